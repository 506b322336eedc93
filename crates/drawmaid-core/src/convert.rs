//! Mermaid text -> scene elements, through an external parser.

use crate::capability::{Clock, RandomSource};
use crate::config::SceneConfig;
use crate::extract::extract;
use crate::normalize::Normalizer;
use crate::sanitize::sanitize;
use crate::scene::{PartialScene, SceneDocument};
use crate::service::{DiagramResponse, OutputFormat};
use crate::{Error, Result};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

pub type ParserError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParserOptions {
    pub font_size: u32,
}

impl Default for ParserOptions {
    fn default() -> Self {
        Self { font_size: 20 }
    }
}

impl ParserOptions {
    /// Reads `parser.fontSize` from `config`, falling back to the default.
    pub fn from_config(config: &SceneConfig) -> Self {
        let mut options = Self::default();
        if let Some(size) = config
            .get_u64("parser.fontSize")
            .and_then(|n| u32::try_from(n).ok())
            .filter(|n| *n > 0)
        {
            options.font_size = size;
        }
        options
    }
}

/// What the external parser emits: scene elements plus auxiliary files (embedded images, ...).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SceneFragment {
    pub elements: Vec<Value>,
    pub files: Option<Map<String, Value>>,
}

/// The Mermaid-to-scene parser the converter delegates to. Its grammar is opaque to this crate.
pub trait SceneParser {
    fn parse(
        &self,
        syntax: &str,
        options: &ParserOptions,
    ) -> std::result::Result<SceneFragment, ParserError>;
}

impl<F> SceneParser for F
where
    F: Fn(&str, &ParserOptions) -> std::result::Result<SceneFragment, ParserError>,
{
    fn parse(
        &self,
        syntax: &str,
        options: &ParserOptions,
    ) -> std::result::Result<SceneFragment, ParserError> {
        self(syntax, options)
    }
}

/// Sequences extract -> sanitize -> parse.
///
/// The parser output is returned as-is; normalizing it is the caller's job (see
/// [`scene_from_response`]).
#[derive(Debug, Clone)]
pub struct Converter<P> {
    parser: P,
    options: ParserOptions,
}

impl<P: SceneParser> Converter<P> {
    pub fn new(parser: P) -> Self {
        Self {
            parser,
            options: ParserOptions::default(),
        }
    }

    pub fn with_options(mut self, options: ParserOptions) -> Self {
        self.options = options;
        self
    }

    pub fn options(&self) -> &ParserOptions {
        &self.options
    }

    /// Synchronous variant of [`Converter::convert`].
    pub fn convert_sync(&self, raw_response: &str) -> Result<SceneFragment> {
        let syntax = sanitize(&extract(raw_response));
        tracing::debug!(syntax = %syntax, "converting mermaid");

        let fragment = self
            .parser
            .parse(&syntax, &self.options)
            .map_err(|err| Error::Conversion {
                message: err.to_string(),
            })?;

        let mut kinds: BTreeMap<&str, usize> = BTreeMap::new();
        for element in &fragment.elements {
            let kind = element.get("type").and_then(Value::as_str).unwrap_or("?");
            *kinds.entry(kind).or_default() += 1;
        }
        tracing::debug!(
            elements = fragment.elements.len(),
            kinds = ?kinds,
            "mermaid conversion succeeded"
        );
        Ok(fragment)
    }

    pub async fn convert(&self, raw_response: &str) -> Result<SceneFragment> {
        self.convert_sync(raw_response)
    }
}

/// Turns a generation-service response into a complete scene.
///
/// Mermaid payloads (`data` is the diagram text) go through the converter and then the normalizer;
/// Excalidraw payloads (`data` is a scene or an element list) are normalized directly.
pub fn scene_from_response<P, C, R>(
    converter: &Converter<P>,
    normalizer: &mut Normalizer<C, R>,
    response: &DiagramResponse,
) -> Result<SceneDocument>
where
    P: SceneParser,
    C: Clock,
    R: RandomSource,
{
    match response.format {
        OutputFormat::Mermaid => {
            let Some(text) = response.data.as_str() else {
                return Err(Error::InvalidResponse {
                    message: "mermaid response data is not a string".to_string(),
                });
            };
            let fragment = converter.convert_sync(text)?;
            let elements = normalizer.normalize_values(&fragment.elements);
            Ok(SceneDocument {
                elements,
                app_state: normalizer.table().default_app_state(),
                files: fragment.files,
            })
        }
        OutputFormat::Excalidraw => {
            let data = match &response.data {
                Value::Null => return Ok(normalizer.normalize_scene(None)),
                // Some generators hand back the scene as a JSON string.
                Value::String(text) => {
                    serde_json::from_str(text).map_err(|e| Error::InvalidResponse {
                        message: format!("excalidraw response data is not JSON: {e}"),
                    })?
                }
                other => other.clone(),
            };
            let scene = PartialScene::from_value(&data);
            Ok(normalizer.normalize_scene(Some(&scene)))
        }
    }
}
