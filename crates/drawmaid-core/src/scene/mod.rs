//! Complete, renderer-ready scene types.
//!
//! Everything here is the *output* side of normalization: no field is optional unless the
//! renderer itself accepts `null` for it. The loosely-typed input side lives in [`partial`].

pub mod partial;

use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map, Value};
use std::fmt;

pub use partial::{PartialElement, PartialScene};

pub type Point = [f64; 2];

/// Element kind (`type` on the wire). Unknown kinds are kept verbatim and carry only the base
/// record.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ElementKind {
    Rectangle,
    Ellipse,
    Diamond,
    Text,
    Arrow,
    Line,
    Other(String),
}

impl ElementKind {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Rectangle => "rectangle",
            Self::Ellipse => "ellipse",
            Self::Diamond => "diamond",
            Self::Text => "text",
            Self::Arrow => "arrow",
            Self::Line => "line",
            Self::Other(s) => s.as_str(),
        }
    }

    pub fn is_linear(&self) -> bool {
        matches!(self, Self::Arrow | Self::Line)
    }
}

impl From<&str> for ElementKind {
    fn from(value: &str) -> Self {
        match value {
            "rectangle" => Self::Rectangle,
            "ellipse" => Self::Ellipse,
            "diamond" => Self::Diamond,
            "text" => Self::Text,
            "arrow" => Self::Arrow,
            "line" => Self::Line,
            other => Self::Other(other.to_string()),
        }
    }
}

impl fmt::Display for ElementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for ElementKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FillStyle {
    Solid,
    Hachure,
    CrossHatch,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StrokeStyle {
    Solid,
    Dashed,
    Dotted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextAlign {
    Left,
    Center,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VerticalAlign {
    Top,
    Middle,
    Bottom,
}

/// Corner-rounding descriptor. `type: 3` is the adaptive radius used for rectangles.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Roundness {
    #[serde(rename = "type")]
    pub kind: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<f64>,
}

impl Roundness {
    pub const ADAPTIVE_RADIUS: u32 = 3;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoundElement {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
}

/// Attachment of a connector end to another element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Binding {
    pub element_id: String,
    #[serde(default)]
    pub focus: f64,
    #[serde(default)]
    pub gap: f64,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Fields every element carries regardless of kind.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ElementBase {
    pub id: String,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub angle: f64,
    pub stroke_color: String,
    pub background_color: String,
    pub fill_style: FillStyle,
    pub stroke_width: f64,
    pub stroke_style: StrokeStyle,
    pub roughness: f64,
    pub opacity: u8,
    pub group_ids: Vec<String>,
    pub frame_id: Option<String>,
    pub roundness: Option<Roundness>,
    pub seed: u32,
    pub version: u32,
    pub version_nonce: u32,
    pub is_deleted: bool,
    pub bound_elements: Option<Vec<BoundElement>>,
    pub updated: i64,
    pub link: Option<String>,
    pub locked: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TextFields {
    pub text: String,
    pub font_size: f64,
    pub font_family: u32,
    pub text_align: TextAlign,
    pub vertical_align: VerticalAlign,
    pub baseline: f64,
    pub container_id: Option<String>,
    pub original_text: String,
    pub line_height: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LinearFields {
    pub points: Vec<Point>,
    pub last_committed_point: Option<Point>,
    pub start_binding: Option<Binding>,
    pub end_binding: Option<Binding>,
    pub start_arrowhead: Option<String>,
    pub end_arrowhead: Option<String>,
}

/// Kind-specific fields. Shape kinds carry none.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ElementExtension {
    Text(TextFields),
    Linear(LinearFields),
    Shape {},
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DiagramElement {
    #[serde(rename = "type")]
    pub kind: ElementKind,
    #[serde(flatten)]
    pub base: ElementBase,
    #[serde(flatten)]
    pub extension: ElementExtension,
}

impl DiagramElement {
    pub fn id(&self) -> &str {
        &self.base.id
    }

    pub fn text(&self) -> Option<&TextFields> {
        match &self.extension {
            ElementExtension::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn linear(&self) -> Option<&LinearFields> {
        match &self.extension {
            ElementExtension::Linear(linear) => Some(linear),
            _ => None,
        }
    }

    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

/// Editor application state. Kept as an open record: a scene's own `appState` is passed through
/// untouched, only the fallback record is synthesized.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(transparent)]
pub struct AppState(pub Map<String, Value>);

impl AppState {
    pub fn from_value(value: &Value) -> Option<Self> {
        value.as_object().map(|obj| Self(obj.clone()))
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn view_background_color(&self) -> Option<&str> {
        self.0.get("viewBackgroundColor").and_then(Value::as_str)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SceneDocument {
    pub elements: Vec<DiagramElement>,
    pub app_state: AppState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub files: Option<Map<String, Value>>,
}

impl SceneDocument {
    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}
