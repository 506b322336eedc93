//! Wire types of the diagram generation service.
//!
//! The transport itself lives in `drawmaid-client`; the core only knows the payload shapes and how
//! to pick the response object out of what the service sends back.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Mermaid,
    Excalidraw,
}

impl OutputFormat {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Mermaid => "mermaid",
            Self::Excalidraw => "excalidraw",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OutputFormat {
    type Err = ();

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mermaid" => Ok(Self::Mermaid),
            "excalidraw" => Ok(Self::Excalidraw),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiagramRequest {
    pub prompt: String,
    pub current_scene: Value,
    pub output_format: OutputFormat,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiagramResponse {
    pub format: OutputFormat,
    #[serde(default)]
    pub update: Value,
    #[serde(default)]
    pub data: Value,
}

/// Picks the response object out of a service payload.
///
/// The service answers either with the object itself or with an array whose first element is the
/// object.
pub fn select_response(payload: Value) -> Result<DiagramResponse> {
    let object = match payload {
        Value::Array(items) => items.into_iter().next().ok_or(Error::EmptyResponse)?,
        other => other,
    };
    serde_json::from_value(object).map_err(|e| Error::InvalidResponse {
        message: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn request_serializes_in_camel_case() {
        let req = DiagramRequest {
            prompt: "a login flow".to_string(),
            current_scene: json!({ "elements": [] }),
            output_format: OutputFormat::Mermaid,
        };
        assert_eq!(
            serde_json::to_value(&req).unwrap(),
            json!({
                "prompt": "a login flow",
                "currentScene": { "elements": [] },
                "outputFormat": "mermaid"
            })
        );
    }

    #[test]
    fn output_format_parses_case_insensitively() {
        assert_eq!("Excalidraw".parse::<OutputFormat>(), Ok(OutputFormat::Excalidraw));
        assert!("svg".parse::<OutputFormat>().is_err());
    }
}
