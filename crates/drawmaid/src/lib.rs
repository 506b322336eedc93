#![forbid(unsafe_code)]

//! `drawmaid` turns diagram-generator output into complete Excalidraw scenes.
//!
//! The pipeline is headless: an external Mermaid parser is plugged in through
//! [`SceneParser`], and everything else (fence extraction, label sanitizing, schema completion)
//! happens here.
//!
//! # Features
//!
//! - `client`: enable the blocking HTTP client for the generation service (`drawmaid::client`)

pub use drawmaid_core::*;

#[cfg(feature = "client")]
pub use drawmaid_client as client;
