#![forbid(unsafe_code)]

//! Turns generator output into renderable Excalidraw scenes (headless).
//!
//! - [`extract`] strips a code fence from a service response.
//! - [`sanitize`] quotes Mermaid labels that contain syntax-significant characters.
//! - [`Normalizer`] completes partial elements/scenes with type-dependent defaults.
//! - [`Converter`] runs extract -> sanitize -> an external [`SceneParser`].
//!
//! Everything is synchronous and side-effect free apart from the injected [`Clock`] and
//! [`RandomSource`]; the `async` entry points are executor-agnostic wrappers.

pub mod capability;
pub mod config;
pub mod convert;
pub mod error;
pub mod extract;
pub mod normalize;
pub mod sanitize;
pub mod scene;
pub mod service;

pub use capability::{Clock, FixedClock, RandomSource, SeededRandom, SystemClock, ThreadRandom};
pub use config::SceneConfig;
pub use convert::{
    Converter, ParserError, ParserOptions, SceneFragment, SceneParser, scene_from_response,
};
pub use error::{Error, Result};
pub use extract::extract;
pub use normalize::defaults::DefaultTable;
pub use normalize::{Normalizer, effective_kind, normalize_elements, normalize_scene};
pub use sanitize::sanitize;
pub use scene::{
    AppState, DiagramElement, ElementExtension, ElementKind, PartialElement, PartialScene,
    SceneDocument,
};
pub use service::{DiagramRequest, DiagramResponse, OutputFormat, select_response};

#[cfg(test)]
mod tests;
