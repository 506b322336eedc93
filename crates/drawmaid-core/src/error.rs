pub type Result<T> = std::result::Result<T, Error>;

/// Failures surfaced by the conversion pipeline.
///
/// Extraction, sanitization and normalization are total and have no variants here.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The external Mermaid parser rejected the sanitized syntax.
    #[error("Failed to convert Mermaid diagram: {message}")]
    Conversion { message: String },

    #[error("Generation service returned an empty response array")]
    EmptyResponse,

    #[error("Invalid generation response: {message}")]
    InvalidResponse { message: String },
}
