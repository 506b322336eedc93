#![forbid(unsafe_code)]

//! Blocking client for the diagram generation service.
//!
//! The service takes a [`DiagramRequest`] as a JSON POST body and answers with a
//! [`DiagramResponse`], either bare or as the first entry of an array.

use drawmaid_core::{DiagramRequest, DiagramResponse, select_response};
use serde_json::Value;
use std::time::Duration;
use url::Url;

pub const DEFAULT_ENDPOINT: &str = "http://localhost:5678/webhook/generate-diagram";

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("invalid endpoint: {0}")]
    InvalidEndpoint(#[from] url::ParseError),
    #[error(transparent)]
    Http(#[from] ureq::Error),
    #[error("response is not JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Response(#[from] drawmaid_core::Error),
}

pub type Result<T> = std::result::Result<T, ClientError>;

#[derive(Debug, Clone)]
pub struct GenerationClient {
    agent: ureq::Agent,
    endpoint: Url,
}

impl GenerationClient {
    pub fn new(endpoint: &str) -> Result<Self> {
        Self::with_timeout(endpoint, DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(endpoint: &str, timeout: Duration) -> Result<Self> {
        let endpoint = Url::parse(endpoint)?;
        let agent: ureq::Agent = ureq::Agent::config_builder()
            .timeout_global(Some(timeout))
            .build()
            .into();
        Ok(Self { agent, endpoint })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Posts `request` and returns the selected response object.
    ///
    /// Non-2xx statuses surface as [`ClientError::Http`]; there are no retries.
    pub fn generate(&self, request: &DiagramRequest) -> Result<DiagramResponse> {
        let body = serde_json::to_string(request)?;
        tracing::debug!(
            endpoint = %self.endpoint,
            format = %request.output_format,
            "requesting diagram"
        );

        let mut response = self
            .agent
            .post(self.endpoint.as_str())
            .header("Content-Type", "application/json")
            .send(body)?;
        let text = response.body_mut().read_to_string()?;
        let payload: Value = serde_json::from_str(&text)?;

        let selected = select_response(payload)?;
        tracing::debug!(format = %selected.format, "diagram response received");
        Ok(selected)
    }
}
