//! Error taxonomy for the exporter. Every variant is fatal to a run.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExportError {
    /// The endpoint answered with a non-success HTTP status.
    #[error("GraphQL HTTP {status}: {body}")]
    Transport { status: u16, body: String },

    /// The response envelope carried GraphQL-level `errors`.
    #[error("GraphQL errors: {0}")]
    Application(String),

    /// Missing or malformed configuration.
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("failed to decode GraphQL response: {0}")]
    Decode(#[from] serde_json::Error),
}

impl ExportError {
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }
}
