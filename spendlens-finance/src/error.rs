//! Error types for model calls and batch-response parsing

use thiserror::Error;

/// A single failed attempt against the model backend
#[derive(Error, Debug)]
pub enum ModelError {
    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("model endpoint returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("malformed model response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("failed to start async runtime: {0}")]
    Runtime(#[from] std::io::Error),

    #[error("model unavailable: {0}")]
    Unavailable(String),
}

/// Why a batch response could not be applied to its chunk
#[derive(Error, Debug)]
pub enum BatchParseError {
    #[error("no response from model")]
    NoResponse,

    #[error("response is not a JSON array of {{index, category}}: {0}")]
    Json(#[from] serde_json::Error),

    #[error("index {index} out of range for chunk of {len}")]
    IndexOutOfRange { index: usize, len: usize },
}
