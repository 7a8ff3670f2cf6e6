//! Error types for the fleet-manager certificate client.

use thiserror::Error;

use crate::certs::outcome::ValidationReport;

#[derive(Debug, Error)]
pub enum FleetError {
    #[error("transport: {0}")]
    Transport(#[from] reqwest::Error),

    /// A single control-plane call exceeded its per-call timeout.
    #[error("call timed out: {0}")]
    Timeout(String),

    #[error("control plane returned HTTP {status}: {message}")]
    Api { status: u16, message: String },

    #[error("invalid response: {0}")]
    InvalidResponse(String),

    #[error("{0}")]
    ValidationFailed(ValidationReport),

    #[error("operation cancelled: {0}")]
    Cancelled(String),

    #[error("task {task_id} finished with status {status}: {}", messages.join("; "))]
    TaskFailed {
        task_id:  String,
        status:   String,
        messages: Vec<String>,
    },

    /// The fingerprint digest could not be written.
    #[error("encoding: {0}")]
    Encoding(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("config: {0}")]
    Config(String),

    #[error("IO: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TLS: {0}")]
    Tls(#[from] rustls::Error),

    #[error("URL: {0}")]
    Url(#[from] url::ParseError),
}

impl FleetError {
    /// Per-call timeouts are the only condition the poll loop may retry.
    pub fn is_transient(&self) -> bool {
        matches!(self, FleetError::Timeout(_))
    }
}

pub type Result<T> = std::result::Result<T, FleetError>;
