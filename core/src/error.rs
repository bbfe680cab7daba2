use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Structured error body returned by every relay endpoint.
///
/// The CLI reads `message` back out of it, so it must stay human-readable.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ApiError {
    /// Machine-readable error code (see [`codes`])
    pub error: String,
    /// Human-readable description of what went wrong
    pub message: String,
    /// Underlying cause, e.g. the transport or storage error text
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    /// Which field caused the error (if applicable)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    /// Request ID for tracing and debugging
    #[serde(default)]
    pub request_id: String,
}

/// Error codes used across the API
pub mod codes {
    pub const VALIDATION_FAILED: &str = "validation_failed";
    pub const CONFIGURATION_ERROR: &str = "configuration_error";
    pub const UPSTREAM_ERROR: &str = "upstream_error";
    pub const PROTOCOL_ERROR: &str = "protocol_error";
    pub const STORAGE_ERROR: &str = "storage_error";
}

/// Failure taxonomy shared by the relay and its clients.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ChatError {
    /// Required input missing or malformed.
    #[error("{0}")]
    Validation(String),
    /// A required endpoint or credential is not configured.
    #[error("{0}")]
    Configuration(String),
    /// The downstream call failed or answered with a non-success status.
    #[error("{message}")]
    Upstream { status: Option<u16>, message: String },
    /// The downstream answer did not have the expected shape.
    #[error("{0}")]
    Protocol(String),
    /// The feedback document could not be written.
    #[error("{0}")]
    Storage(String),
}

impl ChatError {
    pub fn upstream(status: Option<u16>, message: impl Into<String>) -> Self {
        ChatError::Upstream {
            status,
            message: message.into(),
        }
    }

    /// The [`codes`] entry this error is reported under.
    pub fn code(&self) -> &'static str {
        match self {
            ChatError::Validation(_) => codes::VALIDATION_FAILED,
            ChatError::Configuration(_) => codes::CONFIGURATION_ERROR,
            ChatError::Upstream { .. } => codes::UPSTREAM_ERROR,
            ChatError::Protocol(_) => codes::PROTOCOL_ERROR,
            ChatError::Storage(_) => codes::STORAGE_ERROR,
        }
    }
}
