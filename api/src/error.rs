use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use wipowise_core::error::{self, ApiError, ChatError};

/// Internal error type that converts to structured API responses
#[derive(Debug)]
pub enum AppError {
    /// Validation error (400)
    Validation {
        message: String,
        field: Option<String>,
    },
    /// Relay-level failure reported by the inference proxy or the feedback log
    Chat(ChatError),
}

impl AppError {
    pub fn validation(message: impl Into<String>, field: &str) -> Self {
        AppError::Validation {
            message: message.into(),
            field: Some(field.to_string()),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation { .. } => StatusCode::BAD_REQUEST,
            AppError::Chat(ChatError::Validation(_)) => StatusCode::BAD_REQUEST,
            AppError::Chat(ChatError::Upstream { .. } | ChatError::Protocol(_)) => {
                StatusCode::BAD_GATEWAY
            }
            AppError::Chat(ChatError::Configuration(_) | ChatError::Storage(_)) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let request_id = uuid::Uuid::now_v7().to_string();
        let status = self.status();

        let api_error = match self {
            AppError::Validation { message, field } => ApiError {
                error: error::codes::VALIDATION_FAILED.to_string(),
                message,
                details: None,
                field,
                request_id,
            },
            AppError::Chat(err) => {
                let (message, details) = match &err {
                    ChatError::Validation(msg) | ChatError::Configuration(msg) => {
                        (msg.clone(), None)
                    }
                    ChatError::Upstream { .. } => (
                        "Failed to fetch from inference endpoint".to_string(),
                        Some(err.to_string()),
                    ),
                    ChatError::Protocol(_) => (
                        "Inference endpoint returned an unexpected response".to_string(),
                        Some(err.to_string()),
                    ),
                    ChatError::Storage(_) => (
                        "Failed to save feedback".to_string(),
                        Some(err.to_string()),
                    ),
                };
                tracing::error!(code = err.code(), %request_id, error = %err, "request failed");
                ApiError {
                    error: err.code().to_string(),
                    message,
                    details,
                    field: None,
                    request_id,
                }
            }
        };

        (status, Json(api_error)).into_response()
    }
}

impl From<ChatError> for AppError {
    fn from(err: ChatError) -> Self {
        AppError::Chat(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn taxonomy_maps_to_status_codes() {
        let cases = [
            (AppError::validation("Message is required.", "message"), 400),
            (ChatError::Configuration("unset".into()).into(), 500),
            (ChatError::upstream(Some(503), "down").into(), 502),
            (ChatError::Protocol("not json".into()).into(), 502),
            (ChatError::Storage("write failed".into()).into(), 500),
        ];
        for (err, status) in cases {
            assert_eq!(err.status().as_u16(), status, "{err:?}");
        }
    }

    #[tokio::test]
    async fn storage_failure_body_carries_details() {
        let response =
            AppError::from(ChatError::Storage("container not found".into())).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: ApiError = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body.error, "storage_error");
        assert_eq!(body.details.as_deref(), Some("container not found"));
        assert!(!body.request_id.is_empty());
    }
}
