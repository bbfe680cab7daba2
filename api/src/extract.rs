//! JSON extractor whose rejections come back as `validation_failed` errors
//! instead of axum's plain-text responses.

use axum::{
    Json,
    extract::{FromRequest, Request, rejection::JsonRejection},
};

use crate::error::AppError;

/// Drop-in replacement for `axum::Json<T>` in handler arguments.
pub struct AppJson<T>(pub T);

impl<S, T> FromRequest<S> for AppJson<T>
where
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(AppJson(value)),
            Err(rejection) => Err(map_json_rejection(rejection)),
        }
    }
}

pub fn map_json_rejection(rejection: JsonRejection) -> AppError {
    let body_text = rejection.body_text();
    AppError::Validation {
        field: Some(field_from_serde_message(&body_text).unwrap_or_else(|| "body".to_string())),
        message: format!("Invalid request body: {body_text}"),
    }
}

/// Field a serde message is about, as a path like `history[0].role`.
///
/// axum puts the path of the failing value in front of the serde error
/// (`history[0].role: unknown variant ...`). Missing and unknown fields
/// name themselves (`missing field `response``) and are appended to it.
fn field_from_serde_message(msg: &str) -> Option<String> {
    let segments: Vec<&str> = msg.split(": ").collect();
    let path = segments[..segments.len().saturating_sub(1)]
        .iter()
        .copied()
        .find(|segment| is_value_path(segment));

    let named = ["missing field `", "unknown field `"]
        .iter()
        .find_map(|marker| {
            let start = msg.find(marker)? + marker.len();
            let rest = &msg[start..];
            rest.find('`').map(|end| &rest[..end])
        });

    match (path, named) {
        (Some(path), Some(name)) => Some(format!("{path}.{name}")),
        (Some(path), None) => Some(path.to_string()),
        (None, name) => name.map(str::to_string),
    }
}

fn is_value_path(segment: &str) -> bool {
    !segment.is_empty()
        && segment
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '[' | ']' | '?'))
}
