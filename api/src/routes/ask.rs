use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};
use serde::Deserialize;
use utoipa::ToSchema;
use wipowise_core::chat::{AskResponse, Turn};
use wipowise_core::error::ApiError;

use crate::error::AppError;
use crate::extract::AppJson;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/api/ask-ai", post(ask_ai))
}

/// Incoming chat request. Both fields are optional on the wire so a missing
/// message is answered with a validation error rather than a parse error.
#[derive(Debug, Deserialize, ToSchema)]
pub struct AskAiBody {
    /// The new user message
    #[serde(default)]
    pub message: Option<String>,
    /// Every turn before the new message; `null` or absent means none
    #[serde(default)]
    pub history: Option<Vec<Turn>>,
}

/// Relay a chat message to the inference endpoint
#[utoipa::path(
    post,
    path = "/api/ask-ai",
    request_body = AskAiBody,
    responses(
        (status = 200, description = "Normalized answer", body = AskResponse),
        (status = 400, description = "Message missing or body malformed", body = ApiError),
        (status = 500, description = "Inference endpoint not configured", body = ApiError),
        (status = 502, description = "Inference call failed", body = ApiError)
    ),
    tag = "chat"
)]
pub async fn ask_ai(
    State(state): State<AppState>,
    AppJson(body): AppJson<AskAiBody>,
) -> Result<Json<AskResponse>, AppError> {
    let message = body
        .message
        .filter(|m| !m.trim().is_empty())
        .ok_or_else(|| AppError::validation("Message is required.", "message"))?;
    let history = body.history.unwrap_or_default();

    let response = state.inference.ask(&message, &history).await?;
    Ok(Json(response))
}
