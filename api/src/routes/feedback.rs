use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};
use wipowise_core::error::ApiError;
use wipowise_core::feedback::{FeedbackAck, FeedbackRecord};

use crate::error::AppError;
use crate::extract::AppJson;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/api/feedback", post(submit_feedback))
}

/// Append a rating to the feedback log
#[utoipa::path(
    post,
    path = "/api/feedback",
    request_body = FeedbackRecord,
    responses(
        (status = 200, description = "Feedback stored", body = FeedbackAck),
        (status = 400, description = "Body malformed", body = ApiError),
        (status = 500, description = "Feedback could not be stored", body = ApiError)
    ),
    tag = "feedback"
)]
pub async fn submit_feedback(
    State(state): State<AppState>,
    AppJson(record): AppJson<FeedbackRecord>,
) -> Result<Json<FeedbackAck>, AppError> {
    state.feedback.append(&record).await?;
    Ok(Json(FeedbackAck::ok()))
}
