use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::{Json, Router, routing::get};

use crate::HealthResponse;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}

/// Health check; reports whether both upstreams are configured
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Relay is fully configured", body = HealthResponse),
        (status = 503, description = "An upstream is not configured", body = HealthResponse)
    ),
    tag = "system"
)]
pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let inference_configured = state.inference.is_configured();
    let feedback_configured = state.feedback.is_configured();
    let healthy = inference_configured && feedback_configured;

    let http_status = if healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (
        http_status,
        Json(HealthResponse {
            status: if healthy { "ok" } else { "degraded" }.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            inference_configured,
            feedback_configured,
        }),
    )
}
