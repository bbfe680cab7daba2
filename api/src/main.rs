use std::net::SocketAddr;
use std::path::Path;

use axum::Router;
use serde::Serialize;
use tower::ServiceBuilder;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

mod config;
mod error;
mod extract;
mod feedback_store;
mod inference;
mod middleware;
mod routes;
mod state;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "WipoWise Relay API",
        version = "0.1.0",
        description = "Relay between the WipoWise chat client, the inference endpoint and the feedback log."
    ),
    paths(
        routes::health::health_check,
        routes::ask::ask_ai,
        routes::feedback::submit_feedback,
    ),
    components(schemas(
        HealthResponse,
        routes::ask::AskAiBody,
        wipowise_core::error::ApiError,
        wipowise_core::chat::Role,
        wipowise_core::chat::Turn,
        wipowise_core::chat::Reference,
        wipowise_core::chat::AskResponse,
        wipowise_core::feedback::FeedbackRecord,
        wipowise_core::feedback::FeedbackAck,
    ))
)]
struct ApiDoc;

#[derive(Serialize, utoipa::ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub inference_configured: bool,
    pub feedback_configured: bool,
}

/// API routes plus the static front-end as fallback.
fn app(app_state: state::AppState, static_dir: &Path, cors_origins: &[String]) -> Router {
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-doc/openapi.json", ApiDoc::openapi()))
        .merge(routes::health::router())
        .merge(routes::ask::router())
        .merge(routes::feedback::router())
        .fallback_service(ServeDir::new(static_dir))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(axum::middleware::from_fn(middleware::security_headers::apply))
                .layer(middleware::cors::build_cors_layer(cors_origins)),
        )
        .with_state(app_state)
}

#[tokio::main]
async fn main() {
    // Load .env if present (dev only)
    let _ = dotenvy::dotenv();

    // Structured JSON logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "wipowise_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().json())
        .init();

    let config = config::AppConfig::from_env();

    let app_state = state::AppState {
        inference: inference::InferenceProxy::new(&config.inference),
        feedback: feedback_store::FeedbackLog::from_config(&config.feedback),
    };
    if !app_state.inference.is_configured() {
        tracing::warn!("AZURE_FUNCTION_URL or AZURE_FUNCTION_KEY not set; /api/ask-ai will fail");
    }

    let router = app(app_state, &config.static_dir, &config.cors_origins);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("WipoWise relay listening on {}", addr);

    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!(error = %e, %addr, "failed to bind");
            std::process::exit(1);
        }
    };
    if let Err(e) = axum::serve(listener, router).await {
        tracing::error!(error = %e, "server error");
        std::process::exit(1);
    }
}
