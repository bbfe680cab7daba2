use std::path::PathBuf;

pub const DEFAULT_FEEDBACK_CONTAINER: &str = "feedback";
pub const DEFAULT_FEEDBACK_BLOB: &str = "feedback.json";

#[derive(Debug, Clone, Default)]
pub struct InferenceConfig {
    /// `AZURE_FUNCTION_URL`
    pub url: Option<String>,
    /// `AZURE_FUNCTION_KEY`, sent as the `code` query parameter
    pub key: Option<String>,
}

#[derive(Debug, Clone)]
pub struct FeedbackConfig {
    /// `AZURE_STORAGE_CONNECTION_STRING`
    pub connection_string: Option<String>,
    /// `WIPOWISE_FEEDBACK_DIR`, used when no connection string is set
    pub directory: Option<PathBuf>,
    pub container: String,
    pub blob: String,
}

impl Default for FeedbackConfig {
    fn default() -> Self {
        Self {
            connection_string: None,
            directory: None,
            container: DEFAULT_FEEDBACK_CONTAINER.to_string(),
            blob: DEFAULT_FEEDBACK_BLOB.to_string(),
        }
    }
}

/// Relay configuration. Every value is optional at startup; a missing
/// upstream only degrades the endpoint that needs it.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub inference: InferenceConfig,
    pub feedback: FeedbackConfig,
    pub static_dir: PathBuf,
    pub cors_origins: Vec<String>,
    pub port: u16,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup. Empty values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let cors_origins = get("WIPOWISE_CORS_ORIGINS")
            .unwrap_or_else(|| "http://localhost:8501".to_string())
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect();

        Self {
            inference: InferenceConfig {
                url: get("AZURE_FUNCTION_URL"),
                key: get("AZURE_FUNCTION_KEY"),
            },
            feedback: FeedbackConfig {
                connection_string: get("AZURE_STORAGE_CONNECTION_STRING"),
                directory: get("WIPOWISE_FEEDBACK_DIR").map(PathBuf::from),
                container: get("WIPOWISE_FEEDBACK_CONTAINER")
                    .unwrap_or_else(|| DEFAULT_FEEDBACK_CONTAINER.to_string()),
                blob: get("WIPOWISE_FEEDBACK_BLOB")
                    .unwrap_or_else(|| DEFAULT_FEEDBACK_BLOB.to_string()),
            },
            static_dir: get("WIPOWISE_STATIC_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("dist")),
            cors_origins,
            port: get("PORT").and_then(|p| p.parse().ok()).unwrap_or(3000),
        }
    }
}
