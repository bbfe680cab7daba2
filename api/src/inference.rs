//! Relay to the external text-generation endpoint.
//!
//! One attempt per request: no retries and no timeout beyond what the
//! transport imposes.

use serde_json::json;
use url::Url;
use wipowise_core::chat::{AskResponse, Turn};
use wipowise_core::error::ChatError;

use crate::config::InferenceConfig;

#[derive(Clone)]
pub struct InferenceProxy {
    client: reqwest::Client,
    url: Option<String>,
    key: Option<String>,
}

impl InferenceProxy {
    pub fn new(config: &InferenceConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: config.url.clone(),
            key: config.key.clone(),
        }
    }

    pub fn is_configured(&self) -> bool {
        self.url.is_some() && self.key.is_some()
    }

    /// Endpoint with the function key attached as `code`.
    fn target(&self) -> Result<Url, ChatError> {
        let (Some(url), Some(key)) = (&self.url, &self.key) else {
            return Err(ChatError::Configuration(
                "Inference endpoint URL or key not set.".to_string(),
            ));
        };
        let mut target = Url::parse(url).map_err(|e| {
            ChatError::Configuration(format!("Inference endpoint URL is invalid: {e}"))
        })?;
        target.query_pairs_mut().append_pair("code", key);
        Ok(target)
    }

    /// Forward `message` and the turns before it; normalize the reply.
    pub async fn ask(&self, message: &str, history: &[Turn]) -> Result<AskResponse, ChatError> {
        let target = self.target()?;
        tracing::debug!(
            host = target.host_str().unwrap_or_default(),
            message_len = message.len(),
            history = history.len(),
            "proxying to inference endpoint"
        );

        let response = self
            .client
            .post(target)
            .json(&json!({ "message": message, "history": history }))
            .send()
            .await
            .map_err(|e| ChatError::upstream(None, format!("request failed: {e}")))?;

        let status = response.status();
        tracing::debug!(status = status.as_u16(), "inference endpoint answered");
        if !status.is_success() {
            return Err(ChatError::upstream(
                Some(status.as_u16()),
                format!("inference endpoint returned {status}"),
            ));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| ChatError::upstream(Some(status.as_u16()), format!("reading body: {e}")))?;
        let payload: serde_json::Value = serde_json::from_slice(&bytes)
            .map_err(|e| ChatError::Protocol(format!("response is not JSON: {e}")))?;
        if !payload.is_object() {
            return Err(ChatError::Protocol(
                "response is not a JSON object".to_string(),
            ));
        }

        Ok(AskResponse::from_upstream(payload))
    }
}
