//! The relay seen from the chat client.

use wipowise_core::chat::{AskRequest, AskResponse};
use wipowise_core::error::{ApiError, ChatError};
use wipowise_core::feedback::FeedbackRecord;
use wipowise_core::session::{FeedbackSink, InferenceClient};

use crate::util::client;

#[derive(Clone)]
pub struct HttpBackend {
    client: reqwest::Client,
    api_url: String,
}

impl HttpBackend {
    pub fn new(api_url: &str) -> Self {
        Self {
            client: client(),
            api_url: api_url.trim_end_matches('/').to_string(),
        }
    }

    async fn post<T: serde::Serialize>(&self, path: &str, body: &T) -> Result<Vec<u8>, ChatError> {
        let response = self
            .client
            .post(format!("{}{path}", self.api_url))
            .json(body)
            .send()
            .await
            .map_err(|e| ChatError::upstream(None, e.to_string()))?;
        let status = response.status();
        let bytes = response
            .bytes()
            .await
            .map_err(|e| ChatError::upstream(Some(status.as_u16()), e.to_string()))?;

        if !status.is_success() {
            return Err(relay_error(status.as_u16(), &bytes));
        }
        Ok(bytes.to_vec())
    }
}

/// Turn a relay error body into a message the user can act on.
fn relay_error(status: u16, body: &[u8]) -> ChatError {
    let message = match serde_json::from_slice::<ApiError>(body) {
        Ok(ApiError {
            message,
            details: Some(details),
            ..
        }) => format!("{message}: {details}"),
        Ok(err) => err.message,
        Err(_) => format!("relay returned status {status}"),
    };
    ChatError::upstream(Some(status), message)
}

impl InferenceClient for HttpBackend {
    async fn ask(&self, request: &AskRequest) -> Result<AskResponse, ChatError> {
        let bytes = self.post("/api/ask-ai", request).await?;
        serde_json::from_slice(&bytes)
            .map_err(|e| ChatError::Protocol(format!("unexpected answer from relay: {e}")))
    }
}

impl FeedbackSink for HttpBackend {
    async fn send(&self, record: &FeedbackRecord) -> Result<(), ChatError> {
        self.post("/api/feedback", record).await.map(|_| ())
    }
}
