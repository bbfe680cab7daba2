use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Answer text used whenever the inference endpoint returns nothing usable.
pub const NO_RESPONSE: &str = "No response";

/// Prompts offered before the first message of a session.
pub const SUGGESTED_PROMPTS: [&str; 2] = [
    "What makes a patent claim strong and enforceable?",
    "How can I manage a patent portfolio to boost my business?",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// One message in a chat session. Never edited after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Turn {
    /// Opaque client-generated identifier (UUIDv7 when created by this crate)
    pub id: String,
    pub role: Role,
    pub content: String,
}

impl Turn {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            id: Uuid::now_v7().to_string(),
            role,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }

    pub fn is_assistant(&self) -> bool {
        self.role == Role::Assistant
    }
}

/// A citation attached to an assistant turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Reference {
    /// 1-based display position within the owning turn
    pub index: u32,
    pub title: String,
    pub url: String,
}

/// Body of `POST /api/ask-ai` as sent by a client.
///
/// `history` holds every turn strictly before the one carrying `message`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct AskRequest {
    pub message: String,
    #[serde(default)]
    pub history: Vec<Turn>,
}

/// Normalized answer of the inference endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct AskResponse {
    pub answer: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub references: Option<Vec<Reference>>,
    /// Unmodified upstream payload
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<Object>)]
    pub raw: Option<serde_json::Value>,
}

impl AskResponse {
    pub fn answer(answer: impl Into<String>) -> Self {
        Self {
            answer: answer.into(),
            references: None,
            raw: None,
        }
    }

    /// Build a response from an arbitrary upstream payload.
    ///
    /// A missing or blank `answer` becomes [`NO_RESPONSE`]; `references` is kept
    /// only when it parses as a list of [`Reference`].
    pub fn from_upstream(payload: serde_json::Value) -> Self {
        let answer = payload
            .get("answer")
            .and_then(|v| v.as_str())
            .filter(|s| !s.trim().is_empty())
            .unwrap_or(NO_RESPONSE)
            .to_string();

        let references = payload
            .get("references")
            .cloned()
            .and_then(|v| serde_json::from_value::<Vec<Reference>>(v).ok());

        Self {
            answer,
            references,
            raw: Some(payload),
        }
    }
}
