use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Feedback text stored for a thumbs-up.
pub const POSITIVE_FEEDBACK: &str = "Good";

/// One rating of one assistant answer. Records carry no id; the log is
/// ordered only by insertion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct FeedbackRecord {
    /// The user message the rated answer replied to
    #[serde(default)]
    pub query: String,
    /// The rated assistant answer
    pub response: String,
    /// "Good" for a positive rating, otherwise the user's free-text comment
    pub feedback: String,
    /// RFC 3339 UTC timestamp of when the rating was given
    #[serde(default = "now_iso8601")]
    pub timestamp: String,
}

impl FeedbackRecord {
    pub fn new(query: impl Into<String>, response: impl Into<String>, verdict: &Verdict) -> Self {
        Self {
            query: query.into(),
            response: response.into(),
            feedback: verdict.text().to_string(),
            timestamp: now_iso8601(),
        }
    }
}

/// Millisecond-precision `Z` timestamp, the shape browsers produce.
pub fn now_iso8601() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Positive,
    Negative(String),
}

impl Verdict {
    pub fn text(&self) -> &str {
        match self {
            Verdict::Positive => POSITIVE_FEEDBACK,
            Verdict::Negative(text) => text,
        }
    }

    /// A negative verdict needs an actual comment.
    pub fn is_valid(&self) -> bool {
        match self {
            Verdict::Positive => true,
            Verdict::Negative(text) => !text.trim().is_empty(),
        }
    }
}

/// Success body of `POST /api/feedback`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct FeedbackAck {
    pub status: String,
}

impl FeedbackAck {
    pub fn ok() -> Self {
        Self {
            status: "ok".to_string(),
        }
    }
}
