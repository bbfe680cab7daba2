use crate::feedback_store::FeedbackLog;
use crate::inference::InferenceProxy;

#[derive(Clone)]
pub struct AppState {
    pub inference: InferenceProxy,
    pub feedback: FeedbackLog,
}
