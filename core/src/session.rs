//! Chat session controller.
//!
//! A session owns the ordered turns of one conversation, the references
//! attached to assistant turns, the unsent draft and whether a request is in
//! flight. Submitting is split in two phases: [`ChatSession::begin_submit`]
//! appends the user turn right away and hands out a [`PendingSubmit`] ticket,
//! and [`ChatSession::commit`] consumes that ticket with the outcome of the
//! inference call. Every outcome, including failures, ends in an assistant
//! turn and an idle session. A ticket the session is not waiting for is
//! turned away without touching the session.

use std::collections::HashMap;
use std::future::Future;

use crate::chat::{AskRequest, AskResponse, NO_RESPONSE, Reference, Turn};
use crate::error::ChatError;
use crate::feedback::{FeedbackRecord, Verdict};

/// Shown when a submission arrives while a request is still in flight.
pub const BUSY_NOTICE: &str = "Please wait for the model to finish its response!";

/// Shown after feedback was delivered.
pub const FEEDBACK_THANKS: &str = "Thank you for your feedback!";

/// Something that answers a chat request, usually the relay over HTTP.
pub trait InferenceClient {
    fn ask(
        &self,
        request: &AskRequest,
    ) -> impl Future<Output = Result<AskResponse, ChatError>> + Send;
}

/// Something that stores feedback records.
pub trait FeedbackSink {
    fn send(&self, record: &FeedbackRecord) -> impl Future<Output = Result<(), ChatError>> + Send;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum SubmitRejected {
    #[error("{}", BUSY_NOTICE)]
    Busy,
    #[error("nothing to send")]
    Empty,
    #[error("answer arrived for a submission this session is not waiting for")]
    Stale,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FeedbackError {
    #[error("no turn with id {0}")]
    UnknownTurn(String),
    #[error("turn {0} is not an assistant answer")]
    NotAnAnswer(String),
    #[error("negative feedback needs a comment")]
    EmptyComment,
    #[error(transparent)]
    Delivery(#[from] ChatError),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
enum Phase {
    #[default]
    Idle,
    Pending {
        user_turn_id: String,
    },
}

/// Ticket for a submission whose user turn is already in the session.
#[derive(Debug)]
#[must_use = "the session stays busy until the ticket is committed"]
pub struct PendingSubmit {
    user_turn_id: String,
    request: AskRequest,
}

impl PendingSubmit {
    /// Body to send: the new message plus every turn before it.
    pub fn request(&self) -> &AskRequest {
        &self.request
    }
}

#[derive(Debug, Default)]
pub struct ChatSession {
    turns: Vec<Turn>,
    references: HashMap<String, Vec<Reference>>,
    draft: String,
    phase: Phase,
}

impl ChatSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    pub fn is_busy(&self) -> bool {
        matches!(self.phase, Phase::Pending { .. })
    }

    pub fn draft(&self) -> &str {
        &self.draft
    }

    pub fn set_draft(&mut self, draft: impl Into<String>) {
        self.draft = draft.into();
    }

    /// References attached to an assistant turn, empty when there are none.
    pub fn references(&self, turn_id: &str) -> &[Reference] {
        self.references
            .get(turn_id)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn last_answer(&self) -> Option<&Turn> {
        self.turns.iter().rev().find(|t| t.is_assistant())
    }

    /// First phase of a submission.
    ///
    /// `text` wins over the draft when it is present and not blank. The
    /// request history is captured before the new user turn is appended, so it
    /// holds exactly the turns that precede it.
    pub fn begin_submit(&mut self, text: Option<&str>) -> Result<PendingSubmit, SubmitRejected> {
        if self.is_busy() {
            return Err(SubmitRejected::Busy);
        }

        let message = match text {
            Some(t) if !t.trim().is_empty() => t.to_string(),
            _ => self.draft.clone(),
        };
        if message.trim().is_empty() {
            return Err(SubmitRejected::Empty);
        }

        let history = self.turns.clone();
        let turn = Turn::user(message.clone());
        let user_turn_id = turn.id.clone();

        self.turns.push(turn);
        self.draft.clear();
        self.phase = Phase::Pending {
            user_turn_id: user_turn_id.clone(),
        };
        tracing::debug!(turn_id = %user_turn_id, history = history.len(), "submit started");

        Ok(PendingSubmit {
            user_turn_id,
            request: AskRequest { message, history },
        })
    }

    /// Second phase of a submission: record the answer, or the failure as an
    /// answer, and return to idle.
    ///
    /// Only the ticket of the pending submission is accepted. Any other ticket
    /// is rejected with [`SubmitRejected::Stale`] and the session keeps
    /// waiting for its own answer.
    pub fn commit(
        &mut self,
        pending: PendingSubmit,
        outcome: Result<AskResponse, ChatError>,
    ) -> Result<&Turn, SubmitRejected> {
        match &self.phase {
            Phase::Pending { user_turn_id } if *user_turn_id == pending.user_turn_id => {}
            other => {
                tracing::warn!(
                    ticket = %pending.user_turn_id,
                    phase = ?other,
                    "ignoring a ticket the session is not waiting for"
                );
                return Err(SubmitRejected::Stale);
            }
        }

        let turn = match outcome {
            Ok(response) => {
                let answer = if response.answer.trim().is_empty() {
                    NO_RESPONSE.to_string()
                } else {
                    response.answer
                };
                let turn = Turn::assistant(answer);
                if let Some(refs) = response.references.filter(|r| !r.is_empty()) {
                    self.references.insert(turn.id.clone(), refs);
                }
                turn
            }
            Err(err) => {
                tracing::warn!(code = err.code(), error = %err, "inference failed");
                Turn::assistant(format!("Error: {err}"))
            }
        };

        self.phase = Phase::Idle;
        self.turns.push(turn);
        Ok(&self.turns[self.turns.len() - 1])
    }

    /// Submit and wait for the answer in one call.
    pub async fn submit<C: InferenceClient>(
        &mut self,
        client: &C,
        text: Option<&str>,
    ) -> Result<&Turn, SubmitRejected> {
        let pending = self.begin_submit(text)?;
        let outcome = client.ask(pending.request()).await;
        self.commit(pending, outcome)
    }

    /// Build the record for rating the assistant turn `turn_id`.
    ///
    /// The query is the turn right before it when that is a user turn.
    pub fn feedback_for(
        &self,
        turn_id: &str,
        verdict: &Verdict,
    ) -> Result<FeedbackRecord, FeedbackError> {
        if !verdict.is_valid() {
            return Err(FeedbackError::EmptyComment);
        }
        let position = self
            .turns
            .iter()
            .position(|t| t.id == turn_id)
            .ok_or_else(|| FeedbackError::UnknownTurn(turn_id.to_string()))?;
        let answer = &self.turns[position];
        if !answer.is_assistant() {
            return Err(FeedbackError::NotAnAnswer(turn_id.to_string()));
        }

        let query = position
            .checked_sub(1)
            .map(|i| &self.turns[i])
            .filter(|t| !t.is_assistant())
            .map(|t| t.content.as_str())
            .unwrap_or_default();

        Ok(FeedbackRecord::new(query, answer.content.as_str(), verdict))
    }

    /// Rate an assistant turn. Repeated ratings produce separate records.
    pub async fn record_feedback<S: FeedbackSink>(
        &self,
        sink: &S,
        turn_id: &str,
        verdict: &Verdict,
    ) -> Result<(), FeedbackError> {
        let record = self.feedback_for(turn_id, verdict)?;
        sink.send(&record).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::chat::Role;

    struct Canned(Result<AskResponse, ChatError>);

    impl InferenceClient for Canned {
        async fn ask(&self, _request: &AskRequest) -> Result<AskResponse, ChatError> {
            self.0.clone()
        }
    }

    #[derive(Default)]
    struct Recording {
        requests: Mutex<Vec<AskRequest>>,
        records: Mutex<Vec<FeedbackRecord>>,
    }

    impl InferenceClient for Recording {
        async fn ask(&self, request: &AskRequest) -> Result<AskResponse, ChatError> {
            self.requests.lock().unwrap().push(request.clone());
            Ok(AskResponse::answer(format!("re: {}", request.message)))
        }
    }

    impl FeedbackSink for Recording {
        async fn send(&self, record: &FeedbackRecord) -> Result<(), ChatError> {
            self.records.lock().unwrap().push(record.clone());
            Ok(())
        }
    }

    fn reference(index: u32) -> Reference {
        Reference {
            index,
            title: format!("Section {index}"),
            url: format!("https://www.wipo.int/pdm#{index}"),
        }
    }

    #[tokio::test]
    async fn patent_claim_question_round_trip() {
        let mut session = ChatSession::new();
        let pending = session.begin_submit(Some("What is a patent claim?")).unwrap();

        assert!(session.is_busy());
        assert_eq!(session.turns().len(), 1);
        assert_eq!(session.turns()[0].role, Role::User);
        assert_eq!(session.turns()[0].content, "What is a patent claim?");
        assert!(pending.request().history.is_empty());

        let answer = session
            .commit(pending, Ok(AskResponse::answer("A claim defines...")))
            .unwrap()
            .clone();

        assert_eq!(answer.role, Role::Assistant);
        assert_eq!(answer.content, "A claim defines...");
        assert_eq!(session.turns().len(), 2);
        assert!(!session.is_busy());
    }

    #[tokio::test]
    async fn rejected_inference_becomes_error_turn() {
        let mut session = ChatSession::new();
        let client = Canned(Err(ChatError::upstream(None, "connection refused")));

        let turn = session.submit(&client, Some("hello")).await.unwrap();
        assert_eq!(turn.role, Role::Assistant);
        assert!(turn.content.contains("connection refused"));
        assert!(turn.content.starts_with("Error: "));
        assert!(!session.is_busy());
        assert_eq!(session.turns().len(), 2);
    }

    #[test]
    fn submit_while_busy_changes_nothing() {
        let mut session = ChatSession::new();
        let _pending = session.begin_submit(Some("first")).unwrap();
        session.set_draft("typed while waiting");
        let before = session.turns().to_vec();

        for text in [None, Some("second"), Some("")] {
            assert_eq!(session.begin_submit(text).unwrap_err(), SubmitRejected::Busy);
        }

        assert_eq!(session.turns(), before.as_slice());
        assert_eq!(session.draft(), "typed while waiting");
        assert!(session.is_busy());
    }

    #[test]
    fn ticket_from_another_session_is_turned_away() {
        let mut mine = ChatSession::new();
        let mut other = ChatSession::new();
        let own = mine.begin_submit(Some("mine")).unwrap();
        let foreign = other.begin_submit(Some("other")).unwrap();

        let rejected = mine.commit(foreign, Ok(AskResponse::answer("stray")));
        assert_eq!(rejected.unwrap_err(), SubmitRejected::Stale);
        assert!(mine.is_busy());
        assert_eq!(mine.begin_submit(Some("again")).unwrap_err(), SubmitRejected::Busy);
        assert_eq!(mine.turns().len(), 1);

        let answer = mine.commit(own, Ok(AskResponse::answer("for mine"))).unwrap();
        assert_eq!(answer.content, "for mine");
        let roles: Vec<_> = mine.turns().iter().map(|t| t.role).collect();
        assert_eq!(roles, [Role::User, Role::Assistant]);
        assert!(!mine.is_busy());
    }

    #[test]
    fn ticket_for_an_idle_session_is_turned_away() {
        let mut session = ChatSession::new();
        let mut other = ChatSession::new();
        let foreign = other.begin_submit(Some("other")).unwrap();

        let rejected = session.commit(foreign, Err(ChatError::Protocol("x".into())));
        assert_eq!(rejected.unwrap_err(), SubmitRejected::Stale);
        assert!(session.is_empty());
        assert!(!session.is_busy());
    }

    #[test]
    fn blank_submission_is_rejected() {
        let mut session = ChatSession::new();
        session.set_draft("   ");
        assert_eq!(session.begin_submit(None).unwrap_err(), SubmitRejected::Empty);
        assert!(session.is_empty());
        assert!(!session.is_busy());
    }

    #[test]
    fn draft_is_used_and_cleared() {
        let mut session = ChatSession::new();
        session.set_draft("from the draft");
        let pending = session.begin_submit(None).unwrap();
        assert_eq!(pending.request().message, "from the draft");
        assert_eq!(session.draft(), "");
    }

    #[test]
    fn blank_override_falls_back_to_draft() {
        let mut session = ChatSession::new();
        session.set_draft("draft text");
        let pending = session.begin_submit(Some("")).unwrap();
        assert_eq!(pending.request().message, "draft text");
    }

    #[tokio::test]
    async fn history_excludes_the_new_turn() {
        let mut session = ChatSession::new();
        let client = Recording::default();

        session.submit(&client, Some("one")).await.unwrap();
        session.submit(&client, Some("two")).await.unwrap();

        let requests = client.requests.lock().unwrap();
        assert!(requests[0].history.is_empty());
        assert_eq!(requests[1].message, "two");
        let contents: Vec<_> = requests[1].history.iter().map(|t| t.content.as_str()).collect();
        assert_eq!(contents, ["one", "re: one"]);
    }

    #[tokio::test]
    async fn answers_follow_their_questions() {
        let mut session = ChatSession::new();
        let client = Recording::default();
        for q in ["a", "b", "c"] {
            session.submit(&client, Some(q)).await.unwrap();
        }

        for (i, turn) in session.turns().iter().enumerate() {
            if turn.is_assistant() {
                let question = &session.turns()[i - 1];
                assert_eq!(question.role, Role::User);
                assert_eq!(turn.content, format!("re: {}", question.content));
            }
        }
    }

    #[test]
    fn busy_clears_after_every_outcome() {
        let outcomes = [
            Ok(AskResponse::answer("fine")),
            Ok(AskResponse::answer("")),
            Err(ChatError::Configuration("Inference endpoint URL or key not set.".into())),
            Err(ChatError::upstream(Some(502), "bad gateway")),
            Err(ChatError::Protocol("expected a JSON object".into())),
        ];
        let mut session = ChatSession::new();
        for outcome in outcomes {
            let pending = session.begin_submit(Some("q")).unwrap();
            session.commit(pending, outcome).unwrap();
            assert!(!session.is_busy());
        }
        assert_eq!(session.turns().len(), 10);
        assert_eq!(session.turns()[3].content, NO_RESPONSE);
    }

    #[test]
    fn references_are_keyed_by_answer_turn() {
        let mut session = ChatSession::new();
        let pending = session.begin_submit(Some("cite")).unwrap();
        let response = AskResponse {
            answer: "See the manual.".to_string(),
            references: Some(vec![reference(1), reference(2)]),
            raw: None,
        };
        let answer_id = session.commit(pending, Ok(response)).unwrap().id.clone();
        let question_id = session.turns()[0].id.clone();

        assert_eq!(session.references(&answer_id).len(), 2);
        assert_eq!(session.references(&answer_id)[1].index, 2);
        assert!(session.references(&question_id).is_empty());
    }

    #[test]
    fn empty_reference_list_is_not_stored() {
        let mut session = ChatSession::new();
        let pending = session.begin_submit(Some("cite")).unwrap();
        let response = AskResponse {
            answer: "No sources.".to_string(),
            references: Some(Vec::new()),
            raw: None,
        };
        let answer_id = session.commit(pending, Ok(response)).unwrap().id.clone();
        assert!(session.references(&answer_id).is_empty());
    }

    #[tokio::test]
    async fn feedback_uses_preceding_question() {
        let mut session = ChatSession::new();
        let client = Recording::default();
        session.submit(&client, Some("What is novelty?")).await.unwrap();
        let answer_id = session.last_answer().unwrap().id.clone();
        let before = session.turns().to_vec();

        session
            .record_feedback(&client, &answer_id, &Verdict::Positive)
            .await
            .unwrap();
        session
            .record_feedback(&client, &answer_id, &Verdict::Negative("too short".into()))
            .await
            .unwrap();

        let records = client.records.lock().unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].query, "What is novelty?");
        assert_eq!(records[0].response, "re: What is novelty?");
        assert_eq!(records[0].feedback, "Good");
        assert_eq!(records[1].feedback, "too short");
        assert_eq!(session.turns(), before.as_slice());
        assert!(!session.is_busy());
    }

    #[test]
    fn feedback_rejects_bad_targets() {
        let mut session = ChatSession::new();
        let pending = session.begin_submit(Some("q")).unwrap();
        let question_id = pending.user_turn_id.clone();
        session.commit(pending, Ok(AskResponse::answer("a"))).unwrap();

        assert_eq!(
            session.feedback_for(&question_id, &Verdict::Positive),
            Err(FeedbackError::NotAnAnswer(question_id.clone()))
        );
        assert!(matches!(
            session.feedback_for("missing", &Verdict::Positive),
            Err(FeedbackError::UnknownTurn(_))
        ));
        let answer_id = session.last_answer().unwrap().id.clone();
        assert_eq!(
            session.feedback_for(&answer_id, &Verdict::Negative(" ".into())),
            Err(FeedbackError::EmptyComment)
        );
    }
}
