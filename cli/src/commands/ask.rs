use serde_json::json;
use wipowise_core::chat::AskResponse;
use wipowise_core::error::ChatError;
use wipowise_core::session::{ChatSession, InferenceClient};

use crate::backend::HttpBackend;
use crate::render;
use crate::util::{exit_code_for_status, exit_error};

/// Ask a single question and print the answer.
pub async fn run(api_url: &str, message: &str, json_output: bool) -> i32 {
    let backend = HttpBackend::new(api_url);
    let mut session = ChatSession::new();
    let pending = match session.begin_submit(Some(message)) {
        Ok(p) => p,
        Err(e) => exit_error(&e.to_string(), Some("Pass a non-empty question"), 4),
    };

    let outcome = backend.ask(pending.request()).await;
    let code = exit_code_for(&outcome);
    let turn = match session.commit(pending, outcome).cloned() {
        Ok(turn) => turn,
        Err(e) => exit_error(&e.to_string(), None, 2),
    };
    let references = session.references(&turn.id);

    if json_output {
        println!("{:#}", json!({"turn": turn, "references": references}));
    } else {
        print!("{}", render::turn(&turn, references));
    }
    code
}

fn exit_code_for(outcome: &Result<AskResponse, ChatError>) -> i32 {
    match outcome {
        Ok(_) => 0,
        Err(ChatError::Upstream {
            status: Some(status),
            ..
        }) => exit_code_for_status(*status),
        Err(ChatError::Upstream { status: None, .. }) => 3,
        Err(_) => 2,
    }
}

#[cfg(test)]
mod tests {
    use httpmock::prelude::*;

    use super::*;

    #[test]
    fn outcomes_map_to_exit_codes() {
        let answer = AskResponse::from_upstream(json!({"answer": "a"}));
        assert_eq!(exit_code_for(&Ok(answer)), 0);
        assert_eq!(exit_code_for(&Err(ChatError::upstream(Some(400), "bad"))), 1);
        assert_eq!(exit_code_for(&Err(ChatError::upstream(Some(502), "down"))), 2);
        assert_eq!(exit_code_for(&Err(ChatError::upstream(None, "refused"))), 3);
        assert_eq!(exit_code_for(&Err(ChatError::Protocol("x".into()))), 2);
    }

    #[tokio::test]
    async fn one_shot_question() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/api/ask-ai")
                    .json_body(json!({"message": "What is a patent claim?", "history": []}));
                then.status(200).json_body(json!({"answer": "A claim defines..."}));
            })
            .await;

        assert_eq!(run(&server.base_url(), "What is a patent claim?", true).await, 0);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn unreachable_relay_is_a_connection_error() {
        assert_eq!(run("http://127.0.0.1:9", "q", false).await, 3);
    }
}
