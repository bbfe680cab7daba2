//! Plain-text rendering of a chat session.

use std::fmt::Write;

use wipowise_core::chat::{Reference, SUGGESTED_PROMPTS, Turn};

pub const THINKING: &str = "assistant> …";

pub fn overview() -> String {
    "Welcome WipoWise Agent\nAsk me about the WIPO Patent Drafting Manual. Type /help for commands.\n"
        .to_string()
}

pub fn suggestions() -> String {
    let mut out = String::from("Suggestions:\n");
    for (i, prompt) in SUGGESTED_PROMPTS.iter().enumerate() {
        let _ = writeln!(out, "  /{}  {prompt}", i + 1);
    }
    out
}

pub fn help() -> String {
    "\
Commands:
  /1, /2        send a suggested question
  /good         rate the last answer as good
  /bad TEXT     rate the last answer and say what could be improved
  /mic          dictate a question
  /speak        read the last answer aloud
  /lang CODE    speech language (en-US, de-DE, fr-FR)
  /help         show this help
  /quit         leave
"
    .to_string()
}

/// One turn with its references, if any.
pub fn turn(turn: &Turn, references: &[Reference]) -> String {
    let mut out = format!("{}> {}\n", role_label(turn), turn.content);
    if !references.is_empty() {
        out.push_str("References:\n");
        for r in references {
            let _ = writeln!(out, "  [{}] {} <{}>", r.index, r.title, r.url);
        }
    }
    out
}

fn role_label(turn: &Turn) -> &'static str {
    if turn.is_assistant() { "assistant" } else { "you" }
}
