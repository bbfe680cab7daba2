use std::future::Future;
use std::io::Write;
use std::pin::Pin;

use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use wipowise_core::chat::{AskResponse, SUGGESTED_PROMPTS};
use wipowise_core::error::ChatError;
use wipowise_core::feedback::Verdict;
use wipowise_core::session::{
    ChatSession, FEEDBACK_THANKS, InferenceClient, PendingSubmit, SubmitRejected,
};
use wipowise_core::speech::{Dictation, Language, ReadAloud, SpeechCapability};

use crate::backend::HttpBackend;
use crate::render;
use crate::repl::ReplCommand;

/// A terminal has neither a speech recognizer nor a synthesizer, so
/// dictation and read-aloud are always reported as unsupported.
const TERMINAL_SPEECH: SpeechCapability = SpeechCapability::Unavailable;

const NOTHING_TO_RATE: &str = "Nothing to rate yet.";

type Outcome = (PendingSubmit, Result<AskResponse, ChatError>);
type InFlight = Pin<Box<dyn Future<Output = Outcome> + Send>>;

pub async fn run(api_url: &str, language: Language) -> i32 {
    let input = tokio::io::BufReader::new(tokio::io::stdin());
    let mut out = std::io::stdout();
    match chat_loop(HttpBackend::new(api_url), language, input, &mut out).await {
        Ok(()) => 0,
        Err(e) => {
            eprintln!("chat ended: {e}");
            2
        }
    }
}

/// Drive one chat session from `input` until it ends or `/quit`.
///
/// Input keeps being read while a request is in flight so that questions
/// typed in the meantime can be turned away with the busy notice.
async fn chat_loop<R, W>(
    backend: HttpBackend,
    mut language: Language,
    input: R,
    out: &mut W,
) -> std::io::Result<()>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    let mut session = ChatSession::new();
    let mut read_aloud = ReadAloud::default();
    let mut in_flight: Option<InFlight> = None;
    let mut suggestions_open = true;
    let mut lines = input.lines();

    write!(out, "{}{}", render::overview(), render::suggestions())?;
    out.flush()?;

    loop {
        tokio::select! {
            (pending, outcome) = wait(&mut in_flight) => {
                in_flight = None;
                finish(&mut session, pending, outcome, out)?;
            }
            line = lines.next_line() => {
                let Some(line) = line? else {
                    if let Some(request) = in_flight.take() {
                        let (pending, outcome) = request.await;
                        finish(&mut session, pending, outcome, out)?;
                    }
                    break;
                };

                match ReplCommand::parse(&line) {
                    ReplCommand::Blank => {}
                    ReplCommand::Ask(text) => {
                        if start(&mut session, &backend, &text, &mut in_flight, out)? {
                            suggestions_open = false;
                        }
                    }
                    ReplCommand::Suggestion(n) => {
                        match SUGGESTED_PROMPTS.get(n - 1).filter(|_| suggestions_open) {
                            Some(prompt) => {
                                if start(&mut session, &backend, prompt, &mut in_flight, out)? {
                                    suggestions_open = false;
                                }
                            }
                            None => writeln!(out, "No suggestion /{n}.")?,
                        }
                    }
                    ReplCommand::Good => {
                        rate(&session, &backend, Verdict::Positive, out).await?;
                    }
                    ReplCommand::Bad(comment) => {
                        rate(&session, &backend, Verdict::Negative(comment), out).await?;
                    }
                    ReplCommand::Mic => {
                        if let Err(notice) = Dictation::start(TERMINAL_SPEECH, language, &session) {
                            writeln!(out, "{notice}")?;
                        }
                    }
                    ReplCommand::Speak => {
                        let answer = session.last_answer();
                        if let Err(notice) = read_aloud.toggle(TERMINAL_SPEECH, language, answer) {
                            writeln!(out, "{notice}")?;
                        }
                    }
                    ReplCommand::Lang(tag) if tag.is_empty() => {
                        writeln!(out, "Speech language: {} ({language})", language.label())?;
                    }
                    ReplCommand::Lang(tag) => match tag.parse::<Language>() {
                        Ok(lang) => {
                            language = lang;
                            writeln!(out, "Speech language: {} ({language})", language.label())?;
                        }
                        Err(e) => writeln!(out, "{e}")?,
                    },
                    ReplCommand::Help => write!(out, "{}", render::help())?,
                    ReplCommand::Quit => break,
                    ReplCommand::Unknown(name) => {
                        writeln!(out, "Unknown command /{name}. Type /help for commands.")?;
                    }
                }
            }
        }
        out.flush()?;
    }

    out.flush()
}

/// Resolve with the in-flight answer, or never when there is none.
async fn wait(in_flight: &mut Option<InFlight>) -> Outcome {
    match in_flight {
        Some(request) => request.await,
        None => std::future::pending().await,
    }
}

/// Begin a submission. Returns whether the question was accepted.
fn start<W: Write>(
    session: &mut ChatSession,
    backend: &HttpBackend,
    text: &str,
    in_flight: &mut Option<InFlight>,
    out: &mut W,
) -> std::io::Result<bool> {
    match session.begin_submit(Some(text)) {
        Ok(pending) => {
            let backend = backend.clone();
            *in_flight = Some(Box::pin(async move {
                let outcome = backend.ask(pending.request()).await;
                (pending, outcome)
            }));
            writeln!(out, "you> {}", text.trim())?;
            writeln!(out, "{}", render::THINKING)?;
            Ok(true)
        }
        Err(rejected @ SubmitRejected::Busy) => {
            writeln!(out, "{rejected}")?;
            Ok(false)
        }
        Err(SubmitRejected::Empty | SubmitRejected::Stale) => Ok(false),
    }
}

/// Record the answer of the in-flight request and print it.
fn finish<W: Write>(
    session: &mut ChatSession,
    pending: PendingSubmit,
    outcome: Result<AskResponse, ChatError>,
    out: &mut W,
) -> std::io::Result<()> {
    match session.commit(pending, outcome).cloned() {
        Ok(turn) => write!(out, "{}", render::turn(&turn, session.references(&turn.id))),
        Err(rejected) => writeln!(out, "{rejected}"),
    }
}

async fn rate<W: Write>(
    session: &ChatSession,
    backend: &HttpBackend,
    verdict: Verdict,
    out: &mut W,
) -> std::io::Result<()> {
    let Some(answer_id) = session.last_answer().map(|t| t.id.clone()) else {
        return writeln!(out, "{NOTHING_TO_RATE}");
    };
    match session.record_feedback(backend, &answer_id, &verdict).await {
        Ok(()) => writeln!(out, "{FEEDBACK_THANKS}"),
        Err(e) => writeln!(out, "Feedback not sent: {e}"),
    }
}
