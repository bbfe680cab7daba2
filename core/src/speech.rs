//! Speech input and read-aloud output modelled as host capabilities.
//!
//! Hosts that can transcribe speech feed recognition events into a
//! [`Dictation`]; hosts with a synthesizer play the utterances a
//! [`ReadAloud`] hands out. Hosts without either report
//! [`SpeechCapability::Unavailable`] and disable the control instead of
//! failing.

use std::fmt;
use std::str::FromStr;

use crate::chat::Turn;
use crate::session::ChatSession;

pub const UNSUPPORTED_NOTICE: &str =
    "Speech recognition is not supported in this environment. Type your question instead.";
pub const NO_SPEECH_NOTICE: &str = "No speech detected. Please try again.";
pub const AUDIO_CAPTURE_NOTICE: &str = "Microphone access denied or unavailable.";
pub const GENERIC_NOTICE: &str = "An error occurred during speech recognition.";
pub const SPEAK_UNSUPPORTED_NOTICE: &str =
    "Reading answers aloud is not supported in this environment.";
pub const NOTHING_TO_READ_NOTICE: &str = "There is no answer to read aloud yet.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpeechCapability {
    Available,
    Unavailable,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Language {
    #[default]
    EnglishUs,
    German,
    French,
}

impl Language {
    pub const ALL: [Language; 3] = [Language::EnglishUs, Language::German, Language::French];

    /// BCP 47 tag handed to the recognizer.
    pub fn tag(self) -> &'static str {
        match self {
            Language::EnglishUs => "en-US",
            Language::German => "de-DE",
            Language::French => "fr-FR",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Language::EnglishUs => "English (US)",
            Language::German => "German",
            Language::French => "French",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl FromStr for Language {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Language::ALL
            .into_iter()
            .find(|lang| lang.tag().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| {
                let known: Vec<_> = Language::ALL.iter().map(|l| l.tag()).collect();
                format!("unsupported language '{s}', expected one of {}", known.join(", "))
            })
    }
}

/// One update from a recognizer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecognitionEvent {
    /// Transcript so far; replaces the previous interim text.
    Interim(String),
    /// Final transcript; ends the dictation.
    Final(String),
    /// Recognizer error code, e.g. `no-speech` or `audio-capture`.
    Error(String),
    /// Recognizer stopped without a final result.
    End,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DictationStep {
    Listening,
    /// Dictation finished with text that should be submitted.
    Submit(String),
    Stopped,
    /// Dictation failed; show the notice to the user.
    Failed(&'static str),
}

/// A single listening run, from start to final result or error.
#[derive(Debug)]
pub struct Dictation {
    language: Language,
    prefix: String,
    done: bool,
}

impl Dictation {
    /// Start listening. The current draft is kept and transcripts are
    /// appended after it.
    pub fn start(
        capability: SpeechCapability,
        language: Language,
        session: &ChatSession,
    ) -> Result<Self, &'static str> {
        if capability == SpeechCapability::Unavailable {
            return Err(UNSUPPORTED_NOTICE);
        }
        Ok(Self {
            language,
            prefix: session.draft().to_string(),
            done: false,
        })
    }

    pub fn language(&self) -> Language {
        self.language
    }

    pub fn is_listening(&self) -> bool {
        !self.done
    }

    /// Apply one recognizer event. Events after the run has ended are ignored.
    pub fn apply(&mut self, event: RecognitionEvent, session: &mut ChatSession) -> DictationStep {
        if self.done {
            return DictationStep::Stopped;
        }
        match event {
            RecognitionEvent::Interim(text) => {
                session.set_draft(self.with_prefix(&text));
                DictationStep::Listening
            }
            RecognitionEvent::Final(text) => {
                self.done = true;
                session.set_draft(self.with_prefix(&text));
                DictationStep::Submit(text)
            }
            RecognitionEvent::Error(code) => {
                self.done = true;
                DictationStep::Failed(notice_for(&code))
            }
            RecognitionEvent::End => {
                self.done = true;
                DictationStep::Stopped
            }
        }
    }

    pub fn stop(&mut self) {
        self.done = true;
    }

    fn with_prefix(&self, transcript: &str) -> String {
        if self.prefix.is_empty() {
            transcript.to_string()
        } else {
            format!("{} {transcript}", self.prefix)
        }
    }
}

pub fn notice_for(code: &str) -> &'static str {
    match code {
        "no-speech" => NO_SPEECH_NOTICE,
        "audio-capture" | "not-allowed" => AUDIO_CAPTURE_NOTICE,
        _ => GENERIC_NOTICE,
    }
}

/// Text for the host synthesizer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Utterance {
    pub text: String,
    pub language: Language,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpeakAction {
    /// Cancel whatever is playing, then speak this.
    Speak(Utterance),
    /// Stop the answer that is playing.
    Cancel,
}

/// Read-aloud toggle for assistant answers. At most one answer plays at a
/// time; asking for the playing answer again stops it.
#[derive(Debug, Default)]
pub struct ReadAloud {
    playing: Option<String>,
}

impl ReadAloud {
    pub fn toggle(
        &mut self,
        capability: SpeechCapability,
        language: Language,
        answer: Option<&Turn>,
    ) -> Result<SpeakAction, &'static str> {
        if capability == SpeechCapability::Unavailable {
            return Err(SPEAK_UNSUPPORTED_NOTICE);
        }
        let Some(answer) = answer.filter(|t| t.is_assistant()) else {
            return Err(NOTHING_TO_READ_NOTICE);
        };

        if self.playing.as_deref() == Some(answer.id.as_str()) {
            self.playing = None;
            return Ok(SpeakAction::Cancel);
        }
        self.playing = Some(answer.id.clone());
        Ok(SpeakAction::Speak(Utterance {
            text: answer.content.clone(),
            language,
        }))
    }

    /// The synthesizer reached the end of the utterance.
    pub fn finished(&mut self) {
        self.playing = None;
    }

    /// Id of the answer being read, if any.
    pub fn playing(&self) -> Option<&str> {
        self.playing.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unavailable_capability_refuses_to_start() {
        let session = ChatSession::new();
        let err = Dictation::start(SpeechCapability::Unavailable, Language::default(), &session)
            .unwrap_err();
        assert_eq!(err, UNSUPPORTED_NOTICE);
    }

    #[test]
    fn interim_updates_extend_existing_draft() {
        let mut session = ChatSession::new();
        session.set_draft("Regarding claims,");
        let mut dictation =
            Dictation::start(SpeechCapability::Available, Language::German, &session).unwrap();

        dictation.apply(RecognitionEvent::Interim("what is".into()), &mut session);
        assert_eq!(session.draft(), "Regarding claims, what is");
        dictation.apply(RecognitionEvent::Interim("what is novelty".into()), &mut session);
        assert_eq!(session.draft(), "Regarding claims, what is novelty");

        let step = dictation.apply(RecognitionEvent::Final("what is novelty".into()), &mut session);
        assert_eq!(step, DictationStep::Submit("what is novelty".into()));
        assert!(!dictation.is_listening());
    }

    #[test]
    fn events_after_final_are_ignored() {
        let mut session = ChatSession::new();
        let mut dictation =
            Dictation::start(SpeechCapability::Available, Language::EnglishUs, &session).unwrap();
        dictation.apply(RecognitionEvent::Final("done".into()), &mut session);

        let step = dictation.apply(RecognitionEvent::Interim("late".into()), &mut session);
        assert_eq!(step, DictationStep::Stopped);
        assert_eq!(session.draft(), "done");
    }

    #[test]
    fn recognizer_errors_map_to_notices() {
        let mut session = ChatSession::new();
        for (code, notice) in [
            ("no-speech", NO_SPEECH_NOTICE),
            ("audio-capture", AUDIO_CAPTURE_NOTICE),
            ("network", GENERIC_NOTICE),
        ] {
            let mut dictation =
                Dictation::start(SpeechCapability::Available, Language::French, &session).unwrap();
            let step = dictation.apply(RecognitionEvent::Error(code.into()), &mut session);
            assert_eq!(step, DictationStep::Failed(notice));
        }
    }

    #[test]
    fn stopping_ends_the_run() {
        let mut session = ChatSession::new();
        let mut dictation =
            Dictation::start(SpeechCapability::Available, Language::German, &session).unwrap();
        assert_eq!(dictation.language(), Language::German);
        assert!(dictation.is_listening());

        dictation.stop();
        assert!(!dictation.is_listening());
        let step = dictation.apply(RecognitionEvent::Final("too late".into()), &mut session);
        assert_eq!(step, DictationStep::Stopped);
        assert_eq!(session.draft(), "");
    }

    #[test]
    fn read_aloud_needs_a_synthesizer() {
        let answer = Turn::assistant("A claim defines the scope of protection.");
        let mut reader = ReadAloud::default();
        assert_eq!(
            reader.toggle(SpeechCapability::Unavailable, Language::EnglishUs, Some(&answer)),
            Err(SPEAK_UNSUPPORTED_NOTICE)
        );
        assert_eq!(reader.playing(), None);
    }

    #[test]
    fn read_aloud_only_reads_answers() {
        let mut reader = ReadAloud::default();
        let question = Turn::user("What is a patent claim?");
        for turn in [None, Some(&question)] {
            assert_eq!(
                reader.toggle(SpeechCapability::Available, Language::EnglishUs, turn),
                Err(NOTHING_TO_READ_NOTICE)
            );
        }
    }

    #[test]
    fn read_aloud_toggles_per_answer() {
        let first = Turn::assistant("first answer");
        let second = Turn::assistant("second answer");
        let mut reader = ReadAloud::default();

        let action = reader
            .toggle(SpeechCapability::Available, Language::French, Some(&first))
            .unwrap();
        assert_eq!(
            action,
            SpeakAction::Speak(Utterance {
                text: "first answer".into(),
                language: Language::French,
            })
        );
        assert_eq!(reader.playing(), Some(first.id.as_str()));

        let switched = reader
            .toggle(SpeechCapability::Available, Language::French, Some(&second))
            .unwrap();
        assert!(matches!(switched, SpeakAction::Speak(u) if u.text == "second answer"));

        let again = reader.toggle(SpeechCapability::Available, Language::French, Some(&second));
        assert_eq!(again, Ok(SpeakAction::Cancel));
        assert_eq!(reader.playing(), None);
    }

    #[test]
    fn finished_utterance_can_be_replayed() {
        let answer = Turn::assistant("answer");
        let mut reader = ReadAloud::default();
        reader
            .toggle(SpeechCapability::Available, Language::EnglishUs, Some(&answer))
            .unwrap();
        reader.finished();
        let replay = reader.toggle(SpeechCapability::Available, Language::EnglishUs, Some(&answer));
        assert!(matches!(replay, Ok(SpeakAction::Speak(_))));
    }

    #[test]
    fn language_tags_parse_case_insensitively() {
        assert_eq!("de-de".parse::<Language>(), Ok(Language::German));
        assert_eq!(Language::French.to_string(), "fr-FR");
        assert!("es-ES".parse::<Language>().is_err());
    }
}
