/// One line of input in the interactive chat.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplCommand {
    Blank,
    Ask(String),
    Suggestion(usize),
    Good,
    Bad(String),
    Mic,
    Speak,
    Lang(String),
    Help,
    Quit,
    Unknown(String),
}

impl ReplCommand {
    pub fn parse(line: &str) -> Self {
        let line = line.trim();
        if line.is_empty() {
            return ReplCommand::Blank;
        }
        let Some(command) = line.strip_prefix('/') else {
            return ReplCommand::Ask(line.to_string());
        };
        let (name, rest) = command
            .split_once(char::is_whitespace)
            .map(|(n, r)| (n, r.trim()))
            .unwrap_or((command, ""));

        match name {
            "good" => ReplCommand::Good,
            "bad" => ReplCommand::Bad(rest.to_string()),
            "mic" => ReplCommand::Mic,
            "speak" => ReplCommand::Speak,
            "lang" => ReplCommand::Lang(rest.to_string()),
            "help" | "?" => ReplCommand::Help,
            "quit" | "exit" => ReplCommand::Quit,
            n => match n.parse::<usize>() {
                Ok(i) if i >= 1 => ReplCommand::Suggestion(i),
                _ => ReplCommand::Unknown(name.to_string()),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_text_is_a_question() {
        assert_eq!(
            ReplCommand::parse("  What is a patent claim?  \n"),
            ReplCommand::Ask("What is a patent claim?".to_string())
        );
        assert_eq!(ReplCommand::parse("   "), ReplCommand::Blank);
    }

    #[test]
    fn slash_commands() {
        assert_eq!(ReplCommand::parse("/2"), ReplCommand::Suggestion(2));
        assert_eq!(ReplCommand::parse("/good"), ReplCommand::Good);
        assert_eq!(
            ReplCommand::parse("/bad  cite the PCT rules"),
            ReplCommand::Bad("cite the PCT rules".to_string())
        );
        assert_eq!(ReplCommand::parse("/lang de-DE"), ReplCommand::Lang("de-DE".to_string()));
        assert_eq!(ReplCommand::parse("/quit"), ReplCommand::Quit);
        assert_eq!(ReplCommand::parse("/speak"), ReplCommand::Speak);
    }

    #[test]
    fn unknown_commands_are_reported() {
        assert_eq!(ReplCommand::parse("/0"), ReplCommand::Unknown("0".to_string()));
        assert_eq!(ReplCommand::parse("/draft"), ReplCommand::Unknown("draft".to_string()));
    }
}
