//! Utterances and the voice command table

use std::fmt;

use crate::classifier::Label;

/// Default phrase that arms the session
pub const DEFAULT_WAKE_WORD: &str = "hey jarvis";

/// Recognized text, trimmed and lower-cased
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Utterance(String);

impl Utterance {
    /// Normalize raw recognizer text
    #[must_use]
    pub fn new(raw: &str) -> Self {
        Self(raw.trim().to_lowercase())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Utterance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A command spoken after the wake word
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Classify the current frame
    Predict,
    /// Capture a burst of examples for a label
    Record(Label),
    /// Drop every example of a label
    Reset(Label),
    /// Restore the persisted dataset
    Load,
    /// Persist the current dataset
    Save,
    /// Drop every example of every label
    ClearAll,
    /// Nothing in the table matched; holds the utterance text
    Unknown(String),
}

impl Command {
    /// Map an utterance to a command by exact phrase match
    #[must_use]
    pub fn parse(utterance: &Utterance) -> Self {
        let text = utterance.as_str();
        match text {
            "predict" => return Self::Predict,
            "load" => return Self::Load,
            "save" => return Self::Save,
            "clear" => return Self::ClearAll,
            _ => {}
        }

        if let Some(label) = text.strip_prefix("record ").and_then(Label::from_spoken) {
            return Self::Record(label);
        }
        if let Some(label) = text.strip_prefix("reset ").and_then(Label::from_spoken) {
            return Self::Reset(label);
        }

        Self::Unknown(text.to_string())
    }

    /// Every command phrase, in grammar order
    #[must_use]
    pub fn phrases() -> Vec<String> {
        let mut phrases = vec!["predict".to_string()];
        phrases.extend(Label::ALL.iter().map(|l| format!("record {}", l.spoken())));
        phrases.extend(Label::ALL.iter().map(|l| format!("reset {}", l.spoken())));
        phrases.extend(["load", "save", "clear"].map(String::from));
        phrases
    }

    /// Short upper-case name used in status lines
    #[must_use]
    pub fn title(&self) -> String {
        match self {
            Self::Predict => "PREDICT".to_string(),
            Self::Record(label) => format!("RECORD {}", label.spoken().to_uppercase()),
            Self::Reset(label) => format!("RESET {}", label.spoken().to_uppercase()),
            Self::Load => "LOAD".to_string(),
            Self::Save => "SAVE".to_string(),
            Self::ClearAll => "CLEAR ALL LABELS".to_string(),
            Self::Unknown(_) => "UNKNOWN".to_string(),
        }
    }
}

/// Recognizer vocabulary: every command phrase plus the wake word
#[must_use]
pub fn vocabulary(wake_word: &str) -> Vec<String> {
    let mut words = Command::phrases();
    let wake = Utterance::new(wake_word).0;
    if !words.contains(&wake) {
        words.push(wake);
    }
    words
}

/// JSGF grammar hint for recognizers that accept one
#[must_use]
pub fn grammar(wake_word: &str) -> String {
    format!(
        "#JSGF V1.0; grammar commands; public <command> = {} ;",
        vocabulary(wake_word).join(" | ")
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(text: &str) -> Command {
        Command::parse(&Utterance::new(text))
    }

    #[test]
    fn test_utterance_normalization() {
        assert_eq!(Utterance::new("  Hey JARVIS \n").as_str(), "hey jarvis");
    }

    #[test]
    fn test_parse_table() {
        assert_eq!(parse("predict"), Command::Predict);
        assert_eq!(parse("Record Rock"), Command::Record(Label::Rock));
        assert_eq!(parse("record paper"), Command::Record(Label::Paper));
        assert_eq!(parse("record scissor"), Command::Record(Label::Scissor));
        assert_eq!(parse("reset rock"), Command::Reset(Label::Rock));
        assert_eq!(parse("reset paper"), Command::Reset(Label::Paper));
        assert_eq!(parse("reset scissor"), Command::Reset(Label::Scissor));
        assert_eq!(parse(" LOAD "), Command::Load);
        assert_eq!(parse("save"), Command::Save);
        assert_eq!(parse("clear"), Command::ClearAll);
    }

    #[test]
    fn test_parse_requires_exact_phrase() {
        assert_eq!(parse("dance"), Command::Unknown("dance".to_string()));
        assert_eq!(parse("record"), Command::Unknown("record".to_string()));
        assert_eq!(
            parse("record rocks"),
            Command::Unknown("record rocks".to_string())
        );
        assert_eq!(
            parse("please predict"),
            Command::Unknown("please predict".to_string())
        );
        assert_eq!(parse(""), Command::Unknown(String::new()));
    }

    #[test]
    fn test_every_phrase_parses_to_known_command() {
        for phrase in Command::phrases() {
            assert!(
                !matches!(parse(&phrase), Command::Unknown(_)),
                "{phrase} should be known"
            );
        }
    }

    #[test]
    fn test_grammar_lists_wake_word_once() {
        let g = grammar("Hey Jarvis");
        assert!(g.starts_with("#JSGF V1.0; grammar commands; public <command> = predict | "));
        assert!(g.ends_with("hey jarvis ;"));
        assert_eq!(g.matches("hey jarvis").count(), 1);
        assert_eq!(vocabulary(DEFAULT_WAKE_WORD).len(), 11);
    }

    #[test]
    fn test_titles() {
        assert_eq!(Command::Record(Label::Rock).title(), "RECORD ROCK");
        assert_eq!(Command::ClearAll.title(), "CLEAR ALL LABELS");
    }
}
