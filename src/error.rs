//! Error types for the gesture voice classifier

use thiserror::Error;

/// Result type alias for gesture voice operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while driving the voice session
///
/// None of these end a session: the state machine reports them and returns
/// to waiting for the wake word.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// Classification attempted while no label holds any example
    #[error("there are no examples in any label")]
    NoExamples,

    /// Armed utterance matched no command phrase
    #[error("unknown command: {0}")]
    UnrecognizedCommand(String),

    /// Dataset load or save failure
    #[error("dataset error: {0}")]
    Persistence(String),

    /// Recognizer hiccup (no speech, end of stream, failed restart)
    #[error("recognizer error: {0}")]
    Recognizer(String),

    /// Frame capture or feature extraction error
    #[error("vision error: {0}")]
    Vision(String),

    /// Classifier rejected an operation
    #[error("classifier error: {0}")]
    Classifier(String),

    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// TOML parsing error
    #[error("toml error: {0}")]
    Toml(#[from] toml::de::Error),
}
