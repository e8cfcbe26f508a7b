//! Voice command handling
//!
//! The recognizer adapter turns a self-restarting speech recognizer into an
//! ordered stream of utterances; the session gates them on the wake word and
//! dispatches commands to the classifier.

mod command;
mod recognizer;
mod session;
mod stdin;

pub use command::{Command, DEFAULT_WAKE_WORD, Utterance, grammar, vocabulary};
pub use recognizer::{
    AdapterConfig, DEFAULT_MAX_RESTART_ATTEMPTS, DEFAULT_RESTART_DELAY, RecognizerAdapter,
    RecognizerBackend, RecognizerEvent, ScriptedRecognizer,
};
pub use session::{
    DEFAULT_BURST_SIZE, DEFAULT_DATASET, Outcome, SessionConfig, SessionState, VoiceSession,
    WAKE_WORD_RECEIVED, WAKE_WORD_REQUIRED,
};
pub use stdin::{LineRecognizer, StdinRecognizer};
