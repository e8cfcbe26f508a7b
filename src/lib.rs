//! Gesture Voice - voice-commanded rock/paper/scissor gesture classifier
//!
//! This library provides the pieces of a hands-free KNN gesture trainer:
//! - Wake-word gated voice session that dispatches spoken commands
//! - Recognizer adapter that keeps a self-stopping recognizer listening
//! - KNN classifier over frame features, with JSON dataset persistence
//! - Status reports for the console, JSON lines, or the log
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │                   Recognizer                         │
//! │        stdin  │  scripted  │  any backend            │
//! └────────────────────┬────────────────────────────────┘
//!                      │ utterances
//! ┌────────────────────▼────────────────────────────────┐
//! │                 Voice Session                        │
//! │   Idle ⇄ Armed  │  commands  │  recording bursts    │
//! └──────────┬─────────────────────────────┬────────────┘
//!            │                             │
//! ┌──────────▼──────────┐       ┌──────────▼────────────┐
//! │  Capture + KNN      │       │  Presentation sink    │
//! └─────────────────────┘       └───────────────────────┘
//! ```

pub mod classifier;
pub mod config;
pub mod daemon;
pub mod error;
pub mod presentation;
pub mod vision;
pub mod voice;

pub use classifier::{Classifier, ExampleCounts, FeatureVector, KnnClassifier, Label, Prediction};
pub use config::Config;
pub use daemon::Daemon;
pub use error::{Error, Result};
pub use presentation::{Output, PresentationSink, Report};
pub use voice::{Command, Outcome, SessionState, Utterance, VoiceSession};
