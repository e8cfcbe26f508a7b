//! Voice session state machine
//!
//! Two states. `Idle` waits for the wake word; `Armed` interprets the next
//! utterance as a command. Every utterance received while armed, matched or
//! not, returns the session to `Idle`.
//!
//! Recording bursts run in the background so the session can go back to
//! waiting for the wake word immediately. A burst holds the classifier lock
//! from dispatch until its last example is stored, so commands that reach the
//! classifier afterwards queue behind it in arrival order.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, OwnedMutexGuard};
use tokio::task::JoinSet;
use tracing::Instrument;
use uuid::Uuid;

use super::command::{Command, DEFAULT_WAKE_WORD, Utterance};
use crate::classifier::{Classifier, ExampleCounts, Label, Prediction};
use crate::presentation::{PresentationSink, Report};
use crate::vision::Capture;
use crate::{Error, Result};

/// Examples captured per `record <label>` command
pub const DEFAULT_BURST_SIZE: usize = 5;

/// Dataset name used by `load` and `save`
pub const DEFAULT_DATASET: &str = "myKNNDataset";

/// Status shown when the wake word arms the session
pub const WAKE_WORD_RECEIVED: &str = "Wake word received, ready to receive command...";

/// Status shown for utterances heard before the wake word
pub const WAKE_WORD_REQUIRED: &str = "Please say the wake word first";

/// Classifier shared between the session and its recording bursts
type SharedClassifier = Arc<Mutex<Box<dyn Classifier>>>;

/// Session behavior knobs
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Phrase that arms the session (normalized on use)
    pub wake_word: String,

    /// Examples captured per recording burst
    pub burst_size: usize,

    /// Pause between captures within a burst
    pub burst_interval: Duration,

    /// Dataset name for `load`/`save`
    pub dataset_name: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            wake_word: DEFAULT_WAKE_WORD.to_string(),
            burst_size: DEFAULT_BURST_SIZE,
            burst_interval: Duration::ZERO,
            dataset_name: DEFAULT_DATASET.to_string(),
        }
    }
}

/// Whether the next utterance is a command
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SessionState {
    /// Waiting for the wake word
    #[default]
    Idle,
    /// Next utterance is interpreted as a command
    Armed,
}

impl SessionState {
    #[must_use]
    pub const fn awaiting_command(self) -> bool {
        matches!(self, Self::Armed)
    }
}

/// What an utterance led to
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// Wake word heard; session armed
    Armed,
    /// Heard something other than the wake word while idle
    WakeWordRequired,
    /// Current frame classified
    Predicted(Prediction),
    /// Recording burst started in the background
    Recording { label: Label, examples: usize },
    /// One label's examples dropped
    Reset { label: Label, counts: ExampleCounts },
    /// All examples dropped
    Cleared(ExampleCounts),
    /// Dataset restored
    Loaded { name: String, counts: ExampleCounts },
    /// Dataset written
    Saved { name: String },
}

/// Wake-word gated command dispatcher
pub struct VoiceSession {
    id: Uuid,
    state: SessionState,
    wake_word: Utterance,
    config: SessionConfig,
    classifier: SharedClassifier,
    capture: Arc<Capture>,
    sink: Arc<dyn PresentationSink>,
    bursts: JoinSet<()>,
}

impl VoiceSession {
    /// Create an idle session
    #[must_use]
    pub fn new(
        config: SessionConfig,
        classifier: Box<dyn Classifier>,
        capture: Capture,
        sink: Arc<dyn PresentationSink>,
    ) -> Self {
        let id = Uuid::new_v4();
        let wake_word = Utterance::new(&config.wake_word);
        tracing::debug!(session = %id, wake_word = %wake_word, "voice session created");

        Self {
            id,
            state: SessionState::Idle,
            wake_word,
            config,
            classifier: Arc::new(Mutex::new(classifier)),
            capture: Arc::new(capture),
            sink,
            bursts: JoinSet::new(),
        }
    }

    #[must_use]
    pub const fn id(&self) -> Uuid {
        self.id
    }

    #[must_use]
    pub const fn state(&self) -> SessionState {
        self.state
    }

    /// Current example counts, after any in-flight burst
    pub async fn counts(&self) -> ExampleCounts {
        self.classifier.lock().await.counts_by_label()
    }

    /// Number of recording bursts that have not been collected yet
    #[must_use]
    pub fn pending_bursts(&self) -> usize {
        self.bursts.len()
    }

    /// Feed one utterance through the state machine
    ///
    /// Exactly one report reaches the sink per utterance; for `record` it is
    /// sent when the burst completes.
    ///
    /// # Errors
    ///
    /// Returns the error the command hit. It has already been reported and
    /// the session is back in `Idle`.
    #[tracing::instrument(skip_all, fields(session = %self.id, utterance = %utterance))]
    pub async fn handle(&mut self, utterance: &Utterance) -> Result<Outcome> {
        self.reap_bursts();

        match self.state {
            SessionState::Idle if *utterance == self.wake_word => {
                self.state = SessionState::Armed;
                tracing::info!("wake word received, ready to receive command");
                self.sink.report(&Report::message(WAKE_WORD_RECEIVED));
                Ok(Outcome::Armed)
            }
            SessionState::Idle => {
                tracing::debug!("waiting for wake word");
                self.sink.report(&Report::message(WAKE_WORD_REQUIRED));
                Ok(Outcome::WakeWordRequired)
            }
            SessionState::Armed => {
                self.state = SessionState::Idle;
                self.dispatch(Command::parse(utterance)).await
            }
        }
    }

    /// Run a command and report its outcome
    ///
    /// # Errors
    ///
    /// Returns the (already reported) error the command hit
    pub async fn dispatch(&mut self, command: Command) -> Result<Outcome> {
        tracing::info!(command = %command.title(), "executing command");

        let result = self.execute(command).await;
        match &result {
            Ok(outcome) => {
                if let Some(report) = outcome_report(outcome) {
                    self.sink.report(&report);
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "command failed");
                self.sink.report(&Report::message(e.to_string()));
            }
        }
        result
    }

    /// Wait for every in-flight recording burst to finish
    pub async fn flush(&mut self) {
        while let Some(joined) = self.bursts.join_next().await {
            if let Err(e) = joined {
                tracing::error!(error = %e, "recording burst aborted");
            }
        }
    }

    async fn execute(&mut self, command: Command) -> Result<Outcome> {
        match command {
            Command::Predict => {
                let classifier = self.classifier.lock().await;
                if classifier.counts_by_label().total() == 0 {
                    return Err(Error::NoExamples);
                }
                let features = self.capture.sample()?;
                let prediction = classifier.classify(&features)?.with_all_labels();
                Ok(Outcome::Predicted(prediction))
            }
            Command::Record(label) => {
                let guard = Arc::clone(&self.classifier).lock_owned().await;
                let burst = Burst {
                    label,
                    size: self.config.burst_size,
                    interval: self.config.burst_interval,
                    capture: Arc::clone(&self.capture),
                    sink: Arc::clone(&self.sink),
                };
                let span = tracing::info_span!("burst", session = %self.id, %label);
                self.bursts.spawn(burst.run(guard).instrument(span));
                Ok(Outcome::Recording {
                    label,
                    examples: self.config.burst_size,
                })
            }
            Command::Reset(label) => {
                let mut classifier = self.classifier.lock().await;
                classifier.clear_label(label);
                Ok(Outcome::Reset {
                    label,
                    counts: classifier.counts_by_label(),
                })
            }
            Command::ClearAll => {
                let mut classifier = self.classifier.lock().await;
                classifier.clear_all();
                Ok(Outcome::Cleared(classifier.counts_by_label()))
            }
            Command::Load => {
                let name = self.config.dataset_name.clone();
                let mut classifier = self.classifier.lock().await;
                classifier.load(&name)?;
                Ok(Outcome::Loaded {
                    name,
                    counts: classifier.counts_by_label(),
                })
            }
            Command::Save => {
                let name = self.config.dataset_name.clone();
                self.classifier.lock().await.save(&name)?;
                Ok(Outcome::Saved { name })
            }
            Command::Unknown(text) => Err(Error::UnrecognizedCommand(text)),
        }
    }

    fn reap_bursts(&mut self) {
        while let Some(joined) = self.bursts.try_join_next() {
            if let Err(e) = joined {
                tracing::error!(error = %e, "recording burst aborted");
            }
        }
    }
}

impl std::fmt::Debug for VoiceSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VoiceSession")
            .field("id", &self.id)
            .field("state", &self.state)
            .field("wake_word", &self.wake_word)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// Report for a successful command; `None` when the report comes later
fn outcome_report(outcome: &Outcome) -> Option<Report> {
    let report = match outcome {
        Outcome::Armed => Report::message(WAKE_WORD_RECEIVED),
        Outcome::WakeWordRequired => Report::message(WAKE_WORD_REQUIRED),
        Outcome::Predicted(prediction) => Report::prediction(prediction.clone()),
        Outcome::Recording { .. } => return None,
        Outcome::Reset { label, counts } => {
            Report::counts(format!("reset {label} examples"), counts.clone())
        }
        Outcome::Cleared(counts) => Report::counts("cleared all examples", counts.clone()),
        Outcome::Loaded { name, counts } => {
            Report::counts(format!("loaded dataset {name}"), counts.clone())
        }
        Outcome::Saved { name } => Report::message(format!("saved dataset {name}")),
    };
    Some(report)
}

/// Back-to-back capture of `size` examples for one label
struct Burst {
    label: Label,
    size: usize,
    interval: Duration,
    capture: Arc<Capture>,
    sink: Arc<dyn PresentationSink>,
}

impl Burst {
    async fn run(self, mut classifier: OwnedMutexGuard<Box<dyn Classifier>>) {
        let mut added = 0;
        let mut failure = None;

        for i in 0..self.size {
            if i > 0 && !self.interval.is_zero() {
                tokio::time::sleep(self.interval).await;
            }
            let stored = self
                .capture
                .sample()
                .and_then(|features| classifier.add_example(features, self.label));
            match stored {
                Ok(()) => added += 1,
                Err(e) => {
                    failure = Some(e);
                    break;
                }
            }
        }

        let counts = classifier.counts_by_label();
        drop(classifier);

        let report = match failure {
            None => {
                tracing::info!(added, counts = %counts, "recording complete");
                Report::counts(format!("recorded {added} {} examples", self.label), counts)
            }
            Some(e) => {
                tracing::warn!(added, error = %e, "recording stopped early");
                Report::counts(
                    format!("recording {} stopped after {added} examples: {e}", self.label),
                    counts,
                )
            }
        };
        self.sink.report(&report);
    }
}
