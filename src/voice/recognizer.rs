//! Speech recognizer lifecycle
//!
//! Recognizers stop on their own: after a stretch of silence, on a
//! transient error, or when their input ends. [`RecognizerAdapter`] hides
//! that behind a single ordered stream of [`Utterance`]s by restarting the
//! backend whenever it stops. The session on the other side of the channel
//! never sees a restart, so its state survives them.

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use super::command::Utterance;
use crate::{Error, Result};

/// Default pause before restarting a stopped recognizer
pub const DEFAULT_RESTART_DELAY: Duration = Duration::from_millis(250);

/// Default number of consecutive failed starts before giving up
pub const DEFAULT_MAX_RESTART_ATTEMPTS: u32 = 5;

/// Something the recognizer backend observed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecognizerEvent {
    /// Final transcript of one utterance
    Transcript(String),
    /// Speech heard but nothing recognized
    NoMatch,
    /// Transient failure (no speech, audio glitch); the backend needs a restart
    Error(String),
    /// The backend stopped listening
    End,
}

/// A continuous speech recognizer
#[async_trait]
pub trait RecognizerBackend: Send {
    /// Hand the backend a grammar hint before the first start
    fn set_grammar(&mut self, grammar: &str) {
        let _ = grammar;
    }

    /// Begin (or resume) listening
    ///
    /// # Errors
    ///
    /// Returns [`Error::Recognizer`] if the backend cannot listen
    async fn start(&mut self) -> Result<()>;

    /// Stop listening; the next event after a stop is [`RecognizerEvent::End`]
    async fn stop(&mut self);

    /// Wait for the next event
    async fn next_event(&mut self) -> RecognizerEvent;
}

/// Restart policy
#[derive(Debug, Clone, Copy)]
pub struct AdapterConfig {
    /// Pause before each restart
    pub restart_delay: Duration,

    /// Consecutive failed starts tolerated before the stream closes
    pub max_restart_attempts: u32,
}

impl Default for AdapterConfig {
    fn default() -> Self {
        Self {
            restart_delay: DEFAULT_RESTART_DELAY,
            max_restart_attempts: DEFAULT_MAX_RESTART_ATTEMPTS,
        }
    }
}

/// Turns a self-stopping recognizer into a continuous utterance stream
pub struct RecognizerAdapter<B> {
    backend: B,
    config: AdapterConfig,
    grammar: Option<String>,
}

impl<B: RecognizerBackend + 'static> RecognizerAdapter<B> {
    #[must_use]
    pub const fn new(backend: B, config: AdapterConfig) -> Self {
        Self {
            backend,
            config,
            grammar: None,
        }
    }

    /// Grammar hint passed to the backend before it starts
    #[must_use]
    pub fn with_grammar(mut self, grammar: impl Into<String>) -> Self {
        self.grammar = Some(grammar.into());
        self
    }

    /// Run the adapter on its own task
    ///
    /// The receiver yields utterances in recognition order and closes when
    /// the backend can no longer be restarted.
    #[must_use]
    pub fn spawn(self) -> (mpsc::UnboundedReceiver<Utterance>, JoinHandle<()>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let handle = tokio::spawn(self.run(tx));
        (rx, handle)
    }

    /// Forward utterances until the backend gives up or the receiver is dropped
    pub async fn run(mut self, tx: mpsc::UnboundedSender<Utterance>) {
        if let Some(grammar) = self.grammar.take() {
            self.backend.set_grammar(&grammar);
        }

        if !self.start_with_retries(false).await {
            return;
        }
        tracing::info!("recognizer listening");

        loop {
            match self.backend.next_event().await {
                RecognizerEvent::Transcript(text) => {
                    let utterance = Utterance::new(&text);
                    tracing::debug!(utterance = %utterance, "recognized");
                    if tx.send(utterance).is_err() {
                        tracing::debug!("utterance receiver dropped");
                        self.backend.stop().await;
                        return;
                    }
                }
                RecognizerEvent::NoMatch => {
                    tracing::debug!("no match, try again");
                }
                RecognizerEvent::Error(message) => {
                    tracing::warn!(error = %message, "recognizer error, restarting");
                    self.backend.stop().await;
                    if !self.start_with_retries(true).await {
                        return;
                    }
                }
                RecognizerEvent::End => {
                    tracing::info!("recognizer ended, restarting");
                    if !self.start_with_retries(true).await {
                        return;
                    }
                }
            }

            if tx.is_closed() {
                self.backend.stop().await;
                return;
            }
        }
    }

    async fn start_with_retries(&mut self, restart: bool) -> bool {
        let attempts = self.config.max_restart_attempts.max(1);

        for attempt in 1..=attempts {
            if restart || attempt > 1 {
                tokio::time::sleep(self.config.restart_delay).await;
            }
            match self.backend.start().await {
                Ok(()) => return true,
                Err(e) => {
                    tracing::warn!(attempt, max = attempts, error = %e, "recognizer failed to start");
                }
            }
        }

        tracing::error!(attempts, "giving up on recognizer");
        false
    }
}

/// Backend that replays a fixed list of events
///
/// Once the script is exhausted it reports [`RecognizerEvent::End`] and
/// refuses to start again, which closes the adapter's stream.
#[derive(Debug, Default)]
pub struct ScriptedRecognizer {
    events: VecDeque<RecognizerEvent>,
    listening: bool,
    starts: Arc<AtomicUsize>,
}

impl ScriptedRecognizer {
    #[must_use]
    pub fn new(events: impl IntoIterator<Item = RecognizerEvent>) -> Self {
        Self {
            events: events.into_iter().collect(),
            ..Self::default()
        }
    }

    /// Script of plain transcripts
    #[must_use]
    pub fn transcripts<S: AsRef<str>>(lines: impl IntoIterator<Item = S>) -> Self {
        Self::new(
            lines
                .into_iter()
                .map(|l| RecognizerEvent::Transcript(l.as_ref().to_string())),
        )
    }

    /// Shared counter of successful starts
    #[must_use]
    pub fn start_counter(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.starts)
    }
}

#[async_trait]
impl RecognizerBackend for ScriptedRecognizer {
    async fn start(&mut self) -> Result<()> {
        if self.events.is_empty() {
            return Err(Error::Recognizer("script exhausted".to_string()));
        }
        self.listening = true;
        self.starts.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn stop(&mut self) {
        self.listening = false;
    }

    async fn next_event(&mut self) -> RecognizerEvent {
        if !self.listening {
            return RecognizerEvent::End;
        }
        let event = self.events.pop_front().unwrap_or(RecognizerEvent::End);
        if event == RecognizerEvent::End {
            self.listening = false;
        }
        event
    }
}
