//! Daemon - the voice classifier service
//!
//! Wires the recognizer adapter, the voice session, frame capture and the
//! KNN classifier together, then feeds utterances to the session until the
//! recognizer gives up or the process is interrupted.

use std::sync::Arc;

use crate::classifier::{DatasetStore, KnnClassifier};
use crate::presentation::PresentationSink;
use crate::vision::{
    Capture, FrameSource, HistogramExtractor, NoiseFrameSource, ReplayFrameSource,
};
use crate::voice::{RecognizerAdapter, RecognizerBackend, StdinRecognizer, VoiceSession, grammar};
use crate::{Config, Result};

/// The gesture daemon - owns one voice session
pub struct Daemon {
    config: Config,
    session: VoiceSession,
}

impl Daemon {
    /// Create a daemon reporting through the configured output
    ///
    /// # Errors
    ///
    /// Returns error if the configuration is invalid or the replay frames
    /// cannot be read
    pub fn new(config: Config) -> Result<Self> {
        let sink: Arc<dyn PresentationSink> = Arc::from(config.output.sink());
        Self::with_sink(config, sink)
    }

    /// Create a daemon reporting through `sink`
    ///
    /// # Errors
    ///
    /// Returns error if the configuration is invalid or the replay frames
    /// cannot be read
    pub fn with_sink(config: Config, sink: Arc<dyn PresentationSink>) -> Result<Self> {
        config.validate()?;

        let store = DatasetStore::new(config.data_dir.clone());
        let classifier = KnnClassifier::new(config.k, store);

        let frames: Box<dyn FrameSource> = match &config.frames {
            Some(path) => {
                let source = ReplayFrameSource::from_file(path)?;
                tracing::info!(path = %path.display(), frames = source.len(), "replaying frames");
                Box::new(source)
            }
            None => {
                tracing::debug!("no frames configured, using random frames");
                Box::new(NoiseFrameSource::default())
            }
        };
        let capture = Capture::new(frames, Box::new(HistogramExtractor::default()));

        let session = VoiceSession::new(config.session(), Box::new(classifier), capture, sink);
        tracing::info!(
            session = %session.id(),
            data_dir = %config.data_dir.display(),
            k = config.k,
            "daemon initialized"
        );

        Ok(Self { config, session })
    }

    /// The session driven by this daemon
    #[must_use]
    pub const fn session(&self) -> &VoiceSession {
        &self.session
    }

    /// Listen for utterances on stdin
    ///
    /// # Errors
    ///
    /// Returns error if the daemon fails fatally; command failures are
    /// reported and never end the loop
    pub async fn run(self) -> Result<()> {
        self.run_with(StdinRecognizer::stdin()).await.map(drop)
    }

    /// Drive the session from `backend` until it stops or ctrl-c arrives
    ///
    /// Returns the session so callers can inspect its final state. In-flight
    /// recording bursts are finished before returning.
    ///
    /// # Errors
    ///
    /// Returns error if the daemon fails fatally; command failures are
    /// reported and never end the loop
    pub async fn run_with<B: RecognizerBackend + 'static>(
        mut self,
        backend: B,
    ) -> Result<VoiceSession> {
        let adapter = RecognizerAdapter::new(backend, self.config.adapter())
            .with_grammar(grammar(&self.config.wake_word));
        let (mut utterances, adapter_handle) = adapter.spawn();

        tracing::info!(wake_word = %self.config.wake_word, "listening for wake word");

        loop {
            tokio::select! {
                _ = tokio::signal::ctrl_c() => {
                    tracing::info!("shutdown requested");
                    break;
                }
                next = utterances.recv() => {
                    let Some(utterance) = next else {
                        tracing::info!("recognizer stream closed");
                        break;
                    };
                    if let Err(e) = self.session.handle(&utterance).await {
                        tracing::debug!(error = %e, "command failed");
                    }
                }
            }
        }

        adapter_handle.abort();
        self.session.flush().await;
        let counts = self.session.counts().await;
        tracing::info!(%counts, "daemon stopped");

        Ok(self.session)
    }
}
