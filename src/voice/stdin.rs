//! Line-oriented recognizer backend
//!
//! Treats every input line as one final transcript. Used by the binary to
//! read utterances from stdin (pipe a speech-to-text tool into it, or type).

use async_trait::async_trait;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader, Lines, Stdin};

use super::recognizer::{RecognizerBackend, RecognizerEvent};
use crate::{Error, Result};

/// Recognizer reading one utterance per line
pub struct LineRecognizer<R> {
    lines: Lines<R>,
    listening: bool,
    exhausted: bool,
}

/// Line recognizer over the process's stdin
pub type StdinRecognizer = LineRecognizer<BufReader<Stdin>>;

impl StdinRecognizer {
    #[must_use]
    pub fn stdin() -> Self {
        Self::new(BufReader::new(tokio::io::stdin()))
    }
}

impl<R: AsyncBufRead + Unpin> LineRecognizer<R> {
    #[must_use]
    pub fn new(reader: R) -> Self {
        Self {
            lines: reader.lines(),
            listening: false,
            exhausted: false,
        }
    }
}

#[async_trait]
impl<R: AsyncBufRead + Unpin + Send> RecognizerBackend for LineRecognizer<R> {
    async fn start(&mut self) -> Result<()> {
        if self.exhausted {
            return Err(Error::Recognizer("input closed".to_string()));
        }
        self.listening = true;
        Ok(())
    }

    async fn stop(&mut self) {
        self.listening = false;
    }

    async fn next_event(&mut self) -> RecognizerEvent {
        if !self.listening {
            return RecognizerEvent::End;
        }

        match self.lines.next_line().await {
            Ok(Some(line)) if line.trim().is_empty() => RecognizerEvent::NoMatch,
            Ok(Some(line)) => RecognizerEvent::Transcript(line),
            Ok(None) => {
                self.exhausted = true;
                self.listening = false;
                RecognizerEvent::End
            }
            Err(e) => RecognizerEvent::Error(e.to_string()),
        }
    }
}
