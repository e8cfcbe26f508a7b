//! Frame sources that work without a camera

use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};

use rand::Rng;

use super::{FRAME_HEIGHT, FRAME_WIDTH, Frame, FrameSource};
use crate::{Error, Result};

/// Random RGB frames
#[derive(Debug, Clone, Copy)]
pub struct NoiseFrameSource {
    width: u32,
    height: u32,
}

impl NoiseFrameSource {
    #[must_use]
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

impl Default for NoiseFrameSource {
    fn default() -> Self {
        Self::new(FRAME_WIDTH, FRAME_HEIGHT)
    }
}

impl FrameSource for NoiseFrameSource {
    fn current_frame(&self) -> Result<Frame> {
        let mut rgb = vec![0u8; self.width as usize * self.height as usize * 3];
        rand::thread_rng().fill(&mut rgb[..]);
        Frame::new(self.width, self.height, rgb)
    }
}

/// Cycles through a fixed list of frames
#[derive(Debug)]
pub struct ReplayFrameSource {
    frames: Vec<Frame>,
    cursor: AtomicUsize,
}

impl ReplayFrameSource {
    /// Replay the given frames in order, wrapping around
    ///
    /// # Errors
    ///
    /// Returns [`Error::Vision`] if `frames` is empty or a frame is malformed
    pub fn new(frames: Vec<Frame>) -> Result<Self> {
        if frames.is_empty() {
            return Err(Error::Vision("no frames to replay".to_string()));
        }
        for frame in &frames {
            frame.validate()?;
        }

        Ok(Self {
            frames,
            cursor: AtomicUsize::new(0),
        })
    }

    /// Load frames from a JSON array of `{width, height, rgb}` objects
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be read or parsed
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let frames: Vec<Frame> = serde_json::from_str(&content)?;
        tracing::debug!(path = %path.display(), frames = frames.len(), "loaded replay frames");
        Self::new(frames)
    }

    /// Number of frames in the loop
    #[must_use]
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
}

impl FrameSource for ReplayFrameSource {
    fn current_frame(&self) -> Result<Frame> {
        let index = self.cursor.fetch_add(1, Ordering::Relaxed) % self.frames.len();
        Ok(self.frames[index].clone())
    }
}
