//! Frame capture and feature extraction
//!
//! The session samples the "current frame" through a [`FrameSource`] and turns
//! it into a [`FeatureVector`] with a [`FeatureSource`]. [`Capture`] pairs the
//! two so one call performs both steps.

mod extractor;
mod frames;

use serde::{Deserialize, Serialize};

use crate::classifier::FeatureVector;
use crate::{Error, Result};

pub use extractor::{DEFAULT_BINS, HistogramExtractor};
pub use frames::{NoiseFrameSource, ReplayFrameSource};

/// Width of generated frames
pub const FRAME_WIDTH: u32 = 340;

/// Height of generated frames
pub const FRAME_HEIGHT: u32 = 240;

/// A single RGB video frame, row-major, 3 bytes per pixel
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Frame {
    pub width: u32,
    pub height: u32,
    pub rgb: Vec<u8>,
}

impl Frame {
    /// Build a frame, checking the buffer length against the dimensions
    ///
    /// # Errors
    ///
    /// Returns [`Error::Vision`] if `rgb` is not `width * height * 3` bytes
    pub fn new(width: u32, height: u32, rgb: Vec<u8>) -> Result<Self> {
        let frame = Self { width, height, rgb };
        frame.validate()?;
        Ok(frame)
    }

    /// Number of pixels
    #[must_use]
    pub fn pixels(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// Check the buffer length against the dimensions
    ///
    /// # Errors
    ///
    /// Returns [`Error::Vision`] on a size mismatch
    pub fn validate(&self) -> Result<()> {
        let expected = self.pixels() * 3;
        if self.rgb.len() == expected {
            Ok(())
        } else {
            Err(Error::Vision(format!(
                "{}x{} frame needs {expected} bytes, got {}",
                self.width,
                self.height,
                self.rgb.len()
            )))
        }
    }
}

/// Source of the current video frame
pub trait FrameSource: Send + Sync {
    /// Grab the frame being shown right now
    ///
    /// # Errors
    ///
    /// Returns [`Error::Vision`] if no frame is available
    fn current_frame(&self) -> Result<Frame>;
}

/// Turns a frame into a feature vector
pub trait FeatureSource: Send + Sync {
    /// Extract features from a frame; deterministic for a given frame
    ///
    /// # Errors
    ///
    /// Returns [`Error::Vision`] if the frame cannot be processed
    fn extract(&self, frame: &Frame) -> Result<FeatureVector>;
}

/// Frame source plus feature extractor
pub struct Capture {
    frames: Box<dyn FrameSource>,
    features: Box<dyn FeatureSource>,
}

impl Capture {
    #[must_use]
    pub fn new(frames: Box<dyn FrameSource>, features: Box<dyn FeatureSource>) -> Self {
        Self { frames, features }
    }

    /// Sample the current frame and extract its features
    ///
    /// # Errors
    ///
    /// Returns error if capture or extraction fails
    pub fn sample(&self) -> Result<FeatureVector> {
        let frame = self.frames.current_frame()?;
        self.features.extract(&frame)
    }
}

impl std::fmt::Debug for Capture {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Capture").finish_non_exhaustive()
    }
}
