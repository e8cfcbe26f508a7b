//! Color histogram feature extraction

use super::{FeatureSource, Frame};
use crate::classifier::FeatureVector;
use crate::{Error, Result};

/// Histogram bins per color channel
pub const DEFAULT_BINS: usize = 8;

/// Normalized per-channel intensity histogram
///
/// Produces `3 * bins` components: red bins, then green, then blue. Each
/// channel's bins sum to 1.
#[derive(Debug, Clone, Copy)]
pub struct HistogramExtractor {
    bins: usize,
}

impl HistogramExtractor {
    /// Create an extractor; `bins` is clamped to `1..=256`
    #[must_use]
    pub fn new(bins: usize) -> Self {
        Self {
            bins: bins.clamp(1, 256),
        }
    }

    /// Length of the vectors this extractor produces
    #[must_use]
    pub const fn dimension(&self) -> usize {
        self.bins * 3
    }
}

impl Default for HistogramExtractor {
    fn default() -> Self {
        Self::new(DEFAULT_BINS)
    }
}

impl FeatureSource for HistogramExtractor {
    #[allow(clippy::cast_precision_loss)]
    fn extract(&self, frame: &Frame) -> Result<FeatureVector> {
        frame.validate()?;
        let pixels = frame.pixels();
        if pixels == 0 {
            return Err(Error::Vision("empty frame".to_string()));
        }

        let mut histogram = vec![0usize; self.dimension()];
        for pixel in frame.rgb.chunks_exact(3) {
            for (channel, &value) in pixel.iter().enumerate() {
                let bin = usize::from(value) * self.bins / 256;
                histogram[channel * self.bins + bin] += 1;
            }
        }

        let values = histogram
            .into_iter()
            .map(|n| n as f32 / pixels as f32)
            .collect::<Vec<_>>();
        Ok(FeatureVector::new(values))
    }
}
