//! Gesture classifier capability
//!
//! The voice session only sees the [`Classifier`] trait. [`KnnClassifier`]
//! is the in-process implementation used by the daemon; it persists its
//! example set as a JSON [`Dataset`].

mod dataset;
mod knn;

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

pub use dataset::{DATASET_VERSION, Dataset, DatasetStore};
pub use knn::{DEFAULT_K, KnnClassifier};

/// One of the three fixed gesture classes
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Label {
    Rock,
    Paper,
    Scissor,
}

impl Label {
    /// Every label, in display order
    pub const ALL: [Self; 3] = [Self::Rock, Self::Paper, Self::Scissor];

    /// Lower-case name as it is spoken in commands
    #[must_use]
    pub const fn spoken(self) -> &'static str {
        match self {
            Self::Rock => "rock",
            Self::Paper => "paper",
            Self::Scissor => "scissor",
        }
    }

    /// Match a normalized spoken word exactly
    #[must_use]
    pub fn from_spoken(word: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|l| l.spoken() == word)
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Rock => "Rock",
            Self::Paper => "Paper",
            Self::Scissor => "Scissor",
        };
        f.pad(name)
    }
}

impl FromStr for Label {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_spoken(&s.trim().to_lowercase())
            .ok_or_else(|| Error::Classifier(format!("unknown label: {s}")))
    }
}

/// Numeric embedding of a single video frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FeatureVector(Vec<f32>);

impl FeatureVector {
    #[must_use]
    pub const fn new(values: Vec<f32>) -> Self {
        Self(values)
    }

    /// Number of components
    #[must_use]
    pub fn dimension(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn as_slice(&self) -> &[f32] {
        &self.0
    }
}

impl From<Vec<f32>> for FeatureVector {
    fn from(values: Vec<f32>) -> Self {
        Self(values)
    }
}

/// Stored example count per label
///
/// Labels without examples read as zero.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExampleCounts(BTreeMap<Label, usize>);

impl ExampleCounts {
    /// Count for one label (zero when absent)
    #[must_use]
    pub fn get(&self, label: Label) -> usize {
        self.0.get(&label).copied().unwrap_or(0)
    }

    /// Examples across all labels
    #[must_use]
    pub fn total(&self) -> usize {
        self.0.values().sum()
    }

    /// Counts for every fixed label, zero-filled
    pub fn iter(&self) -> impl Iterator<Item = (Label, usize)> + '_ {
        Label::ALL.into_iter().map(|l| (l, self.get(l)))
    }
}

impl FromIterator<(Label, usize)> for ExampleCounts {
    fn from_iter<I: IntoIterator<Item = (Label, usize)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl fmt::Display for ExampleCounts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.iter().map(|(l, n)| format!("{l}: {n}")).collect();
        f.write_str(&parts.join(", "))
    }
}

/// Classification result: the winning label and per-label confidences
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    /// Label with the highest confidence
    pub label: Label,

    /// Confidence per label in `0.0..=1.0`
    pub confidences: BTreeMap<Label, f32>,
}

impl Prediction {
    /// Confidence for a label (zero when absent)
    #[must_use]
    pub fn confidence(&self, label: Label) -> f32 {
        self.confidences.get(&label).copied().unwrap_or(0.0)
    }

    /// Fill in zero confidence for every label the classifier left out
    #[must_use]
    pub fn with_all_labels(mut self) -> Self {
        for label in Label::ALL {
            self.confidences.entry(label).or_insert(0.0);
        }
        self
    }
}

/// Example store and classifier
///
/// Implementations own their example set. Access is serialized by the
/// caller, so methods take `&mut self` where they mutate.
#[cfg_attr(test, mockall::automock)]
pub trait Classifier: Send {
    /// Remember one example under a label
    ///
    /// # Errors
    ///
    /// Returns error if the vector does not fit the stored examples
    fn add_example(&mut self, features: FeatureVector, label: Label) -> Result<()>;

    /// Classify a feature vector against the stored examples
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoExamples`] if no example has been added
    fn classify(&self, features: &FeatureVector) -> Result<Prediction>;

    /// Number of stored examples per label
    fn counts_by_label(&self) -> ExampleCounts;

    /// Drop every example of one label
    fn clear_label(&mut self, label: Label);

    /// Drop every example
    fn clear_all(&mut self);

    /// Persist the example set under a dataset name
    ///
    /// # Errors
    ///
    /// Returns [`Error::Persistence`] if the dataset cannot be written
    fn save(&self, name: &str) -> Result<()>;

    /// Replace the example set with a persisted dataset
    ///
    /// # Errors
    ///
    /// Returns [`Error::Persistence`] if the dataset is missing or corrupt
    fn load(&mut self, name: &str) -> Result<()>;
}
