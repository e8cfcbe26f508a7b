//! K-nearest-neighbor classifier over cosine similarity

use std::collections::BTreeMap;

use super::{
    Classifier, DATASET_VERSION, Dataset, DatasetStore, ExampleCounts, FeatureVector, Label,
    Prediction,
};
use crate::{Error, Result};

/// Neighbors consulted per classification
pub const DEFAULT_K: usize = 3;

/// In-memory KNN classifier with JSON persistence
#[derive(Debug)]
pub struct KnnClassifier {
    k: usize,
    examples: BTreeMap<Label, Vec<FeatureVector>>,
    dimension: Option<usize>,
    store: DatasetStore,
}

impl KnnClassifier {
    /// Create an empty classifier that persists datasets through `store`
    ///
    /// A `k` of zero is treated as one.
    #[must_use]
    pub fn new(k: usize, store: DatasetStore) -> Self {
        Self {
            k: k.max(1),
            examples: BTreeMap::new(),
            dimension: None,
            store,
        }
    }

    fn total(&self) -> usize {
        self.examples.values().map(Vec::len).sum()
    }

    fn to_dataset(&self) -> Dataset {
        Dataset {
            version: DATASET_VERSION,
            dimension: self.dimension,
            examples: self.examples.clone(),
        }
    }
}

impl Classifier for KnnClassifier {
    fn add_example(&mut self, features: FeatureVector, label: Label) -> Result<()> {
        let dim = features.dimension();
        if dim == 0 {
            return Err(Error::Classifier("empty feature vector".to_string()));
        }
        match self.dimension {
            Some(expected) if expected != dim => {
                return Err(Error::Classifier(format!(
                    "feature dimension {dim} does not match stored examples ({expected})"
                )));
            }
            Some(_) => {}
            None => self.dimension = Some(dim),
        }

        self.examples.entry(label).or_default().push(features);
        tracing::trace!(%label, total = self.total(), "example added");
        Ok(())
    }

    #[allow(clippy::cast_precision_loss)]
    fn classify(&self, features: &FeatureVector) -> Result<Prediction> {
        if self.total() == 0 {
            return Err(Error::NoExamples);
        }
        if self.dimension != Some(features.dimension()) {
            return Err(Error::Classifier(format!(
                "feature dimension {} does not match stored examples",
                features.dimension()
            )));
        }

        let mut ranked: Vec<(f32, Label)> = self
            .examples
            .iter()
            .flat_map(|(label, vectors)| {
                vectors
                    .iter()
                    .map(move |v| (cosine_similarity(features.as_slice(), v.as_slice()), *label))
            })
            .collect();
        ranked.sort_by(|a, b| b.0.total_cmp(&a.0));

        let k = self.k.min(ranked.len());
        let nearest = &ranked[..k];

        // votes and the rank of each label's closest neighbor
        let mut votes: BTreeMap<Label, (usize, usize)> = BTreeMap::new();
        for (rank, (_, label)) in nearest.iter().enumerate() {
            votes.entry(*label).or_insert((0, rank)).0 += 1;
        }

        let label = votes
            .iter()
            .max_by(|a, b| a.1.0.cmp(&b.1.0).then(b.1.1.cmp(&a.1.1)))
            .map(|(label, _)| *label)
            .ok_or(Error::NoExamples)?;

        let confidences = votes
            .into_iter()
            .map(|(l, (n, _))| (l, n as f32 / k as f32))
            .collect();

        Ok(Prediction { label, confidences }.with_all_labels())
    }

    fn counts_by_label(&self) -> ExampleCounts {
        self.examples
            .iter()
            .map(|(label, vectors)| (*label, vectors.len()))
            .collect()
    }

    fn clear_label(&mut self, label: Label) {
        self.examples.remove(&label);
        if self.total() == 0 {
            self.dimension = None;
        }
    }

    fn clear_all(&mut self) {
        self.examples.clear();
        self.dimension = None;
    }

    fn save(&self, name: &str) -> Result<()> {
        let path = self.store.save(name, &self.to_dataset())?;
        tracing::info!(path = %path.display(), examples = self.total(), "dataset saved");
        Ok(())
    }

    fn load(&mut self, name: &str) -> Result<()> {
        let dataset = self.store.load(name)?;
        self.examples = dataset.examples;
        self.dimension = dataset.dimension;
        tracing::info!(name, examples = self.total(), "dataset loaded");
        Ok(())
    }
}

/// Cosine similarity of two equal-length vectors (0 when undefined)
#[must_use]
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }

    let mut dot = 0.0_f32;
    let mut norm_a = 0.0_f32;
    let mut norm_b = 0.0_f32;

    for (x, y) in a.iter().zip(b.iter()) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    let denom = norm_a.sqrt() * norm_b.sqrt();
    if denom == 0.0 {
        return 0.0;
    }

    dot / denom
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classifier(dir: &std::path::Path) -> KnnClassifier {
        KnnClassifier::new(DEFAULT_K, DatasetStore::new(dir))
    }

    fn v(values: &[f32]) -> FeatureVector {
        FeatureVector::new(values.to_vec())
    }

    #[test]
    fn test_classify_empty_is_no_examples() {
        let dir = tempfile::tempdir().unwrap();
        let knn = classifier(dir.path());

        assert!(matches!(knn.classify(&v(&[1.0, 0.0])), Err(Error::NoExamples)));
    }

    #[test]
    fn test_classify_majority_vote() {
        let dir = tempfile::tempdir().unwrap();
        let mut knn = classifier(dir.path());

        knn.add_example(v(&[1.0, 0.0]), Label::Rock).unwrap();
        knn.add_example(v(&[0.9, 0.1]), Label::Rock).unwrap();
        knn.add_example(v(&[0.0, 1.0]), Label::Paper).unwrap();
        knn.add_example(v(&[-1.0, 0.0]), Label::Scissor).unwrap();

        let prediction = knn.classify(&v(&[1.0, 0.05])).unwrap();
        assert_eq!(prediction.label, Label::Rock);
        assert!((prediction.confidence(Label::Rock) - 2.0 / 3.0).abs() < 1e-6);
        assert!((prediction.confidence(Label::Paper) - 1.0 / 3.0).abs() < 1e-6);
        assert!(prediction.confidence(Label::Scissor).abs() < f32::EPSILON);
    }

    #[test]
    fn test_k_capped_by_example_count() {
        let dir = tempfile::tempdir().unwrap();
        let mut knn = classifier(dir.path());

        knn.add_example(v(&[0.0, 1.0]), Label::Paper).unwrap();

        let prediction = knn.classify(&v(&[1.0, 0.0])).unwrap();
        assert_eq!(prediction.label, Label::Paper);
        assert!((prediction.confidence(Label::Paper) - 1.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_tie_goes_to_closest_neighbor() {
        let dir = tempfile::tempdir().unwrap();
        let mut knn = KnnClassifier::new(2, DatasetStore::new(dir.path()));

        knn.add_example(v(&[1.0, 0.0]), Label::Scissor).unwrap();
        knn.add_example(v(&[0.0, 1.0]), Label::Rock).unwrap();

        let prediction = knn.classify(&v(&[1.0, 0.2])).unwrap();
        assert_eq!(prediction.label, Label::Scissor);
    }

    #[test]
    fn test_dimension_mismatch_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let mut knn = classifier(dir.path());

        knn.add_example(v(&[1.0, 0.0]), Label::Rock).unwrap();
        assert!(knn.add_example(v(&[1.0, 0.0, 0.0]), Label::Rock).is_err());
        assert!(knn.add_example(v(&[]), Label::Rock).is_err());

        // Clearing everything frees the dimension again
        knn.clear_all();
        knn.add_example(v(&[1.0, 0.0, 0.0]), Label::Rock).unwrap();
    }

    #[test]
    fn test_clear_label_keeps_others() {
        let dir = tempfile::tempdir().unwrap();
        let mut knn = classifier(dir.path());

        knn.add_example(v(&[1.0, 0.0]), Label::Rock).unwrap();
        knn.add_example(v(&[0.0, 1.0]), Label::Paper).unwrap();
        knn.clear_label(Label::Paper);

        let counts = knn.counts_by_label();
        assert_eq!(counts.get(Label::Rock), 1);
        assert_eq!(counts.get(Label::Paper), 0);
    }

    #[test]
    fn test_save_and_load_restore_examples() {
        let dir = tempfile::tempdir().unwrap();
        let mut knn = classifier(dir.path());

        knn.add_example(v(&[1.0, 0.0]), Label::Rock).unwrap();
        knn.add_example(v(&[0.0, 1.0]), Label::Scissor).unwrap();
        knn.save("myKNNDataset").unwrap();

        let mut restored = classifier(dir.path());
        restored.load("myKNNDataset").unwrap();
        assert_eq!(restored.counts_by_label(), knn.counts_by_label());
        assert_eq!(
            restored.classify(&v(&[0.1, 1.0])).unwrap().label,
            Label::Scissor
        );
    }

    #[test]
    fn test_failed_load_keeps_examples() {
        let dir = tempfile::tempdir().unwrap();
        let mut knn = classifier(dir.path());

        knn.add_example(v(&[1.0, 0.0]), Label::Rock).unwrap();
        assert!(matches!(knn.load("missing"), Err(Error::Persistence(_))));
        assert_eq!(knn.counts_by_label().get(Label::Rock), 1);
    }

    #[test]
    fn test_inconsistent_dataset_does_not_lock_dimension() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("stale.json"),
            r#"{"version":1,"dimension":5,"examples":{}}"#,
        )
        .unwrap();
        let mut knn = classifier(dir.path());

        assert!(matches!(knn.load("stale"), Err(Error::Persistence(_))));
        knn.add_example(v(&[1.0, 0.0]), Label::Rock).unwrap();
        assert_eq!(knn.counts_by_label().get(Label::Rock), 1);
    }

    #[test]
    fn test_cosine_similarity() {
        assert!((cosine_similarity(&[1.0, 0.0], &[2.0, 0.0]) - 1.0).abs() < 1e-6);
        assert!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]).abs() < 1e-6);
        assert!(cosine_similarity(&[0.0, 0.0], &[1.0, 1.0]).abs() < f32::EPSILON);
        assert!(cosine_similarity(&[1.0], &[1.0, 1.0]).abs() < f32::EPSILON);
    }
}
