//! Shared test utilities

#![allow(dead_code)]

use std::path::Path;
use std::sync::{Arc, Mutex};

use gesture_voice::classifier::{Classifier, DatasetStore, KnnClassifier};
use gesture_voice::vision::{Capture, Frame, HistogramExtractor, ReplayFrameSource};
use gesture_voice::voice::{SessionConfig, VoiceSession};
use gesture_voice::{ExampleCounts, FeatureVector, Label, Prediction, PresentationSink, Report};

/// Calls observed by a [`SpyClassifier`]
#[derive(Debug, Default)]
pub struct CallLog {
    pub added: Vec<Label>,
    pub classified: usize,
}

/// Real KNN classifier that records which capabilities were used
pub struct SpyClassifier {
    inner: KnnClassifier,
    log: Arc<Mutex<CallLog>>,
}

impl SpyClassifier {
    pub fn new(dir: &Path) -> (Self, Arc<Mutex<CallLog>>) {
        let log = Arc::new(Mutex::new(CallLog::default()));
        let spy = Self {
            inner: KnnClassifier::new(3, DatasetStore::new(dir)),
            log: Arc::clone(&log),
        };
        (spy, log)
    }
}

impl Classifier for SpyClassifier {
    fn add_example(&mut self, features: FeatureVector, label: Label) -> gesture_voice::Result<()> {
        self.log.lock().unwrap().added.push(label);
        self.inner.add_example(features, label)
    }

    fn classify(&self, features: &FeatureVector) -> gesture_voice::Result<Prediction> {
        self.log.lock().unwrap().classified += 1;
        self.inner.classify(features)
    }

    fn counts_by_label(&self) -> ExampleCounts {
        self.inner.counts_by_label()
    }

    fn clear_label(&mut self, label: Label) {
        self.inner.clear_label(label);
    }

    fn clear_all(&mut self) {
        self.inner.clear_all();
    }

    fn save(&self, name: &str) -> gesture_voice::Result<()> {
        self.inner.save(name)
    }

    fn load(&mut self, name: &str) -> gesture_voice::Result<()> {
        self.inner.load(name)
    }
}

/// Sink that keeps every report
#[derive(Default)]
pub struct RecordingSink {
    reports: Mutex<Vec<Report>>,
}

impl RecordingSink {
    pub fn messages(&self) -> Vec<String> {
        self.reports
            .lock()
            .unwrap()
            .iter()
            .map(|r| r.message.clone())
            .collect()
    }

    pub fn last(&self) -> Option<String> {
        self.messages().pop()
    }
}

impl PresentationSink for RecordingSink {
    fn report(&self, report: &Report) {
        self.reports.lock().unwrap().push(report.clone());
    }
}

/// Capture replaying two small distinct frames
pub fn test_capture() -> Capture {
    let frames = vec![
        Frame::new(2, 1, vec![250, 10, 10, 240, 20, 20]).unwrap(),
        Frame::new(2, 1, vec![10, 250, 10, 20, 240, 20]).unwrap(),
    ];
    Capture::new(
        Box::new(ReplayFrameSource::new(frames).unwrap()),
        Box::new(HistogramExtractor::default()),
    )
}

/// Idle session over a spy classifier storing datasets in `dir`
pub fn spy_session(dir: &Path) -> (VoiceSession, Arc<Mutex<CallLog>>, Arc<RecordingSink>) {
    let (classifier, log) = SpyClassifier::new(dir);
    let sink = Arc::new(RecordingSink::default());
    let session = VoiceSession::new(
        SessionConfig::default(),
        Box::new(classifier),
        test_capture(),
        sink.clone(),
    );
    (session, log, sink)
}
