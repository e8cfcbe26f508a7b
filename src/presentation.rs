//! Status reporting
//!
//! The session emits one [`Report`] per utterance. Sinks decide how it is
//! shown: log lines, human-readable console output, or JSON lines.

use std::fmt::Write as _;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::classifier::{ExampleCounts, Label, Prediction};
use crate::{Error, Result};

/// Structured payload attached to a report
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum ReportData {
    /// Example counts after a dataset mutation
    Counts(ExampleCounts),
    /// Result of a classification
    Prediction(Prediction),
}

/// A single status update
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Report {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<ReportData>,
    pub at: DateTime<Utc>,
}

impl Report {
    /// Plain status message
    #[must_use]
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            data: None,
            at: Utc::now(),
        }
    }

    /// Status message with the current example counts
    #[must_use]
    pub fn counts(message: impl Into<String>, counts: ExampleCounts) -> Self {
        Self {
            data: Some(ReportData::Counts(counts)),
            ..Self::message(message)
        }
    }

    /// Classification result
    #[must_use]
    pub fn prediction(prediction: Prediction) -> Self {
        let message = format!(
            "{} with confidence of {}%",
            prediction.label,
            percent(prediction.confidence(prediction.label))
        );
        Self {
            data: Some(ReportData::Prediction(prediction)),
            ..Self::message(message)
        }
    }
}

/// Destination for status reports
pub trait PresentationSink: Send + Sync {
    /// Show a report; never fails
    fn report(&self, report: &Report);
}

/// Report through `tracing`
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

impl PresentationSink for LogSink {
    fn report(&self, report: &Report) {
        match &report.data {
            Some(ReportData::Counts(counts)) => {
                tracing::info!(counts = %counts, "{}", report.message);
            }
            Some(ReportData::Prediction(p)) => {
                tracing::info!(
                    label = %p.label,
                    rock = p.confidence(Label::Rock),
                    paper = p.confidence(Label::Paper),
                    scissor = p.confidence(Label::Scissor),
                    "{}",
                    report.message
                );
            }
            None => tracing::info!("{}", report.message),
        }
    }
}

/// Human-readable lines on stdout
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleSink;

impl PresentationSink for ConsoleSink {
    fn report(&self, report: &Report) {
        println!("{}", format_report(report));
    }
}

/// One JSON object per line on stdout
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonSink;

impl PresentationSink for JsonSink {
    fn report(&self, report: &Report) {
        match serde_json::to_string(report) {
            Ok(line) => println!("{line}"),
            Err(e) => tracing::warn!(error = %e, "failed to encode report"),
        }
    }
}

/// Render a report the way the console sink prints it
#[must_use]
pub fn format_report(report: &Report) -> String {
    let mut out = report.message.clone();
    match &report.data {
        Some(ReportData::Counts(counts)) => {
            for (label, n) in counts.iter() {
                let _ = write!(out, "\n  {label:<8} {n} examples");
            }
        }
        Some(ReportData::Prediction(p)) => {
            for label in Label::ALL {
                let _ = write!(out, "\n  {label:<8} {} %", percent(p.confidence(label)));
            }
        }
        None => {}
    }
    out
}

/// Confidence as a percentage, trimmed to at most two decimals
fn percent(confidence: f32) -> String {
    let value = format!("{:.2}", confidence * 100.0);
    value.trim_end_matches('0').trim_end_matches('.').to_string()
}

/// Which sink the daemon reports through
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Output {
    #[default]
    Console,
    Json,
    Log,
}

impl Output {
    /// Build the sink for this output mode
    #[must_use]
    pub fn sink(self) -> Box<dyn PresentationSink> {
        match self {
            Self::Console => Box::new(ConsoleSink),
            Self::Json => Box::new(JsonSink),
            Self::Log => Box::new(LogSink),
        }
    }
}

impl FromStr for Output {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "console" => Ok(Self::Console),
            "json" => Ok(Self::Json),
            "log" => Ok(Self::Log),
            other => Err(Error::Config(format!(
                "unknown output {other:?} (expected console, json or log)"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prediction_message() {
        let prediction = Prediction {
            label: Label::Rock,
            confidences: [(Label::Rock, 2.0 / 3.0), (Label::Paper, 1.0 / 3.0)]
                .into_iter()
                .collect(),
        };
        let report = Report::prediction(prediction);

        assert_eq!(report.message, "Rock with confidence of 66.67%");
        let text = format_report(&report);
        assert!(text.contains("Paper    33.33 %"));
        assert!(text.contains("Scissor  0 %"));
    }

    #[test]
    fn test_counts_lines() {
        let counts: ExampleCounts = [(Label::Rock, 5)].into_iter().collect();
        let text = format_report(&Report::counts("recorded 5 Rock examples", counts));

        assert!(text.starts_with("recorded 5 Rock examples"));
        assert!(text.contains("Rock     5 examples"));
        assert!(text.contains("Scissor  0 examples"));
    }

    #[test]
    fn test_percent_trimming() {
        assert_eq!(percent(1.0), "100");
        assert_eq!(percent(0.0), "0");
        assert_eq!(percent(0.5), "50");
    }

    #[test]
    fn test_report_json_shape() {
        let counts: ExampleCounts = [(Label::Paper, 1)].into_iter().collect();
        let json = serde_json::to_value(Report::counts("ok", counts)).unwrap();

        assert_eq!(json["message"], "ok");
        assert_eq!(json["data"]["kind"], "counts");
        assert_eq!(json["data"]["value"]["Paper"], 1);
        assert!(serde_json::to_value(Report::message("plain")).unwrap()["data"].is_null());
    }

    #[test]
    fn test_output_parsing() {
        assert_eq!("JSON".parse::<Output>().unwrap(), Output::Json);
        assert!("xml".parse::<Output>().is_err());
    }
}
