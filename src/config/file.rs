//! TOML configuration file loading
//!
//! Supports `~/.config/omni/gesture/config.toml` as a persistent config source.
//! All fields are optional; the file is a partial overlay on top of defaults.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::Result;
use crate::presentation::Output;

/// Top-level TOML configuration file schema
#[derive(Debug, Default, Deserialize)]
pub struct GestureConfigFile {
    /// Voice session configuration
    #[serde(default)]
    pub voice: VoiceFileConfig,

    /// Frame capture configuration
    #[serde(default)]
    pub capture: CaptureFileConfig,

    /// Classifier and dataset configuration
    #[serde(default)]
    pub classifier: ClassifierFileConfig,

    /// Recognizer restart policy
    #[serde(default)]
    pub recognizer: RecognizerFileConfig,

    /// Report output ("console", "json", "log")
    #[serde(default)]
    pub output: Option<Output>,
}

/// Voice session configuration
#[derive(Debug, Default, Deserialize)]
pub struct VoiceFileConfig {
    /// Phrase that arms the session (e.g. "hey jarvis")
    pub wake_word: Option<String>,
}

/// Frame capture configuration
#[derive(Debug, Default, Deserialize)]
pub struct CaptureFileConfig {
    /// Examples recorded per `record` command
    pub burst_size: Option<usize>,

    /// Pause between captures within a burst
    pub burst_interval_ms: Option<u64>,

    /// JSON file of frames to replay instead of random frames
    pub frames: Option<PathBuf>,
}

/// Classifier configuration
#[derive(Debug, Default, Deserialize)]
pub struct ClassifierFileConfig {
    /// Neighbors consulted per classification
    pub k: Option<usize>,

    /// Dataset name used by `load` and `save`
    pub dataset: Option<String>,

    /// Directory holding saved datasets
    pub data_dir: Option<PathBuf>,
}

/// Recognizer restart policy
#[derive(Debug, Default, Deserialize)]
pub struct RecognizerFileConfig {
    /// Pause before restarting a stopped recognizer
    pub restart_delay_ms: Option<u64>,

    /// Consecutive failed starts before giving up
    pub max_restart_attempts: Option<u32>,
}

/// Parse config file content
///
/// # Errors
///
/// Returns error if the content is not valid TOML for this schema
pub fn parse_config_file(content: &str) -> Result<GestureConfigFile> {
    Ok(toml::from_str(content)?)
}

/// Load the TOML config file from the standard path
///
/// Returns `GestureConfigFile::default()` if the file doesn't exist or can't be parsed.
pub fn load_config_file() -> GestureConfigFile {
    config_file_path().map_or_else(GestureConfigFile::default, |p| load_config_file_from(&p))
}

/// Load a TOML config file, falling back to defaults with a warning
pub fn load_config_file_from(path: &Path) -> GestureConfigFile {
    if !path.exists() {
        return GestureConfigFile::default();
    }

    match std::fs::read_to_string(path) {
        Ok(content) => match parse_config_file(&content) {
            Ok(config) => {
                tracing::info!(path = %path.display(), "loaded config file");
                config
            }
            Err(e) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %e,
                    "failed to parse config file, using defaults"
                );
                GestureConfigFile::default()
            }
        },
        Err(e) => {
            tracing::warn!(
                path = %path.display(),
                error = %e,
                "failed to read config file"
            );
            GestureConfigFile::default()
        }
    }
}

/// Return the config file path: `~/.config/omni/gesture/config.toml`
#[must_use]
pub fn config_file_path() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|d| {
        d.config_dir()
            .join("omni")
            .join("gesture")
            .join("config.toml")
    })
}
