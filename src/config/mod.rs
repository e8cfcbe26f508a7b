//! Configuration management for the gesture voice classifier
//!
//! Precedence, lowest first: built-in defaults, the TOML file, environment
//! variables. The binary applies CLI flags on top.

pub mod file;

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::classifier::DEFAULT_K;
use crate::presentation::Output;
use crate::voice::{
    AdapterConfig, DEFAULT_BURST_SIZE, DEFAULT_DATASET, DEFAULT_MAX_RESTART_ATTEMPTS,
    DEFAULT_RESTART_DELAY, DEFAULT_WAKE_WORD, SessionConfig,
};
use crate::{Error, Result};

pub use file::GestureConfigFile;

/// Runtime configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Phrase that arms the session
    pub wake_word: String,

    /// Examples recorded per `record` command
    pub burst_size: usize,

    /// Pause between captures within a burst
    pub burst_interval: Duration,

    /// Neighbors consulted per classification
    pub k: usize,

    /// Dataset name used by `load` and `save`
    pub dataset_name: String,

    /// Directory holding saved datasets
    pub data_dir: PathBuf,

    /// Pause before restarting a stopped recognizer
    pub restart_delay: Duration,

    /// Consecutive failed recognizer starts before giving up
    pub max_restart_attempts: u32,

    /// Frames to replay; random frames when unset
    pub frames: Option<PathBuf>,

    /// Where reports go
    pub output: Output,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            wake_word: DEFAULT_WAKE_WORD.to_string(),
            burst_size: DEFAULT_BURST_SIZE,
            burst_interval: Duration::ZERO,
            k: DEFAULT_K,
            dataset_name: DEFAULT_DATASET.to_string(),
            data_dir: default_data_dir(),
            restart_delay: DEFAULT_RESTART_DELAY,
            max_restart_attempts: DEFAULT_MAX_RESTART_ATTEMPTS,
            frames: None,
            output: Output::default(),
        }
    }
}

/// Default dataset directory (`~/.local/share/omni/gesture` on Linux)
#[must_use]
pub fn default_data_dir() -> PathBuf {
    directories::BaseDirs::new().map_or_else(
        || PathBuf::from(".local/share/omni/gesture"),
        |d| d.data_dir().join("omni").join("gesture"),
    )
}

impl Config {
    /// Load configuration from the standard config file and the environment
    ///
    /// # Errors
    ///
    /// Returns error if the resulting configuration is invalid
    pub fn load() -> Result<Self> {
        let file = file::load_config_file();
        Self::from_sources(&file, |key| std::env::var(key).ok())
    }

    /// Build configuration from a parsed file and an environment lookup
    ///
    /// # Errors
    ///
    /// Returns error if the resulting configuration is invalid
    pub fn from_sources(
        file: &GestureConfigFile,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self> {
        let defaults = Self::default();

        let wake_word = env("GESTURE_WAKE_WORD")
            .or_else(|| file.voice.wake_word.clone())
            .unwrap_or(defaults.wake_word);

        let burst_size = env_parse(&env, "GESTURE_BURST_SIZE")
            .or(file.capture.burst_size)
            .unwrap_or(defaults.burst_size);

        let burst_interval = env_parse(&env, "GESTURE_BURST_INTERVAL_MS")
            .or(file.capture.burst_interval_ms)
            .map_or(defaults.burst_interval, Duration::from_millis);

        let frames = env("GESTURE_FRAMES")
            .map(PathBuf::from)
            .or_else(|| file.capture.frames.clone());

        let k = env_parse(&env, "GESTURE_KNN_K")
            .or(file.classifier.k)
            .unwrap_or(defaults.k);

        let dataset_name = env("GESTURE_DATASET")
            .or_else(|| file.classifier.dataset.clone())
            .unwrap_or(defaults.dataset_name);

        let data_dir = env("GESTURE_DATA_DIR")
            .map(PathBuf::from)
            .or_else(|| file.classifier.data_dir.clone())
            .unwrap_or(defaults.data_dir);

        let restart_delay = env_parse(&env, "GESTURE_RESTART_DELAY_MS")
            .or(file.recognizer.restart_delay_ms)
            .map_or(defaults.restart_delay, Duration::from_millis);

        let max_restart_attempts = env_parse(&env, "GESTURE_MAX_RESTARTS")
            .or(file.recognizer.max_restart_attempts)
            .unwrap_or(defaults.max_restart_attempts);

        let output = env_parse(&env, "GESTURE_OUTPUT")
            .or(file.output)
            .unwrap_or(defaults.output);

        let config = Self {
            wake_word,
            burst_size,
            burst_interval,
            k,
            dataset_name,
            data_dir,
            restart_delay,
            max_restart_attempts,
            frames,
            output,
        };
        config.validate()?;
        Ok(config)
    }

    /// Reject settings the session cannot run with
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] naming the offending setting
    pub fn validate(&self) -> Result<()> {
        if self.wake_word.trim().is_empty() {
            return Err(Error::Config("wake word must not be empty".to_string()));
        }
        if self.burst_size == 0 {
            return Err(Error::Config("burst size must be at least 1".to_string()));
        }
        if self.k == 0 {
            return Err(Error::Config("k must be at least 1".to_string()));
        }
        if self.dataset_name.trim().is_empty() {
            return Err(Error::Config("dataset name must not be empty".to_string()));
        }
        Ok(())
    }

    /// Session settings derived from this configuration
    #[must_use]
    pub fn session(&self) -> SessionConfig {
        SessionConfig {
            wake_word: self.wake_word.clone(),
            burst_size: self.burst_size,
            burst_interval: self.burst_interval,
            dataset_name: self.dataset_name.clone(),
        }
    }

    /// Recognizer restart policy derived from this configuration
    #[must_use]
    pub const fn adapter(&self) -> AdapterConfig {
        AdapterConfig {
            restart_delay: self.restart_delay,
            max_restart_attempts: self.max_restart_attempts,
        }
    }
}

/// Parse an environment value, ignoring (and logging) malformed ones
fn env_parse<T: FromStr>(env: &impl Fn(&str) -> Option<String>, key: &str) -> Option<T> {
    let raw = env(key)?;
    raw.trim().parse().map_or_else(
        |_| {
            tracing::warn!(key, value = %raw, "ignoring malformed environment value");
            None
        },
        Some,
    )
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn env_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_sources(&GestureConfigFile::default(), env_from(&[])).unwrap();

        assert_eq!(config.wake_word, "hey jarvis");
        assert_eq!(config.burst_size, 5);
        assert_eq!(config.k, 3);
        assert_eq!(config.dataset_name, "myKNNDataset");
        assert_eq!(config.output, Output::Console);
        assert!(config.frames.is_none());
    }

    #[test]
    fn test_env_overrides_file() {
        let file = file::parse_config_file(
            r#"
            [voice]
            wake_word = "ok gesture"

            [classifier]
            k = 5
            dataset = "fromfile"
            "#,
        )
        .unwrap();
        let env = env_from(&[("GESTURE_DATASET", "fromenv"), ("GESTURE_BURST_INTERVAL_MS", "40")]);

        let config = Config::from_sources(&file, env).unwrap();

        assert_eq!(config.wake_word, "ok gesture");
        assert_eq!(config.k, 5);
        assert_eq!(config.dataset_name, "fromenv");
        assert_eq!(config.burst_interval, Duration::from_millis(40));
    }

    #[test]
    fn test_malformed_env_value_is_ignored() {
        let env = env_from(&[("GESTURE_BURST_SIZE", "lots"), ("GESTURE_OUTPUT", "json")]);
        let config = Config::from_sources(&GestureConfigFile::default(), env).unwrap();

        assert_eq!(config.burst_size, 5);
        assert_eq!(config.output, Output::Json);
    }

    #[test]
    fn test_validation() {
        let env = env_from(&[("GESTURE_BURST_SIZE", "0")]);
        assert!(Config::from_sources(&GestureConfigFile::default(), env).is_err());

        let env = env_from(&[("GESTURE_WAKE_WORD", "   ")]);
        assert!(Config::from_sources(&GestureConfigFile::default(), env).is_err());

        let config = Config {
            k: 0,
            ..Config::default()
        };
        assert!(matches!(config.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn test_session_and_adapter_views() {
        let config = Config {
            burst_size: 7,
            max_restart_attempts: 9,
            ..Config::default()
        };

        assert_eq!(config.session().burst_size, 7);
        assert_eq!(config.adapter().max_restart_attempts, 9);
    }
}
