//! Game configuration.

use derive_getters::Getters;
use derive_more::{Display, Error};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info, instrument};

/// Settings of a single game.
#[derive(Debug, Clone, Default, PartialEq, Eq, Getters, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GameConfig {
    /// Length of the prepare phase before each shift, in milliseconds.
    /// Absent or zero disables the prepare phase.
    #[serde(default)]
    prepare_delay_ms: Option<u64>,

    /// Seed for maze generation and objective draws. Absent means entropy.
    #[serde(default)]
    seed: Option<u64>,
}

impl GameConfig {
    /// Creates a configuration.
    pub fn new(prepare_delay_ms: Option<u64>, seed: Option<u64>) -> Self {
        Self {
            prepare_delay_ms,
            seed,
        }
    }

    /// Loads configuration from a TOML file.
    ///
    /// Unknown keys are rejected.
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        debug!("Reading game config");
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::new(ConfigErrorKind::Read, path, e.to_string()))?;

        let config: Self = toml::from_str(&content)
            .map_err(|e| ConfigError::new(ConfigErrorKind::Parse, path, e.to_string()))?;

        info!(prepare_delay_ms = ?config.prepare_delay_ms, seed = ?config.seed, "Game config loaded");
        Ok(config)
    }

    /// Replaces the prepare delay if `prepare_delay_ms` is given.
    pub fn override_prepare_delay_ms(mut self, prepare_delay_ms: Option<u64>) -> Self {
        if prepare_delay_ms.is_some() {
            self.prepare_delay_ms = prepare_delay_ms;
        }
        self
    }

    /// Replaces the seed if `seed` is given.
    pub fn override_seed(mut self, seed: Option<u64>) -> Self {
        if seed.is_some() {
            self.seed = seed;
        }
        self
    }

    /// The prepare delay as a duration; `None` when disabled.
    pub fn prepare_delay(&self) -> Option<Duration> {
        self.prepare_delay_ms
            .filter(|&ms| ms > 0)
            .map(Duration::from_millis)
    }
}

/// Stage at which loading a configuration file failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
pub enum ConfigErrorKind {
    /// The file could not be read.
    #[strum(serialize = "read")]
    Read,
    /// The file is not a valid game config.
    #[strum(serialize = "parse")]
    Parse,
}

/// Configuration error.
#[derive(Debug, Clone, Display, Error)]
#[display("Config {} error in {}: {} ({}:{})", kind, path, message, file, line)]
pub struct ConfigError {
    /// Stage that failed.
    pub kind: ConfigErrorKind,
    /// The offending config file.
    pub path: String,
    /// Error message.
    pub message: String,
    /// Line number where error occurred.
    pub line: u32,
    /// Source file where error occurred.
    pub file: &'static str,
}

impl ConfigError {
    /// Creates a configuration error for the given file.
    #[track_caller]
    pub fn new(kind: ConfigErrorKind, path: &Path, message: impl Into<String>) -> Self {
        let loc = std::panic::Location::caller();
        Self {
            kind,
            path: path.display().to_string(),
            message: message.into(),
            line: loc.line(),
            file: loc.file(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_delay_is_disabled() {
        assert_eq!(GameConfig::new(Some(0), None).prepare_delay(), None);
        assert_eq!(
            GameConfig::new(Some(250), None).prepare_delay(),
            Some(Duration::from_millis(250))
        );
    }

    #[test]
    fn test_overrides_only_apply_when_given() {
        let config = GameConfig::new(Some(100), Some(1))
            .override_prepare_delay_ms(None)
            .override_seed(Some(9));
        assert_eq!(*config.prepare_delay_ms(), Some(100));
        assert_eq!(*config.seed(), Some(9));
    }

    #[test]
    fn test_config_error_records_caller_and_path() {
        let err = ConfigError::new(ConfigErrorKind::Parse, Path::new("game.toml"), "bad value");
        assert_eq!(err.file, file!());
        assert_eq!(err.path, "game.toml");
        assert!(err.to_string().starts_with("Config parse error in game.toml: bad value"));
    }
}
