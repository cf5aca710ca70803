//! Configuration loading and validation.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// How aggregated records are labeled on the time axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LabelMode {
    /// Wall-clock `HH:MM:SS` at the start of each window.
    WallClock,
    /// `HH:MM:SS` elapsed since the session started.
    Elapsed,
}

/// Configuration for the sampling loop.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SamplingConfig {
    /// Samples per aggregation window.
    pub window_size: usize,
    /// Upper bound on each frame-source poll, in milliseconds.
    pub poll_timeout_ms: u64,
    /// Pause between samples, in milliseconds. Bounds the polling rate.
    pub sample_interval_ms: u64,
    /// How long `stop` waits for the sampling thread, in milliseconds.
    pub stop_grace_ms: u64,
    /// Time-axis labeling for aggregated records.
    pub label_mode: LabelMode,
}

impl Default for SamplingConfig {
    fn default() -> Self {
        Self {
            window_size: 10,
            poll_timeout_ms: 500,
            sample_interval_ms: 1000,
            stop_grace_ms: 2000,
            label_mode: LabelMode::WallClock,
        }
    }
}

impl SamplingConfig {
    /// Validates the configuration parameters.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.window_size == 0 {
            return Err(ConfigError::InvalidWindowSize);
        }
        if self.poll_timeout_ms == 0 || self.sample_interval_ms == 0 {
            return Err(ConfigError::InvalidInterval);
        }
        Ok(())
    }

    /// Per-poll timeout as a [`Duration`].
    pub fn poll_timeout(&self) -> Duration {
        Duration::from_millis(self.poll_timeout_ms)
    }

    /// Inter-sample pause as a [`Duration`].
    pub fn sample_interval(&self) -> Duration {
        Duration::from_millis(self.sample_interval_ms)
    }

    /// Shutdown grace period as a [`Duration`].
    pub fn stop_grace(&self) -> Duration {
        Duration::from_millis(self.stop_grace_ms)
    }
}

/// Configuration for report emission.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    /// Directory the chart and log files are written to.
    pub output_dir: PathBuf,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("logs"),
        }
    }
}

/// Configuration for source discovery.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    /// How long discovery waits for sources to appear, in milliseconds.
    pub discovery_timeout_ms: u64,
    /// Preferred source name; the first discovered source when unset.
    pub source_name: Option<String>,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            discovery_timeout_ms: 2000,
            source_name: None,
        }
    }
}

impl SourceConfig {
    /// Discovery timeout as a [`Duration`].
    pub fn discovery_timeout(&self) -> Duration {
        Duration::from_millis(self.discovery_timeout_ms)
    }
}

/// Full configuration file format.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct FileConfig {
    /// Source discovery settings.
    #[serde(default)]
    pub source: SourceConfig,
    /// Sampling loop settings.
    #[serde(default)]
    pub sampling: SamplingConfig,
    /// Report emission settings.
    #[serde(default)]
    pub report: ReportConfig,
}

impl FileConfig {
    /// Loads and validates configuration from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::FileReadError(e.to_string()))?;
        let config: FileConfig =
            toml::from_str(&content).map_err(|e| ConfigError::ParseError(e.to_string()))?;
        config.sampling.validate()?;
        Ok(config)
    }
}

/// Configuration validation errors.
#[derive(Debug, Clone, Error)]
pub enum ConfigError {
    /// `window_size` was zero.
    #[error("window size must be at least 1")]
    InvalidWindowSize,
    /// A timing parameter was zero.
    #[error("poll timeout and sample interval must be non-zero")]
    InvalidInterval,
    /// The config file could not be read.
    #[error("failed to read config file: {0}")]
    FileReadError(String),
    /// The config file was not valid TOML for this format.
    #[error("failed to parse config file: {0}")]
    ParseError(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config_valid() {
        assert!(SamplingConfig::default().validate().is_ok());
    }

    #[test]
    fn test_zero_window_invalid() {
        let config = SamplingConfig {
            window_size: 0,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidWindowSize)
        ));
    }

    #[test]
    fn test_zero_interval_invalid() {
        let config = SamplingConfig {
            sample_interval_ms: 0,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::InvalidInterval)));
    }

    #[test]
    fn test_from_file_partial_sections() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[sampling]\nwindow_size = 5\nsample_interval_ms = 250\n\
             poll_timeout_ms = 100\nstop_grace_ms = 500\nlabel_mode = \"elapsed\"\n"
        )
        .unwrap();

        let config = FileConfig::from_file(file.path()).unwrap();
        assert_eq!(config.sampling.window_size, 5);
        assert_eq!(config.sampling.label_mode, LabelMode::Elapsed);
        assert_eq!(config.report.output_dir, PathBuf::from("logs"));
        assert_eq!(config.source.discovery_timeout_ms, 2000);
    }

    #[test]
    fn test_from_file_rejects_invalid() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[sampling]\nwindow_size = 0\n").unwrap();
        assert!(matches!(
            FileConfig::from_file(file.path()),
            Err(ConfigError::InvalidWindowSize)
        ));
    }
}
