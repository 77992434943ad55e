//! Link configuration
//!
//! Serial parameters and protocol timing, loadable from a JSON file.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

use crate::protocol::{
    DEFAULT_BAUD_RATE, DEFAULT_KEYPRESS_GAP_MS, DEFAULT_RETRY_ATTEMPTS, DEFAULT_SETTLE_MS,
    DEFAULT_TIMEOUT_MS, MIN_KEYPRESS_GAP_MS,
};

/// Errors that can occur while loading a configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid value for '{field}': {message}")]
    Invalid { field: String, message: String },
}

/// Serial and timing parameters for one UPS
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LinkConfig {
    /// Serial device (e.g. "/dev/ttyS0" or "COM5")
    pub port_name: String,

    /// Line speed
    pub baud_rate: u32,

    /// Transport read timeout in milliseconds
    pub read_timeout_ms: u64,

    /// Wait after each transmit before draining the reply
    pub settle_delay_ms: u64,

    /// Gap between the two sends of a two-stage command
    pub keypress_gap_ms: u64,

    /// Attempts for the retrying queries
    pub retry_attempts: u32,
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            port_name: String::new(),
            baud_rate: DEFAULT_BAUD_RATE,
            read_timeout_ms: DEFAULT_TIMEOUT_MS,
            settle_delay_ms: DEFAULT_SETTLE_MS,
            keypress_gap_ms: DEFAULT_KEYPRESS_GAP_MS,
            retry_attempts: DEFAULT_RETRY_ATTEMPTS,
        }
    }
}

impl LinkConfig {
    /// Default configuration for `port_name`
    pub fn for_port(port_name: impl Into<String>) -> Self {
        Self {
            port_name: port_name.into(),
            ..Self::default()
        }
    }

    /// Parse and validate a JSON document
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: LinkConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)?;
        Self::from_json_str(&content)
    }

    /// Write as pretty-printed JSON
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    /// Reject values the UPS cannot work with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.baud_rate == 0 {
            return Err(invalid("baud_rate", "must be non-zero"));
        }
        if self.retry_attempts == 0 {
            return Err(invalid("retry_attempts", "must be at least 1"));
        }
        if self.keypress_gap_ms < MIN_KEYPRESS_GAP_MS {
            return Err(invalid(
                "keypress_gap_ms",
                &format!(
                    "{}ms is below the UPS minimum of {}ms",
                    self.keypress_gap_ms, MIN_KEYPRESS_GAP_MS
                ),
            ));
        }
        Ok(())
    }

    /// Read timeout as a duration
    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms)
    }

    /// Settle delay as a duration
    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }

    /// Keypress gap as a duration
    pub fn keypress_gap(&self) -> Duration {
        Duration::from_millis(self.keypress_gap_ms)
    }
}

fn invalid(field: &str, message: &str) -> ConfigError {
    ConfigError::Invalid {
        field: field.to_string(),
        message: message.to_string(),
    }
}
