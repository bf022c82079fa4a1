//! YAML configuration for driver sessions.
//!
//! Every field has a default, so an empty document is a valid configuration:
//!
//! ```rust
//! use sensor_codecs::DriverConfig;
//!
//! let config = DriverConfig::from_yaml_str("polling:\n  interval_ms: 250\n").unwrap();
//! assert_eq!(config.polling.interval_ms, 250);
//! assert_eq!(config.connection.max_attempts, 10);
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::debug;

use crate::{DriverError, Result};

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DriverConfig {
    pub polling: PollingConfig,
    pub connection: ConnectionConfig,
    pub printer: PrinterLayout,
}

/// How the background poller drains the provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PollingConfig {
    /// Delay between provider polls
    pub interval_ms: u64,
    /// Consecutive provider errors tolerated before the poller gives up
    pub max_errors: u32,
    /// Capacity of the record channel handed to the host
    pub record_buffer: usize,
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self { interval_ms: 1000, max_errors: 10, record_buffer: 256 }
    }
}

impl PollingConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }
}

/// Connection retry policy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectionConfig {
    pub max_attempts: u32,
    pub retry_delay_ms: u64,
    pub max_backoff_ms: u64,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self { max_attempts: 10, retry_delay_ms: 1000, max_backoff_ms: 8000 }
    }
}

impl ConnectionConfig {
    /// Delay before retry number `attempt` (0-based), doubling up to the cap.
    pub fn backoff(&self, attempt: u32) -> Duration {
        let factor = 1u64 << attempt.min(16);
        Duration::from_millis(self.retry_delay_ms.saturating_mul(factor).min(self.max_backoff_ms))
    }
}

/// Label geometry in printer dots.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PrinterLayout {
    /// First row y coordinate
    pub top_margin: u32,
    pub barcode_height: u32,
    pub text_line_height: u32,
    /// Dots per QR module
    pub qr_module_dpi: u32,
}

impl Default for PrinterLayout {
    fn default() -> Self {
        Self { top_margin: 5, barcode_height: 50, text_line_height: 25, qr_module_dpi: 6 }
    }
}

impl DriverConfig {
    /// Parse and validate a YAML document.
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let config: DriverConfig = if yaml.trim().is_empty() {
            DriverConfig::default()
        } else {
            serde_yaml_ng::from_str(yaml)?
        };
        config.validate()?;
        Ok(config)
    }

    /// Load, parse and validate a YAML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let yaml = std::fs::read_to_string(path)
            .map_err(|e| DriverError::file_error(path.to_path_buf(), e))?;
        debug!("Loaded driver config from {} ({} bytes)", path.display(), yaml.len());
        Self::from_yaml_str(&yaml)
    }

    pub fn to_yaml_string(&self) -> Result<String> {
        Ok(serde_yaml_ng::to_string(self)?)
    }

    /// Reject values the poller, session or encoder cannot work with.
    pub fn validate(&self) -> Result<()> {
        let checks = [
            (self.polling.interval_ms == 0, "polling.interval_ms must be positive"),
            (self.polling.max_errors == 0, "polling.max_errors must be positive"),
            (self.polling.record_buffer == 0, "polling.record_buffer must be positive"),
            (self.connection.max_attempts == 0, "connection.max_attempts must be positive"),
            (
                self.connection.max_backoff_ms < self.connection.retry_delay_ms,
                "connection.max_backoff_ms must not be below retry_delay_ms",
            ),
            (self.printer.barcode_height == 0, "printer.barcode_height must be positive"),
            (self.printer.text_line_height == 0, "printer.text_line_height must be positive"),
            (self.printer.qr_module_dpi == 0, "printer.qr_module_dpi must be positive"),
        ];

        match checks.iter().find(|(failed, _)| *failed) {
            Some((_, reason)) => Err(DriverError::config(*reason)),
            None => Ok(()),
        }
    }
}
