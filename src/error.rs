//! Error types for sensor driver codecs and host plumbing.
//!
//! Every fallible operation in the crate returns [`DriverError`]. Variants carry
//! structured context so hosts can decide whether to retry and what to tell the
//! user.
//!
//! ## Error Categories
//!
//! - **Configure Errors**: unknown settings or absent parameters
//! - **Print Errors**: label requests with no printable content
//! - **Decode Errors**: payloads shorter than their declared sample count
//! - **Connection Errors**: transport failures and exhausted retries
//! - **Lifecycle Errors**: operations issued in the wrong connection state
//! - **Config Errors**: unreadable or invalid YAML configuration
//!
//! ## Recovery and Retry
//!
//! ```rust
//! use sensor_codecs::DriverError;
//!
//! let error = DriverError::connection_failed("sensor did not answer");
//! if error.is_retryable() {
//!     for suggestion in error.recovery_suggestions() {
//!         println!("  - {}", suggestion);
//!     }
//! }
//! ```

use std::path::PathBuf;
use thiserror::Error;

use crate::connection::ConnectionState;

/// Result type alias for driver operations.
pub type Result<T, E = DriverError> = std::result::Result<T, E>;

/// Main error type for driver operations.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum DriverError {
    #[error("Missing or unusable parameter for setting '{setting}': {reason}")]
    MissingParameter { setting: String, reason: String },

    #[error("Malformed print request: {reason}")]
    MalformedPrintRequest { reason: String },

    #[error("Payload too short: expected {expected} bytes, got {actual}")]
    ShortPayload { expected: usize, actual: usize },

    #[error("{driver} driver does not support {operation}")]
    Unsupported { driver: &'static str, operation: &'static str },

    #[error("Sensor connection failed: {reason}")]
    Connection {
        reason: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Cannot {operation} while {state}")]
    InvalidState { operation: &'static str, state: ConnectionState },

    #[error("Channel closed: {context}")]
    ChannelClosed { context: String },

    #[error("Invalid configuration: {reason}")]
    Config { reason: String },

    #[error("Config file error: {path}")]
    File {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Parse error in {context}: {details}")]
    Parse { context: String, details: String },
}

impl DriverError {
    /// Returns whether this error is potentially recoverable through retry.
    pub fn is_retryable(&self) -> bool {
        match self {
            DriverError::Connection { .. } => true,
            DriverError::ChannelClosed { .. } => false,
            DriverError::MissingParameter { .. } => false,
            DriverError::MalformedPrintRequest { .. } => false,
            DriverError::ShortPayload { .. } => false,
            DriverError::Unsupported { .. } => false,
            DriverError::InvalidState { .. } => false,
            DriverError::Config { .. } => false,
            DriverError::File { .. } => false,
            DriverError::Parse { .. } => false,
        }
    }

    /// Returns suggested recovery actions for this error.
    pub fn recovery_suggestions(&self) -> Vec<&'static str> {
        match self {
            DriverError::MissingParameter { .. } => vec![
                "Check the setting name against the driver's parameter list",
                "Supply the parameter with the declared type",
            ],
            DriverError::MalformedPrintRequest { .. } => vec![
                "Provide a barcode, a QR code or at least one text line",
                "Check that every legacy text line key is present",
            ],
            DriverError::ShortPayload { .. } => vec![
                "Verify the sample count reported by the transport",
                "Check for a truncated transfer from the device",
            ],
            DriverError::Unsupported { .. } => vec![
                "Use a driver that implements this operation",
                "Check the driver kind before issuing the call",
            ],
            DriverError::Connection { .. } => vec![
                "Ensure the sensor is powered and in range",
                "Check that the device is paired or plugged in",
                "Increase connection.max_attempts in the configuration",
            ],
            DriverError::InvalidState { .. } => vec![
                "Connect before configuring or starting a sensor",
                "Stop the sensor before starting it again",
            ],
            DriverError::ChannelClosed { .. } => vec![
                "Check that the host side of the transport is still alive",
                "Reopen the sensor session",
            ],
            DriverError::Config { .. } => vec![
                "Check configuration values are non-zero",
                "Compare against the documented defaults",
            ],
            DriverError::File { .. } => {
                vec!["Check file exists and is readable", "Check file permissions"]
            }
            DriverError::Parse { .. } => vec![
                "Check YAML syntax and field names",
                "Verify source data integrity",
            ],
        }
    }

    /// Helper constructor for configure errors.
    pub fn missing_parameter(setting: impl Into<String>, reason: impl Into<String>) -> Self {
        DriverError::MissingParameter { setting: setting.into(), reason: reason.into() }
    }

    /// Helper constructor for print request errors.
    pub fn malformed_print_request(reason: impl Into<String>) -> Self {
        DriverError::MalformedPrintRequest { reason: reason.into() }
    }

    /// Helper constructor for connection errors.
    pub fn connection_failed(reason: impl Into<String>) -> Self {
        DriverError::Connection { reason: reason.into(), source: None }
    }

    /// Helper constructor for connection errors with source.
    pub fn connection_failed_with_source(
        reason: impl Into<String>,
        source: Box<dyn std::error::Error + Send + Sync>,
    ) -> Self {
        DriverError::Connection { reason: reason.into(), source: Some(source) }
    }

    /// Helper constructor for closed channels.
    pub fn channel_closed(context: impl Into<String>) -> Self {
        DriverError::ChannelClosed { context: context.into() }
    }

    /// Helper constructor for file errors with path context.
    pub fn file_error(path: PathBuf, source: std::io::Error) -> Self {
        DriverError::File { path, source }
    }

    /// Helper constructor for configuration errors.
    pub fn config(reason: impl Into<String>) -> Self {
        DriverError::Config { reason: reason.into() }
    }
}

impl From<std::io::Error> for DriverError {
    fn from(err: std::io::Error) -> Self {
        DriverError::File { path: PathBuf::from("<unknown>"), source: err }
    }
}

impl From<serde_yaml_ng::Error> for DriverError {
    fn from(err: serde_yaml_ng::Error) -> Self {
        DriverError::Parse { context: "YAML configuration".to_string(), details: err.to_string() }
    }
}
