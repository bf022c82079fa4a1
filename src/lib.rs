//! Byte-level codecs and host plumbing for ODK Sensors peripherals.
//!
//! The crate decodes the raw byte streams that USB and Bluetooth sensors
//! deliver into typed records, encodes the command messages those sensors
//! accept, and renders print jobs for a mobile label printer.
//!
//! # Features
//!
//! - **Codecs**: accelerometer, force, 3-axis force, temperature probe,
//!   heart-rate strap and label printer
//! - **Stream framing**: fixed-width records and PDUs split across arbitrary
//!   transport chunks
//! - **Host plumbing**: a provider abstraction, a polling task and a
//!   connection state machine built on tokio
//! - **Configuration**: YAML-loaded polling, retry and label layout settings
//!
//! # Quick Start
//!
//! Decoding without any async machinery:
//!
//! ```rust
//! use sensor_codecs::{DriverConfig, DriverInstance, DriverKind, RawPacket, SensorRecord};
//!
//! let driver = DriverKind::Force.build(&DriverConfig::default());
//! let mut instance = DriverInstance::new(driver);
//!
//! let packet = RawPacket::new(vec![0x10, 0x00, 0x20, 0x00], 2, 1_000);
//! let records = instance.process(&[packet]).unwrap();
//! assert!(matches!(records[0], SensorRecord::Force(ref s) if s.force == 16));
//! ```
//!
//! ## Example (host-fed session)
//!
//! ```rust,no_run
//! use futures::StreamExt;
//! use sensor_codecs::providers::channel_provider;
//! use sensor_codecs::{DriverConfig, DriverKind, RawPacket, Sensors};
//!
//! #[tokio::main]
//! async fn main() -> sensor_codecs::Result<()> {
//!     let (provider, host) = channel_provider("usb0", 64);
//!     let mut session = Sensors::connect(provider, DriverKind::Temperature, &DriverConfig::default()).await?;
//!     let mut records = session.start().await?;
//!
//!     host.deliver(RawPacket::new(vec![0x01, 0x91, 0, 0, 0, 0], 1, 0)).await?;
//!     if let Some(record) = records.next().await {
//!         println!("{:?}", record.field_map());
//!     }
//!     session.disconnect().await
//! }
//! ```

// Codecs and their building blocks
pub mod commands;
pub mod config;
pub mod drivers;
mod error;
pub mod framing;
mod instance;
#[cfg_attr(any(test, feature = "benchmark"), path = "test_utils.rs")]
#[cfg(any(test, feature = "benchmark"))]
pub mod test_utils;
pub mod types;

// Host-side plumbing
pub mod connection;
pub mod poller;
pub mod provider;
pub mod providers;

// Core exports
pub use config::{ConnectionConfig, DriverConfig, PollingConfig, PrinterLayout};
pub use drivers::{DriverKind, ParseResponse, PrintRequest, SensorDriver, SensorRecord};
pub use error::*;
pub use instance::DriverInstance;
pub use types::*;

// Main API exports
pub use connection::{ConnectionState, SensorSession};
pub use poller::{Poller, PollerChannels, PollerHandle};
pub use provider::Provider;
pub use providers::{ChannelProvider, ReplayProvider};

/// Unified entry point for sensor sessions.
///
/// # Examples
///
/// ## Replaying a recording
/// ```rust,no_run
/// use sensor_codecs::{DriverConfig, DriverKind, ReplayProvider, Sensors};
///
/// #[tokio::main]
/// async fn main() -> sensor_codecs::Result<()> {
///     let provider = ReplayProvider::open("session.yaml")?;
///     let _session = Sensors::connect(provider, DriverKind::Accelerometer, &DriverConfig::default()).await?;
///     // Use session...
///     Ok(())
/// }
/// ```
pub struct Sensors;

impl Sensors {
    /// Build a disconnected session for `kind` behind `provider`.
    ///
    /// # Errors
    ///
    /// Returns `DriverError::Config` if the configuration fails validation or
    /// the provider carries data for a different driver.
    pub fn open<P: Provider>(provider: P, kind: DriverKind, config: &DriverConfig) -> Result<SensorSession<P>> {
        config.validate()?;
        if let Some(recorded) = provider.driver_kind().filter(|recorded| *recorded != kind) {
            return Err(DriverError::config(format!(
                "{} carries {} data, not {}",
                provider.describe(),
                recorded,
                kind
            )));
        }
        Ok(SensorSession::new(provider, kind.build(config), config.clone()))
    }

    /// Build a session and connect it, retrying per `config.connection`.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The configuration is invalid
    /// - The provider refuses with a non-retryable error
    /// - Every connect attempt fails
    pub async fn connect<P: Provider>(
        provider: P,
        kind: DriverKind,
        config: &DriverConfig,
    ) -> Result<SensorSession<P>> {
        let mut session = Self::open(provider, kind, config)?;
        session.connect().await?;
        Ok(session)
    }
}
