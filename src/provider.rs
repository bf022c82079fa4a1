//! Provider trait for sensor transports

use crate::Result;
use crate::drivers::DriverKind;
use crate::types::RawPacket;

/// Trait for sensor transports
///
/// Providers stand between the codecs and whatever actually talks to the
/// device (a USB bridge, a Bluetooth socket, a recorded session). They buffer
/// incoming packets until polled and accept outbound command bytes.
#[async_trait::async_trait]
pub trait Provider: Send + 'static {
    /// Establish the link to the device
    ///
    /// Errors from here are retried by the session up to its configured
    /// attempt limit, so transient failures should be reported as
    /// `DriverError::Connection`.
    async fn connect(&mut self) -> Result<()>;

    /// Release the link. The default does nothing.
    async fn disconnect(&mut self) -> Result<()> {
        Ok(())
    }

    /// Send command bytes to the device
    async fn send(&mut self, bytes: &[u8]) -> Result<()>;

    /// Take every packet buffered since the last call
    ///
    /// Returns:
    /// - `Ok(Some(packets))` - Packets received since the last poll, possibly none
    /// - `Ok(None)` - Source ended (normal termination)
    /// - `Err(e)` - Error occurred
    async fn poll_packets(&mut self) -> Result<Option<Vec<RawPacket>>>;

    /// Short human-readable description for logs
    fn describe(&self) -> String;

    /// The driver this source is known to carry, if it records one.
    fn driver_kind(&self) -> Option<DriverKind> {
        None
    }
}
