//! Channel-backed provider for hosts that own the transport.
//!
//! The host keeps a [`HostHandle`], pushes packets into it as the device
//! delivers them, and reads back the command bytes the session wants written.

use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TryRecvError;
use tracing::{debug, trace};

use crate::provider::Provider;
use crate::types::RawPacket;
use crate::{DriverError, Result};

/// Create a connected provider/handle pair.
///
/// `capacity` bounds how many packets may wait between polls.
pub fn channel_provider(name: impl Into<String>, capacity: usize) -> (ChannelProvider, HostHandle) {
    let (packet_tx, packet_rx) = mpsc::channel(capacity);
    let (command_tx, command_rx) = mpsc::unbounded_channel();
    let provider =
        ChannelProvider { name: name.into(), packets: packet_rx, commands: command_tx, ended: false };
    let handle = HostHandle { packets: packet_tx, commands: command_rx };
    (provider, handle)
}

/// Provider side of a [`channel_provider`] pair
pub struct ChannelProvider {
    name: String,
    packets: mpsc::Receiver<RawPacket>,
    commands: mpsc::UnboundedSender<Vec<u8>>,
    ended: bool,
}

/// Host side of a [`channel_provider`] pair
pub struct HostHandle {
    packets: mpsc::Sender<RawPacket>,
    commands: mpsc::UnboundedReceiver<Vec<u8>>,
}

impl HostHandle {
    /// Queue a packet, waiting if the buffer is full.
    pub async fn deliver(&self, packet: RawPacket) -> Result<()> {
        self.packets.send(packet).await.map_err(|_| DriverError::channel_closed("sensor provider"))
    }

    /// Queue a packet without waiting.
    pub fn try_deliver(&self, packet: RawPacket) -> Result<()> {
        self.packets.try_send(packet).map_err(|e| DriverError::channel_closed(e.to_string()))
    }

    /// Next command the session wants written to the device.
    pub async fn next_command(&mut self) -> Option<Vec<u8>> {
        self.commands.recv().await
    }

    /// Next command, if one is already waiting.
    pub fn try_next_command(&mut self) -> Option<Vec<u8>> {
        self.commands.try_recv().ok()
    }
}

#[async_trait::async_trait]
impl Provider for ChannelProvider {
    async fn connect(&mut self) -> Result<()> {
        if self.commands.is_closed() {
            return Err(DriverError::connection_failed(format!(
                "{}: host handle dropped",
                self.name
            )));
        }
        debug!("{} connected", self.name);
        Ok(())
    }

    async fn send(&mut self, bytes: &[u8]) -> Result<()> {
        trace!("{} send {} bytes", self.name, bytes.len());
        self.commands
            .send(bytes.to_vec())
            .map_err(|_| DriverError::channel_closed(format!("{} command receiver", self.name)))
    }

    async fn poll_packets(&mut self) -> Result<Option<Vec<RawPacket>>> {
        if self.ended {
            return Ok(None);
        }

        let mut batch = Vec::new();
        loop {
            match self.packets.try_recv() {
                Ok(packet) => batch.push(packet),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    debug!("{} host side closed", self.name);
                    self.ended = true;
                    if batch.is_empty() {
                        return Ok(None);
                    }
                    break;
                }
            }
        }

        trace!("{} polled {} packets", self.name, batch.len());
        Ok(Some(batch))
    }

    fn describe(&self) -> String {
        format!("channel:{}", self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn drains_everything_buffered() {
        let (mut provider, handle) = channel_provider("test", 8);
        provider.connect().await.unwrap();

        assert_eq!(provider.poll_packets().await.unwrap(), Some(vec![]));

        handle.deliver(RawPacket::new(vec![1u8], 1, 1)).await.unwrap();
        handle.try_deliver(RawPacket::new(vec![2u8], 1, 2)).unwrap();
        let batch = provider.poll_packets().await.unwrap().unwrap();
        assert_eq!(batch.len(), 2);
        assert_eq!(batch[1].series_timestamp, 2);
    }

    #[tokio::test]
    async fn ends_after_host_drops_and_buffer_drains() {
        let (mut provider, handle) = channel_provider("test", 8);
        handle.deliver(RawPacket::new(vec![1u8], 1, 1)).await.unwrap();
        drop(handle);

        assert_eq!(provider.poll_packets().await.unwrap().map(|b| b.len()), Some(1));
        assert_eq!(provider.poll_packets().await.unwrap(), None);
        assert!(provider.connect().await.is_err());
    }

    #[tokio::test]
    async fn commands_reach_the_host() {
        let (mut provider, mut handle) = channel_provider("test", 1);
        provider.send(&[0x01]).await.unwrap();
        assert_eq!(handle.next_command().await, Some(vec![0x01]));
        assert_eq!(handle.try_next_command(), None);
        assert_eq!(provider.describe(), "channel:test");
    }
}
