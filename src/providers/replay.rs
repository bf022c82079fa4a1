//! Replay provider for recorded sensor sessions

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::path::Path;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::time::{Duration, Interval, MissedTickBehavior, interval};
use tracing::{debug, info, trace};

use crate::drivers::DriverKind;
use crate::provider::Provider;
use crate::types::RawPacket;
use crate::{DriverError, Result};

/// One packet as stored in a recording file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordedPacket {
    pub payload: Vec<u8>,
    pub sample_count: u32,
    pub series_timestamp: i64,
}

impl From<&RawPacket> for RecordedPacket {
    fn from(packet: &RawPacket) -> Self {
        Self {
            payload: packet.payload.to_vec(),
            sample_count: packet.sample_count,
            series_timestamp: packet.series_timestamp,
        }
    }
}

impl From<RecordedPacket> for RawPacket {
    fn from(packet: RecordedPacket) -> Self {
        RawPacket::new(packet.payload, packet.sample_count, packet.series_timestamp)
    }
}

/// A captured packet sequence for one sensor, stored as YAML.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recording {
    pub driver: DriverKind,
    pub packets: Vec<RecordedPacket>,
}

impl Recording {
    pub fn parse(yaml: &str) -> Result<Self> {
        Ok(serde_yaml_ng::from_str(yaml)?)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let yaml = std::fs::read_to_string(path)
            .map_err(|e| DriverError::file_error(path.to_path_buf(), e))?;
        Self::parse(&yaml)
    }

    pub fn to_yaml_string(&self) -> Result<String> {
        Ok(serde_yaml_ng::to_string(self)?)
    }
}

/// Commands a [`ReplayProvider`] has been asked to send, shared with the caller.
#[derive(Debug, Clone, Default)]
pub struct CommandLog(Arc<Mutex<Vec<Vec<u8>>>>);

impl CommandLog {
    fn push(&self, bytes: &[u8]) {
        self.0.lock().unwrap_or_else(PoisonError::into_inner).push(bytes.to_vec());
    }

    /// Every command sent so far, oldest first.
    pub fn snapshot(&self) -> Vec<Vec<u8>> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }
}

/// Replay provider that plays back a fixed packet sequence
pub struct ReplayProvider {
    /// Packets not yet delivered
    packets: VecDeque<RawPacket>,

    /// Packets handed out per poll
    batch_size: usize,

    /// Optional pacing between polls
    pacing: Option<Duration>,
    interval: Option<Interval>,

    total: usize,
    sent: CommandLog,

    /// Driver named by the recording file
    recorded: Option<DriverKind>,
}

impl ReplayProvider {
    /// Replay `packets` one per poll, without pacing.
    pub fn new(packets: impl IntoIterator<Item = RawPacket>) -> Self {
        let packets: VecDeque<RawPacket> = packets.into_iter().collect();
        let total = packets.len();
        Self {
            packets,
            batch_size: 1,
            pacing: None,
            interval: None,
            total,
            sent: CommandLog::default(),
            recorded: None,
        }
    }

    /// Replay a recording file.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let recording = Recording::load(path.as_ref())?;
        info!(
            "Opened {} recording: {} packets",
            recording.driver,
            recording.packets.len()
        );
        let mut provider = Self::new(recording.packets.into_iter().map(RawPacket::from));
        provider.recorded = Some(recording.driver);
        Ok(provider)
    }

    /// Hand out up to `batch_size` packets per poll.
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    /// Wait at least `period` between polls.
    pub fn with_pacing(mut self, period: Duration) -> Self {
        self.pacing = Some(period);
        self.interval = None;
        debug!("Replay pacing set to {:?}", period);
        self
    }

    /// Shared view of the commands sent to this provider.
    pub fn command_log(&self) -> CommandLog {
        self.sent.clone()
    }

    pub fn remaining(&self) -> usize {
        self.packets.len()
    }

    pub fn total(&self) -> usize {
        self.total
    }
}

#[async_trait::async_trait]
impl Provider for ReplayProvider {
    async fn connect(&mut self) -> Result<()> {
        debug!("Replay connected ({} packets)", self.total);
        Ok(())
    }

    async fn send(&mut self, bytes: &[u8]) -> Result<()> {
        trace!("Replay received {} command bytes", bytes.len());
        self.sent.push(bytes);
        Ok(())
    }

    async fn poll_packets(&mut self) -> Result<Option<Vec<RawPacket>>> {
        if self.packets.is_empty() {
            debug!("Reached end of replay");
            return Ok(None);
        }

        if let Some(period) = self.pacing {
            let ticker = self.interval.get_or_insert_with(|| {
                let mut ticker = interval(period);
                ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
                ticker
            });
            ticker.tick().await;
        }

        let take = self.batch_size.min(self.packets.len());
        let batch: Vec<RawPacket> = self.packets.drain(..take).collect();
        trace!("Replay packet {}/{}", self.total - self.packets.len(), self.total);
        Ok(Some(batch))
    }

    fn describe(&self) -> String {
        format!("replay:{} packets", self.total)
    }

    fn driver_kind(&self) -> Option<DriverKind> {
        self.recorded
    }
}
