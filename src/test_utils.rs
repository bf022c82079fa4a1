//! Test utilities: packet builders, a scripted provider and tracing setup
//!
//! These helpers are shared by unit tests and the criterion benches. Packet
//! builders produce the exact wire layout each driver decodes, so tests can
//! state expectations in sample values instead of raw bytes.

#![cfg(any(test, feature = "benchmark"))]

use std::collections::VecDeque;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use crate::drivers::PDU_SIZE;
use crate::provider::Provider;
use crate::types::RawPacket;
use crate::{DriverError, Result};

/// Install a fmt subscriber for tests, honouring `RUST_LOG`.
///
/// Safe to call from every test; only the first call installs anything.
pub fn init_test_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).with_test_writer().try_init();
}

/// Path to a file under the crate's `test-data/` directory.
pub fn test_data_file(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("test-data").join(name)
}

/// Force sensor packet: one little-endian `u16` per sample.
pub fn force_packet(forces: &[u16], series_timestamp: i64) -> RawPacket {
    let payload: Vec<u8> = forces.iter().flat_map(|f| f.to_le_bytes()).collect();
    RawPacket::new(payload, forces.len() as u32, series_timestamp)
}

/// Encode a signed 12-bit reading as (low byte, high byte).
pub fn twelve_bit_bytes(value: i16) -> [u8; 2] {
    let raw = (value as u16) & 0x0FFF;
    [(raw & 0xFF) as u8, (raw >> 8) as u8]
}

/// Accelerometer packet from (x, y, z) readings in the range -2048..=2047.
pub fn accelerometer_packet(samples: &[(i16, i16, i16)], series_timestamp: i64) -> RawPacket {
    let payload: Vec<u8> = samples
        .iter()
        .flat_map(|&(x, y, z)| {
            let mut record = [0u8; 6];
            record[0..2].copy_from_slice(&twelve_bit_bytes(x));
            record[2..4].copy_from_slice(&twelve_bit_bytes(y));
            record[4..6].copy_from_slice(&twelve_bit_bytes(z));
            record
        })
        .collect();
    RawPacket::new(payload, samples.len() as u32, series_timestamp)
}

/// Temperature packet from (scratchpad register, sample timestamp) pairs.
pub fn temperature_packet(samples: &[(u16, u32)], series_timestamp: i64) -> RawPacket {
    let mut payload = Vec::with_capacity(samples.len() * 6);
    for &(register, timestamp) in samples {
        payload.extend_from_slice(&register.to_be_bytes());
        payload.extend_from_slice(&timestamp.to_le_bytes());
    }
    RawPacket::new(payload, samples.len() as u32, series_timestamp)
}

/// One heart-rate PDU with the given rate and beat counter.
pub fn heart_rate_pdu(heart_rate: u8, beat_count: u8) -> Vec<u8> {
    let mut pdu = vec![0u8; PDU_SIZE];
    pdu[12] = heart_rate;
    pdu[13] = beat_count;
    pdu
}

/// Provider that fails on a script, for retry and error-budget tests.
#[derive(Debug, Default)]
pub struct ScriptedProvider {
    connect_failures: usize,
    fatal_connect: bool,
    poll_failures: usize,
    packets: VecDeque<RawPacket>,
    connects: usize,
    polls: usize,
    sent: Vec<Vec<u8>>,
}

impl ScriptedProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail the first `n` connect attempts with a retryable error.
    pub fn failing_connects(n: usize) -> Self {
        Self { connect_failures: n, ..Self::default() }
    }

    /// Fail every connect attempt with an error that must not be retried.
    pub fn fatal_connect() -> Self {
        Self { fatal_connect: true, ..Self::default() }
    }

    /// Fail the first `n` polls.
    pub fn failing_polls(n: usize) -> Self {
        Self { poll_failures: n, ..Self::default() }
    }

    /// Packets handed out one per poll once the failures are used up.
    pub fn then_packets(mut self, packets: impl IntoIterator<Item = RawPacket>) -> Self {
        self.packets.extend(packets);
        self
    }

    pub fn connects(&self) -> usize {
        self.connects
    }

    pub fn polls(&self) -> usize {
        self.polls
    }

    pub fn sent(&self) -> &[Vec<u8>] {
        &self.sent
    }
}

#[async_trait::async_trait]
impl Provider for ScriptedProvider {
    async fn connect(&mut self) -> Result<()> {
        self.connects += 1;
        if self.fatal_connect {
            return Err(DriverError::config("no such port"));
        }
        if self.connects <= self.connect_failures {
            return Err(DriverError::connection_failed(format!("attempt {} refused", self.connects)));
        }
        Ok(())
    }

    async fn send(&mut self, bytes: &[u8]) -> Result<()> {
        self.sent.push(bytes.to_vec());
        Ok(())
    }

    async fn poll_packets(&mut self) -> Result<Option<Vec<RawPacket>>> {
        self.polls += 1;
        if self.polls <= self.poll_failures {
            return Err(DriverError::connection_failed(format!("poll {} failed", self.polls)));
        }
        Ok(self.packets.pop_front().map(|packet| vec![packet]))
    }

    fn describe(&self) -> String {
        "scripted provider".to_string()
    }
}
