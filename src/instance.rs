//! Per-sensor decode state.

use std::sync::Arc;
use tracing::{debug, warn};

use crate::drivers::{SensorDriver, SensorRecord};
use crate::types::RawPacket;
use crate::Result;

/// A driver plus the bytes it carries between decode calls.
///
/// All decoding goes through `&mut self`, so two batches for the same sensor
/// can never interleave.
#[derive(Debug)]
pub struct DriverInstance {
    driver: Arc<dyn SensorDriver>,
    remainder: Vec<u8>,
}

impl DriverInstance {
    pub fn new(driver: impl Into<Arc<dyn SensorDriver>>) -> Self {
        Self { driver: driver.into(), remainder: Vec::new() }
    }

    /// Shared handle to the driver, for encoding commands alongside decoding.
    pub fn driver(&self) -> Arc<dyn SensorDriver> {
        Arc::clone(&self.driver)
    }

    /// Bytes waiting for the rest of their record.
    pub fn remainder(&self) -> &[u8] {
        &self.remainder
    }

    /// Decode a batch, replacing the stored remainder on success.
    ///
    /// On error the remainder is left as it was.
    pub fn process(&mut self, packets: &[RawPacket]) -> Result<Vec<SensorRecord>> {
        let response = match self.driver.decode(packets, &self.remainder) {
            Ok(response) => response,
            Err(e) => {
                warn!("{} decode failed: {}", self.driver.kind(), e);
                return Err(e);
            }
        };

        debug!(
            "{} decoded {} records from {} packets, {} bytes carried",
            self.driver.kind(),
            response.records.len(),
            packets.len(),
            response.remainder.len()
        );
        self.remainder = response.remainder;
        Ok(response.records)
    }

    /// Drop any carried bytes, e.g. after the device restarts its stream.
    pub fn reset(&mut self) {
        self.remainder.clear();
    }
}
