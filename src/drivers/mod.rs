//! Sensor drivers: one codec per supported peripheral.
//!
//! Every driver implements [`SensorDriver`]. Decoders are pure: the caller
//! passes in the remainder from the previous call and gets the new remainder
//! back in the [`ParseResponse`]. [`DriverInstance`](crate::DriverInstance)
//! does that bookkeeping for hosts that just want records.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::debug;

use crate::commands;
use crate::config::DriverConfig;
use crate::framing::FixedWidthFramer;
use crate::types::{ParamBundle, ParameterSpec, RawPacket};
use crate::{DriverError, Result};

mod accelerometer;
mod force;
mod force3;
mod heart_rate;
mod printer;
mod record;
mod temperature;

pub use accelerometer::Accelerometer;
pub use force::{ForceSample, ForceSensor};
pub use force3::ForceSensor3Axis;
pub use heart_rate::{HeartRateMonitor, HeartRateSample, PDU_SIZE};
pub use printer::{LabelPrinter, PrintRequest, qr_version};
pub use record::{AxisSample, SensorRecord, keys};
pub use temperature::{Sign, TemperatureProbe, TemperatureSample};

/// Records decoded from one batch of packets plus the bytes to carry forward.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ParseResponse {
    pub records: Vec<SensorRecord>,
    pub remainder: Vec<u8>,
}

/// Codec for one kind of peripheral.
pub trait SensorDriver: Send + Sync + fmt::Debug {
    fn kind(&self) -> DriverKind;

    /// Fields this driver can be configured with and reports.
    fn parameters(&self) -> ParameterSpec;

    /// Command that starts the device streaming, if it needs one.
    fn start_cmd(&self) -> Option<Vec<u8>> {
        None
    }

    /// Command that stops the device streaming, if it needs one.
    fn stop_cmd(&self) -> Option<Vec<u8>> {
        None
    }

    /// Encode a configure message for `setting`.
    fn configure(&self, setting: &str, params: &ParamBundle) -> Result<Vec<u8>> {
        commands::configure(&self.parameters(), setting, params)
    }

    /// Decode a batch of packets, starting from `remainder`.
    fn decode(&self, packets: &[RawPacket], remainder: &[u8]) -> Result<ParseResponse>;

    /// Encode a print request. Only printers support this.
    fn encode(&self, _request: &PrintRequest) -> Result<Vec<u8>> {
        Err(DriverError::Unsupported { driver: self.kind().id(), operation: "encode" })
    }
}

/// Supported peripherals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DriverKind {
    #[serde(rename = "accelerometer")]
    Accelerometer,
    #[serde(rename = "force")]
    Force,
    #[serde(rename = "force-3axis")]
    Force3Axis,
    #[serde(rename = "temperature")]
    Temperature,
    #[serde(rename = "heart-rate")]
    HeartRate,
    #[serde(rename = "label-printer")]
    LabelPrinter,
}

impl DriverKind {
    pub const ALL: [DriverKind; 6] = [
        DriverKind::Accelerometer,
        DriverKind::Force,
        DriverKind::Force3Axis,
        DriverKind::Temperature,
        DriverKind::HeartRate,
        DriverKind::LabelPrinter,
    ];

    /// Stable identifier used in configuration and logs.
    pub const fn id(self) -> &'static str {
        match self {
            DriverKind::Accelerometer => "accelerometer",
            DriverKind::Force => "force",
            DriverKind::Force3Axis => "force-3axis",
            DriverKind::Temperature => "temperature",
            DriverKind::HeartRate => "heart-rate",
            DriverKind::LabelPrinter => "label-printer",
        }
    }

    /// Instantiate the driver for this kind.
    pub fn build(self, config: &DriverConfig) -> Box<dyn SensorDriver> {
        match self {
            DriverKind::Accelerometer => Box::new(Accelerometer),
            DriverKind::Force => Box::new(ForceSensor),
            DriverKind::Force3Axis => Box::new(ForceSensor3Axis),
            DriverKind::Temperature => Box::new(TemperatureProbe),
            DriverKind::HeartRate => Box::new(HeartRateMonitor),
            DriverKind::LabelPrinter => Box::new(LabelPrinter::new(config.printer.clone())),
        }
    }
}

impl fmt::Display for DriverKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for DriverKind {
    type Err = DriverError;

    fn from_str(s: &str) -> Result<Self> {
        DriverKind::ALL.into_iter().find(|k| k.id() == s).ok_or_else(|| DriverError::Parse {
            context: "Driver kind".to_string(),
            details: format!("unknown driver '{}'", s),
        })
    }
}

/// Shared decode loop for drivers whose payload is a run of fixed-size records.
///
/// Incoming remainder bytes are ignored and none are carried forward.
fn decode_fixed<F>(
    kind: DriverKind,
    framer: FixedWidthFramer,
    packets: &[RawPacket],
    remainder: &[u8],
    mut decode_record: F,
) -> ParseResponse
where
    F: FnMut(&[u8], i64) -> SensorRecord,
{
    if !remainder.is_empty() {
        debug!("{} ignoring {} remainder bytes", kind, remainder.len());
    }

    let mut records = Vec::new();
    for packet in packets {
        debug!(
            "{}: {} bytes, {} samples declared",
            kind,
            packet.len(),
            packet.sample_count
        );
        for chunk in framer.records(&packet.payload) {
            records.push(decode_record(chunk, packet.series_timestamp));
        }
    }

    ParseResponse { records, remainder: Vec::new() }
}
