//! Three-axis USB force gauge.
//!
//! Same 6-byte record layout as the accelerometer, but the board is wired in
//! reverse: the first reading is z and the last is x.

use super::{AxisSample, DriverKind, ParseResponse, SensorDriver, SensorRecord, decode_fixed, keys};
use crate::commands;
use crate::framing::FixedWidthFramer;
use crate::types::{ParameterSpec, ParameterType, RawPacket, SensorParameter, bits};
use crate::Result;

const FRAMER: FixedWidthFramer = FixedWidthFramer::new(6);

static PARAMETERS: &[SensorParameter] = &[
    SensorParameter::config("SR", ParameterType::Integer, "Sensor sampling rate"),
    SensorParameter::config("RR", ParameterType::Integer, "Rate at which readings are processed"),
    SensorParameter::data(keys::X_VALUE, ParameterType::Integer, "Force along x"),
    SensorParameter::data(keys::Y_VALUE, ParameterType::Integer, "Force along y"),
    SensorParameter::data(keys::Z_VALUE, ParameterType::Integer, "Force along z"),
    SensorParameter::data(keys::SERIES_TIMESTAMP, ParameterType::Long, "Series timestamp"),
];

#[derive(Debug, Clone, Copy, Default)]
pub struct ForceSensor3Axis;

impl SensorDriver for ForceSensor3Axis {
    fn kind(&self) -> DriverKind {
        DriverKind::Force3Axis
    }

    fn parameters(&self) -> ParameterSpec {
        ParameterSpec::new(PARAMETERS)
    }

    fn start_cmd(&self) -> Option<Vec<u8>> {
        Some(commands::start())
    }

    fn stop_cmd(&self) -> Option<Vec<u8>> {
        Some(commands::stop())
    }

    fn decode(&self, packets: &[RawPacket], remainder: &[u8]) -> Result<ParseResponse> {
        Ok(decode_fixed(self.kind(), FRAMER, packets, remainder, |record, series_timestamp| {
            SensorRecord::Force3Axis(AxisSample {
                z: bits::twelve_bit(record[1], record[0]),
                y: bits::twelve_bit(record[3], record[2]),
                x: bits::twelve_bit(record[5], record[4]),
                series_timestamp,
            })
        }))
    }
}
