//! Single-axis USB force gauge.

use serde::Serialize;

use super::{DriverKind, ParseResponse, SensorDriver, SensorRecord, decode_fixed, keys};
use crate::commands;
use crate::framing::FixedWidthFramer;
use crate::types::{FieldMap, FieldValue, ParameterSpec, ParameterType, RawPacket, SensorParameter, bits};
use crate::Result;

const FRAMER: FixedWidthFramer = FixedWidthFramer::new(2);

static PARAMETERS: &[SensorParameter] = &[
    SensorParameter::config("SR", ParameterType::Integer, "Sensor sampling rate"),
    SensorParameter::config("RR", ParameterType::Integer, "Rate at which readings are processed"),
    SensorParameter::data(keys::FORCE, ParameterType::Integer, "Force reading"),
    SensorParameter::data(keys::SERIES_TIMESTAMP, ParameterType::Long, "Series timestamp"),
];

/// Unsigned 16-bit force reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ForceSample {
    pub force: u16,
    pub series_timestamp: i64,
}

impl ForceSample {
    pub fn field_map(&self) -> FieldMap {
        FieldMap::from([
            (keys::FORCE, FieldValue::Int(i32::from(self.force))),
            (keys::SERIES_TIMESTAMP, FieldValue::Long(self.series_timestamp)),
        ])
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ForceSensor;

impl SensorDriver for ForceSensor {
    fn kind(&self) -> DriverKind {
        DriverKind::Force
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
            let force = bits::u16_le(record[0], record[1]);
            tracing::trace!("force={}", force);
            SensorRecord::Force(ForceSample { force, series_timestamp })
        }))
    }
}
