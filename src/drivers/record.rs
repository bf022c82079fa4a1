//! Typed decoded records and their wire field maps

use serde::Serialize;

use super::{ForceSample, HeartRateSample, TemperatureSample};
use crate::types::{FieldMap, FieldValue};

/// Field-map keys, exactly as hosts expect them.
pub mod keys {
    pub const X_VALUE: &str = "x-value";
    pub const Y_VALUE: &str = "y-value";
    pub const Z_VALUE: &str = "z-value";
    pub const SERIES_TIMESTAMP: &str = "series-timestamp";
    pub const FORCE: &str = "force";
    pub const HEART_RATE: &str = "HR";
    pub const BEAT_COUNT: &str = "BC";
    pub const SAMPLE: &str = "SAMPLE";
    pub const RAW_HI: &str = "raw_hi";
    pub const RAW_LOW: &str = "raw_low";
    pub const SAMPLE_TIMESTAMP: &str = "SERIES_TIMESTAMP";
}

/// Three signed 12-bit axis readings sharing the packet's series timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AxisSample {
    pub x: i32,
    pub y: i32,
    pub z: i32,
    pub series_timestamp: i64,
}

impl AxisSample {
    pub fn field_map(&self) -> FieldMap {
        FieldMap::from([
            (keys::X_VALUE, FieldValue::Int(self.x)),
            (keys::Y_VALUE, FieldValue::Int(self.y)),
            (keys::Z_VALUE, FieldValue::Int(self.z)),
            (keys::SERIES_TIMESTAMP, FieldValue::Long(self.series_timestamp)),
        ])
    }
}

/// One decoded physical sample.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SensorRecord {
    Acceleration(AxisSample),
    Force(ForceSample),
    Force3Axis(AxisSample),
    HeartRate(HeartRateSample),
    Temperature(TemperatureSample),
}

impl SensorRecord {
    /// Wire-compatible key/value view of this record.
    pub fn field_map(&self) -> FieldMap {
        match self {
            SensorRecord::Acceleration(s) | SensorRecord::Force3Axis(s) => s.field_map(),
            SensorRecord::Force(s) => s.field_map(),
            SensorRecord::HeartRate(s) => s.field_map(),
            SensorRecord::Temperature(s) => s.field_map(),
        }
    }
}
