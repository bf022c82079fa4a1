//! USB temperature probe.
//!
//! Each sample is a 6-byte group: the probe's 16-bit scratchpad register
//! (MS byte first) followed by a little-endian `u32` sample timestamp. The
//! register holds a sign flag in bit 11 and an 11-bit magnitude in 1/16 °C.

use serde::Serialize;
use std::fmt;

use super::{DriverKind, ParseResponse, SensorDriver, SensorRecord, keys};
use crate::commands;
use crate::types::bits::{self, MAGNITUDE_MASK_11, SIGN_BIT_12};
use crate::types::{FieldMap, FieldValue, ParameterSpec, ParameterType, RawPacket, SensorParameter};
use crate::{DriverError, Result};

const GROUP_SIZE: usize = 6;

/// Degrees Celsius per magnitude step.
const RESOLUTION: f32 = 0.0625;

static PARAMETERS: &[SensorParameter] = &[
    SensorParameter::config("SR", ParameterType::Integer, "Sensor sampling rate"),
    SensorParameter::config("RR", ParameterType::Integer, "Rate at which readings are processed"),
    SensorParameter::config("AT", ParameterType::Integer, "Alarm threshold"),
    SensorParameter::data(keys::SAMPLE_TIMESTAMP, ParameterType::Long, "Sample timestamp"),
    SensorParameter::data(keys::SAMPLE, ParameterType::String, "Temperature in degrees Celsius"),
    SensorParameter::data(keys::RAW_LOW, ParameterType::Integer, "Raw scratchpad LS byte"),
    SensorParameter::data(keys::RAW_HI, ParameterType::Integer, "Raw scratchpad MS byte"),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Sign {
    Positive,
    Negative,
}

impl Sign {
    pub const fn as_char(self) -> char {
        match self {
            Sign::Positive => '+',
            Sign::Negative => '-',
        }
    }
}

/// One probe reading.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TemperatureSample {
    /// Timestamp embedded in the sample group, read as a signed 32-bit value
    pub timestamp: i32,
    pub sign: Sign,
    /// Unsigned magnitude in degrees Celsius
    pub magnitude: f32,
    pub raw_hi: u8,
    pub raw_low: u8,
}

impl TemperatureSample {
    /// Decode one register value. The sign belongs to this sample only.
    pub fn from_register(raw_hi: u8, raw_low: u8, timestamp: i32) -> Self {
        let raw = bits::u16_be(raw_hi, raw_low);
        let (sign, value) = if raw & SIGN_BIT_12 != 0 {
            (Sign::Negative, (!raw).wrapping_add(1))
        } else {
            (Sign::Positive, raw)
        };
        let magnitude = f32::from(value & MAGNITUDE_MASK_11) * RESOLUTION;
        Self { timestamp, sign, magnitude, raw_hi, raw_low }
    }

    /// Signed temperature in degrees Celsius.
    pub fn celsius(&self) -> f32 {
        match self.sign {
            Sign::Positive => self.magnitude,
            Sign::Negative => -self.magnitude,
        }
    }

    pub fn field_map(&self) -> FieldMap {
        FieldMap::from([
            (keys::SAMPLE_TIMESTAMP, FieldValue::Long(i64::from(self.timestamp))),
            (keys::SAMPLE, FieldValue::Str(self.to_string())),
            (keys::RAW_HI, FieldValue::Int(i32::from(self.raw_hi))),
            (keys::RAW_LOW, FieldValue::Int(i32::from(self.raw_low))),
        ])
    }
}

/// Sign-prefixed reading with at least one fractional digit, e.g. `+25.0`.
impl fmt::Display for TemperatureSample {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{:?}", self.sign.as_char(), self.magnitude)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TemperatureProbe;

impl TemperatureProbe {
    fn decode_packet(packet: &RawPacket, out: &mut Vec<SensorRecord>) -> Result<()> {
        let count = packet.sample_count as usize;
        let expected = count * GROUP_SIZE;
        if packet.len() < expected {
            return Err(DriverError::ShortPayload { expected, actual: packet.len() });
        }

        for group in packet.payload.chunks_exact(GROUP_SIZE).take(count) {
            let timestamp = bits::read_u32_le(group, 2)? as i32;
            let sample = TemperatureSample::from_register(group[0], group[1], timestamp);
            tracing::debug!(
                "timestamp: {} raw hi: {} lo: {} decoded: {}",
                timestamp,
                sample.raw_hi,
                sample.raw_low,
                sample
            );
            out.push(SensorRecord::Temperature(sample));
        }

        tracing::debug!("{} samples in series {}", count, packet.series_timestamp);
        Ok(())
    }
}

impl SensorDriver for TemperatureProbe {
    fn kind(&self) -> DriverKind {
        DriverKind::Temperature
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

    fn decode(&self, packets: &[RawPacket], _remainder: &[u8]) -> Result<ParseResponse> {
        let mut records = Vec::new();
        for packet in packets {
            Self::decode_packet(packet, &mut records)?;
        }
        Ok(ParseResponse { records, remainder: Vec::new() })
    }
}
