//! Three-axis USB accelerometer.
//!
//! Each 6-byte record holds three 12-bit two's-complement readings, low byte
//! first, in x, y, z order.

use super::{AxisSample, DriverKind, ParseResponse, SensorDriver, SensorRecord, decode_fixed, keys};
use crate::commands;
use crate::framing::FixedWidthFramer;
use crate::types::{ParameterSpec, ParameterType, RawPacket, SensorParameter, bits};
use crate::Result;

const FRAMER: FixedWidthFramer = FixedWidthFramer::new(6);

static PARAMETERS: &[SensorParameter] = &[
    SensorParameter::config("SR", ParameterType::Integer, "Sensor sampling rate"),
    SensorParameter::config("RR", ParameterType::Integer, "Rate at which readings are processed"),
    SensorParameter::action("TX", "Tare the x axis"),
    SensorParameter::action("TY", "Tare the y axis"),
    SensorParameter::action("TZ", "Tare the z axis"),
    SensorParameter::config("OX", ParameterType::Byte, "Offset of the x axis"),
    SensorParameter::config("OY", ParameterType::Byte, "Offset of the y axis"),
    SensorParameter::config("OZ", ParameterType::Byte, "Offset of the z axis"),
    SensorParameter::config("RA", ParameterType::Byte, "Measurement range"),
    SensorParameter::data(keys::X_VALUE, ParameterType::Integer, "Acceleration along x"),
    SensorParameter::data(keys::Y_VALUE, ParameterType::Integer, "Acceleration along y"),
    SensorParameter::data(keys::Z_VALUE, ParameterType::Integer, "Acceleration along z"),
    SensorParameter::data(keys::SERIES_TIMESTAMP, ParameterType::Long, "Series timestamp"),
];

#[derive(Debug, Clone, Copy, Default)]
pub struct Accelerometer;

impl Accelerometer {
    fn decode_record(record: &[u8], series_timestamp: i64) -> SensorRecord {
        let sample = AxisSample {
            x: bits::twelve_bit(record[1], record[0]),
            y: bits::twelve_bit(record[3], record[2]),
            z: bits::twelve_bit(record[5], record[4]),
            series_timestamp,
        };
        tracing::trace!("accel x={} y={} z={}", sample.x, sample.y, sample.z);
        SensorRecord::Acceleration(sample)
    }
}

impl SensorDriver for Accelerometer {
    fn kind(&self) -> DriverKind {
        DriverKind::Accelerometer
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
        Ok(decode_fixed(self.kind(), FRAMER, packets, remainder, Self::decode_record))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DriverError;
    use crate::types::{FieldValue, ParamBundle, ParamValue};
    use proptest::prelude::*;

    fn axes(record: &SensorRecord) -> (i32, i32, i32, i64) {
        match record {
            SensorRecord::Acceleration(s) => (s.x, s.y, s.z, s.series_timestamp),
            other => panic!("unexpected record {other:?}"),
        }
    }

    #[test]
    fn decodes_axes_in_xyz_order() {
        let payload = vec![0x00, 0x08, 0xFF, 0x07, 0x01, 0x00];
        let packet = RawPacket::new(payload, 1, 42);
        let response = Accelerometer.decode(&[packet], &[]).unwrap();
        assert_eq!(response.records.len(), 1);
        assert_eq!(axes(&response.records[0]), (-2048, 2047, 1, 42));
        assert!(response.remainder.is_empty());
    }

    #[test]
    fn field_map_uses_wire_keys() {
        let packet = RawPacket::new(vec![0xFF, 0x0F, 0, 0, 0, 0], 1, 7);
        let response = Accelerometer.decode(&[packet], &[]).unwrap();
        let map = response.records[0].field_map();
        assert_eq!(map.get("x-value"), Some(&FieldValue::Int(-1)));
        assert_eq!(map.get("y-value"), Some(&FieldValue::Int(0)));
        assert_eq!(map.get("series-timestamp"), Some(&FieldValue::Long(7)));
        assert_eq!(map.len(), 4);
    }

    #[test]
    fn trailing_partial_record_is_dropped() {
        let packet = RawPacket::new(vec![0u8; 10], 2, 0);
        let response = Accelerometer.decode(&[packet], &[]).unwrap();
        assert_eq!(response.records.len(), 1);
        assert!(response.remainder.is_empty());
    }

    #[test]
    fn configure_covers_every_setting_kind() {
        let params = ParamBundle::new()
            .with("SR", ParamValue::Int(50))
            .with("RA", ParamValue::Byte(2));
        assert_eq!(Accelerometer.configure("SR", &params).unwrap(), commands::sampling_rate(50));
        assert_eq!(Accelerometer.configure("RA", &params).unwrap(), vec![b'R', b'A', 2]);
        assert_eq!(Accelerometer.configure("TZ", &params).unwrap(), b"TZ".to_vec());
        assert!(matches!(
            Accelerometer.configure("OX", &params),
            Err(DriverError::MissingParameter { .. })
        ));
        assert!(matches!(
            Accelerometer.configure("AT", &params),
            Err(DriverError::MissingParameter { .. })
        ));
    }

    proptest! {
        #[test]
        fn prop_one_record_per_six_bytes(
            records in prop::collection::vec(prop::array::uniform6(any::<u8>()), 0..50),
            timestamp in any::<i64>(),
        ) {
            let payload: Vec<u8> = records.iter().flatten().copied().collect();
            let packet = RawPacket::new(payload, records.len() as u32, timestamp);
            let response = Accelerometer.decode(&[packet], &[]).unwrap();

            prop_assert_eq!(response.records.len(), records.len());
            for (raw, record) in records.iter().zip(&response.records) {
                let (x, y, z, ts) = axes(record);
                prop_assert_eq!(x, bits::twelve_bit(raw[1], raw[0]));
                prop_assert_eq!(y, bits::twelve_bit(raw[3], raw[2]));
                prop_assert_eq!(z, bits::twelve_bit(raw[5], raw[4]));
                prop_assert_eq!(ts, timestamp);
            }
        }
    }
}
