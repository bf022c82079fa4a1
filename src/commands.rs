//! Device command messages sent to USB sensor boards.
//!
//! Every message starts with the ASCII setting key. What follows depends on
//! the parameter type:
//!
//! | Parameter | Payload |
//! |-----------|---------|
//! | Integer (`SR`, `RR`, `AT`) | `i32`, little-endian |
//! | Byte (`OX`, `OY`, `OZ`, `RA`) | one byte |
//! | Action (`TX`, `TY`, `TZ`) | none |
//!
//! Start and stop are single-byte commands with no key.

use crate::types::{ParamBundle, ParameterSpec, ParameterType};
use crate::{DriverError, Result};

/// Begin streaming samples.
pub const START_SENSOR: u8 = 0x01;

/// Stop streaming samples.
pub const STOP_SENSOR: u8 = 0x02;

pub const SAMPLING_RATE: &str = "SR";
pub const READ_RATE: &str = "RR";
pub const ALARM_THRESHOLD: &str = "AT";

pub fn start() -> Vec<u8> {
    vec![START_SENSOR]
}

pub fn stop() -> Vec<u8> {
    vec![STOP_SENSOR]
}

/// Key followed by a raw payload.
pub fn message(key: &str, payload: &[u8]) -> Vec<u8> {
    let mut msg = Vec::with_capacity(key.len() + payload.len());
    msg.extend_from_slice(key.as_bytes());
    msg.extend_from_slice(payload);
    msg
}

/// Key followed by a little-endian `i32`.
pub fn int_message(key: &str, value: i32) -> Vec<u8> {
    message(key, &value.to_le_bytes())
}

/// Key followed by a single byte.
pub fn byte_message(key: &str, value: u8) -> Vec<u8> {
    message(key, &[value])
}

pub fn sampling_rate(rate: i32) -> Vec<u8> {
    int_message(SAMPLING_RATE, rate)
}

pub fn read_rate(rate: i32) -> Vec<u8> {
    int_message(READ_RATE, rate)
}

pub fn alarm_threshold(threshold: i32) -> Vec<u8> {
    int_message(ALARM_THRESHOLD, threshold)
}

/// Build the configure message for `setting` from a driver's declaration.
///
/// Fails with `MissingParameter` when the driver does not declare the setting
/// as configurable, or when `params` lacks a value of the declared type.
pub fn configure(spec: &ParameterSpec, setting: &str, params: &ParamBundle) -> Result<Vec<u8>> {
    let param = spec
        .configurable(setting)
        .ok_or_else(|| DriverError::missing_parameter(setting, "Unknown Setting"))?;

    match param.kind {
        ParameterType::Void => Ok(message(param.name, &[])),
        ParameterType::Byte => Ok(byte_message(param.name, params.require_byte(setting)?)),
        ParameterType::Integer => Ok(int_message(param.name, params.require_int(setting)?)),
        other => Err(DriverError::missing_parameter(
            setting,
            format!("{:?} settings cannot be sent to the device", other),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ParamValue, SensorParameter};

    const SPEC: &[SensorParameter] = &[
        SensorParameter::config("SR", ParameterType::Integer, "Sensor sampling rate"),
        SensorParameter::action("TX", "Tare X"),
        SensorParameter::config("OX", ParameterType::Byte, "Offset X"),
        SensorParameter::config("NAME", ParameterType::String, "Label"),
        SensorParameter::data("x-value", ParameterType::Integer, "X"),
    ];

    #[test]
    fn integer_setting_is_key_then_le_i32() {
        let params = ParamBundle::new().with("SR", ParamValue::Int(0x0102));
        let msg = configure(&ParameterSpec::new(SPEC), "SR", &params).unwrap();
        assert_eq!(msg, vec![b'S', b'R', 0x02, 0x01, 0x00, 0x00]);
        assert_eq!(msg, sampling_rate(0x0102));
    }

    #[test]
    fn action_has_no_payload() {
        let msg = configure(&ParameterSpec::new(SPEC), "TX", &ParamBundle::new()).unwrap();
        assert_eq!(msg, b"TX".to_vec());
    }

    #[test]
    fn byte_setting_appends_one_byte() {
        let params = ParamBundle::new().with("OX", ParamValue::Byte(0x7F));
        let msg = configure(&ParameterSpec::new(SPEC), "OX", &params).unwrap();
        assert_eq!(msg, vec![b'O', b'X', 0x7F]);
    }

    #[test]
    fn unknown_and_data_settings_are_rejected() {
        let spec = ParameterSpec::new(SPEC);
        for setting in ["ZZ", "x-value"] {
            match configure(&spec, setting, &ParamBundle::new()).unwrap_err() {
                DriverError::MissingParameter { setting: s, reason } => {
                    assert_eq!(s, setting);
                    assert_eq!(reason, "Unknown Setting");
                }
                other => panic!("unexpected error: {other}"),
            }
        }
    }

    #[test]
    fn absent_value_is_missing_parameter() {
        let result = configure(&ParameterSpec::new(SPEC), "SR", &ParamBundle::new());
        assert!(matches!(result, Err(DriverError::MissingParameter { .. })));
    }

    #[test]
    fn string_settings_are_not_sendable() {
        let params = ParamBundle::new().with("NAME", ParamValue::Str("a".into()));
        assert!(configure(&ParameterSpec::new(SPEC), "NAME", &params).is_err());
    }

    #[test]
    fn start_stop_are_single_bytes() {
        assert_eq!(start(), vec![START_SENSOR]);
        assert_eq!(stop(), vec![STOP_SENSOR]);
        assert_ne!(START_SENSOR, STOP_SENSOR);
        assert_eq!(alarm_threshold(-1), vec![b'A', b'T', 0xFF, 0xFF, 0xFF, 0xFF]);
        assert_eq!(read_rate(1), vec![b'R', b'R', 1, 0, 0, 0]);
    }
}
