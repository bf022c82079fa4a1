//! Parameter types and decoded field values

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Declared type of a sensor parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ParameterType {
    Integer,
    Long,
    Float,
    String,
    Byte,
    /// Action parameters carry no value
    Void,
}

/// One decoded value in a record's field map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Int(i32),
    Long(i64),
    Float(f32),
    Str(String),
}

impl FieldValue {
    pub fn as_long(&self) -> Option<i64> {
        match self {
            FieldValue::Long(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::Str(v) => Some(v),
            _ => None,
        }
    }
}

/// Wire-compatible mapping from field key to value.
pub type FieldMap = BTreeMap<&'static str, FieldValue>;
