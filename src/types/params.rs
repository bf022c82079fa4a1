//! Host-supplied parameter bundles

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::{DriverError, Result};

/// One value in a [`ParamBundle`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ParamValue {
    Int(i32),
    Long(i64),
    Byte(u8),
    Str(String),
    StrArray(Vec<String>),
    Bundle(ParamBundle),
}

impl ParamValue {
    /// Short type name for error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            ParamValue::Int(_) => "integer",
            ParamValue::Long(_) => "long",
            ParamValue::Byte(_) => "byte",
            ParamValue::Str(_) => "string",
            ParamValue::StrArray(_) => "string array",
            ParamValue::Bundle(_) => "bundle",
        }
    }
}

/// Key/value parameters handed to `configure` and to legacy print requests.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParamBundle {
    values: BTreeMap<String, ParamValue>,
}

impl ParamBundle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, key: impl Into<String>, value: ParamValue) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: ParamValue) {
        self.values.insert(key.into(), value);
    }

    pub fn get(&self, key: &str) -> Option<&ParamValue> {
        self.values.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Integer value for `setting`, or `MissingParameter` when absent or mistyped.
    pub fn require_int(&self, setting: &str) -> Result<i32> {
        match self.get(setting) {
            Some(ParamValue::Int(v)) => Ok(*v),
            Some(other) => Err(mistyped(setting, "integer", other)),
            None => Err(DriverError::missing_parameter(setting, "parameter absent")),
        }
    }

    /// Byte value for `setting`, or `MissingParameter` when absent or mistyped.
    pub fn require_byte(&self, setting: &str) -> Result<u8> {
        match self.get(setting) {
            Some(ParamValue::Byte(v)) => Ok(*v),
            Some(other) => Err(mistyped(setting, "byte", other)),
            None => Err(DriverError::missing_parameter(setting, "parameter absent")),
        }
    }

    /// Optional integer; a value of another type counts as absent.
    pub fn int(&self, key: &str) -> Option<i32> {
        match self.get(key) {
            Some(ParamValue::Int(v)) => Some(*v),
            _ => None,
        }
    }

    /// Optional string; a value of another type counts as absent.
    pub fn string(&self, key: &str) -> Option<&str> {
        match self.get(key) {
            Some(ParamValue::Str(v)) => Some(v),
            _ => None,
        }
    }
}

fn mistyped(setting: &str, expected: &str, found: &ParamValue) -> DriverError {
    DriverError::missing_parameter(
        setting,
        format!("expected {}, found {}", expected, found.type_name()),
    )
}
