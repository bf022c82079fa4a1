//! Static parameter declarations for sensor drivers

use serde::Serialize;
use std::collections::HashSet;

use super::ParameterType;
use crate::{DriverError, Result};

/// What a parameter is used for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ParameterPurpose {
    /// Settable through `configure` with a value
    Config,
    /// Triggered through `configure` without a value
    Action,
    /// Reported in decoded records
    Data,
}

/// Declaration of one configurable or reportable driver field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SensorParameter {
    pub name: &'static str,
    pub kind: ParameterType,
    pub purpose: ParameterPurpose,
    pub description: &'static str,
}

impl SensorParameter {
    pub const fn config(name: &'static str, kind: ParameterType, description: &'static str) -> Self {
        Self { name, kind, purpose: ParameterPurpose::Config, description }
    }

    pub const fn action(name: &'static str, description: &'static str) -> Self {
        Self { name, kind: ParameterType::Void, purpose: ParameterPurpose::Action, description }
    }

    pub const fn data(name: &'static str, kind: ParameterType, description: &'static str) -> Self {
        Self { name, kind, purpose: ParameterPurpose::Data, description }
    }

    /// True for parameters accepted by `configure`.
    pub fn is_configurable(&self) -> bool {
        matches!(self.purpose, ParameterPurpose::Config | ParameterPurpose::Action)
    }
}

/// The full parameter list a driver declares.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct ParameterSpec {
    parameters: &'static [SensorParameter],
}

impl ParameterSpec {
    pub const fn new(parameters: &'static [SensorParameter]) -> Self {
        Self { parameters }
    }

    /// An empty declaration, for drivers with nothing to configure or report.
    pub const fn empty() -> Self {
        Self { parameters: &[] }
    }

    /// Validate the declaration for consistency.
    pub fn validate(&self) -> Result<()> {
        let mut seen = HashSet::new();
        for param in self.parameters {
            if !seen.insert(param.name) {
                return Err(DriverError::Parse {
                    context: "Parameter declaration".to_string(),
                    details: format!("Parameter '{}' declared twice", param.name),
                });
            }

            let void = param.kind == ParameterType::Void;
            let action = param.purpose == ParameterPurpose::Action;
            if void != action {
                return Err(DriverError::Parse {
                    context: "Parameter declaration".to_string(),
                    details: format!(
                        "Parameter '{}' must be Void exactly when it is an action",
                        param.name
                    ),
                });
            }
        }

        Ok(())
    }

    /// Look up a parameter by name.
    pub fn get(&self, name: &str) -> Option<&SensorParameter> {
        self.parameters.iter().find(|p| p.name == name)
    }

    /// Look up a parameter accepted by `configure`.
    pub fn configurable(&self, name: &str) -> Option<&SensorParameter> {
        self.get(name).filter(|p| p.is_configurable())
    }

    /// Parameters reported in decoded records.
    pub fn data_fields(&self) -> impl Iterator<Item = &SensorParameter> + '_ {
        self.parameters.iter().filter(|p| p.purpose == ParameterPurpose::Data)
    }

    pub fn iter(&self) -> impl Iterator<Item = &SensorParameter> + '_ {
        self.parameters.iter()
    }

    pub fn len(&self) -> usize {
        self.parameters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parameters.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &[SensorParameter] = &[
        SensorParameter::config("SR", ParameterType::Integer, "Sensor sampling rate"),
        SensorParameter::action("TX", "Tare X"),
        SensorParameter::data("force", ParameterType::Integer, "Force reading"),
    ];

    #[test]
    fn lookup_by_purpose() {
        let spec = ParameterSpec::new(SAMPLE);
        assert!(spec.validate().is_ok());
        assert_eq!(spec.get("SR").map(|p| p.kind), Some(ParameterType::Integer));
        assert!(spec.configurable("TX").is_some());
        assert!(spec.configurable("force").is_none());
        assert_eq!(spec.data_fields().count(), 1);
        assert_eq!(spec.len(), 3);
    }

    #[test]
    fn duplicate_names_rejected() {
        const DUP: &[SensorParameter] = &[
            SensorParameter::config("SR", ParameterType::Integer, "a"),
            SensorParameter::config("SR", ParameterType::Integer, "b"),
        ];
        assert!(ParameterSpec::new(DUP).validate().is_err());
    }

    #[test]
    fn void_config_rejected() {
        const BAD: &[SensorParameter] =
            &[SensorParameter::config("TX", ParameterType::Void, "not an action")];
        assert!(ParameterSpec::new(BAD).validate().is_err());
    }
}
