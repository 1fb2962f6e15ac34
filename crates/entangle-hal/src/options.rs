//! Estimator execution options.
//!
//! Everything except `default_precision` and `seed` is a request to the
//! execution service. Transpilation, twirling-free resilience and dynamical
//! decoupling all happen service-side; nothing here rewrites a circuit.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{HalError, HalResult};

/// Pulse sequence the service inserts into idle periods.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DdSequence {
    /// X X.
    #[serde(rename = "XX")]
    Xx,
    /// X+ X-.
    #[serde(rename = "XpXm")]
    XpXm,
    /// X Y X Y.
    #[serde(rename = "XY4")]
    Xy4,
}

impl fmt::Display for DdSequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DdSequence::Xx => "XX",
            DdSequence::XpXm => "XpXm",
            DdSequence::Xy4 => "XY4",
        };
        f.write_str(name)
    }
}

impl FromStr for DdSequence {
    type Err = HalError;

    fn from_str(s: &str) -> HalResult<Self> {
        match s.to_ascii_lowercase().as_str() {
            "xx" => Ok(DdSequence::Xx),
            "xpxm" => Ok(DdSequence::XpXm),
            "xy4" => Ok(DdSequence::Xy4),
            other => Err(HalError::Configuration(format!(
                "unknown dynamical decoupling sequence '{other}' (expected XX, XpXm or XY4)"
            ))),
        }
    }
}

/// Dynamical decoupling request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DynamicalDecouplingOptions {
    /// Whether the service should insert decoupling pulses.
    pub enable: bool,
    /// Which sequence to insert.
    pub sequence_type: DdSequence,
}

impl Default for DynamicalDecouplingOptions {
    fn default() -> Self {
        Self {
            enable: false,
            sequence_type: DdSequence::Xx,
        }
    }
}

impl DynamicalDecouplingOptions {
    /// Enabled with the given sequence.
    pub fn enabled(sequence_type: DdSequence) -> Self {
        Self {
            enable: true,
            sequence_type,
        }
    }
}

/// Options shared by every estimator implementation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EstimatorOptions {
    /// Target standard error for pubs that do not set their own precision.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_precision: Option<f64>,
    /// Shot budget per pub, overriding precision on services that support it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_shots: Option<u32>,
    /// Service-side error mitigation level (0..=2).
    pub resilience_level: u8,
    /// Service-side transpiler optimization level (0..=3).
    pub optimization_level: u8,
    /// Dynamical decoupling request.
    pub dynamical_decoupling: DynamicalDecouplingOptions,
    /// Seed for simulators that add sampling noise.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
}

impl Default for EstimatorOptions {
    fn default() -> Self {
        Self {
            default_precision: None,
            default_shots: None,
            resilience_level: 1,
            optimization_level: 1,
            dynamical_decoupling: DynamicalDecouplingOptions::default(),
            seed: None,
        }
    }
}

impl EstimatorOptions {
    /// Options used by the hardware walkthrough: resilience 1 and XY4 decoupling.
    pub fn hardware_defaults() -> Self {
        Self {
            dynamical_decoupling: DynamicalDecouplingOptions::enabled(DdSequence::Xy4),
            ..Self::default()
        }
    }

    /// Reject values the service would refuse.
    pub fn validate(&self) -> HalResult<()> {
        if self.resilience_level > 2 {
            return Err(HalError::Configuration(format!(
                "resilience_level must be 0..=2, got {}",
                self.resilience_level
            )));
        }
        if self.optimization_level > 3 {
            return Err(HalError::Configuration(format!(
                "optimization_level must be 0..=3, got {}",
                self.optimization_level
            )));
        }
        if let Some(p) = self.default_precision {
            if !(p.is_finite() && p >= 0.0) {
                return Err(HalError::Configuration(format!(
                    "default_precision must be a non-negative number, got {p}"
                )));
            }
        }
        if self.default_shots == Some(0) {
            return Err(HalError::Configuration(
                "default_shots must be positive".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_validate() {
        assert!(EstimatorOptions::default().validate().is_ok());
        let hw = EstimatorOptions::hardware_defaults();
        assert!(hw.dynamical_decoupling.enable);
        assert_eq!(hw.dynamical_decoupling.sequence_type, DdSequence::Xy4);
    }

    #[test]
    fn test_validate_rejects_out_of_range() {
        let opts = EstimatorOptions {
            resilience_level: 3,
            ..EstimatorOptions::default()
        };
        assert!(matches!(opts.validate(), Err(HalError::Configuration(_))));

        let opts = EstimatorOptions {
            default_precision: Some(-0.1),
            ..EstimatorOptions::default()
        };
        assert!(opts.validate().is_err());
    }

    #[test]
    fn test_dd_sequence_parse_and_display() {
        assert_eq!("xy4".parse::<DdSequence>().unwrap(), DdSequence::Xy4);
        assert_eq!("XpXm".parse::<DdSequence>().unwrap(), DdSequence::XpXm);
        assert!("ZZ".parse::<DdSequence>().is_err());
        assert_eq!(DdSequence::Xy4.to_string(), "XY4");
    }

    #[test]
    fn test_dd_sequence_wire_names() {
        let json = serde_json::to_string(&DynamicalDecouplingOptions::enabled(DdSequence::XpXm))
            .unwrap();
        assert_eq!(json, r#"{"enable":true,"sequence_type":"XpXm"}"#);
    }
}
