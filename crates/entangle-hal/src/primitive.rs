//! Primitive unified blocs: the unit of work an estimator accepts.

use entangle_ir::{Circuit, ObservableSet};
use serde::{Deserialize, Serialize};

use crate::error::{HalError, HalResult};

/// A circuit paired with the observables to estimate on its output state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "EstimatorPubData")]
pub struct EstimatorPub {
    circuit: Circuit,
    observables: ObservableSet,
    precision: Option<f64>,
}

#[derive(Deserialize)]
struct EstimatorPubData {
    circuit: Circuit,
    observables: ObservableSet,
    #[serde(default)]
    precision: Option<f64>,
}

impl TryFrom<EstimatorPubData> for EstimatorPub {
    type Error = HalError;

    fn try_from(data: EstimatorPubData) -> HalResult<Self> {
        let pub_ = Self::new(data.circuit, data.observables)?;
        match data.precision {
            Some(precision) => pub_.with_precision(precision),
            None => Ok(pub_),
        }
    }
}

impl EstimatorPub {
    /// Pair `circuit` with `observables`.
    ///
    /// Every observable must be exactly as wide as the circuit.
    pub fn new(circuit: Circuit, observables: ObservableSet) -> HalResult<Self> {
        if observables.num_qubits() != circuit.num_qubits() {
            return Err(HalError::InvalidPub(format!(
                "circuit '{}' has {} qubits but observables act on {}",
                circuit.name(),
                circuit.num_qubits(),
                observables.num_qubits()
            )));
        }
        Ok(Self {
            circuit,
            observables,
            precision: None,
        })
    }

    /// Request a target standard error for this pub only.
    pub fn with_precision(mut self, precision: f64) -> HalResult<Self> {
        if !(precision.is_finite() && precision >= 0.0) {
            return Err(HalError::InvalidPub(format!(
                "precision must be a non-negative number, got {precision}"
            )));
        }
        self.precision = Some(precision);
        Ok(self)
    }

    /// The state-preparation circuit.
    pub fn circuit(&self) -> &Circuit {
        &self.circuit
    }

    /// Observables, in result order.
    pub fn observables(&self) -> &ObservableSet {
        &self.observables
    }

    /// Per-pub precision override.
    pub fn precision(&self) -> Option<f64> {
        self.precision
    }

    /// Precision to use given the estimator-wide default.
    pub fn effective_precision(&self, default: Option<f64>) -> Option<f64> {
        self.precision.or(default)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use entangle_ir::library;

    #[test]
    fn test_pub_accepts_matching_width() {
        let pub_ = EstimatorPub::new(
            library::bell().unwrap(),
            library::bell_observables().unwrap(),
        )
        .unwrap();
        assert_eq!(pub_.observables().len(), 6);
        assert_eq!(pub_.precision(), None);
        assert_eq!(pub_.effective_precision(Some(0.01)), Some(0.01));
    }

    #[test]
    fn test_pub_rejects_width_mismatch() {
        let err = EstimatorPub::new(
            library::ghz(3).unwrap(),
            library::bell_observables().unwrap(),
        )
        .unwrap_err();
        assert!(matches!(err, HalError::InvalidPub(_)));
    }

    #[test]
    fn test_pub_precision_override() {
        let pub_ = EstimatorPub::new(
            library::ghz(4).unwrap(),
            library::ghz_correlators(4).unwrap(),
        )
        .unwrap()
        .with_precision(0.02)
        .unwrap();
        assert_eq!(pub_.effective_precision(Some(0.1)), Some(0.02));

        let bad = EstimatorPub::new(
            library::ghz(4).unwrap(),
            library::ghz_correlators(4).unwrap(),
        )
        .unwrap()
        .with_precision(f64::NAN);
        assert!(bad.is_err());
    }

    #[test]
    fn test_deserialize_goes_through_width_check() {
        let pub_ = EstimatorPub::new(
            library::bell().unwrap(),
            library::bell_observables().unwrap(),
        )
        .unwrap();
        let mut json = serde_json::to_value(&pub_).unwrap();
        let back: EstimatorPub = serde_json::from_value(json.clone()).unwrap();
        assert_eq!(back, pub_);

        json["observables"]["observables"] = serde_json::json!(["ZZZ"]);
        let err = serde_json::from_value::<EstimatorPub>(json.clone()).unwrap_err();
        assert!(err.to_string().contains("observables act on 3"), "{err}");

        json["observables"]["observables"] = serde_json::json!(["ZZ"]);
        json["precision"] = serde_json::json!(-1.0);
        assert!(serde_json::from_value::<EstimatorPub>(json).is_err());
    }
}
