//! Quantum gate types.

use serde::{Deserialize, Serialize};

/// Gates from the OpenQASM 3 standard library that the walkthrough circuits use.
///
/// Rotation angles are concrete radians; the walkthrough never binds symbolic
/// parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum StandardGate {
    // Single-qubit Pauli gates
    /// Identity gate.
    I,
    /// Pauli-X gate.
    X,
    /// Pauli-Y gate.
    Y,
    /// Pauli-Z gate.
    Z,

    // Single-qubit Clifford gates
    /// Hadamard gate.
    H,
    /// S gate (sqrt(Z)).
    S,
    /// S-dagger gate.
    Sdg,
    /// T gate (fourth root of Z).
    T,
    /// T-dagger gate.
    Tdg,
    /// sqrt(X) gate.
    SX,

    // Single-qubit rotation gates
    /// Rotation around X axis.
    Rx(f64),
    /// Rotation around Y axis.
    Ry(f64),
    /// Rotation around Z axis.
    Rz(f64),

    // Two-qubit gates
    /// Controlled-X (CNOT) gate.
    CX,
    /// Controlled-Y gate.
    CY,
    /// Controlled-Z gate.
    CZ,
    /// SWAP gate.
    Swap,

    // Multi-controlled gates
    /// X on the last operand, controlled by the given number of leading
    /// operands. Emitted as `ctrl(k) @ x`.
    Mcx(u32),
}

impl StandardGate {
    /// Name of the gate in `stdgates.inc`.
    #[inline]
    pub fn name(&self) -> &'static str {
        match self {
            StandardGate::I => "id",
            StandardGate::X => "x",
            StandardGate::Y => "y",
            StandardGate::Z => "z",
            StandardGate::H => "h",
            StandardGate::S => "s",
            StandardGate::Sdg => "sdg",
            StandardGate::T => "t",
            StandardGate::Tdg => "tdg",
            StandardGate::SX => "sx",
            StandardGate::Rx(_) => "rx",
            StandardGate::Ry(_) => "ry",
            StandardGate::Rz(_) => "rz",
            StandardGate::CX => "cx",
            StandardGate::CY => "cy",
            StandardGate::CZ => "cz",
            StandardGate::Swap => "swap",
            StandardGate::Mcx(_) => "mcx",
        }
    }

    /// Number of qubits this gate operates on.
    #[inline]
    pub fn num_qubits(&self) -> u32 {
        match self {
            StandardGate::CX | StandardGate::CY | StandardGate::CZ | StandardGate::Swap => 2,
            StandardGate::Mcx(controls) => controls + 1,
            _ => 1,
        }
    }

    /// Rotation angle, if the gate carries one.
    pub fn angle(&self) -> Option<f64> {
        match self {
            StandardGate::Rx(theta) | StandardGate::Ry(theta) | StandardGate::Rz(theta) => {
                Some(*theta)
            }
            _ => None,
        }
    }

    /// Control count of a multi-controlled gate.
    pub fn controls(&self) -> Option<u32> {
        match self {
            StandardGate::Mcx(controls) => Some(*controls),
            _ => None,
        }
    }

    /// Whether the gate acts on two qubits.
    #[inline]
    pub fn is_two_qubit(&self) -> bool {
        self.num_qubits() == 2
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    #[test]
    fn test_standard_gate_properties() {
        assert_eq!(StandardGate::H.num_qubits(), 1);
        assert_eq!(StandardGate::CX.num_qubits(), 2);
        assert!(StandardGate::Swap.is_two_qubit());
        assert!(!StandardGate::Rz(PI).is_two_qubit());
    }

    #[test]
    fn test_mcx_arity() {
        assert_eq!(StandardGate::Mcx(2).num_qubits(), 3);
        assert_eq!(StandardGate::Mcx(2).controls(), Some(2));
        assert!(!StandardGate::Mcx(2).is_two_qubit());
        assert_eq!(StandardGate::CX.controls(), None);
    }

    #[test]
    fn test_gate_names_match_stdgates() {
        assert_eq!(StandardGate::I.name(), "id");
        assert_eq!(StandardGate::Sdg.name(), "sdg");
        assert_eq!(StandardGate::CX.name(), "cx");
    }

    #[test]
    fn test_angle() {
        assert_eq!(StandardGate::Ry(0.25).angle(), Some(0.25));
        assert_eq!(StandardGate::H.angle(), None);
    }
}
