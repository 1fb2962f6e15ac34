//! Error types for the IR crate.

use crate::qubit::QubitId;
use thiserror::Error;

/// Errors that can occur while building circuits or observables.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum IrError {
    /// Operand refers to a qubit the circuit does not have.
    #[error("Qubit {qubit} out of range for a {num_qubits}-qubit circuit{}", format_gate_context(.gate_name))]
    QubitOutOfRange {
        /// The offending qubit.
        qubit: QubitId,
        /// Width of the circuit.
        num_qubits: u32,
        /// Optional gate name for context.
        gate_name: Option<String>,
    },

    /// Gate requires a different number of qubits.
    #[error("Gate '{gate_name}' requires {expected} qubits, got {got}")]
    QubitCountMismatch {
        /// Name of the gate.
        gate_name: String,
        /// Expected number of qubits.
        expected: u32,
        /// Actual number of qubits provided.
        got: u32,
    },

    /// The same qubit appears twice in one operation.
    #[error("Duplicate qubit {qubit} in operation{}", format_gate_context(.gate_name))]
    DuplicateQubit {
        /// The duplicate qubit.
        qubit: QubitId,
        /// Optional gate name for context.
        gate_name: Option<String>,
    },

    /// A circuit width that the builder cannot produce.
    #[error("Invalid qubit count {got}: {reason}")]
    InvalidQubitCount {
        /// Requested width.
        got: u32,
        /// Why it was rejected.
        reason: &'static str,
    },

    /// Character outside `{I, X, Y, Z}` in a Pauli label.
    #[error("Invalid Pauli character '{character}' at position {position} in label '{label}'")]
    InvalidPauli {
        /// The full label.
        label: String,
        /// The rejected character.
        character: char,
        /// Character position within the label.
        position: usize,
    },

    /// Pauli label with no characters.
    #[error("Pauli label must not be empty")]
    EmptyPauliString,

    /// Observables of different widths in one set.
    #[error("Observable '{label}' acts on {got} qubits, expected {expected}")]
    ObservableWidthMismatch {
        /// Label of the mismatching observable.
        label: String,
        /// Width shared by the set.
        expected: usize,
        /// Width of the mismatching observable.
        got: usize,
    },

    /// Observable set with no observables.
    #[error("Observable set must contain at least one observable")]
    EmptyObservableSet,

    /// Search target that does not fit in the register.
    #[error("Target {target} does not fit in {num_qubits} qubits")]
    TargetOutOfRange {
        /// Requested basis state.
        target: u64,
        /// Register width.
        num_qubits: u32,
    },
}

#[allow(clippy::ref_option)]
fn format_gate_context(gate_name: &Option<String>) -> String {
    match gate_name {
        Some(name) => format!(" (gate: {name})"),
        None => String::new(),
    }
}

/// Result type for IR operations.
pub type IrResult<T> = Result<T, IrError>;
