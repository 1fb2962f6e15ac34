//! A single circuit step.

use serde::{Deserialize, Serialize};

use crate::gate::StandardGate;
use crate::qubit::QubitId;

/// One step of a circuit: a gate on ordered operands, or a barrier.
///
/// Operand order matters for controlled gates: `cx` takes the control first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Instruction {
    Gate {
        gate: StandardGate,
        qubits: Vec<QubitId>,
    },
    /// Scheduling fence with no effect on the state.
    Barrier { qubits: Vec<QubitId> },
}

impl Instruction {
    pub fn gate(gate: StandardGate, qubits: impl IntoIterator<Item = QubitId>) -> Self {
        Self::Gate {
            gate,
            qubits: qubits.into_iter().collect(),
        }
    }

    pub fn barrier(qubits: impl IntoIterator<Item = QubitId>) -> Self {
        Self::Barrier {
            qubits: qubits.into_iter().collect(),
        }
    }

    /// Operands in order.
    pub fn qubits(&self) -> &[QubitId] {
        match self {
            Self::Gate { qubits, .. } | Self::Barrier { qubits } => qubits,
        }
    }

    /// The gate, unless this is a barrier.
    pub fn as_gate(&self) -> Option<StandardGate> {
        match self {
            Self::Gate { gate, .. } => Some(*gate),
            Self::Barrier { .. } => None,
        }
    }

    /// OpenQASM 3 keyword for this step.
    pub fn name(&self) -> &'static str {
        self.as_gate().map_or("barrier", |g| g.name())
    }
}
