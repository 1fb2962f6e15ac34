//! Entangle Circuit Model
//!
//! Core data structures for the entanglement walkthrough: small circuits on a
//! fixed number of qubits and the Pauli observables estimated on them.
//!
//! # Core Components
//!
//! - **Qubits**: [`QubitId`] addresses a qubit within a circuit
//! - **Gates**: [`StandardGate`] for the `stdgates.inc` gates the walkthrough uses
//! - **Instructions**: [`Instruction`] combining a gate with its operands
//! - **Circuit**: [`Circuit`] ordered, operand-checked builder
//! - **Observables**: [`PauliString`] labels and ordered [`ObservableSet`]s
//! - **Library**: [`library::bell`], [`library::ghz`] and their observables,
//!   and [`library::grover`] search circuits
//!
//! # Example: Bell State
//!
//! ```rust
//! use entangle_ir::library;
//!
//! let circuit = library::bell().unwrap();
//! let observables = library::bell_observables().unwrap();
//!
//! assert_eq!(circuit.num_qubits(), 2);
//! assert_eq!(observables.labels()[4], "ZZ");
//! ```
//!
//! # Example: GHZ Correlators
//!
//! ```rust
//! use entangle_ir::library::{ghz, ghz_correlators};
//!
//! let circuit = ghz(5).unwrap();
//! let observables = ghz_correlators(5).unwrap();
//!
//! assert_eq!(circuit.two_qubit_gates().len(), 4);
//! assert_eq!(observables.labels()[0], "ZZIII");
//! ```

pub mod circuit;
pub mod error;
pub mod gate;
pub mod instruction;
pub mod library;
pub mod pauli;
pub mod qubit;

pub use circuit::Circuit;
pub use error::{IrError, IrResult};
pub use gate::StandardGate;
pub use instruction::Instruction;
pub use pauli::{ObservableSet, Pauli, PauliString};
pub use qubit::QubitId;
