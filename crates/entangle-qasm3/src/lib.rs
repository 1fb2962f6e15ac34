//! `OpenQASM` 3 emitter for Entangle
//!
//! Remote estimator services accept circuits as `OpenQASM` 3 text. This crate
//! serializes an [`entangle_ir::Circuit`] into that form.
//!
//! # Example
//!
//! ```rust
//! use entangle_ir::library;
//! use entangle_qasm3::emit;
//!
//! let qasm = emit(&library::bell().unwrap());
//! assert!(qasm.contains("h q[0];"));
//! assert!(qasm.contains("cx q[0], q[1];"));
//! ```

mod emitter;

pub use emitter::emit;
