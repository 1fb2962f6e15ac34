//! Entangle Hardware Abstraction Layer
//!
//! A common interface for estimating Pauli expectation values, whether on a
//! local simulator or a remote execution service.
//!
//! # Overview
//!
//! - [`Estimator`]: submit [`EstimatorPub`]s, poll, fetch results, cancel
//! - [`EstimatorOptions`]: precision, resilience, optimization and dynamical
//!   decoupling requests
//! - [`EstimatorResult`] / [`PubResult`]: expectation values with standard errors
//! - [`Counts`]: sampled bitstrings, for circuits that are measured instead
//! - [`analysis`]: normalization of correlator series
//!
//! # Supported Backends
//!
//! | Backend | Crate | Authentication |
//! |---------|-------|----------------|
//! | Statevector | `entangle-adapter-sim` | None |
//! | IBM Quantum | `entangle-adapter-ibm` | `IBM_API_KEY` + `IBM_SERVICE_CRN`, or `IBM_QUANTUM_TOKEN` |
//!
//! # Example
//!
//! ```ignore
//! use entangle_hal::{Estimator, EstimatorPub, WaitConfig};
//! use entangle_adapter_sim::StatevectorEstimator;
//! use entangle_ir::library;
//!
//! let estimator = StatevectorEstimator::new();
//! let pub_ = EstimatorPub::new(library::bell()?, library::bell_observables()?)?;
//! let job_id = estimator.run(vec![pub_]).await?;
//! let result = estimator.wait(&job_id, WaitConfig::default()).await?;
//! for (label, ev, std) in result.first()?.rows() {
//!     println!("{label}: {ev:.3} ± {std:.3}");
//! }
//! ```

pub mod analysis;
pub mod error;
pub mod estimator;
pub mod job;
pub mod options;
pub mod primitive;
pub mod result;

pub use error::{HalError, HalResult};
pub use estimator::{BackendConfig, Estimator, WaitConfig};
pub use job::{JobId, JobRecord, JobStatus};
pub use options::{DdSequence, DynamicalDecouplingOptions, EstimatorOptions};
pub use primitive::EstimatorPub;
pub use result::{Counts, EstimatorResult, PubResult};
