//! Entangle Local Statevector Estimator
//!
//! Exact expectation values for small circuits, computed from the full
//! statevector, and shot sampling through [`StatevectorSampler`]. Useful for checking the walkthrough before spending time on
//! hardware, and as the default backend for the `entangle` CLI.
//!
//! # Performance
//!
//! | Qubits | Memory |
//! |--------|--------|
//! | 10 | ~16 KB |
//! | 20 | ~16 MB |
//! | 24 | ~256 MB |
//!
//! # Example
//!
//! ```ignore
//! use entangle_adapter_sim::StatevectorEstimator;
//! use entangle_hal::{Estimator, EstimatorPub, WaitConfig};
//! use entangle_ir::library;
//!
//! let estimator = StatevectorEstimator::new();
//! let pub_ = EstimatorPub::new(library::ghz(8)?, library::ghz_correlators(8)?)?;
//! let job_id = estimator.run(vec![pub_]).await?;
//! let result = estimator.wait(&job_id, WaitConfig::default()).await?;
//! assert!(result.first()?.evs.iter().all(|v| (v - 1.0).abs() < 1e-9));
//! ```

mod estimator;
mod sampler;
mod statevector;

pub use estimator::StatevectorEstimator;
pub use sampler::StatevectorSampler;
pub use statevector::Statevector;
