//! IBM Quantum estimator adapter for Entangle.
//!
//! Submits Estimator V2 jobs to IBM Quantum and retrieves expectation values.
//!
//! # Authentication
//!
//! | Channel | Variables |
//! |---------|-----------|
//! | IBM Cloud | `IBM_API_KEY` + `IBM_SERVICE_CRN` |
//! | Legacy | `IBM_QUANTUM_TOKEN` |
//!
//! # Example
//!
//! ```ignore
//! use entangle_adapter_ibm::{BackendSelector, IbmCredentials, IbmEstimator};
//! use entangle_hal::{Estimator, EstimatorOptions, EstimatorPub};
//! use entangle_ir::library;
//!
//! let credentials = IbmCredentials::from_env()?;
//! let estimator = IbmEstimator::connect(
//!     &credentials,
//!     BackendSelector::LeastBusy { min_qubits: 100 },
//!     EstimatorOptions::hardware_defaults(),
//! )
//! .await?;
//!
//! let pub_ = EstimatorPub::new(library::ghz(100)?, library::ghz_correlators(100)?)?;
//! let job_id = estimator.run(vec![pub_]).await?;
//! println!("submitted {job_id} to {}", estimator.target());
//! ```

mod api;
mod credentials;
mod error;
mod estimator;

pub use api::{
    BackendInfo, BackendStatus, DEFAULT_ENDPOINT, IbmClient, JobStatusResponse, LEGACY_ENDPOINT,
    ProcessorType, select_least_busy,
};
pub use credentials::{ENV_API_KEY, ENV_LEGACY_TOKEN, ENV_SERVICE_CRN, IbmCredentials};
pub use error::{IbmError, IbmResult};
pub use estimator::{BackendSelector, IbmEstimator};
