//! Errors surfaced by estimators and the helpers around them.

use thiserror::Error;

/// Failure modes of submitting, polling and reading estimator jobs.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum HalError {
    /// No device matched, or the device is offline.
    #[error("No usable backend: {0}")]
    BackendUnavailable(String),

    /// Credentials were rejected or could not be exchanged.
    #[error("Authentication rejected: {0}")]
    AuthenticationFailed(String),

    /// The service refused the submission.
    #[error("Could not submit job: {0}")]
    SubmissionFailed(String),

    /// The job ran and failed.
    #[error("Job failed: {0}")]
    JobFailed(String),

    #[error("Job was cancelled")]
    JobCancelled,

    #[error("Unknown job: {0}")]
    JobNotFound(String),

    /// Job has not reached a terminal state yet.
    #[error("Job {0} has not completed yet")]
    JobPending(String),

    /// A circuit/observable pair that cannot be estimated.
    #[error("Invalid pub: {0}")]
    InvalidPub(String),

    /// More qubits than the estimator can hold.
    #[error("Circuit too wide: {0}")]
    CircuitTooLarge(String),

    #[error("HTTP error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Malformed payload: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Missing or invalid settings and credentials.
    #[error("Invalid configuration: {0}")]
    Configuration(String),

    #[error("Gave up waiting for job {0}")]
    Timeout(String),

    /// Normalizing by a reference value that is zero, missing or not finite.
    #[error("Cannot normalize: reference value is {0}")]
    DegenerateNormalization(String),

    /// Anything else reported by the service.
    #[error("Backend error: {0}")]
    Backend(String),
}

impl From<entangle_ir::IrError> for HalError {
    fn from(e: entangle_ir::IrError) -> Self {
        HalError::InvalidPub(e.to_string())
    }
}

pub type HalResult<T> = Result<T, HalError>;
