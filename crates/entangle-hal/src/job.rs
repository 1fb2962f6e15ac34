//! Job lifecycle types.
//!
//! ```text
//!   run() ──→ Queued ──→ Running ──→ Completed
//!               │           │
//!               │           ├──→ Failed(reason)
//!               │           │
//!               └───────────┴──→ Cancelled
//! ```
//!
//! Terminal states (`Completed`, `Failed`, `Cancelled`) are permanent, and
//! `result()` is only meaningful once a job is `Completed`.

use std::fmt;

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

/// Identifier returned by [`crate::Estimator::run`].
///
/// Opaque to callers: uuids locally, service-assigned ids remotely.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(pub String);

impl JobId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for JobId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<&str> for JobId {
    fn from(id: &str) -> Self {
        Self(id.to_owned())
    }
}

/// Where a job is in its lifecycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum JobStatus {
    /// Accepted, waiting for a device.
    Queued,
    /// Executing (includes service-side validation and transpilation).
    Running,
    /// Results are available.
    Completed,
    /// Execution failed; carries the service's reason.
    Failed(String),
    /// Cancelled by the user or the service.
    Cancelled,
}

impl JobStatus {
    /// Whether the job can no longer change state.
    pub fn is_terminal(&self) -> bool {
        !self.is_pending()
    }

    /// Whether the job is queued or running.
    pub fn is_pending(&self) -> bool {
        matches!(self, Self::Queued | Self::Running)
    }

    /// Whether results can be fetched.
    pub fn is_success(&self) -> bool {
        *self == Self::Completed
    }

    /// Status name without the failure reason.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Queued => "Queued",
            Self::Running => "Running",
            Self::Completed => "Completed",
            Self::Failed(_) => "Failed",
            Self::Cancelled => "Cancelled",
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Failed(reason) => write!(f, "Failed: {reason}"),
            other => f.write_str(other.label()),
        }
    }
}

/// Bookkeeping for one submitted job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobRecord {
    pub id: JobId,
    /// Estimator that accepted the job.
    pub backend: String,
    /// Pubs in the submission.
    pub num_pubs: usize,
    pub status: JobStatus,
    pub submitted_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<DateTime<Utc>>,
}

impl JobRecord {
    /// A freshly queued job.
    pub fn submitted(id: JobId, backend: impl Into<String>, num_pubs: usize) -> Self {
        Self {
            id,
            backend: backend.into(),
            num_pubs,
            status: JobStatus::Queued,
            submitted_at: Utc::now(),
            finished_at: None,
        }
    }

    /// Move to `status`. Returns `false`, leaving the record untouched, if
    /// the job had already finished.
    pub fn advance(&mut self, status: JobStatus) -> bool {
        if self.status.is_terminal() {
            return false;
        }
        if status.is_terminal() {
            self.finished_at = Some(Utc::now());
        }
        self.status = status;
        true
    }

    /// Time from submission to completion, once finished.
    pub fn turnaround(&self) -> Option<TimeDelta> {
        self.finished_at.map(|t| t - self.submitted_at)
    }
}
