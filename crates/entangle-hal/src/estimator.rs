//! The estimator trait and backend configuration.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{HalError, HalResult};
use crate::job::{JobId, JobStatus};
use crate::options::EstimatorOptions;
use crate::primitive::EstimatorPub;
use crate::result::EstimatorResult;

/// Configuration for an estimator instance.
#[derive(Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    /// Name of the backend.
    pub name: String,
    /// API endpoint URL.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
    /// Authentication token.
    #[serde(skip_serializing)]
    pub token: Option<String>,
    /// Estimator options applied to every job.
    #[serde(default)]
    pub options: EstimatorOptions,
}

impl BackendConfig {
    /// Create a new backend configuration.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            endpoint: None,
            token: None,
            options: EstimatorOptions::default(),
        }
    }

    /// Set the endpoint URL.
    #[must_use]
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    /// Set the authentication token.
    #[must_use]
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Set the estimator options.
    #[must_use]
    pub fn with_options(mut self, options: EstimatorOptions) -> Self {
        self.options = options;
        self
    }
}

impl fmt::Debug for BackendConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BackendConfig")
            .field("name", &self.name)
            .field("endpoint", &self.endpoint)
            .field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
            .field("options", &self.options)
            .finish()
    }
}

/// Polling behaviour for [`Estimator::wait`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitConfig {
    /// Delay between status checks.
    pub poll_interval: Duration,
    /// Give up after this long. `None` waits indefinitely.
    pub timeout: Option<Duration>,
}

impl Default for WaitConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(2),
            timeout: None,
        }
    }
}

impl WaitConfig {
    /// Set a timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Set the poll interval.
    #[must_use]
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }
}

/// An estimator primitive: computes expectation values of observables on
/// the states prepared by circuits.
///
/// # Contract
///
/// - `run()` returns a job id and does not block on execution.
/// - `result()` is only valid once `status()` reports `Completed`;
///   implementations return [`HalError::JobPending`] before that.
/// - Each [`crate::result::PubResult`] lists values in the same order as the
///   observables of the matching pub.
#[async_trait]
pub trait Estimator: Send + Sync {
    /// Get the name of the backend executing the estimates.
    fn name(&self) -> &str;

    /// Options applied to every submitted job.
    fn options(&self) -> &EstimatorOptions;

    /// Submit pubs for estimation.
    async fn run(&self, pubs: Vec<EstimatorPub>) -> HalResult<JobId>;

    /// Get the status of a job.
    async fn status(&self, job_id: &JobId) -> HalResult<JobStatus>;

    /// Get the result of a completed job.
    async fn result(&self, job_id: &JobId) -> HalResult<EstimatorResult>;

    /// Cancel a queued or running job.
    async fn cancel(&self, job_id: &JobId) -> HalResult<()>;

    /// Poll until the job finishes and return its result.
    async fn wait(&self, job_id: &JobId, config: WaitConfig) -> HalResult<EstimatorResult> {
        let started = tokio::time::Instant::now();

        loop {
            let status = self.status(job_id).await?;
            debug!("job {job_id} status: {status}");

            match status {
                JobStatus::Completed => return self.result(job_id).await,
                JobStatus::Failed(msg) => return Err(HalError::JobFailed(msg)),
                JobStatus::Cancelled => return Err(HalError::JobCancelled),
                JobStatus::Queued | JobStatus::Running => {
                    if let Some(timeout) = config.timeout {
                        if started.elapsed() >= timeout {
                            return Err(HalError::Timeout(job_id.to_string()));
                        }
                    }
                    tokio::time::sleep(config.poll_interval).await;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::result::PubResult;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Reports `Running` for a fixed number of polls, then `final_status`.
    struct Scripted {
        polls_until_done: usize,
        polls: AtomicUsize,
        final_status: JobStatus,
        options: EstimatorOptions,
    }

    impl Scripted {
        fn new(polls_until_done: usize, final_status: JobStatus) -> Self {
            Self {
                polls_until_done,
                polls: AtomicUsize::new(0),
                final_status,
                options: EstimatorOptions::default(),
            }
        }
    }

    #[async_trait]
    impl Estimator for Scripted {
        fn name(&self) -> &str {
            "scripted"
        }

        fn options(&self) -> &EstimatorOptions {
            &self.options
        }

        async fn run(&self, _pubs: Vec<EstimatorPub>) -> HalResult<JobId> {
            Ok(JobId::new("scripted-job"))
        }

        async fn status(&self, _job_id: &JobId) -> HalResult<JobStatus> {
            let n = self.polls.fetch_add(1, Ordering::SeqCst);
            if n < self.polls_until_done {
                Ok(JobStatus::Running)
            } else {
                Ok(self.final_status.clone())
            }
        }

        async fn result(&self, job_id: &JobId) -> HalResult<EstimatorResult> {
            let pub_result = PubResult::new(vec!["ZZ".into()], vec![1.0], vec![0.0])?;
            Ok(EstimatorResult::new(job_id.clone(), vec![pub_result]))
        }

        async fn cancel(&self, _job_id: &JobId) -> HalResult<()> {
            Ok(())
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_polls_until_completed() {
        let est = Scripted::new(3, JobStatus::Completed);
        let result = est
            .wait(&JobId::new("scripted-job"), WaitConfig::default())
            .await
            .unwrap();
        assert_eq!(result.first().unwrap().evs, vec![1.0]);
        assert_eq!(est.polls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_surfaces_failure() {
        let est = Scripted::new(1, JobStatus::Failed("calibration".into()));
        let err = est
            .wait(&JobId::new("j"), WaitConfig::default())
            .await
            .unwrap_err();
        assert!(matches!(err, HalError::JobFailed(msg) if msg == "calibration"));

        let est = Scripted::new(0, JobStatus::Cancelled);
        let err = est.wait(&JobId::new("j"), WaitConfig::default()).await.unwrap_err();
        assert!(matches!(err, HalError::JobCancelled));
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_times_out() {
        let est = Scripted::new(usize::MAX, JobStatus::Completed);
        let config = WaitConfig::default()
            .with_poll_interval(Duration::from_secs(1))
            .with_timeout(Duration::from_secs(5));
        let err = est.wait(&JobId::new("slow"), config).await.unwrap_err();
        assert!(matches!(err, HalError::Timeout(id) if id == "slow"));
    }

    #[test]
    fn test_backend_config_redacts_token() {
        let config = BackendConfig::new("ibm_brisbane")
            .with_endpoint("https://quantum.cloud.ibm.com/api/v1")
            .with_token("secret-token");

        assert_eq!(config.token.as_deref(), Some("secret-token"));
        let debug = format!("{config:?}");
        assert!(debug.contains("[REDACTED]"));
        assert!(!debug.contains("secret-token"));

        let json = serde_json::to_string(&config).unwrap();
        assert!(!json.contains("secret-token"));
    }
}
