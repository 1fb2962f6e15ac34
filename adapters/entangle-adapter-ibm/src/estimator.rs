//! IBM Quantum estimator implementation.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::{debug, info, instrument, warn};

use entangle_hal::{
    Estimator, EstimatorOptions, EstimatorPub, EstimatorResult, HalError, HalResult, JobId,
    JobStatus, PubResult,
};
use entangle_qasm3::emit;

use crate::api::{BackendInfo, EstimatorPubPayload, IbmClient, JobResultResponse};
use crate::credentials::IbmCredentials;
use crate::error::{IbmError, IbmResult};

/// How long to cache backend info before refreshing from the API.
const BACKEND_INFO_TTL: Duration = Duration::from_secs(5 * 60);

/// Which device to run on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendSelector {
    /// A device by name, e.g. `ibm_brisbane`.
    Named(String),
    /// The operational device with the shortest queue.
    LeastBusy {
        /// Smallest acceptable device width.
        min_qubits: usize,
    },
}

/// Estimator primitive running on IBM Quantum hardware.
///
/// Circuits are sent as OpenQASM 3 with observables as Pauli labels.
/// Layout, routing, basis translation and dynamical decoupling are left to
/// the service, controlled through [`EstimatorOptions`].
pub struct IbmEstimator {
    client: Arc<IbmClient>,
    target: String,
    options: EstimatorOptions,
    backend_info: Arc<RwLock<Option<(BackendInfo, Instant)>>>,
    /// Labels of submitted pubs, keyed by job id. The service does not echo them.
    /// Entries are dropped once a job's result is returned or it fails.
    labels: Arc<RwLock<HashMap<String, Vec<Vec<String>>>>>,
}

impl IbmEstimator {
    /// Connect and resolve the target device.
    pub async fn connect(
        credentials: &IbmCredentials,
        selector: BackendSelector,
        options: EstimatorOptions,
    ) -> IbmResult<Self> {
        let client = IbmClient::from_credentials(credentials).await?;
        let (target, info) = match selector {
            BackendSelector::Named(name) => (name, None),
            BackendSelector::LeastBusy { min_qubits } => {
                let info = client.least_busy(min_qubits).await?;
                (info.name.clone(), Some((info, Instant::now())))
            }
        };

        let estimator = Self::with_client(client, target, options);
        *estimator.backend_info.write().await = info;
        Ok(estimator)
    }

    /// Wrap an existing client targeting `target`.
    pub fn with_client(client: IbmClient, target: impl Into<String>, options: EstimatorOptions) -> Self {
        Self {
            client: Arc::new(client),
            target: target.into(),
            options,
            backend_info: Arc::new(RwLock::new(None)),
            labels: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// The target device name.
    pub fn target(&self) -> &str {
        &self.target
    }

    /// The underlying API client.
    pub fn client(&self) -> &IbmClient {
        &self.client
    }

    /// Record observable labels for a job submitted elsewhere, so that
    /// [`Estimator::result`] can attach them.
    pub async fn remember_labels(&self, job_id: &JobId, labels: Vec<Vec<String>>) {
        self.labels.write().await.insert(job_id.0.clone(), labels);
    }

    async fn forget_labels(&self, job_id: &JobId) {
        if self.labels.write().await.remove(&job_id.0).is_some() {
            debug!("dropped labels for job {job_id}");
        }
    }

    /// Failed and cancelled jobs never produce results to label.
    fn ends_without_results(status: &JobStatus) -> bool {
        matches!(status, JobStatus::Failed(_) | JobStatus::Cancelled)
    }

    /// Backend information, fetched from the API if not cached or stale.
    pub async fn backend_info(&self) -> IbmResult<BackendInfo> {
        {
            let cached = self.backend_info.read().await;
            if let Some((ref info, fetched_at)) = *cached {
                if fetched_at.elapsed() < BACKEND_INFO_TTL {
                    return Ok(info.clone());
                }
            }
        }

        let info = self.client.get_backend(&self.target).await?;
        *self.backend_info.write().await = Some((info.clone(), Instant::now()));
        Ok(info)
    }

    fn to_payload(pub_: &EstimatorPub) -> EstimatorPubPayload {
        EstimatorPubPayload {
            qasm: emit(pub_.circuit()),
            observables: pub_.observables().labels(),
            precision: pub_.precision(),
        }
    }

    fn check_backend(info: &BackendInfo, pubs: &[EstimatorPub]) -> IbmResult<()> {
        if !info.status.operational {
            return Err(IbmError::BackendUnavailable(
                info.status
                    .status_msg
                    .clone()
                    .unwrap_or_else(|| format!("{} is offline", info.name)),
            ));
        }
        if let Some(widest) = pubs.iter().map(|p| p.circuit().num_qubits()).max() {
            if widest > info.num_qubits {
                return Err(IbmError::TooManyQubits {
                    required: widest,
                    available: info.num_qubits,
                });
            }
        }
        Ok(())
    }

    /// Convert the raw response into pub results, attaching labels.
    fn convert_results(
        job_id: &JobId,
        response: JobResultResponse,
        labels: Option<Vec<Vec<String>>>,
    ) -> IbmResult<EstimatorResult> {
        let mut labels = labels.unwrap_or_default().into_iter();
        let mut pubs = Vec::with_capacity(response.results.len());

        for (index, raw) in response.results.into_iter().enumerate() {
            let evs = raw.data.evs.into_vec();
            let stds = match raw.data.stds {
                Some(stds) => stds.into_vec(),
                None => {
                    warn!("pub {index} of job {job_id} has no stds");
                    vec![f64::NAN; evs.len()]
                }
            };
            let pub_labels = labels
                .next()
                .filter(|l| l.len() == evs.len())
                .unwrap_or_else(|| (0..evs.len()).map(|i| format!("obs{i}")).collect());

            let result = PubResult::new(pub_labels, evs, stds)
                .map_err(|e| IbmError::MalformedResult(format!("pub {index}: {e}")))?;
            pubs.push(match raw.metadata {
                Some(metadata) => result.with_metadata(metadata),
                None => result,
            });
        }

        Ok(EstimatorResult::new(job_id.clone(), pubs))
    }
}

#[async_trait]
impl Estimator for IbmEstimator {
    fn name(&self) -> &str {
        &self.target
    }

    fn options(&self) -> &EstimatorOptions {
        &self.options
    }

    #[instrument(skip(self, pubs), fields(backend = %self.target))]
    async fn run(&self, pubs: Vec<EstimatorPub>) -> HalResult<JobId> {
        self.options.validate()?;
        if pubs.is_empty() {
            return Err(HalError::InvalidPub("no pubs submitted".into()));
        }

        let info = self.backend_info().await?;
        Self::check_backend(&info, &pubs)?;

        let labels: Vec<Vec<String>> = pubs.iter().map(|p| p.observables().labels()).collect();
        let payload: Vec<EstimatorPubPayload> = pubs.iter().map(Self::to_payload).collect();

        let response = self
            .client
            .submit_estimator_job(&self.target, payload, &self.options)
            .await
            .map_err(|e| HalError::SubmissionFailed(e.to_string()))?;

        let job_id = JobId(response.id);
        info!("submitted job {job_id} to {}", self.target);
        self.remember_labels(&job_id, labels).await;
        Ok(job_id)
    }

    async fn status(&self, job_id: &JobId) -> HalResult<JobStatus> {
        let status = self.client.get_job_status(&job_id.0).await?;
        let job_status = status.job_status();
        debug!("job {job_id}: {} -> {job_status}", status.status);
        if Self::ends_without_results(&job_status) {
            self.forget_labels(job_id).await;
        }
        Ok(job_status)
    }

    async fn result(&self, job_id: &JobId) -> HalResult<EstimatorResult> {
        let status = self.client.get_job_status(&job_id.0).await?.job_status();
        if Self::ends_without_results(&status) {
            self.forget_labels(job_id).await;
        }
        match status {
            JobStatus::Completed => {}
            JobStatus::Failed(msg) => return Err(HalError::JobFailed(msg)),
            JobStatus::Cancelled => return Err(HalError::JobCancelled),
            JobStatus::Queued | JobStatus::Running => {
                return Err(HalError::JobPending(job_id.0.clone()));
            }
        }

        let response = self.client.get_job_results(&job_id.0).await?;
        let labels = self.labels.read().await.get(&job_id.0).cloned();
        let result = Self::convert_results(job_id, response, labels)?;
        self.forget_labels(job_id).await;
        Ok(result)
    }

    async fn cancel(&self, job_id: &JobId) -> HalResult<()> {
        self.client.cancel_job(&job_id.0).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{BackendStatus, JobStatusResponse};
    use entangle_ir::library;

    fn device(num_qubits: usize, operational: bool) -> BackendInfo {
        BackendInfo {
            name: "ibm_test".into(),
            num_qubits,
            status: BackendStatus {
                operational,
                status_msg: None,
                pending_jobs: Some(0),
            },
            processor_type: None,
            simulator: false,
        }
    }

    fn ghz_pub(n: u32) -> EstimatorPub {
        EstimatorPub::new(
            library::ghz(n).unwrap(),
            library::ghz_correlators(n as usize).unwrap(),
        )
        .unwrap()
    }

    #[test]
    fn test_payload_from_pub() {
        let payload = IbmEstimator::to_payload(&ghz_pub(3).with_precision(0.02).unwrap());
        assert!(payload.qasm.starts_with("OPENQASM 3.0;"));
        assert!(payload.qasm.contains("cx q[1], q[2];"));
        assert_eq!(payload.observables, vec!["ZZI", "ZIZ"]);
        assert_eq!(payload.precision, Some(0.02));
    }

    #[test]
    fn test_check_backend() {
        let pubs = vec![ghz_pub(10)];
        assert!(IbmEstimator::check_backend(&device(127, true), &pubs).is_ok());
        assert!(matches!(
            IbmEstimator::check_backend(&device(5, true), &pubs),
            Err(IbmError::TooManyQubits {
                required: 10,
                available: 5
            })
        ));
        assert!(matches!(
            IbmEstimator::check_backend(&device(127, false), &pubs),
            Err(IbmError::BackendUnavailable(_))
        ));
    }

    #[test]
    fn test_convert_results_with_labels() {
        let response: JobResultResponse = serde_json::from_str(
            r#"{"results": [{"data": {"evs": [0.9, 0.8], "stds": [0.01, 0.02]},
                             "metadata": {"shots": 4096}}]}"#,
        )
        .unwrap();
        let labels = Some(vec![vec!["ZZI".to_string(), "ZIZ".to_string()]]);
        let result =
            IbmEstimator::convert_results(&JobId::new("d1"), response, labels).unwrap();
        let r = result.first().unwrap();
        assert_eq!(r.labels, vec!["ZZI", "ZIZ"]);
        assert_eq!(r.ev("ZIZ"), Some(0.8));
        assert_eq!(r.metadata["shots"], 4096);
    }

    #[test]
    fn test_convert_results_without_labels() {
        let response: JobResultResponse =
            serde_json::from_str(r#"{"results": [{"data": {"evs": [0.7, 0.6, 0.5]}}]}"#).unwrap();
        let result = IbmEstimator::convert_results(&JobId::new("d2"), response, None).unwrap();
        let r = result.first().unwrap();
        assert_eq!(r.labels, vec!["obs0", "obs1", "obs2"]);
        assert!(r.stds.iter().all(|s| s.is_nan()));
    }

    #[test]
    fn test_convert_results_rejects_ragged() {
        let response: JobResultResponse = serde_json::from_str(
            r#"{"results": [{"data": {"evs": [0.7, 0.6], "stds": [0.1]}}]}"#,
        )
        .unwrap();
        let err = IbmEstimator::convert_results(&JobId::new("d3"), response, None).unwrap_err();
        assert!(matches!(err, IbmError::MalformedResult(_)));
    }

    #[test]
    fn test_status_mapping() {
        let status = |s: &str| JobStatusResponse {
            id: "j".into(),
            status: s.into(),
            backend: None,
            created: None,
            error: None,
            state: None,
        };
        assert_eq!(status("Queued").job_status(), JobStatus::Queued);
        assert_eq!(status("Running").job_status(), JobStatus::Running);
        assert_eq!(status("Completed").job_status(), JobStatus::Completed);
        assert_eq!(
            status("Cancelled - Ran too long").job_status(),
            JobStatus::Cancelled
        );
        assert!(matches!(
            status("Failed").job_status(),
            JobStatus::Failed(_)
        ));
    }

    #[tokio::test]
    async fn test_remembered_labels() {
        let client = IbmClient::new("https://example.invalid", "token").unwrap();
        let est = IbmEstimator::with_client(client, "ibm_brisbane", EstimatorOptions::default());
        let id = JobId::new("d4");
        est.remember_labels(&id, vec![vec!["ZZ".into()]]).await;
        assert_eq!(
            est.labels.read().await.get("d4"),
            Some(&vec![vec!["ZZ".to_string()]])
        );
        assert_eq!(est.name(), "ibm_brisbane");
    }

    #[tokio::test]
    async fn test_labels_released_per_job() {
        let client = IbmClient::new("https://example.invalid", "token").unwrap();
        let est = IbmEstimator::with_client(client, "ibm_brisbane", EstimatorOptions::default());
        let (done, queued) = (JobId::new("d5"), JobId::new("d6"));
        est.remember_labels(&done, vec![vec!["ZZ".into()]]).await;
        est.remember_labels(&queued, vec![vec!["XX".into()]]).await;

        est.forget_labels(&done).await;
        est.forget_labels(&JobId::new("unknown")).await;
        let labels = est.labels.read().await;
        assert_eq!(labels.len(), 1);
        assert!(labels.contains_key("d6"));
    }

    #[test]
    fn test_terminal_failures_release_labels() {
        assert!(IbmEstimator::ends_without_results(&JobStatus::Cancelled));
        assert!(IbmEstimator::ends_without_results(&JobStatus::Failed("x".into())));
        for kept in [JobStatus::Queued, JobStatus::Running, JobStatus::Completed] {
            assert!(!IbmEstimator::ends_without_results(&kept));
        }
    }
}
