//! IBM Quantum Platform API client.
//!
//! Covers the subset of the REST API the estimator needs:
//! - Authentication via IAM token exchange, or a direct legacy token
//! - Listing backends with their configuration and queue length
//! - Submitting Estimator V2 jobs
//! - Polling job status, retrieving `evs`/`stds`, cancelling

use reqwest::{Client, StatusCode, header};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::time::Duration;
use tracing::{debug, info, warn};

use entangle_hal::{EstimatorOptions, JobStatus};

use crate::credentials::IbmCredentials;
use crate::error::{IbmError, IbmResult};

/// Default IBM Quantum Cloud API endpoint.
pub const DEFAULT_ENDPOINT: &str = "https://quantum.cloud.ibm.com/api";

/// Legacy IBM Quantum API endpoint.
pub const LEGACY_ENDPOINT: &str = "https://api.quantum-computing.ibm.com";

/// IBM Cloud IAM token endpoint.
const IAM_TOKEN_URL: &str = "https://iam.cloud.ibm.com/identity/token";

/// IBM API version header value.
const IBM_API_VERSION: &str = "2025-05-01";

/// User-Agent sent with requests; the default reqwest agent is rejected upstream.
const USER_AGENT: &str = concat!("entangle/", env!("CARGO_PKG_VERSION"));

/// Authenticated HTTP client for one IBM Quantum channel.
pub struct IbmClient {
    client: Client,
    endpoint: String,
    cloud_api: bool,
}

impl fmt::Debug for IbmClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IbmClient")
            .field("endpoint", &self.endpoint)
            .field("token", &"[REDACTED]")
            .field("cloud_api", &self.cloud_api)
            .finish()
    }
}

/// IAM token response from `iam.cloud.ibm.com`.
#[derive(Debug, Deserialize)]
struct IamTokenResponse {
    access_token: String,
}

fn default_headers(bearer: &str) -> IbmResult<header::HeaderMap> {
    let mut headers = header::HeaderMap::new();
    headers.insert(
        header::AUTHORIZATION,
        header::HeaderValue::from_str(&format!("Bearer {bearer}"))
            .map_err(|_| IbmError::InvalidToken)?,
    );
    headers.insert(
        header::CONTENT_TYPE,
        header::HeaderValue::from_static("application/json"),
    );
    headers.insert(
        header::ACCEPT,
        header::HeaderValue::from_static("application/json"),
    );
    Ok(headers)
}

fn build_client(headers: header::HeaderMap) -> IbmResult<Client> {
    Ok(Client::builder()
        .user_agent(USER_AGENT)
        .default_headers(headers)
        .timeout(Duration::from_secs(60))
        .connect_timeout(Duration::from_secs(10))
        .build()?)
}

impl IbmClient {
    /// Create a client for the legacy endpoint using a direct bearer token.
    pub fn new(endpoint: impl Into<String>, token: &str) -> IbmResult<Self> {
        Ok(Self {
            client: build_client(default_headers(token)?)?,
            endpoint: endpoint.into(),
            cloud_api: false,
        })
    }

    /// Create a client for the IBM Cloud API.
    ///
    /// Exchanges the API key for an IAM bearer token and sets the
    /// `Service-CRN` and `IBM-API-Version` headers on every request.
    pub async fn connect(api_key: &str, service_crn: &str) -> IbmResult<Self> {
        let iam_client = Client::builder()
            .timeout(Duration::from_secs(30))
            .connect_timeout(Duration::from_secs(10))
            .build()?;

        let iam_response = iam_client
            .post(IAM_TOKEN_URL)
            .form(&[
                ("grant_type", "urn:ibm:params:oauth:grant-type:apikey"),
                ("apikey", api_key),
            ])
            .send()
            .await
            .map_err(|e| IbmError::IamTokenExchange(e.to_string()))?;

        if !iam_response.status().is_success() {
            let status = iam_response.status();
            let body = iam_response
                .text()
                .await
                .unwrap_or_else(|_| "no body".to_string());
            return Err(IbmError::IamTokenExchange(format!(
                "IAM returned {status}: {body}"
            )));
        }

        let iam_token: IamTokenResponse = iam_response.json().await.map_err(|e| {
            IbmError::IamTokenExchange(format!("failed to parse IAM response: {e}"))
        })?;

        let mut headers = default_headers(&iam_token.access_token)?;
        headers.insert(
            header::HeaderName::from_static("service-crn"),
            header::HeaderValue::from_str(service_crn)
                .map_err(|_| IbmError::InvalidParameter("invalid Service-CRN value".into()))?,
        );
        headers.insert(
            header::HeaderName::from_static("ibm-api-version"),
            header::HeaderValue::from_static(IBM_API_VERSION),
        );

        Ok(Self {
            client: build_client(headers)?,
            endpoint: DEFAULT_ENDPOINT.to_string(),
            cloud_api: true,
        })
    }

    /// Connect with whichever channel `credentials` selects.
    pub async fn from_credentials(credentials: &IbmCredentials) -> IbmResult<Self> {
        match credentials {
            IbmCredentials::Cloud {
                api_key,
                service_crn,
            } => {
                info!("connecting to IBM Cloud API (IAM key exchange)");
                Self::connect(api_key, service_crn).await
            }
            IbmCredentials::Legacy { token } => {
                info!("using legacy IBM Quantum token");
                Self::new(LEGACY_ENDPOINT, token)
            }
        }
    }

    /// `true` for the IBM Cloud channel.
    pub fn is_cloud_api(&self) -> bool {
        self.cloud_api
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Every device visible to these credentials.
    ///
    /// The cloud API only returns device names, so configuration and status
    /// are fetched per device. Devices that fail to load are skipped.
    pub async fn list_backends(&self) -> IbmResult<Vec<BackendInfo>> {
        let url = format!("{}/v1/backends", self.endpoint);
        let response = self.client.get(&url).send().await?;
        let response = check(response, "list backends").await?;

        if !self.cloud_api {
            let backends: LegacyBackendsResponse = response.json().await?;
            return Ok(backends.backends);
        }

        let devices: DevicesResponse = response.json().await?;
        let mut backends = Vec::with_capacity(devices.devices.len());
        for device in &devices.devices {
            match self.get_backend(&device.name).await {
                Ok(info) => backends.push(info),
                Err(e) => warn!("skipping backend {}: {e}", device.name),
            }
        }
        Ok(backends)
    }

    /// Configuration and queue state of one device.
    pub async fn get_backend(&self, name: &str) -> IbmResult<BackendInfo> {
        if !self.cloud_api {
            let url = format!("{}/v1/backends/{name}", self.endpoint);
            let response = self.client.get(&url).send().await?;
            if response.status() == StatusCode::NOT_FOUND {
                return Err(IbmError::BackendUnavailable(name.to_string()));
            }
            let response = check(response, "get backend").await?;
            return Ok(response.json().await?);
        }

        let config_url = format!("{}/v1/backends/{name}/configuration", self.endpoint);
        let config_response = self.client.get(&config_url).send().await?;
        if config_response.status() == StatusCode::NOT_FOUND {
            return Err(IbmError::BackendUnavailable(name.to_string()));
        }
        let config: BackendConfigResponse = check(config_response, "backend configuration")
            .await?
            .json()
            .await?;

        let status_url = format!("{}/v1/backends/{name}/status", self.endpoint);
        let status_response = self.client.get(&status_url).send().await?;
        let status = if status_response.status().is_success() {
            let s: BackendStatusResponse = status_response.json().await?;
            BackendStatus {
                operational: s.state,
                status_msg: Some(s.status),
                pending_jobs: Some(u32::try_from(s.length_queue).unwrap_or(u32::MAX)),
            }
        } else {
            // Configuration loaded, so treat the device as up with unknown queue.
            BackendStatus {
                operational: true,
                status_msg: None,
                pending_jobs: None,
            }
        };

        Ok(BackendInfo {
            name: config.backend_name,
            num_qubits: config.n_qubits,
            status,
            processor_type: config.processor_type,
            simulator: config.simulator.unwrap_or(false),
        })
    }

    /// The operational hardware backend with the shortest queue that has at
    /// least `min_qubits` qubits.
    pub async fn least_busy(&self, min_qubits: usize) -> IbmResult<BackendInfo> {
        let backends = self.list_backends().await?;
        let chosen = select_least_busy(backends, min_qubits)?;
        info!(
            "least busy backend: {} ({} pending jobs)",
            chosen.name,
            chosen.status.pending_jobs.unwrap_or(0)
        );
        Ok(chosen)
    }

    /// Submit an Estimator V2 job and return the service job id.
    pub async fn submit_estimator_job(
        &self,
        backend: &str,
        pubs: Vec<EstimatorPubPayload>,
        options: &EstimatorOptions,
    ) -> IbmResult<SubmitResponse> {
        let url = format!("{}/v1/jobs", self.endpoint);
        let request = EstimatorJobRequest::new(backend, pubs, options);
        debug!("submitting estimator job to {backend}");

        let response = self.client.post(&url).json(&request).send().await?;
        let response = check(response, "job submission").await?;
        Ok(response.json().await?)
    }

    /// Poll one job.
    pub async fn get_job_status(&self, job_id: &str) -> IbmResult<JobStatusResponse> {
        let url = format!("{}/v1/jobs/{job_id}", self.endpoint);
        let response = self.client.get(&url).send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Err(IbmError::JobNotFound(job_id.to_string()));
        }
        Ok(check(response, "job status").await?.json().await?)
    }

    /// Download `evs`/`stds` for a completed job.
    pub async fn get_job_results(&self, job_id: &str) -> IbmResult<JobResultResponse> {
        let url = format!("{}/v1/jobs/{job_id}/results", self.endpoint);
        let response = self.client.get(&url).send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Err(IbmError::JobNotFound(job_id.to_string()));
        }
        Ok(check(response, "job results").await?.json().await?)
    }

    /// Ask the service to stop a job.
    pub async fn cancel_job(&self, job_id: &str) -> IbmResult<()> {
        let url = format!("{}/v1/jobs/{job_id}/cancel", self.endpoint);
        let response = self.client.post(&url).send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Err(IbmError::JobNotFound(job_id.to_string()));
        }
        check(response, "job cancel").await?;
        Ok(())
    }
}

/// Turn a non-success response into [`IbmError::ApiError`].
async fn check(response: reqwest::Response, context: &str) -> IbmResult<reqwest::Response> {
    if response.status().is_success() {
        return Ok(response);
    }
    let status = response.status();
    let body = response
        .text()
        .await
        .unwrap_or_else(|_| "no body".to_string());
    let (code, message) = match serde_json::from_str::<ApiErrorResponse>(&body) {
        Ok(err) if !err.message.is_empty() => (err.code, err.message),
        _ => (None, body),
    };
    Err(IbmError::ApiError {
        code,
        message: format!("{context} failed ({status}): {message}"),
    })
}

/// Pick the operational non-simulator backend with the fewest pending jobs.
///
/// Ties keep the first backend listed. An unknown queue length sorts last.
pub fn select_least_busy(backends: Vec<BackendInfo>, min_qubits: usize) -> IbmResult<BackendInfo> {
    backends
        .into_iter()
        .filter(|b| b.status.operational && !b.simulator && b.num_qubits >= min_qubits)
        .min_by_key(|b| b.status.pending_jobs.unwrap_or(u32::MAX))
        .ok_or(IbmError::NoBackendAvailable { min_qubits })
}

/// One Estimator V2 pub on the wire: `[qasm, [labels...], precision?]`.
#[derive(Debug, Clone, PartialEq)]
pub struct EstimatorPubPayload {
    /// OpenQASM 3 circuit.
    pub qasm: String,
    /// Observable labels.
    pub observables: Vec<String>,
    /// Per-pub precision.
    pub precision: Option<f64>,
}

impl Serialize for EstimatorPubPayload {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeSeq;

        let len = if self.precision.is_some() { 3 } else { 2 };
        let mut seq = serializer.serialize_seq(Some(len))?;
        seq.serialize_element(&self.qasm)?;
        seq.serialize_element(&self.observables)?;
        if let Some(precision) = self.precision {
            seq.serialize_element(&precision)?;
        }
        seq.end()
    }
}

/// Estimator job request.
#[derive(Debug, Serialize)]
struct EstimatorJobRequest<'a> {
    program_id: &'static str,
    backend: &'a str,
    params: EstimatorParams<'a>,
}

#[derive(Debug, Serialize)]
struct EstimatorParams<'a> {
    version: u8,
    pubs: Vec<EstimatorPubPayload>,
    options: EstimatorOptionsPayload<'a>,
}

/// Options as the runtime expects them. Local-only fields are dropped.
#[derive(Debug, Serialize)]
struct EstimatorOptionsPayload<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    default_precision: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    default_shots: Option<u32>,
    resilience_level: u8,
    optimization_level: u8,
    dynamical_decoupling: &'a entangle_hal::DynamicalDecouplingOptions,
}

impl<'a> EstimatorJobRequest<'a> {
    fn new(backend: &'a str, pubs: Vec<EstimatorPubPayload>, options: &'a EstimatorOptions) -> Self {
        Self {
            program_id: "estimator",
            backend,
            params: EstimatorParams {
                version: 2,
                pubs,
                options: EstimatorOptionsPayload {
                    default_precision: options.default_precision,
                    default_shots: options.default_shots,
                    resilience_level: options.resilience_level,
                    optimization_level: options.optimization_level,
                    dynamical_decoupling: &options.dynamical_decoupling,
                },
            },
        }
    }
}

/// Error body returned with non-2xx responses.
#[derive(Debug, Deserialize)]
struct ApiErrorResponse {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    message: String,
}

/// Cloud API device list (`{"devices": [...]}`).
#[derive(Debug, Deserialize)]
struct DevicesResponse {
    devices: Vec<DeviceEntry>,
}

#[derive(Debug, Deserialize)]
struct DeviceEntry {
    name: String,
}

/// Legacy API backend list (`{"backends": [...]}`).
#[derive(Debug, Deserialize)]
struct LegacyBackendsResponse {
    backends: Vec<BackendInfo>,
}

/// Cloud API `/backends/{name}/configuration`.
#[derive(Debug, Deserialize)]
struct BackendConfigResponse {
    backend_name: String,
    n_qubits: usize,
    #[serde(default)]
    processor_type: Option<ProcessorType>,
    #[serde(default)]
    simulator: Option<bool>,
}

/// Cloud API `/backends/{name}/status`.
#[derive(Debug, Deserialize)]
struct BackendStatusResponse {
    state: bool,
    #[serde(default)]
    status: String,
    #[serde(default)]
    length_queue: u64,
}

/// A device as listed by either API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendInfo {
    pub name: String,
    pub num_qubits: usize,
    pub status: BackendStatus,
    #[serde(default)]
    pub processor_type: Option<ProcessorType>,
    #[serde(default)]
    pub simulator: bool,
}

/// Availability and queue depth of a device.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendStatus {
    pub operational: bool,
    #[serde(default)]
    pub status_msg: Option<String>,
    /// Queue length; `None` when the API does not say.
    #[serde(default)]
    pub pending_jobs: Option<u32>,
}

/// Processor generation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessorType {
    /// "Eagle", "Heron", ...
    pub family: String,
    #[serde(default)]
    pub revision: Option<String>,
}

/// Reply to a job submission.
#[derive(Debug, Deserialize)]
pub struct SubmitResponse {
    pub id: String,
    /// Device the service placed the job on.
    #[serde(default)]
    pub backend: Option<String>,
}

/// `GET /jobs/{id}` as returned by either API.
#[derive(Debug, Clone, Deserialize)]
pub struct JobStatusResponse {
    pub id: String,
    /// Raw state string; see [`JobStatusResponse::job_status`].
    pub status: String,
    #[serde(default)]
    pub backend: Option<String>,
    #[serde(default)]
    pub created: Option<String>,
    /// Legacy API failure detail.
    #[serde(default)]
    pub error: Option<JobError>,
    /// Cloud API failure detail.
    #[serde(default)]
    pub state: Option<JobState>,
}

/// Legacy `error` block.
#[derive(Debug, Clone, Deserialize)]
pub struct JobError {
    pub message: String,
}

/// Cloud `state` block.
#[derive(Debug, Clone, Deserialize)]
pub struct JobState {
    #[serde(default)]
    pub reason: Option<String>,
}

impl JobStatusResponse {
    /// Lifecycle state. The cloud API reports mixed case ("Completed"), the
    /// legacy API upper case; unknown states count as running.
    pub fn job_status(&self) -> JobStatus {
        match self.status.to_uppercase().as_str() {
            "QUEUED" | "INITIALIZING" => JobStatus::Queued,
            "VALIDATING" | "RUNNING" => JobStatus::Running,
            "COMPLETED" => JobStatus::Completed,
            "FAILED" | "ERROR" => JobStatus::Failed(
                self.error_message()
                    .unwrap_or_else(|| "no reason given".to_string()),
            ),
            s if s.starts_with("CANCELLED") => JobStatus::Cancelled,
            _ => JobStatus::Running,
        }
    }

    fn error_message(&self) -> Option<String> {
        self.state
            .as_ref()
            .and_then(|s| s.reason.clone())
            .or_else(|| self.error.as_ref().map(|e| e.message.clone()))
    }
}

/// `GET /jobs/{id}/results` for an estimator job.
#[derive(Debug, Deserialize)]
pub struct JobResultResponse {
    /// One entry per submitted pub.
    pub results: Vec<EstimatorPubResponse>,
    /// Job-level metadata.
    #[serde(default)]
    pub metadata: Option<Value>,
}

/// Estimator result for one pub.
#[derive(Debug, Deserialize)]
pub struct EstimatorPubResponse {
    /// Expectation values and standard errors.
    pub data: EstimatorData,
    /// Pub-level metadata.
    #[serde(default)]
    pub metadata: Option<Value>,
}

/// `data` block of an estimator pub result.
#[derive(Debug, Deserialize)]
pub struct EstimatorData {
    /// Expectation values.
    pub evs: Values,
    /// Standard errors.
    #[serde(default)]
    pub stds: Option<Values>,
}

/// A scalar or a flat array; a single-observable pub returns a scalar.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum Values {
    /// Single value.
    Scalar(f64),
    /// One value per observable.
    Array(Vec<f64>),
}

impl Values {
    /// Flatten into a vector.
    pub fn into_vec(self) -> Vec<f64> {
        match self {
            Values::Scalar(v) => vec![v],
            Values::Array(v) => v,
        }
    }
}
