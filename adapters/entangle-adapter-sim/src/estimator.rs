//! Statevector estimator implementation.

use async_trait::async_trait;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand_distr::{Distribution, Normal};
use rustc_hash::FxHashMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Instant;
use tracing::{debug, instrument};
use uuid::Uuid;

use entangle_hal::{
    BackendConfig, Estimator, EstimatorOptions, EstimatorPub, EstimatorResult, HalError,
    HalResult, JobId, JobRecord, JobStatus, PubResult,
};

use crate::statevector::Statevector;

/// Default qubit ceiling; a 24-qubit state is 256 MiB of amplitudes.
pub(crate) const DEFAULT_MAX_QUBITS: usize = 24;

/// Job data for the simulator.
struct SimJob {
    record: JobRecord,
    result: Option<EstimatorResult>,
}

/// Local estimator backed by exact statevector simulation.
///
/// Jobs execute synchronously inside [`Estimator::run`], so they are already
/// `Completed` by the time the id is returned. With no precision requested
/// the values are exact and every standard error is zero. A positive precision
/// adds Gaussian noise with that standard deviation, clamped to `[-1, 1]`.
pub struct StatevectorEstimator {
    config: BackendConfig,
    jobs: Arc<Mutex<FxHashMap<String, SimJob>>>,
    rng: Mutex<StdRng>,
    max_qubits: usize,
}

impl StatevectorEstimator {
    /// Create an estimator with default options.
    pub fn new() -> Self {
        Self::from_config(BackendConfig::new("statevector"))
    }

    /// Create an estimator from a configuration.
    ///
    /// `options.seed` makes the added noise reproducible.
    pub fn from_config(config: BackendConfig) -> Self {
        let rng = match config.options.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            config,
            jobs: Arc::new(Mutex::new(FxHashMap::default())),
            rng: Mutex::new(rng),
            max_qubits: DEFAULT_MAX_QUBITS,
        }
    }

    /// Override the estimator options.
    #[must_use]
    pub fn with_options(self, options: EstimatorOptions) -> Self {
        Self::from_config(self.config.with_options(options)).with_max_qubits(self.max_qubits)
    }

    /// Override the qubit ceiling.
    #[must_use]
    pub fn with_max_qubits(mut self, max_qubits: usize) -> Self {
        self.max_qubits = max_qubits;
        self
    }

    /// Maximum circuit width accepted by [`Estimator::run`].
    pub fn max_qubits(&self) -> usize {
        self.max_qubits
    }

    fn check_pub(&self, pub_: &EstimatorPub) -> HalResult<()> {
        let width = pub_.circuit().num_qubits();
        if width > self.max_qubits {
            return Err(HalError::CircuitTooLarge(format!(
                "Circuit has {width} qubits but simulator only supports {}",
                self.max_qubits
            )));
        }
        Ok(())
    }

    #[instrument(skip(self, pub_), fields(circuit = pub_.circuit().name()))]
    fn estimate(&self, pub_: &EstimatorPub) -> HalResult<PubResult> {
        let sv = Statevector::from_circuit(pub_.circuit());
        debug!(
            "Prepared {}-qubit state for {} observables",
            sv.num_qubits(),
            pub_.observables().len()
        );

        let exact: Vec<f64> = pub_.observables().iter().map(|o| sv.expectation(o)).collect();
        let precision = pub_
            .effective_precision(self.config.options.default_precision)
            .unwrap_or(0.0);

        let evs = if precision > 0.0 {
            let noise = Normal::new(0.0, precision)
                .map_err(|e| HalError::InvalidPub(format!("precision {precision}: {e}")))?;
            let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
            exact
                .iter()
                .map(|v| (v + noise.sample(&mut *rng)).clamp(-1.0, 1.0))
                .collect()
        } else {
            exact
        };
        let stds = vec![precision; evs.len()];

        PubResult::new(pub_.observables().labels(), evs, stds)
    }
}

impl Default for StatevectorEstimator {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Estimator for StatevectorEstimator {
    fn name(&self) -> &str {
        &self.config.name
    }

    fn options(&self) -> &EstimatorOptions {
        &self.config.options
    }

    #[instrument(skip(self, pubs))]
    async fn run(&self, pubs: Vec<EstimatorPub>) -> HalResult<JobId> {
        self.config.options.validate()?;
        if pubs.is_empty() {
            return Err(HalError::InvalidPub("no pubs submitted".into()));
        }
        for pub_ in &pubs {
            self.check_pub(pub_)?;
        }

        let job_id = JobId::new(Uuid::new_v4().to_string());
        {
            let mut jobs = self.jobs.lock().unwrap_or_else(PoisonError::into_inner);
            jobs.insert(
                job_id.0.clone(),
                SimJob {
                    record: JobRecord::submitted(job_id.clone(), self.name(), pubs.len()),
                    result: None,
                },
            );
        }
        debug!("Submitted job: {}", job_id);

        let start = Instant::now();
        let outcome = pubs
            .iter()
            .map(|p| self.estimate(p))
            .collect::<HalResult<Vec<_>>>();
        let elapsed = start.elapsed();
        debug!("Estimation completed in {:?}", elapsed);

        let mut jobs = self.jobs.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(sim_job) = jobs.get_mut(&job_id.0) {
            match outcome {
                Ok(pub_results) => {
                    sim_job.result = Some(
                        EstimatorResult::new(job_id.clone(), pub_results)
                            .with_execution_time(elapsed),
                    );
                    sim_job.record.advance(JobStatus::Completed);
                }
                Err(e) => {
                    sim_job.record.advance(JobStatus::Failed(e.to_string()));
                }
            }
        }

        Ok(job_id)
    }

    async fn status(&self, job_id: &JobId) -> HalResult<JobStatus> {
        let jobs = self.jobs.lock().unwrap_or_else(PoisonError::into_inner);
        jobs.get(&job_id.0)
            .map(|j| j.record.status.clone())
            .ok_or_else(|| HalError::JobNotFound(job_id.0.clone()))
    }

    async fn result(&self, job_id: &JobId) -> HalResult<EstimatorResult> {
        let jobs = self.jobs.lock().unwrap_or_else(PoisonError::into_inner);
        let sim_job = jobs
            .get(&job_id.0)
            .ok_or_else(|| HalError::JobNotFound(job_id.0.clone()))?;
        match (&sim_job.record.status, &sim_job.result) {
            (JobStatus::Completed, Some(result)) => Ok(result.clone()),
            (JobStatus::Failed(msg), _) => Err(HalError::JobFailed(msg.clone())),
            (JobStatus::Cancelled, _) => Err(HalError::JobCancelled),
            _ => Err(HalError::JobPending(job_id.0.clone())),
        }
    }

    async fn cancel(&self, job_id: &JobId) -> HalResult<()> {
        let mut jobs = self.jobs.lock().unwrap_or_else(PoisonError::into_inner);
        let sim_job = jobs
            .get_mut(&job_id.0)
            .ok_or_else(|| HalError::JobNotFound(job_id.0.clone()))?;
        if !sim_job.record.advance(JobStatus::Cancelled) {
            debug!("job {job_id} already {}", sim_job.record.status.label());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use entangle_hal::WaitConfig;
    use entangle_ir::library;

    fn bell_pub() -> EstimatorPub {
        EstimatorPub::new(
            library::bell().unwrap(),
            library::bell_observables().unwrap(),
        )
        .unwrap()
    }

    fn ghz_pub(n: u32) -> EstimatorPub {
        EstimatorPub::new(
            library::ghz(n).unwrap(),
            library::ghz_correlators(n as usize).unwrap(),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_bell_exact() {
        let est = StatevectorEstimator::new();
        let job_id = est.run(vec![bell_pub()]).await.unwrap();
        assert_eq!(est.status(&job_id).await.unwrap(), JobStatus::Completed);

        let result = est.wait(&job_id, WaitConfig::default()).await.unwrap();
        let r = result.first().unwrap();
        assert_eq!(r.labels, vec!["IZ", "IX", "ZI", "XI", "ZZ", "XX"]);
        let expected = [0.0, 0.0, 0.0, 0.0, 1.0, 1.0];
        for (ev, want) in r.evs.iter().zip(expected) {
            assert!((ev - want).abs() < 1e-10);
        }
        assert!(r.stds.iter().all(|s| *s == 0.0));
        assert!(result.execution_time.is_some());
    }

    #[tokio::test]
    async fn test_ghz_correlators_exact() {
        let est = StatevectorEstimator::new();
        let job_id = est.run(vec![ghz_pub(10)]).await.unwrap();
        let result = est.result(&job_id).await.unwrap();
        let r = result.first().unwrap();
        assert_eq!(r.len(), 9);
        assert!(r.evs.iter().all(|v| (v - 1.0).abs() < 1e-10));
    }

    #[tokio::test]
    async fn test_multiple_pubs_keep_order() {
        let est = StatevectorEstimator::new();
        let job_id = est.run(vec![ghz_pub(3), bell_pub()]).await.unwrap();
        let result = est.result(&job_id).await.unwrap();
        assert_eq!(result.pubs.len(), 2);
        assert_eq!(result.pubs[0].len(), 2);
        assert_eq!(result.pubs[1].len(), 6);
    }

    #[tokio::test]
    async fn test_rejects_too_many_qubits() {
        let est = StatevectorEstimator::new().with_max_qubits(4);
        let err = est.run(vec![ghz_pub(5)]).await.unwrap_err();
        assert!(matches!(err, HalError::CircuitTooLarge(_)));
    }

    #[tokio::test]
    async fn test_rejects_empty_job() {
        let est = StatevectorEstimator::new();
        assert!(matches!(
            est.run(vec![]).await,
            Err(HalError::InvalidPub(_))
        ));
    }

    #[tokio::test]
    async fn test_seeded_noise_is_reproducible() {
        let options = EstimatorOptions {
            default_precision: Some(0.05),
            seed: Some(7),
            ..EstimatorOptions::default()
        };

        let mut runs = Vec::new();
        for _ in 0..2 {
            let est = StatevectorEstimator::new().with_options(options.clone());
            let job_id = est.run(vec![bell_pub()]).await.unwrap();
            runs.push(est.result(&job_id).await.unwrap().pubs.remove(0));
        }

        assert_eq!(runs[0].evs, runs[1].evs);
        assert!(runs[0].stds.iter().all(|s| *s == 0.05));
        assert!(runs[0].evs.iter().all(|v| (-1.0..=1.0).contains(v)));
        // Exact value of ⟨IZ⟩ is zero; noise moves it.
        assert_ne!(runs[0].evs[0], 0.0);
    }

    #[tokio::test]
    async fn test_unknown_job() {
        let est = StatevectorEstimator::new();
        let missing = JobId::new("nope");
        assert!(matches!(
            est.status(&missing).await,
            Err(HalError::JobNotFound(_))
        ));
        assert!(est.cancel(&missing).await.is_err());
    }

    #[tokio::test]
    async fn test_cancel_completed_job_keeps_result() {
        let est = StatevectorEstimator::new();
        let job_id = est.run(vec![bell_pub()]).await.unwrap();
        est.cancel(&job_id).await.unwrap();
        assert_eq!(est.status(&job_id).await.unwrap(), JobStatus::Completed);
        assert!(est.result(&job_id).await.is_ok());
    }
}
