//! Estimator results and sampled measurement counts.

use std::collections::BTreeMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{HalError, HalResult};
use crate::job::JobId;

/// Expectation values for one pub.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PubResult {
    /// Observable labels, aligned with `evs`.
    pub labels: Vec<String>,
    /// Estimated expectation values.
    pub evs: Vec<f64>,
    /// Standard errors of `evs`.
    pub stds: Vec<f64>,
    /// Service-specific metadata.
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub metadata: Value,
}

impl PubResult {
    /// Build a result, checking that every column has the same length.
    pub fn new(labels: Vec<String>, evs: Vec<f64>, stds: Vec<f64>) -> HalResult<Self> {
        if evs.len() != labels.len() || stds.len() != labels.len() {
            return Err(HalError::Backend(format!(
                "result has {} labels, {} values and {} standard errors",
                labels.len(),
                evs.len(),
                stds.len()
            )));
        }
        Ok(Self {
            labels,
            evs,
            stds,
            metadata: Value::Null,
        })
    }

    /// Attach metadata.
    #[must_use]
    pub fn with_metadata(mut self, metadata: Value) -> Self {
        self.metadata = metadata;
        self
    }

    /// Number of observables.
    pub fn len(&self) -> usize {
        self.evs.len()
    }

    /// Whether there are no observables.
    pub fn is_empty(&self) -> bool {
        self.evs.is_empty()
    }

    /// Expectation value for `label`, if it was estimated.
    pub fn ev(&self, label: &str) -> Option<f64> {
        self.labels
            .iter()
            .position(|l| l == label)
            .map(|i| self.evs[i])
    }

    /// Iterate `(label, ev, std)` rows.
    pub fn rows(&self) -> impl Iterator<Item = (&str, f64, f64)> + '_ {
        self.labels
            .iter()
            .zip(self.evs.iter().zip(&self.stds))
            .map(|(l, (ev, std))| (l.as_str(), *ev, *std))
    }
}

/// Results for every pub in a job, in submission order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EstimatorResult {
    /// The job that produced these results.
    pub job_id: JobId,
    /// One entry per submitted pub.
    pub pubs: Vec<PubResult>,
    /// Execution time, if reported.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub execution_time: Option<Duration>,
}

impl EstimatorResult {
    /// Create a new result.
    pub fn new(job_id: JobId, pubs: Vec<PubResult>) -> Self {
        Self {
            job_id,
            pubs,
            execution_time: None,
        }
    }

    /// Set the execution time.
    #[must_use]
    pub fn with_execution_time(mut self, time: Duration) -> Self {
        self.execution_time = Some(time);
        self
    }

    /// The first pub's result, which is the only one in single-pub jobs.
    pub fn first(&self) -> HalResult<&PubResult> {
        self.pubs
            .first()
            .ok_or_else(|| HalError::Backend(format!("job {} returned no pub results", self.job_id)))
    }
}

/// Measurement outcomes tallied by bitstring.
///
/// Bitstrings put qubit 0 rightmost, like Pauli labels. Iteration is in
/// lexicographic bitstring order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Counts(BTreeMap<String, u64>);

impl Counts {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `count` observations of `bitstring`.
    pub fn insert(&mut self, bitstring: impl Into<String>, count: u64) {
        *self.0.entry(bitstring.into()).or_insert(0) += count;
    }

    pub fn get(&self, bitstring: &str) -> u64 {
        self.0.get(bitstring).copied().unwrap_or(0)
    }

    /// Total number of shots recorded.
    pub fn total(&self) -> u64 {
        self.0.values().sum()
    }

    /// Number of distinct outcomes.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The outcome seen most often. Ties go to the smaller bitstring.
    pub fn most_frequent(&self) -> Option<(&str, u64)> {
        self.0
            .iter()
            .rev()
            .max_by_key(|(_, count)| **count)
            .map(|(bits, count)| (bits.as_str(), *count))
    }

    /// Observed frequency of `bitstring`, or 0 with no shots.
    pub fn probability(&self, bitstring: &str) -> f64 {
        match self.total() {
            0 => 0.0,
            total => self.get(bitstring) as f64 / total as f64,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, u64)> + '_ {
        self.0.iter().map(|(bits, count)| (bits.as_str(), *count))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pub_result_lookup() {
        let r = PubResult::new(
            vec!["ZZ".into(), "XX".into()],
            vec![0.98, 0.97],
            vec![0.01, 0.01],
        )
        .unwrap();
        assert_eq!(r.ev("XX"), Some(0.97));
        assert_eq!(r.ev("YY"), None);
        assert_eq!(r.rows().count(), 2);
    }

    #[test]
    fn test_pub_result_rejects_ragged_columns() {
        assert!(PubResult::new(vec!["ZZ".into()], vec![1.0, 0.5], vec![0.0]).is_err());
    }

    #[test]
    fn test_first_on_empty_result() {
        let r = EstimatorResult::new(JobId::new("j"), vec![]);
        assert!(r.first().is_err());
    }

    #[test]
    fn test_counts_accumulate() {
        let mut counts = Counts::new();
        counts.insert("101", 3);
        counts.insert("000", 1);
        counts.insert("101", 2);

        assert_eq!(counts.get("101"), 5);
        assert_eq!(counts.get("111"), 0);
        assert_eq!(counts.total(), 6);
        assert_eq!(counts.len(), 2);
        assert_eq!(counts.most_frequent(), Some(("101", 5)));
        assert!((counts.probability("000") - 1.0 / 6.0).abs() < 1e-12);

        let order: Vec<&str> = counts.iter().map(|(bits, _)| bits).collect();
        assert_eq!(order, vec!["000", "101"]);
    }

    #[test]
    fn test_counts_tie_and_empty() {
        let mut counts = Counts::new();
        assert_eq!(counts.most_frequent(), None);
        assert_eq!(counts.probability("0"), 0.0);

        counts.insert("11", 4);
        counts.insert("01", 4);
        assert_eq!(counts.most_frequent(), Some(("01", 4)));
        assert_eq!(serde_json::to_string(&counts).unwrap(), r#"{"01":4,"11":4}"#);
    }
}
