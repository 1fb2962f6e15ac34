//! Shared helpers for CLI commands.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::ValueEnum;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use entangle_adapter_ibm::{BackendSelector, IbmCredentials, IbmError};
use entangle_hal::analysis::decay_curve;
use entangle_hal::{
    Counts, DdSequence, DynamicalDecouplingOptions, EstimatorOptions, PubResult, WaitConfig,
};

/// Overrides the state directory.
pub const ENV_HOME: &str = "ENTANGLE_HOME";

const ACCOUNT_FILE: &str = "account.yaml";
const LEDGER_FILE: &str = "jobs.json";

/// Width of a full-scale bar in the terminal chart.
const BAR_WIDTH: f64 = 40.0;

/// Return the state directory (`$ENTANGLE_HOME` or `~/.entangle/`), creating it.
pub fn state_dir() -> Result<PathBuf> {
    let state_dir = match std::env::var_os(ENV_HOME) {
        Some(dir) if !dir.is_empty() => PathBuf::from(dir),
        _ => dirs::home_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not determine home directory"))?
            .join(".entangle"),
    };
    if !state_dir.exists() {
        fs::create_dir_all(&state_dir).with_context(|| {
            format!("Failed to create state directory: {}", state_dir.display())
        })?;
    }
    Ok(state_dir)
}

/// Saved IBM Quantum account.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Account {
    /// Credentials used when none are set in the environment.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credentials: Option<IbmCredentials>,
    /// Backend used when `--backend` and `ENTANGLE_BACKEND` are absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_backend: Option<String>,
}

impl Account {
    /// Path of the account file inside `dir`.
    pub fn path(dir: &Path) -> PathBuf {
        dir.join(ACCOUNT_FILE)
    }

    /// Load the account, or an empty one if none is saved.
    pub fn load(dir: &Path) -> Result<Self> {
        let path = Self::path(dir);
        if !path.exists() {
            return Ok(Self::default());
        }
        let source = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read account: {}", path.display()))?;
        serde_yaml_ng::from_str(&source)
            .with_context(|| format!("Invalid account file: {}", path.display()))
    }

    /// Write the account, readable only by the current user.
    pub fn save(&self, dir: &Path) -> Result<PathBuf> {
        let path = Self::path(dir);
        let yaml = serde_yaml_ng::to_string(self).context("Failed to serialize account")?;
        fs::write(&path, yaml)
            .with_context(|| format!("Failed to write account: {}", path.display()))?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mut perms = fs::metadata(&path)
                .with_context(|| format!("Failed to get file metadata: {}", path.display()))?
                .permissions();
            perms.set_mode(0o600);
            fs::set_permissions(&path, perms)
                .with_context(|| format!("Failed to set permissions: {}", path.display()))?;
        }

        debug!("saved account to {}", path.display());
        Ok(path)
    }

    /// Delete the saved account. Returns whether one existed.
    pub fn clear(dir: &Path) -> Result<bool> {
        let path = Self::path(dir);
        if !path.exists() {
            return Ok(false);
        }
        fs::remove_file(&path)
            .with_context(|| format!("Failed to remove account: {}", path.display()))?;
        Ok(true)
    }
}

/// Credentials from the environment, falling back to the saved account.
pub fn resolve_credentials(account: &Account) -> Result<IbmCredentials> {
    match IbmCredentials::from_env() {
        Ok(credentials) => Ok(credentials),
        Err(IbmError::MissingToken) => account
            .credentials
            .clone()
            .ok_or_else(|| IbmError::MissingToken.into()),
        Err(e) => Err(e.into()),
    }
}

/// Backend name: the flag (or `ENTANGLE_BACKEND`), then the account default,
/// then the local simulator.
pub fn resolve_backend(flag: Option<&str>, account: &Account) -> String {
    flag.map(str::to_string)
        .or_else(|| account.default_backend.clone())
        .unwrap_or_else(|| "simulator".to_string())
}

/// Where a GHZ job runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    /// In-process statevector estimator.
    Simulator,
    /// IBM Quantum device.
    Ibm(BackendSelector),
}

impl Target {
    /// Interpret a backend name. `least-busy` picks among devices with at
    /// least `min_qubits` qubits.
    pub fn parse(name: &str, min_qubits: usize) -> Self {
        match name.to_lowercase().as_str() {
            "simulator" | "sim" | "statevector" | "local" => Self::Simulator,
            "least-busy" | "least_busy" => Self::Ibm(BackendSelector::LeastBusy { min_qubits }),
            _ => Self::Ibm(BackendSelector::Named(name.to_string())),
        }
    }
}

/// Estimator settings taken from the command line.
#[derive(Debug, Clone)]
pub struct RunSettings {
    pub precision: Option<f64>,
    pub resilience_level: u8,
    pub optimization_level: u8,
    pub dd_sequence: String,
    pub seed: Option<u64>,
    pub wait: bool,
    pub timeout: Option<u64>,
}

impl RunSettings {
    /// Build and validate estimator options.
    pub fn estimator_options(&self) -> Result<EstimatorOptions> {
        let options = EstimatorOptions {
            default_precision: self.precision,
            resilience_level: self.resilience_level,
            optimization_level: self.optimization_level,
            dynamical_decoupling: parse_dd_sequence(&self.dd_sequence)?,
            seed: self.seed,
            ..EstimatorOptions::default()
        };
        options.validate()?;
        Ok(options)
    }

    /// Polling configuration for `--wait`.
    pub fn wait_config(&self) -> WaitConfig {
        wait_config(self.timeout)
    }
}

/// Polling configuration with an optional timeout in seconds.
pub fn wait_config(timeout: Option<u64>) -> WaitConfig {
    let config = WaitConfig::default();
    match timeout {
        Some(secs) => config.with_timeout(Duration::from_secs(secs)),
        None => config,
    }
}

/// Parse a decoupling sequence name; `none` disables decoupling.
pub fn parse_dd_sequence(name: &str) -> Result<DynamicalDecouplingOptions> {
    if name.eq_ignore_ascii_case("none") || name.eq_ignore_ascii_case("off") {
        return Ok(DynamicalDecouplingOptions::default());
    }
    let sequence: DdSequence = name.parse()?;
    Ok(DynamicalDecouplingOptions::enabled(sequence))
}

/// A submitted remote job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub job_id: String,
    pub backend: String,
    pub num_qubits: usize,
    pub labels: Vec<String>,
    pub submitted_at: DateTime<Utc>,
}

/// Remote jobs submitted from this machine, oldest first.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct JobLedger {
    pub jobs: Vec<LedgerEntry>,
}

impl JobLedger {
    /// Load the ledger, or an empty one if none exists.
    pub fn load(dir: &Path) -> Result<Self> {
        let path = dir.join(LEDGER_FILE);
        if !path.exists() {
            return Ok(Self::default());
        }
        let source = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read job ledger: {}", path.display()))?;
        serde_json::from_str(&source)
            .with_context(|| format!("Invalid job ledger: {}", path.display()))
    }

    pub fn save(&self, dir: &Path) -> Result<()> {
        let path = dir.join(LEDGER_FILE);
        let json = serde_json::to_string_pretty(self).context("Failed to serialize job ledger")?;
        fs::write(&path, json)
            .with_context(|| format!("Failed to write job ledger: {}", path.display()))?;
        debug!("saved {} job(s) to {}", self.jobs.len(), path.display());
        Ok(())
    }

    pub fn record(&mut self, entry: LedgerEntry) {
        info!("recording job {} on {}", entry.job_id, entry.backend);
        self.jobs.push(entry);
    }

    pub fn find(&self, job_id: &str) -> Option<&LedgerEntry> {
        self.jobs.iter().rev().find(|e| e.job_id == job_id)
    }

    pub fn latest(&self) -> Option<&LedgerEntry> {
        self.jobs.last()
    }

    /// Pick the requested job, or the latest one when no id is given.
    ///
    /// Ids missing from the ledger are still accepted; the entry is then `None`.
    pub fn select(&self, job_id: Option<&str>) -> Result<(String, Option<LedgerEntry>)> {
        match job_id {
            Some(id) => Ok((id.to_string(), self.find(id).cloned())),
            None => {
                let latest = self.latest().ok_or_else(|| {
                    anyhow::anyhow!(
                        "No jobs recorded. Pass a job ID or submit one with `entangle ghz --backend <device>`"
                    )
                })?;
                Ok((latest.job_id.clone(), Some(latest.clone())))
            }
        }
    }
}

/// Output format for estimator results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Terminal table with a bar chart
    Table,
    /// Pretty-printed JSON
    Json,
    /// Comma-separated values
    Csv,
}

/// One estimated observable.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportRow {
    pub label: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distance: Option<usize>,
    pub ev: f64,
    pub std: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub normalized: Option<f64>,
}

/// Estimator output ready for rendering.
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub job_id: String,
    pub backend: String,
    pub rows: Vec<ReportRow>,
}

impl Report {
    /// Plain expectation values, one row per observable.
    pub fn observables(job_id: &str, backend: &str, result: &PubResult) -> Self {
        let rows = result
            .rows()
            .map(|(label, ev, std)| ReportRow {
                label: label.to_string(),
                distance: None,
                ev,
                std,
                normalized: None,
            })
            .collect();
        Self {
            job_id: job_id.to_string(),
            backend: backend.to_string(),
            rows,
        }
    }

    /// GHZ correlators normalized by the nearest-neighbour value, keyed by distance.
    pub fn correlators(job_id: &str, backend: &str, result: &PubResult) -> Result<Self> {
        let curve = decay_curve(&result.evs).context("Cannot normalize correlators")?;
        let rows = result
            .rows()
            .zip(curve)
            .map(|((label, ev, std), (distance, normalized))| ReportRow {
                label: label.to_string(),
                distance: Some(distance),
                ev,
                std,
                normalized: Some(normalized),
            })
            .collect();
        Ok(Self {
            job_id: job_id.to_string(),
            backend: backend.to_string(),
            rows,
        })
    }

    /// Render as JSON or CSV, or print the table.
    pub fn emit(&self, format: OutputFormat) -> Result<()> {
        match format {
            OutputFormat::Table => self.print_table(),
            OutputFormat::Json => println!("{}", self.to_json()?),
            OutputFormat::Csv => print!("{}", self.to_csv()),
        }
        Ok(())
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).context("Failed to serialize report")
    }

    pub fn to_csv(&self) -> String {
        let mut out = String::from("label,distance,ev,std,normalized\n");
        for row in &self.rows {
            out.push_str(&format!(
                "{},{},{},{},{}\n",
                row.label,
                row.distance.map(|d| d.to_string()).unwrap_or_default(),
                row.ev,
                row.std,
                row.normalized.map(|v| v.to_string()).unwrap_or_default()
            ));
        }
        out
    }

    fn print_table(&self) {
        println!(
            "\n{} Results from {} (job {}):",
            style("✓").green().bold(),
            style(&self.backend).yellow(),
            style(&self.job_id).dim()
        );

        let is_curve = self.rows.iter().all(|r| r.normalized.is_some());
        if is_curve {
            println!(
                "\n  {:>8}  {:>10}  {:>16}",
                style("DISTANCE").bold(),
                style("NORMALIZED").bold(),
                style("<Z0 Zd>").bold()
            );
            for row in &self.rows {
                let value = row.normalized.unwrap_or(row.ev);
                println!(
                    "  {:>8}  {:>10.4}  {:>+8.4} ± {:.4}  {}",
                    row.distance.unwrap_or_default(),
                    value,
                    row.ev,
                    row.std,
                    bar(value)
                );
            }
        } else {
            let width = self.rows.iter().map(|r| r.label.len()).max().unwrap_or(0);
            println!();
            for row in &self.rows {
                println!(
                    "  {:>width$}: {:>+8.4} ± {:.4}  {}",
                    style(&row.label).cyan(),
                    row.ev,
                    row.std,
                    bar(row.ev)
                );
            }
        }
    }
}

/// Sampled measurement outcomes ready for rendering.
#[derive(Debug, Clone, Serialize)]
pub struct CountsReport {
    pub circuit: String,
    pub backend: String,
    pub shots: u64,
    pub counts: Counts,
}

impl CountsReport {
    /// Render as JSON or CSV, or print the histogram.
    pub fn emit(&self, format: OutputFormat) -> Result<()> {
        match format {
            OutputFormat::Table => self.print_histogram(),
            OutputFormat::Json => println!("{}", self.to_json()?),
            OutputFormat::Csv => print!("{}", self.to_csv()),
        }
        Ok(())
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).context("Failed to serialize counts")
    }

    pub fn to_csv(&self) -> String {
        let mut out = String::from("bitstring,count,probability\n");
        for (bits, count) in self.counts.iter() {
            out.push_str(&format!(
                "{bits},{count},{}\n",
                self.counts.probability(bits)
            ));
        }
        out
    }

    fn print_histogram(&self) {
        println!(
            "\n{} Counts from {} ({} shots, {}):",
            style("✓").green().bold(),
            style(&self.backend).yellow(),
            self.shots,
            style(&self.circuit).dim()
        );
        println!();

        let top = self.counts.most_frequent().map(|(bits, _)| bits);
        for (bits, count) in self.counts.iter() {
            let p = self.counts.probability(bits);
            let label = if Some(bits) == top {
                style(bits).yellow().bold()
            } else {
                style(bits).cyan()
            };
            println!("  {label}: {count:>6}  {p:>6.3}  {}", bar(p));
        }
    }
}

/// Horizontal bar scaled so that `1.0` spans the full chart width.
fn bar(value: f64) -> String {
    let len = (value.abs().min(1.5) * BAR_WIDTH).round() as usize;
    let bar = "█".repeat(len);
    if value < 0.0 {
        style(bar).red().to_string()
    } else {
        style(bar).green().to_string()
    }
}

/// Cyan spinner drawn while talking to a backend.
pub fn spinner(message: impl Into<String>) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    spinner.set_message(message.into());
    spinner.enable_steady_tick(Duration::from_millis(100));
    spinner
}

#[cfg(test)]
mod tests {
    use super::*;

    fn correlator_result() -> PubResult {
        PubResult::new(
            vec!["ZZII".into(), "ZIZI".into(), "ZIIZ".into()],
            vec![0.8, 0.6, 0.4],
            vec![0.01, 0.01, 0.01],
        )
        .unwrap()
    }

    #[test]
    fn test_target_parse() {
        assert_eq!(Target::parse("simulator", 5), Target::Simulator);
        assert_eq!(Target::parse("SIM", 5), Target::Simulator);
        assert_eq!(
            Target::parse("least-busy", 100),
            Target::Ibm(BackendSelector::LeastBusy { min_qubits: 100 })
        );
        assert_eq!(
            Target::parse("ibm_brisbane", 5),
            Target::Ibm(BackendSelector::Named("ibm_brisbane".into()))
        );
    }

    #[test]
    fn test_resolve_backend_precedence() {
        let account = Account {
            credentials: None,
            default_backend: Some("ibm_kyiv".into()),
        };
        assert_eq!(resolve_backend(Some("ibm_fez"), &account), "ibm_fez");
        assert_eq!(resolve_backend(None, &account), "ibm_kyiv");
        assert_eq!(resolve_backend(None, &Account::default()), "simulator");
    }

    #[test]
    fn test_parse_dd_sequence() {
        assert!(!parse_dd_sequence("none").unwrap().enable);
        let dd = parse_dd_sequence("xy4").unwrap();
        assert!(dd.enable);
        assert_eq!(dd.sequence_type, DdSequence::Xy4);
        assert!(parse_dd_sequence("CPMG").is_err());
    }

    #[test]
    fn test_estimator_options_validated() {
        let mut settings = RunSettings {
            precision: Some(0.02),
            resilience_level: 2,
            optimization_level: 3,
            dd_sequence: "XpXm".into(),
            seed: Some(7),
            wait: false,
            timeout: None,
        };
        let options = settings.estimator_options().unwrap();
        assert_eq!(options.default_precision, Some(0.02));
        assert_eq!(options.dynamical_decoupling.sequence_type, DdSequence::XpXm);
        assert_eq!(options.seed, Some(7));

        settings.resilience_level = 3;
        assert!(settings.estimator_options().is_err());
    }

    #[test]
    fn test_wait_config_timeout() {
        assert_eq!(wait_config(None).timeout, None);
        assert_eq!(wait_config(Some(30)).timeout, Some(Duration::from_secs(30)));
    }

    #[test]
    fn test_account_roundtrip_and_clear() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(Account::load(dir.path()).unwrap(), Account::default());

        let account = Account {
            credentials: Some(IbmCredentials::Legacy {
                token: "tok".into(),
            }),
            default_backend: Some("least-busy".into()),
        };
        let path = account.save(dir.path()).unwrap();
        assert_eq!(Account::load(dir.path()).unwrap(), account);

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = fs::metadata(&path).unwrap().permissions().mode();
            assert_eq!(mode & 0o777, 0o600);
        }

        assert!(Account::clear(dir.path()).unwrap());
        assert!(!Account::clear(dir.path()).unwrap());
    }

    #[test]
    fn test_ledger_select() {
        let dir = tempfile::tempdir().unwrap();
        let mut ledger = JobLedger::load(dir.path()).unwrap();
        assert!(ledger.select(None).is_err());

        for id in ["job-a", "job-b"] {
            ledger.record(LedgerEntry {
                job_id: id.into(),
                backend: "ibm_fez".into(),
                num_qubits: 3,
                labels: vec!["ZZI".into(), "ZIZ".into()],
                submitted_at: Utc::now(),
            });
        }
        ledger.save(dir.path()).unwrap();

        let ledger = JobLedger::load(dir.path()).unwrap();
        let (id, entry) = ledger.select(None).unwrap();
        assert_eq!(id, "job-b");
        assert!(entry.is_some());

        let (id, entry) = ledger.select(Some("job-a")).unwrap();
        assert_eq!(id, "job-a");
        assert_eq!(entry.unwrap().labels.len(), 2);

        let (_, entry) = ledger.select(Some("elsewhere")).unwrap();
        assert!(entry.is_none());
    }

    #[test]
    fn test_correlator_report() {
        let report = Report::correlators("j1", "ibm_fez", &correlator_result()).unwrap();
        let distances: Vec<_> = report.rows.iter().map(|r| r.distance.unwrap()).collect();
        assert_eq!(distances, vec![1, 2, 3]);
        assert_eq!(report.rows[0].normalized, Some(1.0));
        assert!((report.rows[2].normalized.unwrap() - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_correlator_report_rejects_zero_reference() {
        let result = PubResult::new(vec!["ZZ".into()], vec![0.0], vec![0.0]).unwrap();
        assert!(Report::correlators("j1", "sim", &result).is_err());
    }

    #[test]
    fn test_csv_and_json() {
        let report = Report::correlators("j1", "ibm_fez", &correlator_result()).unwrap();
        let csv = report.to_csv();
        let mut lines = csv.lines();
        assert_eq!(lines.next(), Some("label,distance,ev,std,normalized"));
        assert_eq!(lines.next(), Some("ZZII,1,0.8,0.01,1"));
        assert_eq!(csv.lines().count(), 4);

        let json: serde_json::Value = serde_json::from_str(&report.to_json().unwrap()).unwrap();
        assert_eq!(json["rows"][1]["distance"], 2);

        let plain = Report::observables("j2", "statevector", &correlator_result());
        let json: serde_json::Value = serde_json::from_str(&plain.to_json().unwrap()).unwrap();
        assert!(json["rows"][0].get("normalized").is_none());
    }

    #[test]
    fn test_csv_leaves_missing_fields_blank() {
        let plain = Report::observables("j3", "statevector", &correlator_result());
        let csv = plain.to_csv();
        assert!(csv.ends_with('\n'));
        assert_eq!(csv.lines().nth(2), Some("ZIZI,,0.6,0.01,"));
    }

    #[test]
    fn test_counts_report() {
        let mut counts = Counts::new();
        counts.insert("101", 3);
        counts.insert("000", 1);
        let report = CountsReport {
            circuit: "grover_3_5".into(),
            backend: "statevector".into(),
            shots: 4,
            counts,
        };

        let csv = report.to_csv();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(
            lines,
            vec!["bitstring,count,probability", "000,1,0.25", "101,3,0.75"]
        );

        let json: serde_json::Value = serde_json::from_str(&report.to_json().unwrap()).unwrap();
        assert_eq!(json["counts"]["101"], 3);
        assert_eq!(json["shots"], 4);
    }
}
