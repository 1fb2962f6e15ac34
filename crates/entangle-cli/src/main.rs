//! Entangle Command-Line Interface
//!
//! Prepares Bell and GHZ states, estimates Pauli correlators on the local
//! statevector estimator or on IBM Quantum, and renders how the normalized
//! correlators decay with qubit distance. Also samples a local Grover search
//! into a counts histogram.

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

use clap::{Parser, Subcommand};
use console::style;
use tracing_subscriber::EnvFilter;

mod commands;

use commands::common::{OutputFormat, RunSettings};
use commands::{account, backends, bell, fetch, ghz, grover, status, version};

/// Entangle - Bell and GHZ correlator experiments on simulators and IBM Quantum
#[derive(Parser)]
#[command(name = "entangle")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Estimate the six Bell-state observables on the local estimator
    Bell {
        /// Standard deviation of the sampling noise (exact values if omitted)
        #[arg(long)]
        precision: Option<f64>,

        /// Seed for the sampling noise
        #[arg(long)]
        seed: Option<u64>,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Table)]
        format: OutputFormat,
    },

    /// Estimate two-point Z correlators of an n-qubit GHZ state
    Ghz {
        /// Number of qubits
        #[arg(short = 'n', long, default_value = "5")]
        qubits: u32,

        /// Backend (simulator, least-busy, or an IBM device name)
        #[arg(short, long, env = "ENTANGLE_BACKEND")]
        backend: Option<String>,

        /// Target precision (standard error) per correlator
        #[arg(long)]
        precision: Option<f64>,

        /// Service-side error mitigation level (0-2)
        #[arg(long, default_value = "1")]
        resilience_level: u8,

        /// Service-side transpiler optimization level (0-3)
        #[arg(long, default_value = "1")]
        optimization_level: u8,

        /// Dynamical decoupling sequence (XX, XpXm, XY4, none)
        #[arg(long, default_value = "XY4")]
        dd_sequence: String,

        /// Smallest device width accepted by least-busy (defaults to --qubits)
        #[arg(long)]
        min_qubits: Option<usize>,

        /// Seed for the local estimator's sampling noise
        #[arg(long)]
        seed: Option<u64>,

        /// Block until a remote job finishes
        #[arg(short, long)]
        wait: bool,

        /// Give up waiting after this many seconds
        #[arg(long)]
        timeout: Option<u64>,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Table)]
        format: OutputFormat,
    },

    /// Run Grover search for one marked state and plot the counts
    Grover {
        /// Number of search qubits
        #[arg(short = 'n', long, default_value = "3")]
        qubits: u32,

        /// Marked basis state; bit k belongs to qubit k
        #[arg(short, long)]
        target: u64,

        /// Measurement shots
        #[arg(long, default_value = "1024")]
        shots: u64,

        /// Oracle and diffuser rounds (defaults to floor(sqrt(2^n)))
        #[arg(long)]
        iterations: Option<u64>,

        /// Seed for shot sampling
        #[arg(long)]
        seed: Option<u64>,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Table)]
        format: OutputFormat,
    },

    /// Fetch the result of a submitted job and plot its decay curve
    Fetch {
        /// Job ID (defaults to the most recent submission)
        job_id: Option<String>,

        /// Block until the job finishes
        #[arg(short, long)]
        wait: bool,

        /// Give up waiting after this many seconds
        #[arg(long)]
        timeout: Option<u64>,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Table)]
        format: OutputFormat,
    },

    /// Query job status
    Status {
        /// Job ID (defaults to the most recent submission)
        job_id: Option<String>,

        /// List all recorded jobs
        #[arg(short, long)]
        all: bool,
    },

    /// Cancel a queued or running job
    Cancel {
        /// Job ID (defaults to the most recent submission)
        job_id: Option<String>,
    },

    /// List IBM Quantum backends and their queues
    Backends {
        /// Only show devices with at least this many qubits
        #[arg(long, default_value = "0")]
        min_qubits: usize,
    },

    /// Manage the saved IBM Quantum account
    Account {
        #[command(subcommand)]
        action: AccountAction,
    },

    /// Show version information
    Version,
}

#[derive(Subcommand)]
enum AccountAction {
    /// Save credentials and a default backend
    Save {
        /// IBM Cloud API key
        #[arg(long)]
        api_key: Option<String>,

        /// IBM Cloud service instance CRN
        #[arg(long)]
        service_crn: Option<String>,

        /// Legacy IBM Quantum token
        #[arg(long)]
        token: Option<String>,

        /// Backend used when --backend is not given
        #[arg(long)]
        default_backend: Option<String>,
    },

    /// Show the saved account
    Show,

    /// Delete the saved account
    Clear,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let filter = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .with_target(false)
        .init();

    let result = match cli.command {
        Commands::Bell {
            precision,
            seed,
            format,
        } => bell::execute(precision, seed, format).await,

        Commands::Ghz {
            qubits,
            backend,
            precision,
            resilience_level,
            optimization_level,
            dd_sequence,
            min_qubits,
            seed,
            wait: do_wait,
            timeout,
            format,
        } => {
            let settings = RunSettings {
                precision,
                resilience_level,
                optimization_level,
                dd_sequence,
                seed,
                wait: do_wait,
                timeout,
            };
            ghz::execute(qubits, backend.as_deref(), min_qubits, &settings, format).await
        }

        Commands::Grover {
            qubits,
            target,
            shots,
            iterations,
            seed,
            format,
        } => grover::execute(qubits, target, iterations, shots, seed, format),

        Commands::Fetch {
            job_id,
            wait: do_wait,
            timeout,
            format,
        } => fetch::execute(job_id.as_deref(), do_wait, timeout, format).await,

        Commands::Status { job_id, all } => status::execute(job_id.as_deref(), all).await,

        Commands::Cancel { job_id } => status::execute_cancel(job_id.as_deref()).await,

        Commands::Backends { min_qubits } => backends::execute(min_qubits).await,

        Commands::Account { action } => match action {
            AccountAction::Save {
                api_key,
                service_crn,
                token,
                default_backend,
            } => account::execute_save(
                api_key.as_deref(),
                service_crn.as_deref(),
                token.as_deref(),
                default_backend.as_deref(),
            ),
            AccountAction::Show => account::execute_show(),
            AccountAction::Clear => account::execute_clear(),
        },

        Commands::Version => {
            version::execute();
            Ok(())
        }
    };

    // Handle errors
    if let Err(e) = result {
        eprintln!("{} {:#}", style("Error:").red().bold(), e);
        std::process::exit(1);
    }

    Ok(())
}
