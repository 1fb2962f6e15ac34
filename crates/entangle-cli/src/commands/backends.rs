//! Backends command implementation.

use anyhow::Result;
use console::style;

use entangle_adapter_ibm::{BackendInfo, IbmClient, select_least_busy};
use entangle_adapter_sim::StatevectorEstimator;

use super::common::{Account, resolve_credentials, state_dir};

/// Execute the backends command.
pub async fn execute(min_qubits: usize) -> Result<()> {
    println!("{} Available backends:\n", style("→").cyan().bold());

    // Local simulator
    let sim = StatevectorEstimator::new();
    println!("  {} {}", style("●").green(), style("simulator").bold());
    println!("    Qubits: up to {}", sim.max_qubits());
    println!("    Type: exact statevector estimator");
    println!();

    // IBM Quantum
    let credentials = match resolve_credentials(&Account::load(&state_dir()?)?) {
        Ok(credentials) => credentials,
        Err(_) => {
            println!(
                "  {} {} (not configured)",
                style("○").dim(),
                style("ibm").dim()
            );
            println!("    Set IBM_API_KEY + IBM_SERVICE_CRN (or IBM_QUANTUM_TOKEN), or run `entangle account save`");
            return Ok(());
        }
    };

    let client = IbmClient::from_credentials(&credentials).await?;
    let mut devices: Vec<BackendInfo> = client
        .list_backends()
        .await?
        .into_iter()
        .filter(|b| b.num_qubits >= min_qubits)
        .collect();
    devices.sort_by_key(|b| b.status.pending_jobs.unwrap_or(u32::MAX));

    if devices.is_empty() {
        println!("  No IBM Quantum backends with at least {min_qubits} qubits.");
        return Ok(());
    }

    let least_busy = select_least_busy(devices.clone(), min_qubits)
        .ok()
        .map(|b| b.name);

    for device in &devices {
        let marker = if device.status.operational {
            style("●").green()
        } else {
            style("○").yellow()
        };
        let family = device
            .processor_type
            .as_ref()
            .map(|p| format!(", {}", p.family))
            .unwrap_or_default();
        let pending = device
            .status
            .pending_jobs
            .map_or_else(|| "?".to_string(), |n| n.to_string());

        print!(
            "  {} {} ({} qubits{})",
            marker,
            style(&device.name).bold(),
            device.num_qubits,
            family
        );
        if least_busy.as_deref() == Some(device.name.as_str()) {
            print!("  {}", style("least busy").cyan());
        }
        println!();
        println!("    Pending jobs: {}", style(pending).yellow());
        if !device.status.operational {
            let msg = device.status.status_msg.as_deref().unwrap_or("offline");
            println!("    Status: {msg}");
        }
    }

    Ok(())
}
