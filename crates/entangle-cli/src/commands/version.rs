//! Version command implementation.

use console::style;

/// Execute the version command.
pub fn execute() {
    let version = env!("CARGO_PKG_VERSION");

    println!(
        "{} {} - Bell and GHZ correlator experiments",
        style("Entangle").cyan().bold(),
        style(format!("v{version}")).yellow()
    );
    println!();
    println!("Components:");
    println!("  entangle-ir           Circuits, Pauli observables and the Bell/GHZ/Grover library");
    println!("  entangle-qasm3        OpenQASM 3 emitter");
    println!("  entangle-hal          Estimator abstraction and result analysis");
    println!("  entangle-adapter-sim  Statevector estimator and shot sampler");
    println!("  entangle-adapter-ibm  IBM Quantum estimator");
    println!("  entangle-cli          Command-line interface");
    println!();
    println!(
        "Repository: {}",
        style("https://github.com/entangle-rs/entangle").underlined()
    );
    println!("License:    {}", style("Apache-2.0").dim());
}
