//! QASM3 emitter for serializing circuits.

use entangle_ir::{Circuit, Instruction, QubitId};

/// Emit a circuit as QASM3 source code.
///
/// The output includes `stdgates.inc` so that service-side loaders can
/// resolve every gate name without inline definitions.
pub fn emit(circuit: &Circuit) -> String {
    let mut emitter = Emitter::new();
    emitter.emit_circuit(circuit);
    emitter.output
}

struct Emitter {
    output: String,
}

impl Emitter {
    fn new() -> Self {
        Self {
            output: String::new(),
        }
    }

    fn emit_circuit(&mut self, circuit: &Circuit) {
        self.writeln("OPENQASM 3.0;");
        self.writeln("include \"stdgates.inc\";");
        self.writeln("");

        let num_qubits = circuit.num_qubits();
        if num_qubits > 0 {
            self.writeln(&format!("qubit[{num_qubits}] q;"));
            self.writeln("");
        }

        for instruction in circuit.instructions() {
            self.emit_instruction(instruction);
        }
    }

    fn emit_instruction(&mut self, instruction: &Instruction) {
        let qubits = emit_qubits(instruction.qubits());
        match instruction {
            Instruction::Gate { gate, .. } => match (gate.angle(), gate.controls()) {
                (Some(theta), _) => {
                    self.writeln(&format!("{}({}) {qubits};", gate.name(), emit_angle(theta)));
                }
                // stdgates.inc stops at ccx; wider controls need the modifier.
                (None, Some(0)) => self.writeln(&format!("x {qubits};")),
                (None, Some(1)) => self.writeln(&format!("cx {qubits};")),
                (None, Some(2)) => self.writeln(&format!("ccx {qubits};")),
                (None, Some(k)) => self.writeln(&format!("ctrl({k}) @ x {qubits};")),
                (None, None) => self.writeln(&format!("{} {qubits};", gate.name())),
            },
            Instruction::Barrier { .. } => {
                if qubits.is_empty() {
                    self.writeln("barrier;");
                } else {
                    self.writeln(&format!("barrier {qubits};"));
                }
            }
        }
    }

    fn writeln(&mut self, line: &str) {
        self.output.push_str(line);
        self.output.push('\n');
    }
}

fn emit_qubits(qubits: &[QubitId]) -> String {
    qubits
        .iter()
        .map(|q| format!("q[{}]", q.0))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Angles close to common fractions of pi are written symbolically; the rest
/// use Rust's shortest round-trip float formatting.
fn emit_angle(v: f64) -> String {
    use std::f64::consts::PI;

    const NAMED: [(f64, &str); 6] = [
        (PI, "pi"),
        (-PI, "-pi"),
        (PI / 2.0, "pi/2"),
        (-PI / 2.0, "-pi/2"),
        (PI / 4.0, "pi/4"),
        (-PI / 4.0, "-pi/4"),
    ];

    NAMED
        .iter()
        .find(|(value, _)| (v - value).abs() < 1e-12)
        .map_or_else(|| format!("{v:?}"), |(_, name)| (*name).to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use entangle_ir::library;
    use std::f64::consts::PI;

    #[test]
    fn test_emit_bell_state() {
        let qasm = emit(&library::bell().unwrap());
        let expected = "OPENQASM 3.0;\n\
                        include \"stdgates.inc\";\n\
                        \n\
                        qubit[2] q;\n\
                        \n\
                        h q[0];\n\
                        cx q[0], q[1];\n";
        assert_eq!(qasm, expected);
    }

    #[test]
    fn test_emit_ghz_chain_in_order() {
        let qasm = emit(&library::ghz(4).unwrap());
        let body: Vec<&str> = qasm
            .lines()
            .skip_while(|l| !l.starts_with("h "))
            .collect();
        assert_eq!(
            body,
            vec!["h q[0];", "cx q[0], q[1];", "cx q[1], q[2];", "cx q[2], q[3];"]
        );
    }

    #[test]
    fn test_emit_rotation_angles() {
        let mut circuit = Circuit::new("rot", 1);
        circuit.rx(PI / 2.0, QubitId(0)).unwrap();
        circuit.rz(0.125, QubitId(0)).unwrap();
        circuit.ry(-PI, QubitId(0)).unwrap();

        let qasm = emit(&circuit);
        assert!(qasm.contains("rx(pi/2) q[0];"));
        assert!(qasm.contains("rz(0.125) q[0];"));
        assert!(qasm.contains("ry(-pi) q[0];"));
    }

    #[test]
    fn test_emit_multi_controlled_x() {
        let mut circuit = Circuit::new("mcx", 4);
        circuit
            .mcx(&[QubitId(0), QubitId(1), QubitId(2)], QubitId(3))
            .unwrap();
        circuit.ccx(QubitId(0), QubitId(1), QubitId(2)).unwrap();
        circuit.mcx(&[QubitId(2)], QubitId(3)).unwrap();

        let qasm = emit(&circuit);
        assert!(qasm.contains("ctrl(3) @ x q[0], q[1], q[2], q[3];"));
        assert!(qasm.contains("ccx q[0], q[1], q[2];"));
        assert!(qasm.contains("cx q[2], q[3];"));
    }

    #[test]
    fn test_emit_barrier() {
        let mut circuit = Circuit::new("fence", 2);
        circuit.barrier_all().unwrap();
        assert!(emit(&circuit).contains("barrier q[0], q[1];"));
    }
}
