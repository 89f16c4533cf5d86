//! Post-compilation adjacency check.

use tracing::debug;

use crate::architecture::Architecture;
use crate::error::{CompileError, CompileResult};
use crate::mapping::PhysicalCircuit;

/// Check that every two-qubit gate of a physical circuit acts on coupled
/// nodes.
///
/// Direction is not checked here; see
/// [`direct_two_qubit_gates`](super::decompose::direct_two_qubit_gates).
/// The pass manager runs this last, so a violation means an earlier stage
/// produced an invalid circuit.
pub fn verify_adjacency(physical: &PhysicalCircuit, arch: &Architecture) -> CompileResult<()> {
    let mut checked = 0usize;
    for (position, (_, inst)) in physical.dag().topological_ops().enumerate() {
        if !inst.is_gate() {
            continue;
        }
        match inst.qubits.as_slice() {
            [_] => {}
            &[a, b] => {
                if !arch.is_adjacent(a.0, b.0) {
                    return Err(CompileError::NonAdjacentGate {
                        gate: inst.name().to_string(),
                        nodes: (a.0, b.0),
                        position,
                    });
                }
                checked += 1;
            }
            qubits => {
                return Err(CompileError::UnsupportedGate {
                    gate: inst.name().to_string(),
                    arity: qubits.len(),
                    position,
                });
            }
        }
    }
    debug!("adjacency verified for {} two-qubit gates", checked);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapping::Mapping;
    use crate::passes::routing::Router;
    use qmap_ir::{Circuit, Gate, Instruction, QubitId};

    fn physical(circuit: &Circuit, arch: &Architecture) -> PhysicalCircuit {
        let mapping = Mapping::trivial(circuit.num_qubits(), arch.node_count());
        Router::default().run(circuit.dag(), arch, mapping).unwrap()
    }

    #[test]
    fn test_routed_circuit_passes() {
        let arch = Architecture::ring(5);
        let circuit = Circuit::ghz(5).unwrap();
        let physical = physical(&circuit, &arch);
        verify_adjacency(&physical, &arch).unwrap();
    }

    #[test]
    fn test_reports_first_violation() {
        let arch = Architecture::linear(3);
        let mut physical = physical(&Circuit::with_size("test", 3, 0), &arch);
        physical
            .dag_mut()
            .rebuild([
                Instruction::single_qubit_gate(Gate::H, QubitId(0)),
                Instruction::two_qubit_gate(Gate::CZ, QubitId(2), QubitId(0)),
            ])
            .unwrap();

        let err = verify_adjacency(&physical, &arch).unwrap_err();
        assert!(matches!(
            err,
            CompileError::NonAdjacentGate {
                nodes: (2, 0),
                position: 1,
                ..
            }
        ));
    }
}
