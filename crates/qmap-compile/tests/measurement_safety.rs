//! Integration tests for measurement safety across routing and optimization.
//!
//! Measurements must stay on the node their logical qubit occupies when
//! they run and must keep their classical bit. No pass may merge or cancel
//! gates across a measurement or a barrier.

use qmap_compile::{Architecture, Mapping, PassId, PassManagerBuilder, Router, apply_optimization_pass};
use qmap_ir::{Circuit, CircuitDag, ClbitId, QubitId};

/// Helper: count operations of a given kind in a DAG.
fn count_ops(dag: &CircuitDag, kind: &str) -> usize {
    dag.topological_ops()
        .filter(|(_, inst)| inst.name() == kind)
        .count()
}

/// Helper: collect operation names in topological order for a specific qubit.
fn ops_on_qubit(dag: &CircuitDag, qubit: QubitId) -> Vec<String> {
    dag.topological_ops()
        .filter(|(_, inst)| inst.qubits.contains(&qubit))
        .map(|(_, inst)| inst.name().to_string())
        .collect()
}

// ============================================================================
// Passes stop at measurements and barriers
// ============================================================================

#[test]
fn test_h_measure_h_not_optimized() {
    for id in PassId::ALL {
        let mut circuit = Circuit::with_size("test", 1, 1);
        circuit
            .h(QubitId(0))
            .unwrap()
            .measure(QubitId(0), ClbitId(0))
            .unwrap()
            .h(QubitId(0))
            .unwrap();
        let mut dag = circuit.into_dag();

        apply_optimization_pass(id, &mut dag).unwrap();
        assert_eq!(
            ops_on_qubit(&dag, QubitId(0)),
            vec!["h", "measure", "h"],
            "{id} changed the circuit"
        );
    }
}

#[test]
fn test_cx_measure_cx_not_cancelled() {
    let mut circuit = Circuit::with_size("test", 2, 1);
    circuit
        .cx(QubitId(0), QubitId(1))
        .unwrap()
        .measure(QubitId(1), ClbitId(0))
        .unwrap()
        .cx(QubitId(0), QubitId(1))
        .unwrap();
    let mut dag = circuit.into_dag();

    apply_optimization_pass(PassId::Cleanup, &mut dag).unwrap();
    assert_eq!(count_ops(&dag, "cx"), 2);
}

#[test]
fn test_rotations_not_merged_across_barrier() {
    let mut circuit = Circuit::with_size("test", 2, 0);
    circuit
        .rz(0.25, QubitId(0))
        .unwrap()
        .barrier_all()
        .unwrap()
        .rz(-0.25, QubitId(0))
        .unwrap();
    let mut dag = circuit.into_dag();

    for id in [PassId::MergeRotations, PassId::Cleanup, PassId::PhaseGadget] {
        assert!(!apply_optimization_pass(id, &mut dag).unwrap(), "{id} crossed a barrier");
    }
    assert_eq!(count_ops(&dag, "rz"), 2);
}

#[test]
fn test_phase_gadget_run_ends_at_measure() {
    let mut circuit = Circuit::with_size("test", 2, 1);
    circuit
        .t(QubitId(1))
        .unwrap()
        .measure(QubitId(0), ClbitId(0))
        .unwrap()
        .tdg(QubitId(1))
        .unwrap();
    let mut dag = circuit.into_dag();

    apply_optimization_pass(PassId::PhaseGadget, &mut dag).unwrap();
    assert_eq!(count_ops(&dag, "t"), 1);
    assert_eq!(count_ops(&dag, "tdg"), 1);
}

// ============================================================================
// Routing keeps classical destinations
// ============================================================================

#[test]
fn test_measurements_follow_logical_qubits() {
    let arch = Architecture::linear(4);
    let mut circuit = Circuit::with_size("test", 4, 4);
    circuit
        .cx(QubitId(0), QubitId(3))
        .unwrap()
        .cx(QubitId(1), QubitId(3))
        .unwrap()
        .measure_all()
        .unwrap();

    let mapping = Mapping::trivial(4, 4);
    let physical = Router::default().run(circuit.dag(), &arch, mapping).unwrap();
    assert!(physical.swaps_inserted() > 0);

    let record = physical.permutation();
    let measures: Vec<_> = physical
        .dag()
        .instructions()
        .into_iter()
        .filter(|inst| inst.is_measure())
        .collect();
    assert_eq!(measures.len(), 4);
    for inst in measures {
        let clbit = inst.clbits[0];
        let logical = QubitId(clbit.0);
        assert_eq!(Some(inst.qubits[0].0), record.final_node(logical));
    }
}

#[test]
fn test_mid_circuit_measure_uses_current_node() {
    let arch = Architecture::linear(3);
    let mut circuit = Circuit::with_size("test", 3, 2);
    circuit
        .measure(QubitId(0), ClbitId(1))
        .unwrap()
        .cx(QubitId(0), QubitId(2))
        .unwrap()
        .measure(QubitId(0), ClbitId(0))
        .unwrap();

    let mapping = Mapping::trivial(3, 3);
    let physical = Router::default().run(circuit.dag(), &arch, mapping).unwrap();
    let out = physical.dag().instructions();

    let first = out.iter().find(|i| i.is_measure()).unwrap();
    assert_eq!(first.qubits[0], QubitId(0));
    assert_eq!(first.clbits[0], ClbitId(1));

    let last = out.last().unwrap();
    let node = physical.permutation().final_node(QubitId(0)).unwrap();
    assert_eq!(last.qubits[0], QubitId(node));
    assert_eq!(last.clbits[0], ClbitId(0));
}

#[test]
fn test_full_pipeline_keeps_measurements() {
    let arch = Architecture::star(6);
    let circuit = Circuit::ghz(5).unwrap();

    for level in 0..=3 {
        let pm = PassManagerBuilder::new().with_optimization_level(level).build();
        let compiled = pm.run(circuit.dag(), &arch).unwrap();
        let dag = compiled.physical.dag();
        assert_eq!(count_ops(dag, "measure"), 5);
        assert_eq!(dag.num_clbits(), 5);

        let record = compiled.physical.permutation();
        for (_, inst) in dag.topological_ops().filter(|(_, i)| i.is_measure()) {
            let logical = QubitId(inst.clbits[0].0);
            assert_eq!(Some(inst.qubits[0].0), record.final_node(logical));
        }
    }
}
