//! Property tests for the circuit graph.

use proptest::prelude::*;
use qmap_ir::{CircuitDag, Gate, Instruction, QubitId};

const NUM_QUBITS: u32 = 5;

fn arb_instruction() -> impl Strategy<Value = Instruction> {
    let single = (0..6usize, 0..NUM_QUBITS, -2.0f64..2.0).prop_map(|(g, q, angle)| {
        let gate = match g {
            0 => Gate::H,
            1 => Gate::X,
            2 => Gate::T,
            3 => Gate::Rz(angle),
            4 => Gate::Rx(angle),
            _ => Gate::S,
        };
        Instruction::single_qubit_gate(gate, QubitId(q))
    });
    let double = (0..NUM_QUBITS, 1..NUM_QUBITS, any::<bool>()).prop_map(|(a, off, cz)| {
        let b = (a + off) % NUM_QUBITS;
        let gate = if cz { Gate::CZ } else { Gate::CX };
        Instruction::two_qubit_gate(gate, QubitId(a), QubitId(b))
    });
    prop_oneof![3 => single, 2 => double]
}

fn build(instructions: &[Instruction]) -> CircuitDag {
    let mut dag = CircuitDag::new();
    for q in 0..NUM_QUBITS {
        dag.add_qubit(QubitId(q));
    }
    for inst in instructions {
        dag.apply(inst.clone()).unwrap();
    }
    dag
}

proptest! {
    #[test]
    fn topological_order_is_append_order(
        instructions in prop::collection::vec(arb_instruction(), 0..40)
    ) {
        let dag = build(&instructions);
        prop_assert_eq!(dag.instructions(), instructions);
        prop_assert!(dag.verify_integrity().is_ok());
    }

    #[test]
    fn frontier_visits_every_op_once(
        instructions in prop::collection::vec(arb_instruction(), 0..40)
    ) {
        let dag = build(&instructions);
        let mut frontier = dag.frontier();
        let mut visited = 0;
        // Retire the highest ready node first to exercise a non-default order.
        loop {
            let Some(node) = frontier.ready().last() else {
                break;
            };
            frontier.retire(node).unwrap();
            visited += 1;
        }
        prop_assert!(frontier.is_done());
        prop_assert_eq!(visited, dag.num_ops());
    }

    #[test]
    fn rebuild_preserves_order_and_depth(
        instructions in prop::collection::vec(arb_instruction(), 0..40)
    ) {
        let mut dag = build(&instructions);
        let depth = dag.depth();
        let listed = dag.instructions();
        dag.rebuild(listed.clone()).unwrap();
        prop_assert_eq!(dag.instructions(), listed);
        prop_assert_eq!(dag.depth(), depth);
    }
}
