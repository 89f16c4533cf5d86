//! Folding single-qubit gates back through SWAPs.

use qmap_ir::{CircuitDag, Gate, Instruction, QubitId};

use crate::error::CompileResult;
use crate::pass::{Pass, PassStage};

use super::{Combined, WireStacks, combine};

/// Moves a single-qubit gate that directly follows a `Swap` onto the other
/// wire, in front of the `Swap`, when it merges or cancels with the gate
/// sitting there.
///
/// `G'(b) Swap(a, b) G(a)` equals `(G·G')(b) Swap(a, b)`, so the rewrite
/// only fires when `G·G'` is a single gate or the identity. A gate that
/// would merely move is left alone.
pub struct FoldSwaps;

impl Pass for FoldSwaps {
    fn name(&self) -> &'static str {
        "fold-swaps"
    }

    fn stage(&self) -> PassStage {
        PassStage::PostRouting
    }

    fn rewrite(&self, dag: &mut CircuitDag) -> CompileResult<bool> {
        let instructions = dag.instructions();
        let mut wires = WireStacks::with_capacity(instructions.len());
        let mut changed = false;

        for inst in instructions {
            if let Some((gate, qubit)) = inst.as_single_qubit_gate() {
                if let Some((slot, result)) = fold_target(&wires, gate, qubit) {
                    match result {
                        Combined::Identity => wires.remove(slot),
                        Combined::Gate(g) => wires.replace_gate(slot, g),
                    }
                    changed = true;
                    continue;
                }
            }
            wires.push(inst);
        }

        if changed {
            dag.rebuild(wires.finish())?;
        }
        Ok(changed)
    }
}

/// Slot in front of the SWAP that `gate` on `qubit` would fold into.
fn fold_target(wires: &WireStacks, gate: Gate, qubit: QubitId) -> Option<(usize, Combined)> {
    let swap_slot = wires.top(qubit)?;
    let other = swap_partner(wires.get(swap_slot)?, qubit)?;
    let below = wires.predecessor_on(other, swap_slot)?;
    let (prev, _) = wires.get(below)?.as_single_qubit_gate()?;
    combine(&prev, &gate).map(|result| (below, result))
}

fn swap_partner(inst: &Instruction, qubit: QubitId) -> Option<QubitId> {
    match (inst.as_gate(), inst.qubits.as_slice()) {
        (Some(Gate::Swap), &[a, b]) if a == qubit => Some(b),
        (Some(Gate::Swap), &[a, b]) if b == qubit => Some(a),
        _ => None,
    }
}
