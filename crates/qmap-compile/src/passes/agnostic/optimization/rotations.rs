//! Rotation merging.

use qmap_ir::CircuitDag;

use crate::error::CompileResult;
use crate::pass::{Pass, PassStage};

use super::{Combined, WireStacks, merge_rotations};

/// Merges consecutive same-axis rotations on a wire.
///
/// `Rz(a)·Rz(b)` becomes `Rz(a + b)` with the sum normalized into
/// `(-1, 1]` half-turns. A sum of zero removes both gates, which may expose
/// an earlier rotation to merge with the next one.
pub struct MergeRotations;

impl Pass for MergeRotations {
    fn name(&self) -> &'static str {
        "merge-rotations"
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
                let merged = wires.top(qubit).and_then(|slot| {
                    let (prev, _) = wires.get(slot)?.as_single_qubit_gate()?;
                    merge_rotations(&prev, &gate).map(|m| (slot, m))
                });
                if let Some((slot, result)) = merged {
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
