//! Fixed-point composition of the post-routing rules.

use qmap_ir::CircuitDag;
use tracing::debug;

use crate::error::CompileResult;
use crate::pass::{Pass, PassStage};

use super::{CancelInverses, FoldSwaps, MergeRotations, RemoveIdentity};

/// Runs identity removal, inverse cancellation, rotation merging and SWAP
/// folding until none of them changes the circuit.
///
/// Each rule only reports a change when it removed at least one gate, so
/// the number of productive rounds is bounded by the gate count.
pub struct Cleanup;

impl Pass for Cleanup {
    fn name(&self) -> &'static str {
        "cleanup"
    }

    fn stage(&self) -> PassStage {
        PassStage::PostRouting
    }

    fn rewrite(&self, dag: &mut CircuitDag) -> CompileResult<bool> {
        let rules: [&dyn Pass; 4] = [&RemoveIdentity, &CancelInverses, &MergeRotations, &FoldSwaps];
        let mut rounds = 0usize;

        loop {
            let mut progress = false;
            for rule in rules {
                progress |= rule.rewrite(dag)?;
            }
            if !progress {
                debug!("cleanup converged after {} rounds, ops: {}", rounds, dag.num_ops());
                return Ok(rounds > 0);
            }
            rounds += 1;
        }
    }
}
