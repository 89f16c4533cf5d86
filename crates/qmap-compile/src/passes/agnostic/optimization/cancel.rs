//! Identity removal and inverse-pair cancellation.

use qmap_ir::{CircuitDag, Gate, Instruction};

use crate::error::CompileResult;
use crate::pass::{Pass, PassStage};

use super::WireStacks;

/// Drops `I` and rotations whose angle is a multiple of two half-turns.
pub struct RemoveIdentity;

impl Pass for RemoveIdentity {
    fn name(&self) -> &'static str {
        "remove-identity"
    }

    fn stage(&self) -> PassStage {
        PassStage::PostRouting
    }

    fn rewrite(&self, dag: &mut CircuitDag) -> CompileResult<bool> {
        let instructions = dag.instructions();
        let before = instructions.len();
        let kept: Vec<_> = instructions
            .into_iter()
            .filter(|inst| !inst.as_gate().is_some_and(Gate::is_identity))
            .collect();

        if kept.len() == before {
            return Ok(false);
        }
        dag.rebuild(kept)?;
        Ok(true)
    }
}

/// Cancels adjacent inverse pairs.
///
/// `H·H`, `S·Sdg`, `Rz(a)·Rz(-a)` and friends on one wire; `CX·CX` with the
/// same control and target; `CZ·CZ` and `Swap·Swap` in either operand
/// order. Two-qubit pairs must be adjacent on both wires. Measurements and
/// barriers sit on the wire stacks, so nothing cancels across them.
pub struct CancelInverses;

impl Pass for CancelInverses {
    fn name(&self) -> &'static str {
        "cancel-inverses"
    }

    fn stage(&self) -> PassStage {
        PassStage::PostRouting
    }

    fn rewrite(&self, dag: &mut CircuitDag) -> CompileResult<bool> {
        let instructions = dag.instructions();
        let mut wires = WireStacks::with_capacity(instructions.len());
        let mut changed = false;

        for inst in instructions {
            if inst.is_gate() {
                let partner = wires
                    .common_top(&inst.qubits)
                    .filter(|&slot| wires.get(slot).is_some_and(|prev| is_inverse_pair(prev, &inst)));
                if let Some(slot) = partner {
                    wires.remove(slot);
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

fn is_inverse_pair(prev: &Instruction, next: &Instruction) -> bool {
    let (Some(g1), Some(g2)) = (prev.as_gate(), next.as_gate()) else {
        return false;
    };
    if !g1.cancels(g2) {
        return false;
    }
    if prev.qubits == next.qubits {
        return true;
    }
    g1.is_symmetric()
        && prev.qubits.len() == 2
        && prev.qubits[0] == next.qubits[1]
        && prev.qubits[1] == next.qubits[0]
}

#[cfg(test)]
mod tests {
    use super::*;
    use qmap_ir::QubitId;

    fn cx(c: u32, t: u32) -> Instruction {
        Instruction::two_qubit_gate(Gate::CX, QubitId(c), QubitId(t))
    }

    #[test]
    fn test_inverse_pair_rules() {
        assert!(is_inverse_pair(&cx(0, 1), &cx(0, 1)));
        assert!(!is_inverse_pair(&cx(0, 1), &cx(1, 0)));

        let cz01 = Instruction::two_qubit_gate(Gate::CZ, QubitId(0), QubitId(1));
        let cz10 = Instruction::two_qubit_gate(Gate::CZ, QubitId(1), QubitId(0));
        assert!(is_inverse_pair(&cz01, &cz10));

        let swap = Instruction::two_qubit_gate(Gate::Swap, QubitId(2), QubitId(3));
        let swap_rev = Instruction::two_qubit_gate(Gate::Swap, QubitId(3), QubitId(2));
        assert!(is_inverse_pair(&swap, &swap_rev));

        let m = Instruction::measure(QubitId(0), qmap_ir::ClbitId(0));
        assert!(!is_inverse_pair(&m, &m));
    }
}
