//! Optimization passes.
//!
//! Every pass reads the DAG's instructions in topological order, rewrites
//! the list, and rebuilds the DAG over the same wires when something
//! changed. Rebuilding keeps the rewritten order as the new topological
//! order, which makes a second application see exactly what the first one
//! produced.

mod cancel;
mod cleanup;
mod phase_gadget;
mod rotations;
mod swap_fold;


pub use cancel::{CancelInverses, RemoveIdentity};
pub use cleanup::Cleanup;
pub use phase_gadget::PhaseGadget;
pub use rotations::MergeRotations;
pub use swap_fold::FoldSwaps;

use qmap_ir::{Gate, Instruction, QubitId, normalize_angle};
use rustc_hash::FxHashMap;

/// Result of combining two single-qubit gates on the same wire.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(super) enum Combined {
    /// The pair is the identity up to global phase.
    Identity,
    /// The pair equals this single gate.
    Gate(Gate),
}

/// Sum two same-axis rotations, `first` applied first.
pub(super) fn merge_rotations(first: &Gate, second: &Gate) -> Option<Combined> {
    let (axis1, angle1) = first.as_rotation()?;
    let (axis2, angle2) = second.as_rotation()?;
    if axis1 != axis2 {
        return None;
    }
    let sum = normalize_angle(angle1 + angle2);
    Some(if sum == 0.0 {
        Combined::Identity
    } else {
        Combined::Gate(Gate::rotation(axis1, sum))
    })
}

/// Merge same-axis rotations or cancel an inverse pair.
pub(super) fn combine(first: &Gate, second: &Gate) -> Option<Combined> {
    merge_rotations(first, second).or_else(|| first.cancels(second).then_some(Combined::Identity))
}

/// Output buffer with a stack of surviving instruction slots per qubit.
///
/// The top of a qubit's stack is the last surviving instruction on that
/// wire, so checking a new instruction against the tops compares it with
/// its immediate predecessors in the rewritten circuit.
#[derive(Debug, Default)]
pub(super) struct WireStacks {
    slots: Vec<Option<Instruction>>,
    stacks: FxHashMap<QubitId, Vec<usize>>,
}

impl WireStacks {
    pub(super) fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: Vec::with_capacity(capacity),
            stacks: FxHashMap::default(),
        }
    }

    pub(super) fn get(&self, slot: usize) -> Option<&Instruction> {
        self.slots.get(slot).and_then(Option::as_ref)
    }

    /// Last surviving slot on `qubit`.
    pub(super) fn top(&self, qubit: QubitId) -> Option<usize> {
        self.stacks.get(&qubit).and_then(|s| s.last().copied())
    }

    /// The slot that is the top of every wire in `qubits` and acts on
    /// exactly those wires.
    pub(super) fn common_top(&self, qubits: &[QubitId]) -> Option<usize> {
        let (first, rest) = qubits.split_first()?;
        let top = self.top(*first)?;
        if rest.iter().any(|q| self.top(*q) != Some(top)) {
            return None;
        }
        let inst = self.get(top)?;
        (inst.qubits.len() == qubits.len()).then_some(top)
    }

    /// Slot directly before `slot` on `qubit`.
    pub(super) fn predecessor_on(&self, qubit: QubitId, slot: usize) -> Option<usize> {
        let stack = self.stacks.get(&qubit)?;
        let pos = stack.iter().rposition(|&s| s == slot)?;
        pos.checked_sub(1).map(|p| stack[p])
    }

    pub(super) fn push(&mut self, inst: Instruction) -> usize {
        let slot = self.slots.len();
        for &q in &inst.qubits {
            self.stacks.entry(q).or_default().push(slot);
        }
        self.slots.push(Some(inst));
        slot
    }

    /// Swap the gate of a surviving slot, keeping its operands.
    pub(super) fn replace_gate(&mut self, slot: usize, gate: Gate) {
        if let Some(Some(inst)) = self.slots.get_mut(slot) {
            *inst = Instruction::gate(gate, inst.qubits.iter().copied());
        }
    }

    /// Drop a slot from the output and from every wire it sits on.
    pub(super) fn remove(&mut self, slot: usize) {
        let Some(inst) = self.slots.get_mut(slot).and_then(Option::take) else {
            return;
        };
        for q in &inst.qubits {
            if let Some(stack) = self.stacks.get_mut(q) {
                if let Some(pos) = stack.iter().rposition(|&s| s == slot) {
                    stack.remove(pos);
                }
            }
        }
    }

    pub(super) fn finish(self) -> Vec<Instruction> {
        self.slots.into_iter().flatten().collect()
    }
}
