//! SWAP decomposition and gate direction.
//!
//! Both rewrites are exact substitutions: the replacement sequences equal
//! the original gate as matrices, with no global phase.

use qmap_ir::{Gate, Instruction, QubitId};
use tracing::debug;

use crate::architecture::Architecture;
use crate::error::{CompileError, CompileResult};
use crate::mapping::PhysicalCircuit;

/// Replace every `Swap(a, b)` by `CX(a, b) CX(b, a) CX(a, b)`.
///
/// On directed devices the outer pair uses the native direction, so at
/// most the middle `CX` needs redirecting afterwards. Returns whether any
/// SWAP was decomposed.
pub fn decompose_swaps(physical: &mut PhysicalCircuit, arch: &Architecture) -> CompileResult<bool> {
    let instructions = physical.dag().instructions();
    if !instructions.iter().any(is_swap) {
        return Ok(false);
    }

    let mut rewritten = Vec::with_capacity(instructions.len() + 2 * physical.swaps_inserted());
    let mut decomposed = 0usize;
    for (position, inst) in instructions.into_iter().enumerate() {
        if !is_swap(&inst) {
            rewritten.push(inst);
            continue;
        }
        let &[a, b] = inst.qubits.as_slice() else {
            return Err(CompileError::MalformedSwap {
                position,
                arity: inst.qubits.len(),
            });
        };
        let (c, t) = if arch.allows(a.0, b.0) || !arch.allows(b.0, a.0) {
            (a, b)
        } else {
            (b, a)
        };
        rewritten.extend([cx(c, t), cx(t, c), cx(c, t)]);
        decomposed += 1;
    }

    physical.dag_mut().rebuild(rewritten)?;
    debug!("decomposed {} SWAPs into CX triples", decomposed);
    Ok(true)
}

/// Rewrite two-qubit gates that run against the native direction.
///
/// `CX(c, t)` becomes `H(c) H(t) CX(t, c) H(c) H(t)`; `CZ` and `Swap` just
/// exchange their operands. Does nothing on undirected devices.
///
/// # Errors
///
/// [`CompileError::NonAdjacentGate`] for a two-qubit gate whose nodes are
/// not coupled in either direction.
pub fn direct_two_qubit_gates(
    physical: &mut PhysicalCircuit,
    arch: &Architecture,
) -> CompileResult<bool> {
    if !arch.is_directed() {
        return Ok(false);
    }

    let instructions = physical.dag().instructions();
    let mut rewritten = Vec::with_capacity(instructions.len());
    let mut flipped = 0usize;
    for (position, inst) in instructions.into_iter().enumerate() {
        let operands = match (inst.as_gate(), inst.qubits.as_slice()) {
            (Some(&gate), &[a, b]) => Some((gate, a, b)),
            _ => None,
        };
        let Some((gate, a, b)) = operands else {
            rewritten.push(inst);
            continue;
        };
        if arch.allows(a.0, b.0) {
            rewritten.push(inst);
            continue;
        }
        if !arch.allows(b.0, a.0) {
            return Err(CompileError::NonAdjacentGate {
                gate: gate.name().to_string(),
                nodes: (a.0, b.0),
                position,
            });
        }
        if gate.is_symmetric() {
            rewritten.push(Instruction::two_qubit_gate(gate, b, a));
        } else {
            rewritten.extend([h(a), h(b), Instruction::two_qubit_gate(gate, b, a), h(a), h(b)]);
        }
        flipped += 1;
    }

    if flipped == 0 {
        return Ok(false);
    }
    physical.dag_mut().rebuild(rewritten)?;
    debug!("redirected {} two-qubit gates", flipped);
    Ok(true)
}

fn is_swap(inst: &Instruction) -> bool {
    matches!(inst.as_gate(), Some(Gate::Swap))
}

fn cx(control: QubitId, target: QubitId) -> Instruction {
    Instruction::two_qubit_gate(Gate::CX, control, target)
}

fn h(qubit: QubitId) -> Instruction {
    Instruction::single_qubit_gate(Gate::H, qubit)
}
