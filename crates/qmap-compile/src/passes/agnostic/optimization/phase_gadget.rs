//! Phase-polynomial resynthesis of CX networks.
//!
//! Inside a run of `CX` and diagonal single-qubit gates every wire carries
//! the XOR of some input bits, its *parity*. A diagonal gate multiplies the
//! state by a phase that depends only on the parity of its wire, so all
//! diagonal gates acting on the same parity combine into one `Rz`, and the
//! combined rotation may sit anywhere the parity is present. The CX
//! skeleton is kept as is.

use std::collections::{BTreeMap, BTreeSet};

use qmap_ir::{CircuitDag, CircuitLevel, Gate, Instruction, QubitId, normalize_angle};

use crate::error::{CompileError, CompileResult};
use crate::pass::{Pass, PassStage};

type Parity = BTreeSet<QubitId>;

/// Merges diagonal rotations acting on equal parities within maximal runs
/// of `CX` and diagonal single-qubit gates.
///
/// Each surviving rotation is placed at the earliest CX boundary where its
/// parity appears, on the wire carrying it. A parity reached by a single
/// gate keeps that gate's kind; several contributions become one `Rz`;
/// a total angle of zero drops the parity entirely.
///
/// Requires a logical circuit without gates on more than two qubits.
pub struct PhaseGadget;

impl Pass for PhaseGadget {
    fn name(&self) -> &'static str {
        "phase-gadget"
    }

    fn stage(&self) -> PassStage {
        PassStage::PreRouting
    }

    fn rewrite(&self, dag: &mut CircuitDag) -> CompileResult<bool> {
        if dag.level() == CircuitLevel::Physical {
            return Err(precondition("circuit is already routed to physical nodes"));
        }

        let instructions = dag.instructions();
        if let Some((position, inst)) = instructions
            .iter()
            .enumerate()
            .find(|(_, inst)| inst.qubits.len() > 2)
        {
            return Err(precondition(format!(
                "gate '{}' at position {position} acts on {} qubits",
                inst.name(),
                inst.qubits.len()
            )));
        }

        let mut rewritten = Vec::with_capacity(instructions.len());
        let mut run = Vec::new();
        for inst in &instructions {
            if in_network(inst) {
                run.push(inst.clone());
            } else {
                rewritten.extend(synthesize(std::mem::take(&mut run)));
                rewritten.push(inst.clone());
            }
        }
        rewritten.extend(synthesize(run));

        if rewritten == instructions {
            return Ok(false);
        }
        dag.rebuild(rewritten)?;
        Ok(true)
    }
}

fn precondition(reason: impl Into<String>) -> CompileError {
    CompileError::PassPrecondition {
        pass: "phase-gadget".into(),
        reason: reason.into(),
    }
}

fn in_network(inst: &Instruction) -> bool {
    match inst.as_gate() {
        Some(Gate::CX) => true,
        Some(g) => g.num_qubits() == 1 && g.phase_angle().is_some(),
        None => false,
    }
}

struct Term {
    angle: f64,
    contributors: usize,
    first_gate: Gate,
}

/// Parity bookkeeping for one run.
#[derive(Default)]
struct Network {
    parity: BTreeMap<QubitId, Parity>,
    /// Earliest `(slot, wire)` at which each parity was carried.
    first_seen: BTreeMap<Parity, (usize, QubitId)>,
}

impl Network {
    fn parity_of(&mut self, qubit: QubitId) -> &Parity {
        self.parity.entry(qubit).or_insert_with(|| {
            let initial = Parity::from([qubit]);
            self.first_seen.entry(initial.clone()).or_insert((0, qubit));
            initial
        })
    }

    fn apply_cx(&mut self, control: QubitId, target: QubitId, slot: usize) {
        let control_parity = self.parity_of(control).clone();
        let target_parity = self.parity_of(target).clone();
        let updated: Parity = target_parity
            .symmetric_difference(&control_parity)
            .copied()
            .collect();
        self.first_seen.entry(updated.clone()).or_insert((slot, target));
        self.parity.insert(target, updated);
    }
}

fn synthesize(run: Vec<Instruction>) -> Vec<Instruction> {
    if run.is_empty() {
        return run;
    }

    let mut network = Network::default();
    let mut terms: BTreeMap<Parity, Term> = BTreeMap::new();
    let mut skeleton: Vec<Instruction> = Vec::new();

    for inst in run {
        match (inst.as_gate().copied(), inst.qubits.as_slice()) {
            (Some(Gate::CX), &[control, target]) => {
                let slot = skeleton.len() + 1;
                network.apply_cx(control, target, slot);
                skeleton.push(Instruction::two_qubit_gate(Gate::CX, control, target));
            }
            (Some(gate), &[qubit]) => {
                let angle = gate.phase_angle().unwrap_or(0.0);
                let parity = network.parity_of(qubit).clone();
                terms
                    .entry(parity)
                    .and_modify(|t| {
                        t.angle += angle;
                        t.contributors += 1;
                    })
                    .or_insert(Term {
                        angle,
                        contributors: 1,
                        first_gate: gate,
                    });
            }
            _ => {}
        }
    }

    let mut placed: Vec<(usize, QubitId, Gate)> = terms
        .into_iter()
        .filter_map(|(parity, term)| {
            let total = normalize_angle(term.angle);
            if total == 0.0 {
                return None;
            }
            let &(slot, wire) = network.first_seen.get(&parity)?;
            let gate = if term.contributors == 1 {
                term.first_gate
            } else {
                Gate::Rz(total)
            };
            Some((slot, wire, gate))
        })
        .collect();
    placed.sort_by_key(|&(slot, wire, _)| (slot, wire));

    let mut out = Vec::with_capacity(placed.len() + skeleton.len());
    let mut rotations = placed.into_iter().peekable();
    for slot in 0..=skeleton.len() {
        while let Some((_, wire, gate)) = rotations.next_if(|&(s, _, _)| s == slot) {
            out.push(Instruction::single_qubit_gate(gate, wire));
        }
        if let Some(cx) = skeleton.get(slot) {
            out.push(cx.clone());
        }
    }
    out
}
