//! Test support: a small state-vector simulator and equivalence checks.
//!
//! Qubit `k` is bit `k` of the basis-state index. Measurements and barriers
//! are skipped, so equivalence is checked on the unitary part only.

#![allow(dead_code)]

use std::f64::consts::PI;

use num_complex::Complex64;
use qmap_compile::{Architecture, PhysicalCircuit};
use qmap_ir::{CircuitDag, Gate, Instruction, InstructionKind, QubitId};

const FIDELITY_TOLERANCE: f64 = 1e-9;

type Matrix2 = [[Complex64; 2]; 2];

fn c(re: f64, im: f64) -> Complex64 {
    Complex64::new(re, im)
}

/// Matrix of a single-qubit gate; angles in half-turns.
fn matrix(gate: Gate) -> Matrix2 {
    let zero = c(0.0, 0.0);
    let one = c(1.0, 0.0);
    let phase = |turns: f64| Complex64::from_polar(1.0, PI * turns);
    let r = std::f64::consts::FRAC_1_SQRT_2;
    match gate {
        Gate::I => [[one, zero], [zero, one]],
        Gate::X => [[zero, one], [one, zero]],
        Gate::Y => [[zero, c(0.0, -1.0)], [c(0.0, 1.0), zero]],
        Gate::Z => [[one, zero], [zero, -one]],
        Gate::H => [[c(r, 0.0), c(r, 0.0)], [c(r, 0.0), c(-r, 0.0)]],
        Gate::S => [[one, zero], [zero, phase(0.5)]],
        Gate::Sdg => [[one, zero], [zero, phase(-0.5)]],
        Gate::T => [[one, zero], [zero, phase(0.25)]],
        Gate::Tdg => [[one, zero], [zero, phase(-0.25)]],
        Gate::SX => [
            [c(0.5, 0.5), c(0.5, -0.5)],
            [c(0.5, -0.5), c(0.5, 0.5)],
        ],
        Gate::SXdg => [
            [c(0.5, -0.5), c(0.5, 0.5)],
            [c(0.5, 0.5), c(0.5, -0.5)],
        ],
        Gate::Rx(a) => {
            let (s, co) = (PI * a / 2.0).sin_cos();
            [[c(co, 0.0), c(0.0, -s)], [c(0.0, -s), c(co, 0.0)]]
        }
        Gate::Ry(a) => {
            let (s, co) = (PI * a / 2.0).sin_cos();
            [[c(co, 0.0), c(-s, 0.0)], [c(s, 0.0), c(co, 0.0)]]
        }
        Gate::Rz(a) => [[phase(-a / 2.0), zero], [zero, phase(a / 2.0)]],
        other => panic!("{} is not a single-qubit gate", other.name()),
    }
}

/// Dense state vector over `num_qubits` wires.
#[derive(Debug, Clone)]
pub struct StateVector {
    num_qubits: usize,
    amps: Vec<Complex64>,
}

impl StateVector {
    /// The all-zero state.
    pub fn zero(num_qubits: usize) -> Self {
        let mut amps = vec![c(0.0, 0.0); 1 << num_qubits];
        amps[0] = c(1.0, 0.0);
        Self { num_qubits, amps }
    }

    pub fn amplitudes(&self) -> &[Complex64] {
        &self.amps
    }

    pub fn apply(&mut self, inst: &Instruction) {
        let InstructionKind::Gate(gate) = inst.kind else {
            return;
        };
        let bit = |q: QubitId| 1usize << q.index();
        match (gate, inst.qubits.as_slice()) {
            (Gate::CX, &[ctrl, tgt]) => self.controlled_flip(bit(ctrl), bit(tgt)),
            (Gate::CCX, &[c1, c2, tgt]) => self.controlled_flip(bit(c1) | bit(c2), bit(tgt)),
            (Gate::CZ, &[a, b]) => {
                let mask = bit(a) | bit(b);
                for (i, amp) in self.amps.iter_mut().enumerate() {
                    if i & mask == mask {
                        *amp = -*amp;
                    }
                }
            }
            (Gate::Swap, &[a, b]) => {
                let (ba, bb) = (bit(a), bit(b));
                for i in 0..self.amps.len() {
                    if i & ba != 0 && i & bb == 0 {
                        self.amps.swap(i, i ^ ba ^ bb);
                    }
                }
            }
            (g, &[q]) => self.single(matrix(g), bit(q)),
            (g, qubits) => panic!("{} on {} qubits", g.name(), qubits.len()),
        }
    }

    pub fn run(&mut self, instructions: &[Instruction]) {
        for inst in instructions {
            self.apply(inst);
        }
    }

    /// `|<self|other>|`.
    pub fn overlap(&self, other: &StateVector) -> f64 {
        self.amps
            .iter()
            .zip(&other.amps)
            .map(|(a, b)| a.conj() * b)
            .sum::<Complex64>()
            .norm()
    }

    fn single(&mut self, m: Matrix2, bit: usize) {
        for i in 0..self.amps.len() {
            if i & bit == 0 {
                let j = i | bit;
                let (a0, a1) = (self.amps[i], self.amps[j]);
                self.amps[i] = m[0][0] * a0 + m[0][1] * a1;
                self.amps[j] = m[1][0] * a0 + m[1][1] * a1;
            }
        }
    }

    fn controlled_flip(&mut self, controls: usize, target: usize) {
        for i in 0..self.amps.len() {
            if i & controls == controls && i & target == 0 {
                self.amps.swap(i, i | target);
            }
        }
    }

    /// Relabel wires: logical wire `q` moves to wire `layout[q]` of a
    /// `num_nodes`-wire state, other wires are `|0>`.
    pub fn embed(&self, layout: &[u32], num_nodes: usize) -> StateVector {
        let mut out = StateVector {
            num_qubits: num_nodes,
            amps: vec![c(0.0, 0.0); 1 << num_nodes],
        };
        for (index, &amp) in self.amps.iter().enumerate() {
            let mut target = 0usize;
            for (q, &node) in layout.iter().enumerate().take(self.num_qubits) {
                if index & (1 << q) != 0 {
                    target |= 1 << node;
                }
            }
            out.amps[target] = amp;
        }
        out
    }
}

/// Entangling preparation used as a generic input state.
#[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation)]
pub fn preparation(num_qubits: usize, seed: usize) -> Vec<Instruction> {
    let mut prep = Vec::new();
    for q in 0..num_qubits {
        let qubit = QubitId(q as u32);
        let t = (seed * 7 + q) as f64;
        prep.push(Instruction::single_qubit_gate(Gate::Ry(0.31 + 0.17 * t), qubit));
        prep.push(Instruction::single_qubit_gate(Gate::Rz(0.43 + 0.29 * t), qubit));
    }
    for q in 1..num_qubits {
        prep.push(Instruction::two_qubit_gate(
            Gate::CX,
            QubitId((q - 1) as u32),
            QubitId(q as u32),
        ));
    }
    for q in 0..num_qubits {
        let t = (seed * 3 + q) as f64;
        prep.push(Instruction::single_qubit_gate(Gate::Rx(0.11 + 0.37 * t), QubitId(q as u32)));
    }
    prep
}

/// Check that `physical` implements `logical`, up to global phase, with
/// logical qubit `q` entering on node `initial[q]` and leaving on node
/// `final[q]`.
#[allow(clippy::cast_possible_truncation)]
pub fn assert_equivalent(logical: &CircuitDag, physical: &PhysicalCircuit) {
    let num_qubits = logical.num_qubits();
    let num_nodes = physical.dag().num_qubits();
    let record = physical.permutation();
    let logical_ops = logical.instructions();
    let physical_ops = physical.dag().instructions();

    for seed in 0..2 {
        let prep = preparation(num_qubits, seed);

        let mut expected = StateVector::zero(num_qubits);
        expected.run(&prep);
        expected.run(&logical_ops);
        let expected = expected.embed(record.permutation(), num_nodes);

        let mut actual = StateVector::zero(num_qubits).embed(record.initial_layout(), num_nodes);
        for inst in &prep {
            actual.apply(&inst.map_qubits(|q| QubitId(record.initial_layout()[q.index()])));
        }
        actual.run(&physical_ops);

        let fidelity = expected.overlap(&actual);
        assert!(
            (fidelity - 1.0).abs() < FIDELITY_TOLERANCE,
            "physical circuit differs from logical circuit (overlap {fidelity})"
        );
    }
}

/// Check that every two-qubit gate acts on coupled nodes.
pub fn assert_adjacent(physical: &PhysicalCircuit, arch: &Architecture) {
    for (position, inst) in physical.dag().instructions().iter().enumerate() {
        if inst.is_two_qubit_gate() {
            let (a, b) = (inst.qubits[0].0, inst.qubits[1].0);
            assert!(
                arch.is_adjacent(a, b),
                "{} at position {position} acts on uncoupled nodes {a} and {b}",
                inst.name()
            );
        }
    }
}

/// Check that every `CX` runs in a native direction.
pub fn assert_directed(physical: &PhysicalCircuit, arch: &Architecture) {
    for inst in physical.dag().instructions() {
        if matches!(inst.kind, InstructionKind::Gate(Gate::CX)) {
            let (c, t) = (inst.qubits[0].0, inst.qubits[1].0);
            assert!(arch.allows(c, t), "CX({c}, {t}) against native direction");
        }
    }
}
