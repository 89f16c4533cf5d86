//! SWAP-inserting router.
//!
//! The router peels the circuit DAG front to back. Every ready operation
//! whose operands sit on coupled nodes is emitted immediately. When only
//! blocked two-qubit gates are left, one SWAP is inserted that moves an
//! operand of the closest blocked gate one hop towards its partner. The
//! SWAP is chosen by the distances it leaves in the front layer plus a
//! weighted look at upcoming two-qubit gates.

use std::collections::BTreeSet;

use qmap_ir::{CircuitDag, CircuitLevel, Gate, Instruction, NodeIndex, QubitId};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::architecture::Architecture;
use crate::error::{CompileError, CompileResult};
use crate::mapping::{Mapping, PermutationRecord, PhysicalCircuit};

/// Router settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RoutingConfig {
    /// Number of upcoming two-qubit gates scored when choosing a SWAP.
    pub lookahead_window: usize,
    /// Weight of the mean lookahead distance relative to the front layer.
    pub lookahead_weight: f64,
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            lookahead_window: 20,
            lookahead_weight: 0.5,
        }
    }
}

/// Fail with [`CompileError::QubitOutOfRange`] unless the qubits of `dag`
/// are exactly `0..num_qubits`.
pub(crate) fn check_dense_qubits(dag: &CircuitDag) -> CompileResult<()> {
    let num_qubits = dag.num_qubits();
    match dag.qubits().find(|q| q.index() >= num_qubits) {
        Some(qubit) => Err(CompileError::QubitOutOfRange { qubit, num_qubits }),
        None => Ok(()),
    }
}

/// Fail with [`CompileError::UnsupportedGate`] on the first gate acting on
/// more than two qubits.
pub(crate) fn check_gate_arity(dag: &CircuitDag) -> CompileResult<()> {
    let oversized = dag
        .topological_ops()
        .enumerate()
        .find(|(_, (_, inst))| inst.is_gate() && inst.qubits.len() > 2);
    match oversized {
        Some((position, (_, inst))) => Err(CompileError::UnsupportedGate {
            gate: inst.name().to_string(),
            arity: inst.qubits.len(),
            position,
        }),
        None => Ok(()),
    }
}

/// Routes a logical circuit onto an architecture.
#[derive(Debug, Clone, Default)]
pub struct Router {
    config: RoutingConfig,
}

impl Router {
    /// Create a router with the given settings.
    pub fn new(config: RoutingConfig) -> Self {
        Self { config }
    }

    /// The router settings.
    pub fn config(&self) -> &RoutingConfig {
        &self.config
    }

    /// Route `dag` starting from `mapping`.
    ///
    /// The result has one wire per architecture node and every two-qubit
    /// gate acts on coupled nodes. Measurements are emitted on the node
    /// their logical qubit occupies at that point and keep their classical
    /// bit.
    ///
    /// # Errors
    ///
    /// - [`CompileError::QubitOutOfRange`] for non-dense logical qubits
    /// - [`CompileError::UnsupportedGate`] for gates on more than two qubits
    /// - [`CompileError::IncompleteMapping`] if a qubit has no node
    /// - [`CompileError::Connectivity`] if a gate's operands sit in
    ///   different components of the architecture
    pub fn run(
        &self,
        dag: &CircuitDag,
        arch: &Architecture,
        mut mapping: Mapping,
    ) -> CompileResult<PhysicalCircuit> {
        let node_count = arch.node_count();
        if dag.num_qubits() > node_count {
            return Err(CompileError::Capacity {
                required: dag.num_qubits(),
                available: node_count,
            });
        }
        check_dense_qubits(dag)?;
        check_gate_arity(dag)?;
        if mapping.node_count() != node_count {
            return Err(CompileError::PassPrecondition {
                pass: "routing".into(),
                reason: format!(
                    "mapping covers {} nodes but the architecture has {}",
                    mapping.node_count(),
                    node_count
                ),
            });
        }
        if mapping.num_qubits() < dag.num_qubits() {
            #[allow(clippy::cast_possible_truncation)]
            let qubit = QubitId(mapping.num_qubits() as u32);
            return Err(CompileError::IncompleteMapping { qubit });
        }
        let mut record = PermutationRecord::from_mapping(&mapping)?;

        let mut out = physical_dag(dag, node_count);
        let order: Vec<NodeIndex> = dag.topological_ops().map(|(node, _)| node).collect();
        let position: FxHashMap<NodeIndex, usize> =
            order.iter().enumerate().map(|(i, &node)| (node, i)).collect();
        let two_qubit: Vec<usize> = dag
            .topological_ops()
            .enumerate()
            .filter(|(_, (_, inst))| inst.is_two_qubit_gate())
            .map(|(i, _)| i)
            .collect();

        let mut emitted = vec![false; order.len()];
        let mut lookahead = Lookahead {
            two_qubit: &two_qubit,
            cursor: 0,
        };
        let mut frontier = dag.frontier();

        loop {
            // Emit everything executable under the current mapping.
            let mut progress = true;
            while progress {
                progress = false;
                let ready: Vec<NodeIndex> = frontier.ready().collect();
                for node in ready {
                    let Some(inst) = dag.get_instruction(node) else {
                        continue;
                    };
                    if !is_executable(inst, &mapping, arch) {
                        continue;
                    }
                    out.apply(to_physical(inst, &mapping)?)?;
                    frontier.retire(node)?;
                    if let Some(&pos) = position.get(&node) {
                        emitted[pos] = true;
                    }
                    progress = true;
                }
            }
            if frontier.is_done() {
                break;
            }

            let mut blocked = Vec::new();
            for node in frontier.ready() {
                let (Some(inst), Some(&pos)) = (dag.get_instruction(node), position.get(&node)) else {
                    continue;
                };
                blocked.push(BlockedGate {
                    position: pos,
                    qubits: (inst.qubits[0], inst.qubits[1]),
                });
            }
            blocked.sort_by_key(|g| g.position);

            let window = lookahead.window(&emitted, self.config.lookahead_window, dag, &order);
            let (a, b) = self.choose_swap(&blocked, &window, &mapping, arch)?;

            let swap_position = out.num_ops();
            out.apply(Instruction::two_qubit_gate(Gate::Swap, QubitId(a), QubitId(b)))?;
            mapping.swap_nodes(a, b);
            record.record_swap(a, b, swap_position);
            trace!("inserted SWAP({}, {}) at position {}", a, b, swap_position);
        }

        debug!(
            "routing inserted {} SWAPs, {} ops in, {} ops out",
            record.swaps().len(),
            dag.num_ops(),
            out.num_ops()
        );
        Ok(PhysicalCircuit::new(out, record))
    }

    /// Pick the SWAP that serves the closest blocked gate best.
    fn choose_swap(
        &self,
        blocked: &[BlockedGate],
        window: &[(QubitId, QubitId)],
        mapping: &Mapping,
        arch: &Architecture,
    ) -> CompileResult<(u32, u32)> {
        // Closest blocked gate, lowest position on ties. Gates split across
        // components count as infinitely far and fail once nothing else is
        // left to route.
        let mut target: Option<(u32, &BlockedGate, u32, u32)> = None;
        let mut split: Option<(&BlockedGate, u32, u32)> = None;
        for gate in blocked {
            let (pa, pb) = (node_of(mapping, gate.qubits.0)?, node_of(mapping, gate.qubits.1)?);
            match arch.distance(pa, pb) {
                Some(d) if target.is_none_or(|(best, ..)| d < best) => {
                    target = Some((d, gate, pa, pb));
                }
                Some(_) => {}
                None => {
                    split.get_or_insert((gate, pa, pb));
                }
            }
        }
        let (gate, pa, pb) = match (target, split) {
            (Some((_, gate, pa, pb)), _) => (gate, pa, pb),
            (None, Some((gate, pa, pb))) => {
                return Err(CompileError::Connectivity {
                    qubits: gate.qubits,
                    nodes: (pa, pb),
                    position: gate.position,
                });
            }
            (None, None) => {
                return Err(CompileError::PassPrecondition {
                    pass: "routing".into(),
                    reason: "no blocked gate to route".into(),
                });
            }
        };

        let mut candidates = BTreeSet::new();
        for (from, to) in [(pa, pb), (pb, pa)] {
            for hop in arch.next_hops(from, to) {
                candidates.insert((from.min(hop), from.max(hop)));
            }
        }

        let front_before: Vec<(u32, u32)> = pairs_of(blocked.iter().map(|g| g.qubits), mapping)?;
        let window_before: Vec<(u32, u32)> = pairs_of(window.iter().copied(), mapping)?;
        let window_total_before: f64 = window_before.iter().map(|&p| distance(arch, p)).sum();

        let mut best: Option<(f64, f64, (u32, u32))> = None;
        for (a, b) in candidates {
            let moved = |(x, y): (u32, u32)| (swapped(x, a, b), swapped(y, a, b));
            let front: f64 = front_before.iter().map(|&p| distance(arch, moved(p))).sum();
            let window_total: f64 = window_before.iter().map(|&p| distance(arch, moved(p))).sum();
            let window_mean = if window_before.is_empty() {
                0.0
            } else {
                #[allow(clippy::cast_precision_loss)]
                let len = window_before.len() as f64;
                window_total / len
            };
            let score = front + self.config.lookahead_weight * window_mean;
            let reduction = window_total_before - window_total;

            let better = match best {
                None => true,
                Some((best_score, best_reduction, _)) => score
                    .total_cmp(&best_score)
                    .then_with(|| best_reduction.total_cmp(&reduction))
                    .is_lt(),
            };
            if better {
                best = Some((score, reduction, (a, b)));
            }
        }

        best.map(|(_, _, pair)| pair)
            .ok_or_else(|| CompileError::Connectivity {
                qubits: gate.qubits,
                nodes: (pa, pb),
                position: gate.position,
            })
    }
}

/// A ready two-qubit gate whose operands are not coupled.
#[derive(Debug)]
struct BlockedGate {
    position: usize,
    qubits: (QubitId, QubitId),
}

/// Cursor over the two-qubit gates in topological order, skipping those
/// already emitted.
struct Lookahead<'a> {
    two_qubit: &'a [usize],
    cursor: usize,
}

impl Lookahead<'_> {
    fn window(
        &mut self,
        emitted: &[bool],
        size: usize,
        dag: &CircuitDag,
        order: &[NodeIndex],
    ) -> Vec<(QubitId, QubitId)> {
        while self
            .two_qubit
            .get(self.cursor)
            .is_some_and(|&pos| emitted[pos])
        {
            self.cursor += 1;
        }
        self.two_qubit[self.cursor..]
            .iter()
            .filter(|&&pos| !emitted[pos])
            .take(size)
            .filter_map(|&pos| dag.get_instruction(order[pos]))
            .map(|inst| (inst.qubits[0], inst.qubits[1]))
            .collect()
    }
}

fn node_of(mapping: &Mapping, qubit: QubitId) -> CompileResult<u32> {
    mapping
        .physical(qubit)
        .ok_or(CompileError::IncompleteMapping { qubit })
}

fn pairs_of(
    pairs: impl Iterator<Item = (QubitId, QubitId)>,
    mapping: &Mapping,
) -> CompileResult<Vec<(u32, u32)>> {
    pairs
        .map(|(a, b)| Ok((node_of(mapping, a)?, node_of(mapping, b)?)))
        .collect()
}

/// Node `n` after exchanging nodes `a` and `b`.
fn swapped(n: u32, a: u32, b: u32) -> u32 {
    if n == a {
        b
    } else if n == b {
        a
    } else {
        n
    }
}

/// Distance for scoring. Pairs in different components stay there under
/// any SWAP, so they contribute nothing.
fn distance(arch: &Architecture, (a, b): (u32, u32)) -> f64 {
    arch.distance(a, b).map_or(0.0, f64::from)
}

fn is_executable(inst: &Instruction, mapping: &Mapping, arch: &Architecture) -> bool {
    if !inst.is_two_qubit_gate() {
        return true;
    }
    match (mapping.physical(inst.qubits[0]), mapping.physical(inst.qubits[1])) {
        (Some(a), Some(b)) => arch.is_adjacent(a, b),
        _ => false,
    }
}

fn to_physical(inst: &Instruction, mapping: &Mapping) -> CompileResult<Instruction> {
    let qubits = inst
        .qubits
        .iter()
        .map(|&q| node_of(mapping, q).map(QubitId))
        .collect::<CompileResult<Vec<_>>>()?;
    Ok(Instruction {
        kind: inst.kind.clone(),
        qubits,
        clbits: inst.clbits.clone(),
    })
}

/// Empty physical DAG with one wire per node and the classical bits of
/// `dag`.
#[allow(clippy::cast_possible_truncation)]
fn physical_dag(dag: &CircuitDag, node_count: usize) -> CircuitDag {
    let mut out = CircuitDag::new();
    for node in 0..node_count as u32 {
        out.add_qubit(QubitId(node));
    }
    for clbit in dag.clbits() {
        match dag.clbit_info(clbit) {
            Some(info) => out.add_clbit(info.clone()),
            None => out.add_clbit(clbit),
        }
    }
    out.set_level(CircuitLevel::Physical);
    out
}
