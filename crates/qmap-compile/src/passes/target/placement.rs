//! Initial placement of logical qubits on physical nodes.
//!
//! The solver weighs every interacting pair by how early it interacts, then
//! searches for an assignment that keeps heavy pairs close. The search is
//! best-first over partial assignments and bounded by an expansion budget;
//! when the budget runs out a greedy placement takes over.

use std::cmp::Ordering;
use std::collections::{BTreeMap, BinaryHeap, VecDeque};

use qmap_ir::{CircuitDag, QubitId};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::architecture::Architecture;
use crate::error::{CompileError, CompileResult};
use crate::mapping::Mapping;

use super::routing::check_dense_qubits;

/// Cost per unit of weight for a pair placed in different components.
const UNREACHABLE_PENALTY: f64 = 1.0e6;

/// Placement strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Placement {
    /// Logical qubit `i` on node `i`.
    Trivial,
    /// Interaction-weighted best-first search with greedy fallback.
    #[default]
    Search,
}

/// Which path produced a mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PlacementOutcome {
    /// The search completed within its budget.
    Search,
    /// The search budget ran out and the greedy fallback was used.
    Greedy,
    /// Trivial placement was requested.
    Trivial,
}

/// Placement settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlacementConfig {
    /// Strategy to use.
    pub strategy: Placement,
    /// Number of search states that may be generated before falling back
    /// to greedy placement.
    pub search_budget: usize,
    /// Weight multiplier per two-qubit layer; interactions in layer `k`
    /// weigh `interaction_decay^k`.
    pub interaction_decay: f64,
}

impl Default for PlacementConfig {
    fn default() -> Self {
        Self {
            strategy: Placement::Search,
            search_budget: 10_000,
            interaction_decay: 0.95,
        }
    }
}

/// Chooses the initial mapping for routing.
#[derive(Debug, Clone, Default)]
pub struct PlacementSolver {
    config: PlacementConfig,
}

impl PlacementSolver {
    /// Create a solver with the given settings.
    pub fn new(config: PlacementConfig) -> Self {
        Self { config }
    }

    /// The solver settings.
    pub fn config(&self) -> &PlacementConfig {
        &self.config
    }

    /// Place every logical qubit of `dag` on a distinct node of `arch`.
    ///
    /// Fails with [`CompileError::Capacity`] when the circuit has more
    /// qubits than the architecture has nodes.
    pub fn place(
        &self,
        dag: &CircuitDag,
        arch: &Architecture,
    ) -> CompileResult<(Mapping, PlacementOutcome)> {
        let num_qubits = dag.num_qubits();
        let node_count = arch.node_count();
        if num_qubits > node_count {
            return Err(CompileError::Capacity {
                required: num_qubits,
                available: node_count,
            });
        }
        check_dense_qubits(dag)?;

        if self.config.strategy == Placement::Trivial {
            return Ok((Mapping::trivial(num_qubits, node_count), PlacementOutcome::Trivial));
        }

        let interactions = InteractionGraph::build(dag, self.config.interaction_decay);
        let order = interactions.search_order();

        let (mut mapping, outcome) =
            match search(&interactions, &order, arch, self.config.search_budget) {
                Some(mapping) => (mapping, PlacementOutcome::Search),
                None => {
                    warn!(
                        "placement search budget of {} states exhausted, using greedy placement",
                        self.config.search_budget
                    );
                    (greedy(&interactions, arch), PlacementOutcome::Greedy)
                }
            };

        place_isolated(&mut mapping);
        debug!(
            "placement: {:?} for {} qubits on {} nodes",
            outcome, num_qubits, node_count
        );
        Ok((mapping, outcome))
    }
}

/// Weighted interaction graph between logical qubits.
#[derive(Debug)]
struct InteractionGraph {
    num_qubits: usize,
    /// Weight per unordered pair, smaller qubit first.
    weights: BTreeMap<(QubitId, QubitId), f64>,
    /// Interaction partners per qubit with the pair weight.
    partners: Vec<Vec<(QubitId, f64)>>,
    /// Total interaction weight per qubit.
    totals: Vec<f64>,
}

impl InteractionGraph {
    #[allow(clippy::cast_possible_wrap, clippy::cast_possible_truncation)]
    fn build(dag: &CircuitDag, decay: f64) -> Self {
        let num_qubits = dag.num_qubits();
        let mut layer_of = vec![0usize; num_qubits];
        let mut weights: BTreeMap<(QubitId, QubitId), f64> = BTreeMap::new();

        for (_, inst) in dag.topological_ops() {
            if !inst.is_two_qubit_gate() {
                continue;
            }
            let (a, b) = (inst.qubits[0], inst.qubits[1]);
            let layer = layer_of[a.index()].max(layer_of[b.index()]);
            layer_of[a.index()] = layer + 1;
            layer_of[b.index()] = layer + 1;
            *weights.entry((a.min(b), a.max(b))).or_insert(0.0) += decay.powi(layer as i32);
        }

        let mut partners = vec![Vec::new(); num_qubits];
        let mut totals = vec![0.0; num_qubits];
        for (&(a, b), &w) in &weights {
            partners[a.index()].push((b, w));
            partners[b.index()].push((a, w));
            totals[a.index()] += w;
            totals[b.index()] += w;
        }

        Self {
            num_qubits,
            weights,
            partners,
            totals,
        }
    }

    fn weight(&self, a: QubitId, b: QubitId) -> f64 {
        self.weights.get(&(a.min(b), a.max(b))).copied().unwrap_or(0.0)
    }

    fn is_interacting(&self, qubit: QubitId) -> bool {
        !self.partners[qubit.index()].is_empty()
    }

    #[allow(clippy::cast_possible_truncation)]
    fn interacting_qubits(&self) -> impl Iterator<Item = QubitId> + '_ {
        (0..self.num_qubits as u32)
            .map(QubitId)
            .filter(|&q| self.is_interacting(q))
    }

    /// Heaviest qubit first, then breadth-first over heaviest interactions.
    /// Each interaction component is started from its heaviest qubit.
    fn search_order(&self) -> Vec<QubitId> {
        let mut visited = vec![false; self.num_qubits];
        let mut order = Vec::new();

        while let Some(start) = self
            .interacting_qubits()
            .filter(|q| !visited[q.index()])
            .max_by(|&a, &b| heavier(self.totals[a.index()], a, self.totals[b.index()], b))
        {
            let mut queue = VecDeque::from([start]);
            visited[start.index()] = true;
            while let Some(qubit) = queue.pop_front() {
                order.push(qubit);
                let mut next: Vec<(QubitId, f64)> = self.partners[qubit.index()]
                    .iter()
                    .copied()
                    .filter(|(q, _)| !visited[q.index()])
                    .collect();
                next.sort_by(|&(a, wa), &(b, wb)| heavier(wb, b, wa, a));
                for (q, _) in next {
                    visited[q.index()] = true;
                    queue.push_back(q);
                }
            }
        }
        order
    }
}

/// Orders by weight, with the lower qubit index winning ties.
fn heavier(wa: f64, a: QubitId, wb: f64, b: QubitId) -> Ordering {
    wa.total_cmp(&wb).then_with(|| b.cmp(&a))
}

fn pair_cost(arch: &Architecture, weight: f64, a: u32, b: u32) -> f64 {
    match arch.distance(a, b) {
        Some(d) => weight * f64::from(d.saturating_sub(1)),
        None => weight * UNREACHABLE_PENALTY,
    }
}

/// Partial assignment: `nodes[i]` holds `order[i]`.
#[derive(Debug)]
struct SearchState {
    cost: f64,
    nodes: Vec<u32>,
}

impl Ord for SearchState {
    /// Cheapest first, then deepest, then lexicographically smallest.
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .cost
            .total_cmp(&self.cost)
            .then_with(|| self.nodes.len().cmp(&other.nodes.len()))
            .then_with(|| other.nodes.cmp(&self.nodes))
    }
}

impl PartialOrd for SearchState {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for SearchState {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for SearchState {}

/// Best-first search over assignments of `order`.
///
/// Extending a state never lowers its cost, so the first complete state
/// popped is the cheapest. Returns `None` once more than `budget` states
/// were generated.
#[allow(clippy::cast_possible_truncation)]
fn search(
    interactions: &InteractionGraph,
    order: &[QubitId],
    arch: &Architecture,
    budget: usize,
) -> Option<Mapping> {
    let node_count = arch.node_count();

    // Earlier-placed partners of each qubit in `order`, by position.
    let earlier: Vec<Vec<(usize, f64)>> = order
        .iter()
        .enumerate()
        .map(|(k, &q)| {
            order[..k]
                .iter()
                .enumerate()
                .filter_map(|(j, &p)| {
                    let w = interactions.weight(q, p);
                    (w > 0.0).then_some((j, w))
                })
                .collect()
        })
        .collect();

    let mut heap = BinaryHeap::from([SearchState {
        cost: 0.0,
        nodes: Vec::new(),
    }]);
    let mut generated = 0usize;

    while let Some(state) = heap.pop() {
        let depth = state.nodes.len();
        if depth == order.len() {
            let mut mapping = Mapping::new(interactions.num_qubits, node_count);
            for (&qubit, &node) in order.iter().zip(&state.nodes) {
                mapping.assign(qubit, node);
            }
            return Some(mapping);
        }

        let mut used = vec![false; node_count];
        for &n in &state.nodes {
            used[n as usize] = true;
        }

        for node in (0..node_count as u32).filter(|&n| !used[n as usize]) {
            generated += 1;
            if generated > budget {
                return None;
            }
            let added: f64 = earlier[depth]
                .iter()
                .map(|&(j, w)| pair_cost(arch, w, node, state.nodes[j]))
                .sum();
            let mut nodes = Vec::with_capacity(depth + 1);
            nodes.extend_from_slice(&state.nodes);
            nodes.push(node);
            heap.push(SearchState {
                cost: state.cost + added,
                nodes,
            });
        }
    }
    None
}

/// Greedy placement used when the search budget is exhausted.
///
/// The heaviest interacting pair goes on the free edge with the most free
/// neighbours. Then, repeatedly, the unplaced qubit with the most weight
/// towards placed qubits goes on the free neighbour of its heaviest placed
/// partner that minimizes its weighted distance to placed partners, or on
/// the nearest free node when no neighbour is free. A qubit with no placed
/// partner starts a new seed pair.
fn greedy(interactions: &InteractionGraph, arch: &Architecture) -> Mapping {
    let mut mapping = Mapping::new(interactions.num_qubits, arch.node_count());

    loop {
        let unplaced = interactions
            .interacting_qubits()
            .filter(|&q| mapping.physical(q).is_none());
        let best = unplaced
            .map(|q| (q, placed_weight(interactions, &mapping, q)))
            .max_by(|&(a, wa), &(b, wb)| {
                wa.total_cmp(&wb).then_with(|| {
                    heavier(interactions.totals[a.index()], a, interactions.totals[b.index()], b)
                })
            });
        let Some((qubit, weight)) = best else {
            break;
        };

        if weight > 0.0 {
            match node_near_partners(interactions, &mapping, arch, qubit) {
                Some(node) => mapping.assign(qubit, node),
                None => break,
            }
            continue;
        }

        if let Some(((a, na), (b, nb))) = seed_pair(interactions, &mapping, arch) {
            mapping.assign(a, na);
            mapping.assign(b, nb);
        } else if let Some(node) = best_connected_free_node(&mapping, arch) {
            mapping.assign(qubit, node);
        } else {
            break;
        }
    }
    mapping
}

/// Heaviest pair of unplaced qubits on the free edge whose endpoints have
/// the most other free neighbours. The heavier qubit of the pair takes the
/// better-connected endpoint.
fn seed_pair(
    interactions: &InteractionGraph,
    mapping: &Mapping,
    arch: &Architecture,
) -> Option<((QubitId, u32), (QubitId, u32))> {
    let (&(a, b), _) = interactions
        .weights
        .iter()
        .filter(|((a, b), _)| mapping.physical(*a).is_none() && mapping.physical(*b).is_none())
        .max_by(|&(&(a1, b1), &w1), &(&(a2, b2), &w2)| {
            w1.total_cmp(&w2).then_with(|| (a2, b2).cmp(&(a1, b1)))
        })?;

    let free_around = |node: u32, partner: u32| {
        arch.neighbors(node)
            .iter()
            .filter(|&&m| m != partner && mapping.logical(m).is_none())
            .count()
    };
    let (n1, n2) = arch
        .edges()
        .iter()
        .copied()
        .filter(|&(x, y)| mapping.logical(x).is_none() && mapping.logical(y).is_none())
        .map(|(x, y)| (x.min(y), x.max(y)))
        .max_by(|&(x1, y1), &(x2, y2)| {
            let score1 = free_around(x1, y1) + free_around(y1, x1);
            let score2 = free_around(x2, y2) + free_around(y2, x2);
            score1.cmp(&score2).then_with(|| (x2, y2).cmp(&(x1, y1)))
        })?;

    let (hub, rim) = if free_around(n1, n2) >= free_around(n2, n1) {
        (n1, n2)
    } else {
        (n2, n1)
    };
    let totals = &interactions.totals;
    let (heavy, light) = if heavier(totals[a.index()], a, totals[b.index()], b) == Ordering::Less {
        (b, a)
    } else {
        (a, b)
    };
    Some(((heavy, hub), (light, rim)))
}

fn placed_weight(interactions: &InteractionGraph, mapping: &Mapping, qubit: QubitId) -> f64 {
    interactions.partners[qubit.index()]
        .iter()
        .filter(|(p, _)| mapping.physical(*p).is_some())
        .map(|&(_, w)| w)
        .sum()
}

fn weighted_distance(
    interactions: &InteractionGraph,
    mapping: &Mapping,
    arch: &Architecture,
    qubit: QubitId,
    node: u32,
) -> f64 {
    interactions.partners[qubit.index()]
        .iter()
        .filter_map(|&(p, w)| mapping.physical(p).map(|pn| pair_cost(arch, w, node, pn)))
        .sum()
}

fn node_near_partners(
    interactions: &InteractionGraph,
    mapping: &Mapping,
    arch: &Architecture,
    qubit: QubitId,
) -> Option<u32> {
    let anchor = interactions.partners[qubit.index()]
        .iter()
        .filter_map(|&(p, w)| mapping.physical(p).map(|n| (n, w, p)))
        .max_by(|&(_, wa, a), &(_, wb, b)| heavier(wa, a, wb, b))
        .map(|(n, _, _)| n)?;

    let cost = |node: u32| weighted_distance(interactions, mapping, arch, qubit, node);
    let free_neighbour = arch
        .neighbors(anchor)
        .iter()
        .copied()
        .filter(|&n| mapping.logical(n).is_none())
        .min_by(|&a, &b| cost(a).total_cmp(&cost(b)).then_with(|| a.cmp(&b)));

    free_neighbour.or_else(|| {
        mapping
            .free_nodes()
            .min_by_key(|&n| (arch.distance(anchor, n).unwrap_or(u32::MAX), n))
    })
}

/// Free node with the most free neighbours, lowest index on ties.
fn best_connected_free_node(mapping: &Mapping, arch: &Architecture) -> Option<u32> {
    mapping.free_nodes().max_by(|&a, &b| {
        let free = |n: u32| {
            arch.neighbors(n)
                .iter()
                .filter(|&&m| mapping.logical(m).is_none())
                .count()
        };
        free(a).cmp(&free(b)).then_with(|| b.cmp(&a))
    })
}

/// Qubits without interactions take the lowest free nodes.
fn place_isolated(mapping: &mut Mapping) {
    while let Some(qubit) = mapping.first_unassigned() {
        let Some(node) = mapping.free_nodes().next() else {
            break;
        };
        mapping.assign(qubit, node);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use qmap_ir::Circuit;

    fn solver(budget: usize) -> PlacementSolver {
        PlacementSolver::new(PlacementConfig {
            search_budget: budget,
            ..PlacementConfig::default()
        })
    }

    #[test]
    fn test_capacity_error() {
        let dag = Circuit::with_size("test", 5, 0).into_dag();
        let err = PlacementSolver::default()
            .place(&dag, &Architecture::linear(4))
            .unwrap_err();
        assert!(matches!(
            err,
            CompileError::Capacity {
                required: 5,
                available: 4
            }
        ));
    }

    #[test]
    fn test_trivial_strategy() {
        let mut circuit = Circuit::with_size("test", 3, 0);
        circuit.cx(QubitId(0), QubitId(2)).unwrap();
        let solver = PlacementSolver::new(PlacementConfig {
            strategy: Placement::Trivial,
            ..PlacementConfig::default()
        });
        let (mapping, outcome) = solver.place(circuit.dag(), &Architecture::linear(4)).unwrap();
        assert_eq!(outcome, PlacementOutcome::Trivial);
        assert_eq!(mapping.physical(QubitId(2)), Some(2));
    }

    #[test]
    fn test_search_places_pair_adjacent() {
        let mut circuit = Circuit::with_size("test", 4, 0);
        circuit.cx(QubitId(0), QubitId(3)).unwrap();
        let arch = Architecture::linear(4);

        let (mapping, outcome) = solver(10_000).place(circuit.dag(), &arch).unwrap();
        assert_eq!(outcome, PlacementOutcome::Search);
        assert!(mapping.is_total());
        let a = mapping.physical(QubitId(0)).unwrap();
        let b = mapping.physical(QubitId(3)).unwrap();
        assert!(arch.is_adjacent(a, b));
    }

    #[test]
    fn test_search_finds_triangle_free_chain() {
        // q0-q1-q2-q3 interact in a chain; a line fits it with zero cost.
        let mut circuit = Circuit::with_size("test", 4, 0);
        circuit
            .cx(QubitId(2), QubitId(0))
            .unwrap()
            .cx(QubitId(0), QubitId(3))
            .unwrap()
            .cx(QubitId(3), QubitId(1))
            .unwrap();
        let arch = Architecture::linear(4);

        let (mapping, _) = solver(10_000).place(circuit.dag(), &arch).unwrap();
        for (a, b) in [(2, 0), (0, 3), (3, 1)] {
            let na = mapping.physical(QubitId(a)).unwrap();
            let nb = mapping.physical(QubitId(b)).unwrap();
            assert!(arch.is_adjacent(na, nb), "q{a} and q{b} not adjacent");
        }
    }

    #[test]
    fn test_greedy_fallback_uses_hub() {
        let mut circuit = Circuit::with_size("test", 4, 0);
        circuit
            .cx(QubitId(3), QubitId(0))
            .unwrap()
            .cx(QubitId(3), QubitId(1))
            .unwrap()
            .cx(QubitId(3), QubitId(2))
            .unwrap();
        let arch = Architecture::star(5);

        let (mapping, outcome) = solver(0).place(circuit.dag(), &arch).unwrap();
        assert_eq!(outcome, PlacementOutcome::Greedy);
        assert_eq!(mapping.physical(QubitId(3)), Some(0));
        assert!(mapping.is_total());
    }

    #[test]
    fn test_greedy_seeds_heaviest_pair_on_an_edge() {
        // q2 has the largest total weight, but q0-q1 is the heaviest pair.
        let mut circuit = Circuit::with_size("test", 7, 0);
        for _ in 0..3 {
            circuit.cx(QubitId(0), QubitId(1)).unwrap();
        }
        for t in 3..7 {
            circuit.cx(QubitId(2), QubitId(t)).unwrap();
        }
        let arch = Architecture::star(7);

        let (mapping, outcome) = solver(0).place(circuit.dag(), &arch).unwrap();
        assert_eq!(outcome, PlacementOutcome::Greedy);
        assert!(mapping.is_total());
        let a = mapping.physical(QubitId(0)).unwrap();
        let b = mapping.physical(QubitId(1)).unwrap();
        assert!(arch.is_adjacent(a, b), "q0 on {a} and q1 on {b} are not adjacent");
        assert_eq!(a, 0);
    }

    #[test]
    fn test_isolated_qubits_take_lowest_free_nodes() {
        let mut circuit = Circuit::with_size("test", 3, 0);
        circuit.h(QubitId(0)).unwrap().x(QubitId(2)).unwrap();

        let (mapping, _) = solver(10_000)
            .place(circuit.dag(), &Architecture::linear(5))
            .unwrap();
        assert_eq!(
            mapping.iter().collect::<Vec<_>>(),
            vec![(QubitId(0), 0), (QubitId(1), 1), (QubitId(2), 2)]
        );
    }

    #[test]
    fn test_interaction_weights_decay_by_layer() {
        let mut circuit = Circuit::with_size("test", 3, 0);
        circuit
            .cx(QubitId(0), QubitId(1))
            .unwrap()
            .cx(QubitId(1), QubitId(2))
            .unwrap()
            .cx(QubitId(0), QubitId(1))
            .unwrap();
        let graph = InteractionGraph::build(circuit.dag(), 0.5);

        assert!((graph.weight(QubitId(0), QubitId(1)) - 1.25).abs() < 1e-12);
        assert!((graph.weight(QubitId(2), QubitId(1)) - 0.5).abs() < 1e-12);
        assert_eq!(graph.weight(QubitId(0), QubitId(2)), 0.0);
        assert_eq!(graph.search_order(), vec![QubitId(1), QubitId(0), QubitId(2)]);
    }

    #[test]
    fn test_config_deserializes_with_defaults() {
        let config: PlacementConfig = serde_json::from_str(r#"{"strategy":"trivial"}"#).unwrap();
        assert_eq!(config.strategy, Placement::Trivial);
        assert_eq!(config.search_budget, 10_000);
    }
}
