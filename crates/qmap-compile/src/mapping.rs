//! Logical-to-physical assignment and its history.

use qmap_ir::{CircuitDag, QubitId};
use serde::{Deserialize, Serialize};

use crate::error::{CompileError, CompileResult};

/// Bijection between logical qubits and physical nodes.
///
/// Both directions are stored as dense vectors so lookups and swaps are
/// O(1). The mapping is partial while placement runs and total once
/// routing starts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mapping {
    to_physical: Vec<Option<u32>>,
    to_logical: Vec<Option<QubitId>>,
}

impl Mapping {
    /// Empty mapping for `num_qubits` logical qubits on `node_count` nodes.
    pub fn new(num_qubits: usize, node_count: usize) -> Self {
        Self {
            to_physical: vec![None; num_qubits],
            to_logical: vec![None; node_count],
        }
    }

    /// Logical qubit `i` on node `i`. Requires `num_qubits <= node_count`.
    #[allow(clippy::cast_possible_truncation)]
    pub fn trivial(num_qubits: usize, node_count: usize) -> Self {
        let mut mapping = Self::new(num_qubits, node_count);
        for i in 0..num_qubits.min(node_count) {
            mapping.assign(QubitId(i as u32), i as u32);
        }
        mapping
    }

    /// Place `logical` on `node`.
    ///
    /// If either side was already assigned, the old pairing is dropped
    /// first so the mapping stays a bijection.
    pub fn assign(&mut self, logical: QubitId, node: u32) {
        if let Some(old_logical) = self.to_logical[node as usize] {
            self.to_physical[old_logical.index()] = None;
        }
        if let Some(old_node) = self.to_physical[logical.index()] {
            self.to_logical[old_node as usize] = None;
        }
        self.to_physical[logical.index()] = Some(node);
        self.to_logical[node as usize] = Some(logical);
    }

    /// Node holding `logical`.
    #[inline]
    pub fn physical(&self, logical: QubitId) -> Option<u32> {
        self.to_physical.get(logical.index()).copied().flatten()
    }

    /// Logical qubit held by `node`.
    #[inline]
    pub fn logical(&self, node: u32) -> Option<QubitId> {
        self.to_logical.get(node as usize).copied().flatten()
    }

    /// Exchange the contents of two nodes. Either may be empty.
    pub fn swap_nodes(&mut self, a: u32, b: u32) {
        let (a, b) = (a as usize, b as usize);
        self.to_logical.swap(a, b);
        #[allow(clippy::cast_possible_truncation)]
        for node in [a, b] {
            if let Some(q) = self.to_logical[node] {
                self.to_physical[q.index()] = Some(node as u32);
            }
        }
    }

    /// Whether every logical qubit has a node.
    pub fn is_total(&self) -> bool {
        self.to_physical.iter().all(Option::is_some)
    }

    /// First logical qubit without a node.
    #[allow(clippy::cast_possible_truncation)]
    pub fn first_unassigned(&self) -> Option<QubitId> {
        self.to_physical
            .iter()
            .position(Option::is_none)
            .map(|i| QubitId(i as u32))
    }

    /// Nodes holding no logical qubit, ascending.
    #[allow(clippy::cast_possible_truncation)]
    pub fn free_nodes(&self) -> impl Iterator<Item = u32> + '_ {
        self.to_logical
            .iter()
            .enumerate()
            .filter(|(_, q)| q.is_none())
            .map(|(n, _)| n as u32)
    }

    /// Number of logical qubits.
    pub fn num_qubits(&self) -> usize {
        self.to_physical.len()
    }

    /// Number of physical nodes.
    pub fn node_count(&self) -> usize {
        self.to_logical.len()
    }

    /// Assigned `(logical, node)` pairs in logical order.
    #[allow(clippy::cast_possible_truncation)]
    pub fn iter(&self) -> impl Iterator<Item = (QubitId, u32)> + '_ {
        self.to_physical
            .iter()
            .enumerate()
            .filter_map(|(q, node)| node.map(|n| (QubitId(q as u32), n)))
    }
}

/// One inserted SWAP.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwapRecord {
    /// The exchanged nodes.
    pub nodes: (u32, u32),
    /// Index of the SWAP in the routed instruction order.
    pub position: usize,
}

/// Where every logical qubit started and where it ended up.
///
/// Classical readout follows the logical qubit: a measurement is emitted on
/// the node its qubit occupies at that moment and writes the same classical
/// bit as in the input circuit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermutationRecord {
    initial: Vec<u32>,
    current: Vec<u32>,
    swaps: Vec<SwapRecord>,
}

impl PermutationRecord {
    /// Start a record from a total mapping.
    pub fn from_mapping(mapping: &Mapping) -> CompileResult<Self> {
        if let Some(qubit) = mapping.first_unassigned() {
            return Err(CompileError::IncompleteMapping { qubit });
        }
        let initial: Vec<u32> = mapping.iter().map(|(_, n)| n).collect();
        Ok(Self {
            current: initial.clone(),
            initial,
            swaps: Vec::new(),
        })
    }

    /// Log a SWAP of nodes `a` and `b` emitted at `position`.
    pub fn record_swap(&mut self, a: u32, b: u32, position: usize) {
        for node in &mut self.current {
            if *node == a {
                *node = b;
            } else if *node == b {
                *node = a;
            }
        }
        self.swaps.push(SwapRecord {
            nodes: (a, b),
            position,
        });
    }

    /// Node `qubit` started on.
    pub fn initial_node(&self, qubit: QubitId) -> Option<u32> {
        self.initial.get(qubit.index()).copied()
    }

    /// Node holding `qubit` at the end of the circuit.
    pub fn final_node(&self, qubit: QubitId) -> Option<u32> {
        self.current.get(qubit.index()).copied()
    }

    /// Initial node per logical qubit.
    pub fn initial_layout(&self) -> &[u32] {
        &self.initial
    }

    /// Final node per logical qubit.
    pub fn permutation(&self) -> &[u32] {
        &self.current
    }

    /// Inserted SWAPs in emission order.
    pub fn swaps(&self) -> &[SwapRecord] {
        &self.swaps
    }

    /// Number of logical qubits tracked.
    pub fn num_qubits(&self) -> usize {
        self.initial.len()
    }
}

/// A routed circuit over physical nodes.
///
/// Wire `QubitId(n)` of the DAG is node `n`. The circuit owns its gates and
/// shares nothing with the logical circuit it was routed from.
#[derive(Debug, Clone)]
pub struct PhysicalCircuit {
    dag: CircuitDag,
    record: PermutationRecord,
    swaps_inserted: usize,
}

impl PhysicalCircuit {
    pub(crate) fn new(dag: CircuitDag, record: PermutationRecord) -> Self {
        let swaps_inserted = record.swaps().len();
        Self {
            dag,
            record,
            swaps_inserted,
        }
    }

    /// The routed DAG.
    pub fn dag(&self) -> &CircuitDag {
        &self.dag
    }

    /// Mutable access to the routed DAG, for post-routing passes.
    pub fn dag_mut(&mut self) -> &mut CircuitDag {
        &mut self.dag
    }

    /// Initial and final placement plus the SWAP log.
    pub fn permutation(&self) -> &PermutationRecord {
        &self.record
    }

    /// Number of SWAPs the router inserted.
    pub fn swaps_inserted(&self) -> usize {
        self.swaps_inserted
    }

    /// Split into DAG and permutation record.
    pub fn into_parts(self) -> (CircuitDag, PermutationRecord) {
        (self.dag, self.record)
    }
}
