//! DAG-based circuit representation.

use std::cmp::Reverse;
use std::collections::{BTreeMap, BTreeSet, BinaryHeap};

use petgraph::Direction;
use petgraph::graph::{DiGraph, NodeIndex as PetNodeIndex};
use petgraph::visit::EdgeRef;
use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};

use crate::error::{IrError, IrResult};
use crate::instruction::{Instruction, InstructionKind};
use crate::qubit::{Clbit, ClbitId, QubitId};

/// Node index type for the circuit DAG.
pub type NodeIndex = PetNodeIndex<u32>;

/// A node in the circuit DAG.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum DagNode {
    /// Input node for a wire.
    In(WireId),
    /// Output node for a wire.
    Out(WireId),
    /// Operation node containing an instruction.
    Op(Instruction),
}

impl DagNode {
    /// Check if this is an operation node.
    #[inline]
    pub fn is_op(&self) -> bool {
        matches!(self, DagNode::Op(_))
    }

    /// Get the instruction if this is an operation node.
    #[inline]
    pub fn instruction(&self) -> Option<&Instruction> {
        match self {
            DagNode::Op(inst) => Some(inst),
            _ => None,
        }
    }
}

/// Identifier for a wire in the DAG.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WireId {
    /// A quantum wire.
    Qubit(QubitId),
    /// A classical wire.
    Clbit(ClbitId),
}

impl From<QubitId> for WireId {
    fn from(q: QubitId) -> Self {
        WireId::Qubit(q)
    }
}

impl From<ClbitId> for WireId {
    fn from(c: ClbitId) -> Self {
        WireId::Clbit(c)
    }
}

/// An edge in the circuit DAG representing one wire segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DagEdge {
    /// The wire this edge represents.
    pub wire: WireId,
}

/// Whether the qubit wires of a circuit are logical qubits or device nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CircuitLevel {
    /// Wires are abstract logical qubits.
    #[default]
    Logical,
    /// Wire `QubitId(n)` is physical node `n`.
    Physical,
}

/// DAG-based circuit representation.
///
/// - Nodes are input nodes, output nodes, or operation nodes.
/// - Edges are wire segments; every wire runs from its `In` node to its
///   `Out` node through the operations that touch it, in program order.
/// - Nodes are never removed, so node indices follow insertion order.
///   Rewrites build a fresh DAG over the same wires instead (see
///   [`CircuitDag::rebuild`]).
///
/// `wire_front` maps each wire to the node just before its output node, so
/// [`CircuitDag::apply`] finds predecessors in O(1).
#[derive(Debug, Clone, Default)]
pub struct CircuitDag {
    graph: DiGraph<DagNode, DagEdge, u32>,
    qubit_inputs: FxHashMap<QubitId, NodeIndex>,
    qubit_outputs: FxHashMap<QubitId, NodeIndex>,
    clbit_inputs: FxHashMap<ClbitId, NodeIndex>,
    clbit_outputs: FxHashMap<ClbitId, NodeIndex>,
    /// Register metadata of each classical bit.
    clbit_info: BTreeMap<ClbitId, Clbit>,
    wire_front: FxHashMap<WireId, NodeIndex>,
    level: CircuitLevel,
}

impl CircuitDag {
    /// Create a new empty circuit DAG.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a qubit wire. Adding an existing qubit is a no-op.
    pub fn add_qubit(&mut self, qubit: QubitId) {
        if self.qubit_inputs.contains_key(&qubit) {
            return;
        }
        let (in_node, out_node) = self.add_wire(WireId::Qubit(qubit));
        self.qubit_inputs.insert(qubit, in_node);
        self.qubit_outputs.insert(qubit, out_node);
    }

    /// Add a classical wire. Adding an existing bit is a no-op.
    pub fn add_clbit(&mut self, clbit: impl Into<Clbit>) {
        let clbit = clbit.into();
        if self.clbit_inputs.contains_key(&clbit.id) {
            return;
        }
        let (in_node, out_node) = self.add_wire(WireId::Clbit(clbit.id));
        self.clbit_inputs.insert(clbit.id, in_node);
        self.clbit_outputs.insert(clbit.id, out_node);
        self.clbit_info.insert(clbit.id, clbit);
    }

    fn add_wire(&mut self, wire: WireId) -> (NodeIndex, NodeIndex) {
        let in_node = self.graph.add_node(DagNode::In(wire));
        let out_node = self.graph.add_node(DagNode::Out(wire));
        self.graph.add_edge(in_node, out_node, DagEdge { wire });
        self.wire_front.insert(wire, in_node);
        (in_node, out_node)
    }

    /// Append an instruction at the end of its wires.
    #[allow(clippy::cast_possible_truncation)]
    pub fn apply(&mut self, instruction: Instruction) -> IrResult<NodeIndex> {
        let gate_name = instruction.as_gate().map(|g| g.name().to_string());

        match &instruction.kind {
            InstructionKind::Gate(gate) => {
                let expected = gate.num_qubits();
                let got = instruction.qubits.len() as u32;
                if expected != got {
                    return Err(IrError::QubitCountMismatch {
                        gate_name: gate.name().to_string(),
                        expected,
                        got,
                    });
                }
            }
            InstructionKind::Measure => {
                if instruction.qubits.len() != 1 || instruction.clbits.len() != 1 {
                    return Err(IrError::MalformedMeasure {
                        qubits: instruction.qubits.len(),
                        clbits: instruction.clbits.len(),
                    });
                }
            }
            InstructionKind::Barrier => {
                if instruction.qubits.is_empty() {
                    return Err(IrError::InvalidDag("barrier without qubits".into()));
                }
            }
        }

        for &qubit in &instruction.qubits {
            if !self.qubit_inputs.contains_key(&qubit) {
                return Err(IrError::QubitNotFound {
                    qubit,
                    gate_name: gate_name.clone(),
                });
            }
        }
        for &clbit in &instruction.clbits {
            if !self.clbit_inputs.contains_key(&clbit) {
                return Err(IrError::ClbitNotFound {
                    clbit,
                    gate_name: gate_name.clone(),
                });
            }
        }

        let mut seen = FxHashSet::default();
        for &qubit in &instruction.qubits {
            if !seen.insert(qubit) {
                return Err(IrError::DuplicateQubit {
                    qubit,
                    gate_name: gate_name.clone(),
                });
            }
        }

        let wires: Vec<(WireId, NodeIndex)> = instruction
            .qubits
            .iter()
            .map(|q| (WireId::Qubit(*q), self.qubit_outputs[q]))
            .chain(
                instruction
                    .clbits
                    .iter()
                    .map(|c| (WireId::Clbit(*c), self.clbit_outputs[c])),
            )
            .collect();

        let op_node = self.graph.add_node(DagNode::Op(instruction));

        for (wire, out_node) in wires {
            let prev_node = self.wire_front[&wire];
            let eid = self
                .graph
                .edges_directed(prev_node, Direction::Outgoing)
                .find(|e| e.weight().wire == wire && e.target() == out_node)
                .map(|e| e.id())
                .ok_or_else(|| {
                    IrError::InvalidDag(format!(
                        "missing edge into output node of wire {wire:?}"
                    ))
                })?;
            self.graph.remove_edge(eid);
            self.graph.add_edge(prev_node, op_node, DagEdge { wire });
            self.graph.add_edge(op_node, out_node, DagEdge { wire });
            self.wire_front.insert(wire, op_node);
        }

        Ok(op_node)
    }

    /// An empty DAG with the same wires, register metadata and level.
    pub fn with_same_wires(&self) -> Self {
        let mut dag = CircuitDag::new();
        for qubit in self.qubits() {
            dag.add_qubit(qubit);
        }
        for clbit in self.clbit_info.values() {
            dag.add_clbit(clbit.clone());
        }
        dag.level = self.level;
        dag
    }

    /// Replace the operations of this DAG with `instructions`, keeping the
    /// wires. On error the DAG is left unchanged.
    pub fn rebuild(&mut self, instructions: impl IntoIterator<Item = Instruction>) -> IrResult<()> {
        let mut dag = self.with_same_wires();
        for inst in instructions {
            dag.apply(inst)?;
        }
        *self = dag;
        Ok(())
    }

    /// Operations in a deterministic topological order.
    ///
    /// Among the ready nodes the lowest node index goes first, so a DAG
    /// built by appending instructions yields them back in append order.
    pub fn topological_ops(&self) -> impl Iterator<Item = (NodeIndex, &Instruction)> {
        self.topological_order()
            .into_iter()
            .filter_map(|idx| self.graph[idx].instruction().map(|inst| (idx, inst)))
    }

    /// Clone of every instruction, in topological order.
    pub fn instructions(&self) -> Vec<Instruction> {
        self.topological_ops()
            .map(|(_, inst)| inst.clone())
            .collect()
    }

    fn topological_order(&self) -> Vec<NodeIndex> {
        let mut indegree: Vec<usize> = self
            .graph
            .node_indices()
            .map(|n| self.graph.edges_directed(n, Direction::Incoming).count())
            .collect();
        let mut heap: BinaryHeap<Reverse<NodeIndex>> = self
            .graph
            .node_indices()
            .filter(|n| indegree[n.index()] == 0)
            .map(Reverse)
            .collect();

        let mut order = Vec::with_capacity(self.graph.node_count());
        while let Some(Reverse(node)) = heap.pop() {
            order.push(node);
            for edge in self.graph.edges_directed(node, Direction::Outgoing) {
                let target = edge.target();
                indegree[target.index()] -= 1;
                if indegree[target.index()] == 0 {
                    heap.push(Reverse(target));
                }
            }
        }
        order
    }

    /// Ready-set view of the DAG for topological peeling.
    pub fn frontier(&self) -> Frontier<'_> {
        Frontier::new(self)
    }

    /// Get an instruction by node index.
    #[inline]
    pub fn get_instruction(&self, node: NodeIndex) -> Option<&Instruction> {
        self.graph.node_weight(node).and_then(DagNode::instruction)
    }

    /// Number of qubit wires.
    #[inline]
    pub fn num_qubits(&self) -> usize {
        self.qubit_inputs.len()
    }

    /// Number of classical wires.
    #[inline]
    pub fn num_clbits(&self) -> usize {
        self.clbit_inputs.len()
    }

    /// Number of operations.
    #[inline]
    pub fn num_ops(&self) -> usize {
        let io_nodes = 2 * (self.qubit_inputs.len() + self.clbit_inputs.len());
        self.graph.node_count().saturating_sub(io_nodes)
    }

    /// Number of gates acting on two qubits.
    pub fn num_two_qubit_ops(&self) -> usize {
        self.graph
            .node_weights()
            .filter_map(DagNode::instruction)
            .filter(|inst| inst.is_two_qubit_gate())
            .count()
    }

    /// Operation counts keyed by instruction name.
    pub fn count_ops(&self) -> BTreeMap<String, usize> {
        let mut counts = BTreeMap::new();
        for inst in self.graph.node_weights().filter_map(DagNode::instruction) {
            *counts.entry(inst.name().to_string()).or_insert(0) += 1;
        }
        counts
    }

    /// Length of the longest chain of dependent operations.
    pub fn depth(&self) -> usize {
        let mut depths = vec![0usize; self.graph.node_count()];
        let mut max_depth = 0;

        for node in self.topological_order() {
            let max_pred = self
                .graph
                .edges_directed(node, Direction::Incoming)
                .map(|e| depths[e.source().index()])
                .max()
                .unwrap_or(0);
            let depth = if self.graph[node].is_op() {
                max_pred + 1
            } else {
                max_pred
            };
            depths[node.index()] = depth;
            max_depth = max_depth.max(depth);
        }

        max_depth
    }

    /// Qubit wires in ascending order.
    pub fn qubits(&self) -> impl Iterator<Item = QubitId> + '_ {
        let mut qubits: Vec<_> = self.qubit_inputs.keys().copied().collect();
        qubits.sort_unstable();
        qubits.into_iter()
    }

    /// Classical wires in ascending order.
    pub fn clbits(&self) -> impl Iterator<Item = ClbitId> + '_ {
        self.clbit_info.keys().copied()
    }

    /// Register metadata of a classical bit.
    pub fn clbit_info(&self, clbit: ClbitId) -> Option<&Clbit> {
        self.clbit_info.get(&clbit)
    }

    /// Whether `qubit` is a wire of this DAG.
    pub fn has_qubit(&self, qubit: QubitId) -> bool {
        self.qubit_inputs.contains_key(&qubit)
    }

    /// Get the abstraction level of this circuit.
    pub fn level(&self) -> CircuitLevel {
        self.level
    }

    /// Set the abstraction level of this circuit.
    pub fn set_level(&mut self, level: CircuitLevel) {
        self.level = level;
    }

    /// Get a reference to the underlying graph.
    pub fn graph(&self) -> &DiGraph<DagNode, DagEdge, u32> {
        &self.graph
    }

    /// Verify the structural integrity of the DAG.
    ///
    /// Checks that the graph is acyclic and that every wire runs unbroken
    /// from its `In` node to its `Out` node.
    pub fn verify_integrity(&self) -> IrResult<()> {
        if petgraph::algo::is_cyclic_directed(&self.graph) {
            return Err(IrError::InvalidDag("graph contains a cycle".into()));
        }

        for (&qubit, &in_node) in &self.qubit_inputs {
            let out_node = self.qubit_outputs.get(&qubit).copied().ok_or_else(|| {
                IrError::InvalidDag(format!("qubit {qubit} has no output node"))
            })?;
            self.walk_wire(WireId::Qubit(qubit), in_node, out_node)?;
        }
        for (&clbit, &in_node) in &self.clbit_inputs {
            let out_node = self.clbit_outputs.get(&clbit).copied().ok_or_else(|| {
                IrError::InvalidDag(format!("clbit {clbit} has no output node"))
            })?;
            self.walk_wire(WireId::Clbit(clbit), in_node, out_node)?;
        }

        if self.topological_order().len() != self.graph.node_count() {
            return Err(IrError::InvalidDag("unreachable node in DAG".into()));
        }
        Ok(())
    }

    fn walk_wire(&self, wire: WireId, in_node: NodeIndex, out_node: NodeIndex) -> IrResult<()> {
        let mut current = in_node;
        for _ in 0..=self.graph.node_count() {
            if current == out_node {
                return Ok(());
            }
            current = self
                .graph
                .edges_directed(current, Direction::Outgoing)
                .find(|e| e.weight().wire == wire)
                .map(|e| e.target())
                .ok_or_else(|| {
                    IrError::InvalidDag(format!("wire {wire:?} is broken at node {current:?}"))
                })?;
        }
        Err(IrError::InvalidDag(format!("wire {wire:?} does not terminate")))
    }
}

/// Ready set over the operations of a [`CircuitDag`].
///
/// An operation is ready once every operation before it on each of its
/// wires has been retired. Retiring operations in any order the frontier
/// allows yields a valid topological order.
#[derive(Debug)]
pub struct Frontier<'a> {
    dag: &'a CircuitDag,
    pending: Vec<usize>,
    ready: BTreeSet<NodeIndex>,
    remaining: usize,
}

impl<'a> Frontier<'a> {
    fn new(dag: &'a CircuitDag) -> Self {
        let graph = dag.graph();
        let mut pending = vec![0usize; graph.node_count()];
        let mut ready = BTreeSet::new();
        let mut remaining = 0;

        for node in graph.node_indices() {
            if !graph[node].is_op() {
                continue;
            }
            remaining += 1;
            let count = graph
                .edges_directed(node, Direction::Incoming)
                .filter(|e| graph[e.source()].is_op())
                .count();
            pending[node.index()] = count;
            if count == 0 {
                ready.insert(node);
            }
        }

        Self {
            dag,
            pending,
            ready,
            remaining,
        }
    }

    /// Ready operations, lowest node index first.
    pub fn ready(&self) -> impl Iterator<Item = NodeIndex> + '_ {
        self.ready.iter().copied()
    }

    /// Whether every operation has been retired.
    pub fn is_done(&self) -> bool {
        self.remaining == 0
    }

    /// Number of operations not yet retired.
    pub fn remaining(&self) -> usize {
        self.remaining
    }

    /// Mark a ready operation as executed, releasing its successors.
    pub fn retire(&mut self, node: NodeIndex) -> IrResult<()> {
        if !self.ready.remove(&node) {
            return Err(IrError::InvalidDag(format!(
                "node {node:?} retired before it was ready"
            )));
        }
        self.remaining -= 1;

        let graph = self.dag.graph();
        for edge in graph.edges_directed(node, Direction::Outgoing) {
            let target = edge.target();
            if !graph[target].is_op() {
                continue;
            }
            let count = &mut self.pending[target.index()];
            *count -= 1;
            if *count == 0 {
                self.ready.insert(target);
            }
        }
        Ok(())
    }
}
