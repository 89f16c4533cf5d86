//! Error types for the compilation crate.

use qmap_ir::QubitId;
use thiserror::Error;

/// Errors that can occur during placement, routing and optimization.
///
/// Every variant names the qubit, node or gate position that triggered it.
/// Positions index the topological instruction order of the circuit the
/// failing stage was given.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CompileError {
    /// Error from the IR crate.
    #[error("IR error: {0}")]
    Ir(#[from] qmap_ir::IrError),

    /// More logical qubits than physical nodes.
    #[error("Circuit requires {required} qubits but the architecture only has {available} nodes")]
    Capacity { required: usize, available: usize },

    /// The architecture graph is not connected and the circuit needs
    /// two-qubit interactions.
    #[error("Architecture is disconnected ({components} components)")]
    Disconnected { components: usize },

    /// No path exists between the nodes holding the operands of a gate.
    #[error(
        "No path between nodes {} and {} for qubits {} and {} (gate {position})",
        .nodes.0, .nodes.1, .qubits.0, .qubits.1
    )]
    Connectivity {
        qubits: (QubitId, QubitId),
        nodes: (u32, u32),
        position: usize,
    },

    /// An architecture edge references a node outside `0..node_count`.
    #[error("Edge ({}, {}) references a node outside 0..{node_count}", .edge.0, .edge.1)]
    EdgeOutOfRange { edge: (i64, i64), node_count: usize },

    /// An architecture has more nodes than the distance caches allow.
    #[error("Architecture with {nodes} nodes exceeds the limit of {max}")]
    TooManyNodes { nodes: usize, max: usize },

    /// An architecture edge connects a node to itself.
    #[error("Edge ({node}, {node}) is a self-loop")]
    SelfLoop { node: u32 },

    /// A gate operand is not one of the dense logical qubits `0..num_qubits`.
    #[error("Qubit {qubit} is out of range for a circuit with {num_qubits} qubits")]
    QubitOutOfRange { qubit: QubitId, num_qubits: usize },

    /// A gate on more than two qubits reached the router undecomposed.
    #[error("Gate '{gate}' on {arity} qubits at position {position} must be decomposed before routing")]
    UnsupportedGate {
        gate: String,
        arity: usize,
        position: usize,
    },

    /// An optimization pass was given a circuit it cannot handle.
    #[error("Pass '{pass}' cannot run: {reason}")]
    PassPrecondition { pass: String, reason: String },

    /// A two-qubit gate acts on nodes that are not coupled.
    #[error("Gate '{gate}' at position {position} acts on non-adjacent nodes {} and {}", .nodes.0, .nodes.1)]
    NonAdjacentGate {
        gate: String,
        nodes: (u32, u32),
        position: usize,
    },

    /// A SWAP without exactly two operands.
    #[error("SWAP at position {position} has {arity} operands")]
    MalformedSwap { position: usize, arity: usize },

    /// A logical qubit has no node assigned.
    #[error("Qubit {qubit} has no physical node in the mapping")]
    IncompleteMapping { qubit: QubitId },

    /// Unrecognized optimization pass name.
    #[error("Unknown pass '{0}'")]
    UnknownPass(String),
}

/// Result type for compilation operations.
pub type CompileResult<T> = Result<T, CompileError>;
