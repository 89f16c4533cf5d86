//! qmap Circuit Intermediate Representation
//!
//! Core data structures for circuits handed to the qmap placement and
//! routing backend.
//!
//! # Overview
//!
//! A circuit is held as a DAG whose edges are per-wire dependencies. The
//! DAG gives the compiler a deterministic topological order and a ready-set
//! [`Frontier`] for peeling operations layer by layer. The [`Circuit`]
//! builder wraps a DAG with register metadata and a JSON document form.
//!
//! # Core Components
//!
//! - **Qubits and Classical Bits**: [`QubitId`], [`ClbitId`], with optional
//!   register slots in [`Qubit`] and [`Clbit`]
//! - **Gates**: [`Gate`], angles in half-turns
//! - **Instructions**: [`Instruction`] combining a gate, measurement or
//!   barrier with its operands
//! - **DAG**: [`CircuitDag`] and its [`Frontier`]
//! - **Circuit**: [`Circuit`] builder and [`CircuitDocument`]
//!
//! # Example: Building a Bell State
//!
//! ```rust
//! use qmap_ir::{Circuit, QubitId};
//!
//! let mut circuit = Circuit::with_size("bell_state", 2, 2);
//! circuit.h(QubitId(0)).unwrap();
//! circuit.cx(QubitId(0), QubitId(1)).unwrap();
//! circuit.measure_all().unwrap();
//!
//! assert_eq!(circuit.num_qubits(), 2);
//! assert_eq!(circuit.depth(), 3);
//! ```
//!
//! # Supported Gates
//!
//! | Gate | Qubits | Description |
//! |------|--------|-------------|
//! | `I` | 1 | Identity |
//! | `X`, `Y`, `Z` | 1 | Pauli gates |
//! | `H` | 1 | Hadamard gate |
//! | `S`, `Sdg` | 1 | Quarter-turn Z and its inverse |
//! | `T`, `Tdg` | 1 | Eighth-turn Z and its inverse |
//! | `SX`, `SXdg` | 1 | sqrt(X) and its inverse |
//! | `Rx`, `Ry`, `Rz` | 1 | Rotations, angle in half-turns |
//! | `CX` | 2 | Controlled-NOT (control, target) |
//! | `CZ` | 2 | Controlled-Z |
//! | `Swap` | 2 | SWAP gate |
//! | `CCX` | 3 | Toffoli (rejected by the router) |

pub mod circuit;
pub mod dag;
pub mod error;
pub mod gate;
pub mod instruction;
pub mod qubit;

pub use circuit::{Circuit, CircuitDocument};
pub use dag::{CircuitDag, CircuitLevel, DagEdge, DagNode, Frontier, NodeIndex, WireId};
pub use error::{IrError, IrResult};
pub use gate::{ANGLE_EPSILON, Axis, Gate, normalize_angle};
pub use instruction::{Instruction, InstructionKind};
pub use qubit::{Clbit, ClbitId, Qubit, QubitId};
