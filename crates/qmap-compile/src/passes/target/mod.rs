//! Architecture-dependent passes.
//!
//! Placement chooses where logical qubits start, routing inserts SWAPs so
//! every two-qubit gate acts on coupled nodes, and decomposition rewrites
//! SWAPs and gate directions into what the device executes natively.

pub mod decompose;
pub mod placement;
pub mod routing;
pub mod verification;

pub use decompose::{decompose_swaps, direct_two_qubit_gates};
pub use placement::{Placement, PlacementConfig, PlacementOutcome, PlacementSolver};
pub use routing::{Router, RoutingConfig};
pub use verification::verify_adjacency;
