//! Built-in compilation passes.
//!
//! Passes are organized into two categories:
//! - [`agnostic`]: rewrites that only look at the DAG structure
//! - [`target`]: placement, routing and the rewrites that depend on the
//!   architecture graph

pub mod agnostic;
pub mod target;

pub use agnostic::optimization;
pub use target::{decompose, placement, routing, verification};

pub use agnostic::{CancelInverses, Cleanup, FoldSwaps, MergeRotations, PhaseGadget, RemoveIdentity};
pub use target::{
    Placement, PlacementConfig, PlacementOutcome, PlacementSolver, Router, RoutingConfig,
    decompose_swaps, direct_two_qubit_gates, verify_adjacency,
};
