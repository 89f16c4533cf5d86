//! qmap Placement, Routing and Optimization
//!
//! This crate turns a device-independent circuit into one whose two-qubit
//! gates only act on coupled nodes of a target device, while keeping the
//! added gate count and depth low.
//!
//! # Overview
//!
//! Compilation runs these stages:
//! 1. **Pre-routing optimization**: phase-polynomial resynthesis on the
//!    logical circuit
//! 2. **Placement**: choose the initial logical-to-physical mapping
//! 3. **Routing**: insert SWAPs so every two-qubit gate acts on an edge
//! 4. **Decomposition**: rewrite SWAPs into `CX` triples and fix gate
//!    direction on directed devices
//! 5. **Post-routing optimization**: cancel, merge and fold gates
//! 6. **Verification**: check adjacency of the final circuit
//!
//! # Architecture
//!
//! ```text
//! CircuitDag + Architecture
//!       │
//!       ▼
//! ┌─────────────┐
//! │ PassManager │ ◄── CompileConfig (placement, routing, pass lists)
//! └─────────────┘
//!       │
//!       ├── phase-gadget
//!       ├── PlacementSolver ──► Mapping
//!       ├── Router ──► PhysicalCircuit + PermutationRecord
//!       ├── decompose_swaps / direct_two_qubit_gates
//!       ├── cancel-inverses / merge-rotations / fold-swaps / cleanup
//!       └── verify_adjacency
//!       │
//!       ▼
//! CompiledCircuit (physical circuit + stats)
//! ```
//!
//! # Example: Routing a GHZ Circuit
//!
//! ```rust
//! use qmap_compile::{Architecture, PassManagerBuilder};
//! use qmap_ir::Circuit;
//!
//! let circuit = Circuit::ghz(4).unwrap();
//! let arch = Architecture::star(5);
//!
//! let pm = PassManagerBuilder::new().with_optimization_level(2).build();
//! let compiled = pm.run(circuit.dag(), &arch).unwrap();
//!
//! println!("Compiled depth: {}", compiled.stats.depth_after);
//! for (qubit, node) in compiled.physical.permutation().permutation().iter().enumerate() {
//!     println!("q{qubit} ends on node {node}");
//! }
//! ```
//!
//! # Optimization Levels
//!
//! | Level | Passes Included |
//! |-------|-----------------|
//! | 0 | Placement + Routing only, SWAPs kept |
//! | 1 | + SWAP decomposition, inverse cancellation |
//! | 2 | + fixed-point cleanup instead of plain cancellation |
//! | 3 | + phase-polynomial resynthesis before routing |
//!
//! # Built-in Passes
//!
//! ## Target Passes
//! - [`PlacementSolver`]: interaction-weighted search with greedy fallback
//! - [`Router`]: lookahead SWAP insertion
//! - [`decompose_swaps`], [`direct_two_qubit_gates`]: exact gate rewrites
//! - [`verify_adjacency`]: final check
//!
//! ## Optimization Passes
//! Selected by [`PassId`]; see [`passes::optimization`].

pub mod architecture;
pub mod error;
pub mod manager;
pub mod mapping;
pub mod pass;
pub mod passes;

pub use architecture::{Architecture, ArchitectureSpec};
pub use error::{CompileError, CompileResult};
pub use manager::{
    CompileConfig, CompileStats, CompiledCircuit, PassManager, PassManagerBuilder, route,
    route_batch,
};
pub use mapping::{Mapping, PermutationRecord, PhysicalCircuit, SwapRecord};
pub use pass::{Pass, PassId, PassStage, apply_optimization_pass};
pub use passes::{
    Placement, PlacementConfig, PlacementOutcome, PlacementSolver, Router, RoutingConfig,
    decompose_swaps, direct_two_qubit_gates, verify_adjacency,
};
