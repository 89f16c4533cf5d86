//! Pass manager for orchestrating compilation.

use qmap_ir::CircuitDag;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use crate::architecture::Architecture;
use crate::error::{CompileError, CompileResult};
use crate::mapping::PhysicalCircuit;
use crate::pass::{PassId, PassStage};
use crate::passes::{
    Placement, PlacementConfig, PlacementOutcome, PlacementSolver, Router, RoutingConfig,
    decompose_swaps, direct_two_qubit_gates, verify_adjacency,
};

/// Full pipeline configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CompileConfig {
    /// Initial placement settings.
    pub placement: PlacementConfig,
    /// Router settings.
    pub routing: RoutingConfig,
    /// Passes run on the logical circuit before placement.
    pub pre_passes: Vec<PassId>,
    /// Passes run on the physical circuit after routing.
    pub post_passes: Vec<PassId>,
    /// Whether inserted SWAPs are rewritten into `CX` triples.
    pub decompose_swaps: bool,
}

impl CompileConfig {
    /// Preset for an optimization level; levels above 3 are treated as 3.
    ///
    /// | Level | Pre-routing | Post-routing | SWAP decomposition |
    /// |-------|-------------|--------------|--------------------|
    /// | 0 | - | - | no |
    /// | 1 | - | `cancel-inverses` | yes |
    /// | 2 | - | `cleanup` | yes |
    /// | 3 | `phase-gadget` | `cleanup` | yes |
    pub fn for_optimization_level(level: u8) -> Self {
        let (pre_passes, post_passes) = match level {
            0 => (vec![], vec![]),
            1 => (vec![], vec![PassId::CancelInverses]),
            2 => (vec![], vec![PassId::Cleanup]),
            _ => (vec![PassId::PhaseGadget], vec![PassId::Cleanup]),
        };
        Self {
            placement: PlacementConfig::default(),
            routing: RoutingConfig::default(),
            pre_passes,
            post_passes,
            decompose_swaps: level > 0,
        }
    }
}

impl Default for CompileConfig {
    fn default() -> Self {
        Self::for_optimization_level(1)
    }
}

/// Circuit metrics before and after compilation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompileStats {
    /// Operations in the input circuit.
    pub ops_before: usize,
    /// Depth of the input circuit.
    pub depth_before: usize,
    /// Two-qubit gates in the input circuit.
    pub two_qubit_before: usize,
    /// Operations in the compiled circuit.
    pub ops_after: usize,
    /// Depth of the compiled circuit.
    pub depth_after: usize,
    /// Two-qubit gates in the compiled circuit.
    pub two_qubit_after: usize,
    /// SWAPs inserted by the router.
    pub swaps_inserted: usize,
    /// How the initial mapping was chosen.
    pub placement: PlacementOutcome,
}

/// A compiled circuit with its metrics.
#[derive(Debug, Clone)]
pub struct CompiledCircuit {
    /// The routed, decomposed and optimized circuit.
    pub physical: PhysicalCircuit,
    /// Before and after metrics.
    pub stats: CompileStats,
}

/// Runs the compilation pipeline.
///
/// Pre-routing passes run on a copy of the input, followed by placement,
/// routing, SWAP decomposition, gate direction, post-routing passes and a
/// final adjacency check.
#[derive(Debug, Clone, Default)]
pub struct PassManager {
    config: CompileConfig,
}

impl PassManager {
    /// Create a pass manager for a configuration.
    pub fn new(config: CompileConfig) -> Self {
        Self { config }
    }

    /// The pipeline configuration.
    pub fn config(&self) -> &CompileConfig {
        &self.config
    }

    /// Number of optimization passes in the pipeline.
    pub fn len(&self) -> usize {
        self.config.pre_passes.len() + self.config.post_passes.len()
    }

    /// Whether the pipeline runs no optimization pass.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Compile `circuit` for `arch`.
    #[instrument(skip(self, circuit, arch))]
    pub fn run(&self, circuit: &CircuitDag, arch: &Architecture) -> CompileResult<CompiledCircuit> {
        info!(
            "Compiling circuit with {} qubits and {} ops for {} nodes",
            circuit.num_qubits(),
            circuit.num_ops(),
            arch.node_count()
        );

        let mut logical = circuit.clone();
        for &id in &self.config.pre_passes {
            let changed = id.build().rewrite(&mut logical)?;
            debug!("Pass {} completed, changed: {}, ops: {}", id, changed, logical.num_ops());
        }

        let (mapping, outcome) =
            PlacementSolver::new(self.config.placement.clone()).place(&logical, arch)?;
        let mut physical = Router::new(self.config.routing.clone()).run(&logical, arch, mapping)?;
        let swaps_inserted = physical.swaps_inserted();

        if self.config.decompose_swaps {
            decompose_swaps(&mut physical, arch)?;
        }
        direct_two_qubit_gates(&mut physical, arch)?;

        for &id in &self.config.post_passes {
            let changed = id.build().rewrite(physical.dag_mut())?;
            debug!(
                "Pass {} completed, changed: {}, ops: {}",
                id,
                changed,
                physical.dag().num_ops()
            );
        }

        verify_adjacency(&physical, arch)?;

        let dag = physical.dag();
        let stats = CompileStats {
            ops_before: circuit.num_ops(),
            depth_before: circuit.depth(),
            two_qubit_before: circuit.num_two_qubit_ops(),
            ops_after: dag.num_ops(),
            depth_after: dag.depth(),
            two_qubit_after: dag.num_two_qubit_ops(),
            swaps_inserted,
            placement: outcome,
        };
        info!(
            "Compilation completed, final depth: {}, ops: {}, swaps: {}",
            stats.depth_after, stats.ops_after, stats.swaps_inserted
        );

        Ok(CompiledCircuit { physical, stats })
    }
}

/// Builder for creating pass managers with preset configurations.
#[derive(Debug, Clone, Default)]
pub struct PassManagerBuilder {
    config: CompileConfig,
}

impl PassManagerBuilder {
    /// Create a new builder at optimization level 1.
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from an existing configuration.
    #[must_use]
    pub fn with_config(mut self, config: CompileConfig) -> Self {
        self.config = config;
        self
    }

    /// Replace the pass lists and SWAP decomposition flag with the preset
    /// for `level`. Placement and routing settings are kept.
    ///
    /// - Level 0: routing only
    /// - Level 1: inverse cancellation (default)
    /// - Level 2: fixed-point cleanup
    /// - Level 3: phase-polynomial resynthesis before routing, cleanup after
    #[must_use]
    pub fn with_optimization_level(mut self, level: u8) -> Self {
        let preset = CompileConfig::for_optimization_level(level);
        self.config.pre_passes = preset.pre_passes;
        self.config.post_passes = preset.post_passes;
        self.config.decompose_swaps = preset.decompose_swaps;
        self
    }

    /// Set the placement strategy.
    #[must_use]
    pub fn with_placement(mut self, strategy: Placement) -> Self {
        self.config.placement.strategy = strategy;
        self
    }

    /// Set all placement settings.
    #[must_use]
    pub fn with_placement_config(mut self, placement: PlacementConfig) -> Self {
        self.config.placement = placement;
        self
    }

    /// Set all routing settings.
    #[must_use]
    pub fn with_routing(mut self, routing: RoutingConfig) -> Self {
        self.config.routing = routing;
        self
    }

    /// Set the number of upcoming two-qubit gates the router looks at.
    #[must_use]
    pub fn with_lookahead(mut self, window: usize) -> Self {
        self.config.routing.lookahead_window = window;
        self
    }

    /// Replace both pass lists, sorting each pass into its stage.
    #[must_use]
    pub fn with_passes(mut self, passes: impl IntoIterator<Item = PassId>) -> Self {
        let (pre, post): (Vec<_>, Vec<_>) = passes
            .into_iter()
            .partition(|id| id.stage() == PassStage::PreRouting);
        self.config.pre_passes = pre;
        self.config.post_passes = post;
        self
    }

    /// Whether SWAPs are decomposed into `CX` triples.
    #[must_use]
    pub fn with_swap_decomposition(mut self, enabled: bool) -> Self {
        self.config.decompose_swaps = enabled;
        self
    }

    /// Build the pass manager.
    pub fn build(self) -> PassManager {
        PassManager::new(self.config)
    }
}

/// Place and route a circuit with default settings.
///
/// Fails with [`CompileError::Capacity`] before anything else, then with
/// [`CompileError::Disconnected`] if the architecture is split and the
/// circuit has any multi-qubit gate.
pub fn route(circuit: &CircuitDag, arch: &Architecture) -> CompileResult<PhysicalCircuit> {
    if circuit.num_qubits() > arch.node_count() {
        return Err(CompileError::Capacity {
            required: circuit.num_qubits(),
            available: arch.node_count(),
        });
    }
    let interacts = circuit
        .topological_ops()
        .any(|(_, inst)| inst.is_gate() && inst.qubits.len() >= 2);
    if interacts && !arch.is_connected() {
        return Err(CompileError::Disconnected {
            components: arch.num_components(),
        });
    }

    let (mapping, _) = PlacementSolver::default().place(circuit, arch)?;
    Router::default().run(circuit, arch, mapping)
}

/// Route independent circuits in parallel.
///
/// Results are in input order. Nothing is shared between the calls, so
/// each result equals what [`route`] returns for that circuit alone.
pub fn route_batch(
    circuits: &[CircuitDag],
    arch: &Architecture,
) -> Vec<CompileResult<PhysicalCircuit>> {
    circuits.par_iter().map(|circuit| route(circuit, arch)).collect()
}
