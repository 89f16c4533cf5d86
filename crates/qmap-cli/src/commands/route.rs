//! Route command implementation.

use anyhow::{Context, Result};
use console::style;
use serde::Serialize;

use qmap_compile::{
    CompileStats, CompiledCircuit, PassId, PassManagerBuilder, PermutationRecord, Placement,
};
use qmap_ir::{Circuit, CircuitDocument};

use super::common::{load_architecture, load_circuit, load_config, write_json};

/// Arguments of `qmap route`.
#[derive(Debug)]
pub struct RouteArgs<'a> {
    pub circuit: &'a str,
    pub arch: &'a str,
    pub output: Option<&'a str>,
    pub config: Option<&'a str>,
    pub optimization_level: Option<u8>,
    pub placement: Option<Placement>,
    pub lookahead: Option<usize>,
    pub passes: Option<Vec<PassId>>,
    pub keep_swaps: bool,
}

/// Document written by `qmap route`.
#[derive(Debug, Serialize)]
pub struct RouteReport {
    /// The physical circuit; wire `i` is device node `i`.
    pub circuit: CircuitDocument,
    /// Initial layout, final permutation and inserted SWAPs.
    pub permutation: PermutationRecord,
    pub stats: CompileStats,
}

impl RouteReport {
    pub fn new(name: &str, compiled: CompiledCircuit) -> Self {
        let CompiledCircuit { physical, stats } = compiled;
        let (dag, permutation) = physical.into_parts();
        Self {
            circuit: Circuit::from_dag(format!("{name}_routed"), dag).to_document(),
            permutation,
            stats,
        }
    }
}

/// Build the pass manager from a config file and flag overrides.
///
/// Flags apply on top of the config file: the level preset replaces the
/// pass lists, then `--passes` replaces them again.
pub fn builder_from_args(args: &RouteArgs<'_>) -> Result<PassManagerBuilder> {
    let mut builder = PassManagerBuilder::new();
    if let Some(path) = args.config {
        builder = builder.with_config(load_config(path)?);
    }
    if let Some(level) = args.optimization_level {
        builder = builder.with_optimization_level(level);
    }
    if let Some(strategy) = args.placement {
        builder = builder.with_placement(strategy);
    }
    if let Some(window) = args.lookahead {
        builder = builder.with_lookahead(window);
    }
    if let Some(passes) = &args.passes {
        builder = builder.with_passes(passes.iter().copied());
    }
    if args.keep_swaps {
        builder = builder.with_swap_decomposition(false);
    }
    Ok(builder)
}

/// Execute the route command.
pub fn execute(args: &RouteArgs<'_>) -> Result<()> {
    // The report goes to stdout when no output file is given, so progress
    // lines are only printed alongside a file.
    let chatty = args.output.is_some();

    let circuit = load_circuit(args.circuit)?;
    let arch = load_architecture(args.arch)?;
    if chatty {
        println!(
            "{} Routing {} onto {} nodes",
            style("→").cyan().bold(),
            style(args.circuit).green(),
            style(arch.node_count()).yellow()
        );
        println!(
            "  Loaded: {} qubits, {} ops, depth {}",
            circuit.num_qubits(),
            circuit.dag().num_ops(),
            circuit.depth()
        );
    }

    let pm = builder_from_args(args)?.build();
    let compiled = pm
        .run(circuit.dag(), &arch)
        .with_context(|| format!("Failed to route {}", args.circuit))?;

    if chatty {
        let stats = &compiled.stats;
        println!("{} Routing complete", style("✓").green().bold());
        println!(
            "  Result: {} ops, depth {}, {} two-qubit gates ({} SWAPs inserted)",
            stats.ops_after, stats.depth_after, stats.two_qubit_after, stats.swaps_inserted
        );
    }

    let report = RouteReport::new(circuit.name(), compiled);
    write_json(&report, args.output)?;
    if let Some(path) = args.output {
        println!("  Output: {}", style(path).green());
    }
    Ok(())
}
