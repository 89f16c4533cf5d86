//! Arch command implementation.

use anyhow::Result;
use console::style;

use qmap_compile::Architecture;

use super::common::write_json;
use crate::Topology;

/// Build a standard topology with `nodes` nodes.
pub fn build(topology: Topology, nodes: usize, cols: Option<usize>) -> Result<Architecture> {
    if nodes == 0 {
        anyhow::bail!("An architecture needs at least one node");
    }
    let arch = match topology {
        Topology::Linear => Architecture::linear(nodes),
        Topology::Ring => Architecture::ring(nodes),
        Topology::Star => Architecture::star(nodes),
        Topology::Full => Architecture::full(nodes),
        Topology::Grid => {
            let cols = match cols {
                Some(cols) => cols,
                None => (1..=nodes)
                    .filter(|c| nodes % c == 0 && c * c <= nodes)
                    .last()
                    .unwrap_or(1),
            };
            if cols == 0 || nodes % cols != 0 {
                anyhow::bail!("A grid of {nodes} nodes cannot have {cols} columns");
            }
            Architecture::grid(nodes / cols, cols)
        }
    };
    Ok(arch)
}

/// Execute the arch command.
pub fn execute(
    topology: Topology,
    nodes: usize,
    cols: Option<usize>,
    output: Option<&str>,
) -> Result<()> {
    let arch = build(topology, nodes, cols)?;
    write_json(&arch, output)?;

    if let Some(path) = output {
        println!(
            "{} {:?} architecture: {} nodes, {} edges, diameter {}",
            style("✓").green().bold(),
            topology,
            arch.node_count(),
            arch.edges().len(),
            arch.diameter()
        );
        println!("  Output: {}", style(path).green());
    }
    Ok(())
}
