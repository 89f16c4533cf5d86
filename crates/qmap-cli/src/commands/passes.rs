//! Passes command implementation.

use console::style;

use qmap_compile::{CompileConfig, PassId, PassStage};

/// Execute the passes command.
pub fn execute() {
    println!("{}", style("Optimization passes").bold());
    println!();

    for stage in [PassStage::PreRouting, PassStage::PostRouting] {
        let label = match stage {
            PassStage::PreRouting => "Before routing (logical circuit)",
            PassStage::PostRouting => "After routing (physical circuit)",
        };
        println!("{}:", style(label).cyan());
        for id in PassId::ALL.into_iter().filter(|id| id.stage() == stage) {
            println!("  {:<18} {}", style(id.name()).green(), id.description());
        }
        println!();
    }

    println!("{}:", style("Optimization levels").cyan());
    for level in 0..=3 {
        let config = CompileConfig::for_optimization_level(level);
        let names: Vec<&str> = config
            .pre_passes
            .iter()
            .chain(&config.post_passes)
            .map(|id| id.name())
            .collect();
        let passes = if names.is_empty() {
            "-".to_string()
        } else {
            names.join(", ")
        };
        let swaps = if config.decompose_swaps {
            "SWAPs decomposed"
        } else {
            "SWAPs kept"
        };
        println!("  {}  {passes} ({swaps})", style(level).yellow());
    }
}
