//! qmap Command-Line Interface
//!
//! Routes circuit documents onto device coupling graphs.
//!
//! ```text
//! qmap route --circuit bell.json --arch line5.json -O 2 --output routed.json
//! qmap arch --topology grid --nodes 9 --output grid3x3.json
//! qmap passes
//! ```

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

use clap::{Parser, Subcommand, ValueEnum};
use console::style;
use qmap_compile::{PassId, Placement};
use tracing_subscriber::EnvFilter;

mod commands;

use commands::{arch, passes, route};

/// qmap - qubit placement, routing and optimization
#[derive(Parser)]
#[command(name = "qmap")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Place and route a circuit onto a device
    Route {
        /// Circuit document (JSON)
        #[arg(short, long)]
        circuit: String,

        /// Architecture document (JSON)
        #[arg(short, long)]
        arch: String,

        /// Output file for the routing report (stdout if omitted)
        #[arg(short, long)]
        output: Option<String>,

        /// Compile configuration (JSON); flags below override it
        #[arg(long)]
        config: Option<String>,

        /// Optimization level (0-3)
        #[arg(short = 'O', long)]
        optimization_level: Option<u8>,

        /// Initial placement strategy
        #[arg(long, value_enum)]
        placement: Option<PlacementArg>,

        /// Number of upcoming two-qubit gates the router considers
        #[arg(long)]
        lookahead: Option<usize>,

        /// Optimization passes to run instead of the level preset
        #[arg(long, value_delimiter = ',')]
        passes: Option<Vec<PassId>>,

        /// Keep SWAP gates instead of rewriting them into CX triples
        #[arg(long)]
        keep_swaps: bool,
    },

    /// Generate an architecture document for a standard topology
    Arch {
        /// Coupling graph shape
        #[arg(short, long, value_enum)]
        topology: Topology,

        /// Number of nodes
        #[arg(short, long)]
        nodes: usize,

        /// Columns of a grid topology (defaults to the squarest shape)
        #[arg(long)]
        cols: Option<usize>,

        /// Output file (stdout if omitted)
        #[arg(short, long)]
        output: Option<String>,
    },

    /// List available optimization passes
    Passes,
}

/// Placement strategy as accepted on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum PlacementArg {
    /// Interaction-weighted search with greedy fallback
    Search,
    /// Logical qubit i on node i
    Trivial,
}

impl From<PlacementArg> for Placement {
    fn from(arg: PlacementArg) -> Self {
        match arg {
            PlacementArg::Search => Placement::Search,
            PlacementArg::Trivial => Placement::Trivial,
        }
    }
}

/// Standard coupling graph shapes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum Topology {
    Linear,
    Ring,
    Grid,
    Star,
    Full,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let filter = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let result = match cli.command {
        Commands::Route {
            circuit,
            arch,
            output,
            config,
            optimization_level,
            placement,
            lookahead,
            passes,
            keep_swaps,
        } => route::execute(&route::RouteArgs {
            circuit: &circuit,
            arch: &arch,
            output: output.as_deref(),
            config: config.as_deref(),
            optimization_level,
            placement: placement.map(Placement::from),
            lookahead,
            passes,
            keep_swaps,
        }),

        Commands::Arch {
            topology,
            nodes,
            cols,
            output,
        } => arch::execute(topology, nodes, cols, output.as_deref()),

        Commands::Passes => {
            passes::execute();
            Ok(())
        }
    };

    // Handle errors
    if let Err(e) = result {
        eprintln!("{} {:#}", style("Error:").red().bold(), e);
        std::process::exit(1);
    }

    Ok(())
}
