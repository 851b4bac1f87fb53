//! noisewise Command-Line Interface
//!
//! The main entry point for the `noisewise` CLI tool.
//!
//! ```text
//! noisewise zne     --scales 1,2,3 --values 0.9,0.8,0.7 --method linear
//! noisewise layout  --backend backend.json --orbitals 5 --bad-qubit 3
//! noisewise counts  --input counts.json --optimal 0110 --top 30
//! ```

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use console::style;
use tracing_subscriber::EnvFilter;

mod commands;
mod config;

use commands::{counts, layout, version, zne};
use config::Config;

/// noisewise - zero-noise extrapolation and noise-aware qubit layout
#[derive(Parser)]
#[command(name = "noisewise")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Configuration file (YAML)
    #[arg(long, global = true, env = "NOISEWISE_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extrapolate expectation values to the zero-noise limit
    Zne {
        /// Noise scale factors (comma separated)
        #[arg(short, long, value_delimiter = ',', allow_hyphen_values = true)]
        scales: Vec<f64>,

        /// Measured expectation values (comma separated)
        #[arg(long, value_delimiter = ',', allow_hyphen_values = true)]
        values: Vec<f64>,

        /// JSON file with `scales` and `values`
        #[arg(short, long)]
        input: Option<String>,

        /// Fit method (linear, quadratic, exponential)
        #[arg(short, long)]
        method: Option<String>,

        /// Fit every method and compare
        #[arg(long, conflicts_with = "method")]
        all: bool,

        /// Points in the sampled fit curve (JSON output)
        #[arg(long)]
        samples: Option<usize>,

        /// Output format (table, json)
        #[arg(short, long, default_value = "table")]
        format: String,
    },

    /// Select a zigzag qubit layout for a backend
    Layout {
        /// Backend properties JSON file
        #[arg(short, long)]
        backend: String,

        /// Orbitals per chain
        #[arg(short, long)]
        orbitals: u32,

        /// Ancilla qubits appended to each chain
        #[arg(short, long, default_value = "0")]
        ancillas: u32,

        /// Qubit to avoid (repeatable)
        #[arg(long = "bad-qubit")]
        bad_qubits: Vec<u32>,

        /// Coupling to avoid, as A-B (repeatable)
        #[arg(long = "bad-edge")]
        bad_edges: Vec<String>,

        /// Take the first embedding instead of ranking by error
        #[arg(long)]
        no_score: bool,

        /// Rank embeddings by error even if the config disables it
        #[arg(long, conflicts_with = "no_score")]
        score: bool,

        /// Stop after enumerating this many embeddings
        #[arg(long)]
        max_mappings: Option<usize>,

        /// Output format (table, json)
        #[arg(short, long, default_value = "table")]
        format: String,
    },

    /// Rank measured bitstrings by shot count
    Counts {
        /// Counts JSON file (`{"bitstring": shots}`)
        #[arg(short, long)]
        input: String,

        /// Number of outcomes to show
        #[arg(short, long, default_value = "30")]
        top: usize,

        /// Bitstring to highlight as optimal (repeatable)
        #[arg(long)]
        optimal: Vec<String>,

        /// Output format (table, json)
        #[arg(short, long, default_value = "table")]
        format: String,
    },

    /// Show version information
    Version,
}

fn init_logging(verbose: u8, config: &Config) {
    let level = match verbose {
        0 => config.logging.level.as_str(),
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);
    if config.logging.format.eq_ignore_ascii_case("json") {
        builder.json().init();
    } else {
        builder.init();
    }
}

/// Command-line flags win over the configured default.
fn scoring_enabled(score: bool, no_score: bool, configured: bool) -> bool {
    if score {
        true
    } else if no_score {
        false
    } else {
        configured
    }
}

fn run(command: Commands, config: &Config) -> anyhow::Result<()> {
    match command {
        Commands::Zne {
            scales,
            values,
            input,
            method,
            all,
            samples,
            format,
        } => zne::execute(
            input.as_deref(),
            &scales,
            &values,
            method.as_deref().unwrap_or(&config.zne.method),
            all,
            samples.unwrap_or(config.zne.samples),
            config.zne.max_evaluations,
            &format,
        ),

        Commands::Layout {
            backend,
            orbitals,
            ancillas,
            bad_qubits,
            bad_edges,
            no_score,
            score,
            max_mappings,
            format,
        } => layout::execute(&layout::LayoutArgs {
            backend: &backend,
            orbitals,
            ancillas,
            bad_qubits: &bad_qubits,
            bad_edges: &bad_edges,
            score: scoring_enabled(score, no_score, config.layout.score_layouts),
            max_mappings: max_mappings.or(config.layout.max_mappings),
            format: &format,
        }),

        Commands::Counts {
            input,
            top,
            optimal,
            format,
        } => counts::execute(&input, top, &optimal, &format),

        Commands::Version => {
            version::execute();
            Ok(())
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let result = Config::load(cli.config.as_deref()).and_then(|config| {
        init_logging(cli.verbose, &config);
        run(cli.command, &config)
    });

    // Handle errors
    if let Err(e) = result {
        eprintln!("{} {:#}", style("Error:").red().bold(), e);
        std::process::exit(1);
    }

    Ok(())
}
