//! Layout command implementation.

use anyhow::{Context, Result};
use console::style;
use tracing::debug;

use noisewise_layout::{BackendProperties, ScoringFilter, ZigzagLayout, ZigzagOptions, zigzag_layout};

use super::common::{OutputFormat, parse_edge, print_json};

/// Arguments for the layout command.
pub struct LayoutArgs<'a> {
    pub backend: &'a str,
    pub orbitals: u32,
    pub ancillas: u32,
    pub bad_qubits: &'a [u32],
    pub bad_edges: &'a [String],
    pub score: bool,
    pub max_mappings: Option<usize>,
    pub format: &'a str,
}

/// Build zigzag options from command arguments.
pub fn build_options(args: &LayoutArgs<'_>) -> Result<ZigzagOptions> {
    let mut filter = ScoringFilter::new();
    for &q in args.bad_qubits {
        filter = filter.with_bad_qubit(q);
    }
    for edge in args.bad_edges {
        let (a, b) = parse_edge(edge)?;
        filter = filter.with_bad_edge(a, b);
    }

    let mut options = ZigzagOptions::new(args.orbitals)
        .with_ancillas(args.ancillas)
        .with_scoring(args.score)
        .with_filter(filter);
    if let Some(max) = args.max_mappings {
        options = options.with_max_mappings(max);
    }
    Ok(options)
}

/// Execute the layout command.
pub fn execute(args: &LayoutArgs<'_>) -> Result<()> {
    let format = OutputFormat::parse(args.format)?;
    let options = build_options(args)?;

    let props = BackendProperties::load(args.backend)
        .with_context(|| format!("Failed to load backend properties from {}", args.backend))?;
    debug!(options = ?options, "layout options");

    if format == OutputFormat::Table {
        println!(
            "{} Selecting zigzag layout on {} ({} qubits)",
            style("→").cyan().bold(),
            style(&props.name).yellow(),
            props.num_qubits
        );
    }

    let layout = zigzag_layout(&props, &options)?;

    match format {
        OutputFormat::Json => print_json(&layout),
        OutputFormat::Table => {
            print_layout(&layout, &options);
            Ok(())
        }
    }
}

fn print_layout(layout: &ZigzagLayout, options: &ZigzagOptions) {
    let chain = layout.initial_layout.len() / 2;
    let (alpha, beta) = layout.initial_layout.split_at(chain);

    println!("{} Layout selected", style("✓").green().bold());
    println!(
        "  Orbitals:        {} (+{} ancillas per chain)",
        options.num_orbitals, options.num_ancillas
    );
    println!("  Alpha chain:     {}", format_qubits(alpha));
    println!("  Beta chain:      {}", format_qubits(beta));
    println!(
        "  Bridge qubits:   {} ({})",
        format_qubits(&layout.bridge_qubits),
        layout.num_bridge_qubits
    );
    println!("  Initial layout:  {}", format_qubits(&layout.initial_layout));
    println!("  Candidates:      {}", layout.candidates);
    match layout.score {
        Some(score) => println!("  Error score:     {}", style(format!("{score:.6}")).yellow()),
        None => println!("  Error score:     {}", style("not scored").dim()),
    }
}

fn format_qubits(qubits: &[u32]) -> String {
    let items: Vec<String> = qubits.iter().map(ToString::to_string).collect();
    format!("[{}]", items.join(", "))
}
