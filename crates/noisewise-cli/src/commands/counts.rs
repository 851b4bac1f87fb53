//! Counts command implementation.

use std::collections::{BTreeMap, BTreeSet};

use anyhow::Result;
use console::style;
use serde::Serialize;

use super::common::{OutputFormat, print_json, read_json};

/// One ranked outcome.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedOutcome {
    pub bitstring: String,
    pub shots: u64,
    pub probability: f64,
    pub is_optimal: bool,
}

/// Top outcomes of a measurement-count histogram.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CountsSummary {
    pub total_shots: u64,
    pub total_unique: usize,
    pub outcomes: Vec<RankedOutcome>,
}

/// Rank `counts` by shots (descending, ties by bitstring) and keep `top_n`.
pub fn rank_counts(counts: &BTreeMap<String, u64>, top_n: usize, optimal: &[String]) -> CountsSummary {
    let optimal: BTreeSet<&str> = optimal.iter().map(String::as_str).collect();
    let total_shots: u64 = counts.values().sum();

    let mut sorted: Vec<(&String, &u64)> = counts.iter().collect();
    // BTreeMap iteration is already ordered by bitstring; the stable sort keeps it for ties.
    sorted.sort_by(|a, b| b.1.cmp(a.1));

    let outcomes = sorted
        .into_iter()
        .take(top_n)
        .map(|(bitstring, &shots)| RankedOutcome {
            bitstring: bitstring.clone(),
            shots,
            probability: if total_shots == 0 {
                0.0
            } else {
                shots as f64 / total_shots as f64
            },
            is_optimal: optimal.contains(bitstring.as_str()),
        })
        .collect();

    CountsSummary {
        total_shots,
        total_unique: counts.len(),
        outcomes,
    }
}

/// Execute the counts command.
pub fn execute(input: &str, top_n: usize, optimal: &[String], format: &str) -> Result<()> {
    let format = OutputFormat::parse(format)?;
    let counts: BTreeMap<String, u64> = read_json(input)?;
    if counts.is_empty() {
        anyhow::bail!("No counts in {input}");
    }

    let summary = rank_counts(&counts, top_n, optimal);
    match format {
        OutputFormat::Json => print_json(&summary),
        OutputFormat::Table => {
            print_summary(&summary);
            Ok(())
        }
    }
}

fn print_summary(summary: &CountsSummary) {
    println!(
        "\n{} Counts ({} shots), showing {} of {} bitstrings:",
        style("✓").green().bold(),
        summary.total_shots,
        summary.outcomes.len(),
        summary.total_unique
    );

    for outcome in &summary.outcomes {
        let prob = outcome.probability * 100.0;
        let bar: String = "█".repeat((prob / 2.0).round() as usize);
        let bar = if outcome.is_optimal {
            style(bar).green()
        } else {
            style(bar).green().dim()
        };
        let marker = if outcome.is_optimal { " *" } else { "" };

        println!(
            "  {}: {:>6} ({:>5.2}%) {}{}",
            style(&outcome.bitstring).cyan(),
            outcome.shots,
            prob,
            bar,
            style(marker).yellow().bold()
        );
    }
}
