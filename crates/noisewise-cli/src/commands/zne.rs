//! Zne command implementation.

use anyhow::Result;
use console::style;
use serde::{Deserialize, Serialize};
use tracing::debug;

use noisewise_zne::{Extrapolation, FitOptions, ZneModel, extrapolate_all, extrapolate_with};

use super::common::{OutputFormat, print_json, read_json};

/// Measurement data file: `{"scales": [...], "values": [...]}`.
#[derive(Debug, Clone, Deserialize)]
pub struct ZneInput {
    pub scales: Vec<f64>,
    pub values: Vec<f64>,
}

/// JSON output for one fit.
#[derive(Debug, Serialize)]
struct FitReport<'a> {
    #[serde(flatten)]
    fit: &'a Extrapolation,
    curve: Vec<(f64, f64)>,
}

/// Execute the zne command.
#[allow(clippy::too_many_arguments)]
pub fn execute(
    input: Option<&str>,
    scales: &[f64],
    values: &[f64],
    method: &str,
    all: bool,
    samples: usize,
    max_evaluations: usize,
    format: &str,
) -> Result<()> {
    let format = OutputFormat::parse(format)?;
    let data = match input {
        Some(path) => {
            if !scales.is_empty() || !values.is_empty() {
                anyhow::bail!("Use either --input or --scales/--values, not both");
            }
            read_json::<ZneInput>(path)?
        }
        None => ZneInput {
            scales: scales.to_vec(),
            values: values.to_vec(),
        },
    };
    if data.scales.is_empty() {
        anyhow::bail!("No measurements: pass --scales and --values, or --input FILE");
    }
    debug!(points = data.scales.len(), "loaded measurements");

    let options = FitOptions::new().with_max_evaluations(max_evaluations);
    let fits = if all {
        let fits = extrapolate_all(&data.scales, &data.values, &options);
        if fits.is_empty() {
            anyhow::bail!("No model could be fit to {} points", data.scales.len());
        }
        fits
    } else {
        let model: ZneModel = method.parse()?;
        vec![extrapolate_with(model, &data.scales, &data.values, &options)?]
    };

    match format {
        OutputFormat::Json => {
            let reports: Vec<FitReport<'_>> = fits
                .iter()
                .map(|fit| FitReport {
                    fit,
                    curve: fit.curve(samples),
                })
                .collect();
            if all {
                print_json(&reports)
            } else {
                print_json(&reports[0])
            }
        }
        OutputFormat::Table => {
            for fit in &fits {
                print_fit(fit);
            }
            Ok(())
        }
    }
}

fn print_fit(fit: &Extrapolation) {
    println!(
        "{} Zero-noise extrapolation ({} fit, {} points)",
        style("→").cyan().bold(),
        style(fit.model.label()).yellow(),
        fit.scales.len()
    );
    println!("  {:>8}  {:>10}  {:>10}", "scale", "measured", "fit");
    for (&x, &y) in fit.scales.iter().zip(&fit.values) {
        println!("  {x:>8.3}  {y:>10.5}  {:>10.5}", fit.evaluate(x));
    }

    println!(
        "{} Zero-noise estimate: {}",
        style("✓").green().bold(),
        style(format!("{:.6}", fit.zero_noise_value)).green()
    );
    println!("  Parameters: {}", format_params(fit.model, &fit.params));
    println!("  R²: {:.6}", fit.r_squared);
    println!();
}

fn format_params(model: ZneModel, params: &[f64]) -> String {
    let names: &[&str] = match model {
        ZneModel::Linear => &["a", "b"],
        ZneModel::Quadratic | ZneModel::Exponential => &["a", "b", "c"],
    };
    names
        .iter()
        .zip(params)
        .map(|(n, p)| format!("{n} = {p:.6}"))
        .collect::<Vec<_>>()
        .join(", ")
}
