//! Shared helpers for CLI commands.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;
use serde::de::DeserializeOwned;

/// How a command prints its result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Table,
    Json,
}

impl OutputFormat {
    /// Parse a `--format` value.
    pub fn parse(format: &str) -> Result<Self> {
        match format.to_lowercase().as_str() {
            "table" => Ok(Self::Table),
            "json" => Ok(Self::Json),
            other => anyhow::bail!("Unknown format: '{other}'. Available: table, json"),
        }
    }
}

/// Read and deserialize a JSON file.
pub fn read_json<T: DeserializeOwned>(path: &str) -> Result<T> {
    if !Path::new(path).exists() {
        anyhow::bail!("File not found: {path}");
    }
    let source =
        fs::read_to_string(path).with_context(|| format!("Failed to read file: {path}"))?;
    serde_json::from_str(&source).with_context(|| format!("Invalid JSON in {path}"))
}

/// Print a value as pretty JSON on stdout.
pub fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Parse a coupling written as `A-B` (also accepts `A,B` and `A:B`).
pub fn parse_edge(text: &str) -> Result<(u32, u32)> {
    let (a, b) = text
        .split_once(['-', ',', ':'])
        .with_context(|| format!("Invalid edge '{text}': expected A-B"))?;
    let a = a
        .trim()
        .parse()
        .with_context(|| format!("Invalid qubit '{a}' in edge '{text}'"))?;
    let b = b
        .trim()
        .parse()
        .with_context(|| format!("Invalid qubit '{b}' in edge '{text}'"))?;
    Ok((a, b))
}
