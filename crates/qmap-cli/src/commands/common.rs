//! Shared helpers for CLI commands.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;

use qmap_compile::{Architecture, CompileConfig};
use qmap_ir::Circuit;

/// Read a file into a string, failing early with the path in the message.
fn read_source(path: &str) -> Result<String> {
    if !Path::new(path).exists() {
        anyhow::bail!("File not found: {path}");
    }
    fs::read_to_string(path).with_context(|| format!("Failed to read file: {path}"))
}

/// Load a circuit from a JSON circuit document.
pub fn load_circuit(path: &str) -> Result<Circuit> {
    let source = read_source(path)?;
    Circuit::from_json(&source).with_context(|| format!("Invalid circuit document: {path}"))
}

/// Load an architecture from a JSON architecture document.
pub fn load_architecture(path: &str) -> Result<Architecture> {
    let source = read_source(path)?;
    serde_json::from_str(&source).with_context(|| format!("Invalid architecture document: {path}"))
}

/// Load a compile configuration; missing fields take their defaults.
pub fn load_config(path: &str) -> Result<CompileConfig> {
    let source = read_source(path)?;
    serde_json::from_str(&source).with_context(|| format!("Invalid compile configuration: {path}"))
}

/// Write `value` as pretty JSON to `path`, or to stdout when `path` is `None`.
pub fn write_json<T: Serialize>(value: &T, path: Option<&str>) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("Failed to serialize output")?;
    match path {
        Some(path) => {
            fs::write(path, json).with_context(|| format!("Failed to write file: {path}"))?;
        }
        None => println!("{json}"),
    }
    Ok(())
}
