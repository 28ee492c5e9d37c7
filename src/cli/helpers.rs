//! Shared helper functions for CLI commands
//!
//! This module contains utility functions that are used across multiple
//! command modules to avoid code duplication.

use miette::{IntoDiagnostic, Result};
use serde::Serialize;
use std::collections::BTreeMap;

use crate::cli::OutputFormat;

/// Truncate a string to max_len characters, adding "..." if truncated
///
/// Useful for table columns that need fixed-width output.
pub fn truncate_str(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

/// Parse `key=value` pairs separated by commas, e.g. `Rank3=0.8,Rank2=0.2`
///
/// `:` is accepted in place of `=`.
pub fn parse_key_values(text: &str) -> Result<BTreeMap<String, f64>> {
    let mut map = BTreeMap::new();
    for pair in text.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        let (key, value) = pair
            .split_once('=')
            .or_else(|| pair.split_once(':'))
            .ok_or_else(|| miette::miette!("Expected key=value, got '{}'", pair))?;
        let value: f64 = value
            .trim()
            .parse()
            .map_err(|_| miette::miette!("'{}' is not a number in '{}'", value.trim(), pair))?;
        map.insert(key.trim().to_string(), value);
    }
    Ok(map)
}

/// Format a multiplier compactly, e.g. `×1.5`
pub fn format_factor(value: f64) -> String {
    format!("×{}", value)
}

/// Print a serializable value as YAML or JSON
pub fn print_structured<T: Serialize>(value: &T, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(value).into_diagnostic()?;
            println!("{}", json);
        }
        _ => {
            let yaml = serde_yml::to_string(value).into_diagnostic()?;
            print!("{}", yaml);
        }
    }
    Ok(())
}
