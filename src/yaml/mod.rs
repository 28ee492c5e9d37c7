//! YAML parsing with source-annotated diagnostics
//!
//! Catalogs and estimate requests are both read through these helpers. JSON
//! documents parse as well, since the YAML parser accepts JSON input.

mod diagnostics;

pub use diagnostics::{YamlError, YamlSyntaxError};

use serde::de::DeserializeOwned;
use std::path::Path;

/// Parse a document held in memory, labelling diagnostics with `filename`
pub fn parse_yaml_str<T: DeserializeOwned + 'static>(source: &str, filename: &str) -> Result<T, YamlSyntaxError> {
    serde_yml::from_str(source).map_err(|e| YamlSyntaxError::from_serde_error(&e, source, filename))
}

/// Read and parse a document from disk
pub fn parse_yaml_file<T: DeserializeOwned + 'static>(path: &Path) -> Result<T, YamlError> {
    let source = std::fs::read_to_string(path).map_err(|source| YamlError::Io {
        path: path.display().to_string(),
        source,
    })?;
    let filename = path.display().to_string();
    Ok(parse_yaml_str(&source, &filename)?)
}
