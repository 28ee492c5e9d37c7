//! Request and catalog loading utilities
//!
//! Thin wrappers that turn file and stdin input into engine types with
//! source-annotated diagnostics, so commands stay free of I/O plumbing.

use miette::{IntoDiagnostic, Result};
use std::io::Read;
use std::path::Path;

use crate::catalog::Catalog;
use crate::engine::RawRequest;
use crate::yaml::parse_yaml_str;

/// Load a request document from a path, or from stdin when the path is `-`
pub fn load_request(path: &Path) -> Result<RawRequest> {
    if path.as_os_str() == "-" {
        let mut source = String::new();
        std::io::stdin().read_to_string(&mut source).into_diagnostic()?;
        return parse_request(&source, "<stdin>");
    }

    let source = std::fs::read_to_string(path)
        .map_err(|e| miette::miette!("Failed to read request {}: {}", path.display(), e))?;
    parse_request(&source, &path.display().to_string())
}

/// Parse a YAML or JSON request held in memory. An empty document is an empty request.
pub fn parse_request(source: &str, name: &str) -> Result<RawRequest> {
    if source.trim().is_empty() {
        return Ok(RawRequest::default());
    }
    Ok(parse_yaml_str(source, name)?)
}

/// Load a catalog by built-in name or path
pub fn load_catalog(name_or_path: &str) -> Result<Catalog> {
    let catalog = Catalog::load(name_or_path)?;
    tracing::debug!(
        catalog = name_or_path,
        version = %catalog.config_version,
        policy = catalog.allocation.name(),
        "catalog loaded"
    );
    Ok(catalog)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_load_request_from_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("req.yaml");
        fs::write(&path, "screen_count: 4\nfeatures: auth\n").unwrap();

        let raw = load_request(&path).unwrap();
        assert_eq!(raw.screen_count, Some(4));
        assert_eq!(raw.features.as_slice(), &["auth"]);
    }

    #[test]
    fn test_load_request_missing_file() {
        assert!(load_request(Path::new("/nonexistent/req.yaml")).is_err());
    }

    #[test]
    fn test_empty_request_is_default() {
        let raw = parse_request("  \n", "empty.yaml").unwrap();
        assert!(raw.screen_count.is_none());
    }

    #[test]
    fn test_bad_request_reports_name() {
        let err = parse_request("screen_count: [", "bad.yaml").unwrap_err();
        assert!(err.to_string().contains("bad.yaml"));
    }

    #[test]
    fn test_load_custom_catalog_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("custom.yaml");
        let mut catalog = Catalog::builtin("standard").unwrap();
        catalog.config_version = "custom-1".to_string();
        fs::write(&path, serde_yml::to_string(&catalog).unwrap()).unwrap();

        let catalog = load_catalog(path.to_str().unwrap()).unwrap();
        assert_eq!(catalog.config_version, "custom-1");
    }
}
