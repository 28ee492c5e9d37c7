//! Estimate workspace discovery and initialization

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Name of the workspace marker directory
pub const EST_DIR: &str = ".est";

/// A directory tree holding estimate requests and an `.est/` config directory
#[derive(Debug)]
pub struct Project {
    /// Root directory of the workspace (parent of .est/)
    root: PathBuf,
}

impl Project {
    /// Find the workspace root by walking up from the current directory
    pub fn discover() -> Result<Self, ProjectError> {
        let current = std::env::current_dir().map_err(|e| ProjectError::IoError(e.to_string()))?;
        Self::discover_from(&current)
    }

    /// Find the workspace root by walking up from the given directory
    pub fn discover_from(start: &Path) -> Result<Self, ProjectError> {
        let mut current = start
            .canonicalize()
            .map_err(|e| ProjectError::IoError(e.to_string()))?;

        loop {
            if current.join(EST_DIR).is_dir() {
                return Ok(Self { root: current });
            }

            if !current.pop() {
                return Err(ProjectError::NotFound {
                    searched_from: start.to_path_buf(),
                });
            }
        }
    }

    /// Create `.est/config.yaml` and a sample request under `path`
    pub fn init(path: &Path, force: bool) -> Result<Self, ProjectError> {
        let root = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());

        let est_dir = root.join(EST_DIR);
        if est_dir.exists() && !force {
            return Err(ProjectError::AlreadyExists(root));
        }

        std::fs::create_dir_all(&est_dir).map_err(|e| ProjectError::IoError(e.to_string()))?;
        std::fs::write(est_dir.join("config.yaml"), Self::default_config())
            .map_err(|e| ProjectError::IoError(e.to_string()))?;

        let requests = root.join("requests");
        std::fs::create_dir_all(&requests).map_err(|e| ProjectError::IoError(e.to_string()))?;
        let sample = requests.join("sample.yaml");
        if !sample.exists() {
            std::fs::write(&sample, Self::sample_request()).map_err(|e| ProjectError::IoError(e.to_string()))?;
        }

        Ok(Self { root })
    }

    fn default_config() -> &'static str {
        r#"# Estimate workspace configuration

# Catalog used for estimates: a built-in name (standard, departmental)
# or a path to a catalog YAML file
# catalog: standard

# Default output format (auto, text, yaml, json)
# default_format: auto
"#
    }

    fn sample_request() -> &'static str {
        r#"# Sample estimate request. Run: est estimate requests/sample.yaml
screen_count: 12
tables: [users, orders, products]
complexity: medium
duration: normal
dev_type: new
target_platform: web_b2c
estimation_profile: poc
features:
  - auth
  - payment
design_items:
  - basic_design
  - wireframe
vendor_items:
  - logo_creation
confidence: medium
target_margin: "20%"
"#
    }

    /// Get the project root directory
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Get the .est configuration directory
    pub fn est_dir(&self) -> PathBuf {
        self.root.join(EST_DIR)
    }
}

/// Errors that can occur during workspace operations
#[derive(Debug, Error)]
pub enum ProjectError {
    #[error("not an estimate workspace (searched from {searched_from:?}). Run 'est init' to create one.")]
    NotFound { searched_from: PathBuf },

    #[error("estimate workspace already exists at {0:?}")]
    AlreadyExists(PathBuf),

    #[error("IO error: {0}")]
    IoError(String),
}
