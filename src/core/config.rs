//! Configuration management with layered hierarchy

use serde::Deserialize;
use std::path::PathBuf;

use crate::catalog::DEFAULT_CATALOG;
use crate::core::Project;

/// CLI configuration with layered hierarchy
#[derive(Debug, Default, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Built-in catalog name or path to a catalog file
    pub catalog: Option<String>,

    /// Default output format
    pub default_format: Option<String>,
}

impl Config {
    /// Load configuration from all sources, merging in priority order
    pub fn load() -> Self {
        let mut config = Config::default();

        // 1. Built-in defaults (already in Default impl)

        // 2. Global user config (~/.config/est/config.yaml)
        if let Some(global_path) = Self::global_config_path() {
            if let Some(global) = Self::read(&global_path) {
                config.merge(global);
            }
        }

        // 3. Workspace config (.est/config.yaml)
        if let Ok(project) = Project::discover() {
            let project_config_path = project.est_dir().join("config.yaml");
            if let Some(project_config) = Self::read(&project_config_path) {
                // Relative catalog paths are relative to the workspace root
                let project_config = Config {
                    catalog: project_config.catalog.map(|c| {
                        let candidate = project.root().join(&c);
                        if candidate.exists() {
                            candidate.display().to_string()
                        } else {
                            c
                        }
                    }),
                    ..project_config
                };
                config.merge(project_config);
            }
        }

        // 4. Environment variables
        config.merge(Self::from_env(|key| std::env::var(key).ok()));

        config
    }

    fn read(path: &std::path::Path) -> Option<Config> {
        if !path.exists() {
            return None;
        }
        let contents = std::fs::read_to_string(path).ok()?;
        match serde_yml::from_str::<Config>(&contents) {
            Ok(config) => Some(config),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "ignoring unreadable config file");
                None
            }
        }
    }

    /// Read `EST_CATALOG` and `EST_FORMAT` through `lookup`
    fn from_env(lookup: impl Fn(&str) -> Option<String>) -> Config {
        Config {
            catalog: lookup("EST_CATALOG").filter(|v| !v.is_empty()),
            default_format: lookup("EST_FORMAT").filter(|v| !v.is_empty()),
        }
    }

    /// Get the path to the global config file
    fn global_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("", "", "est").map(|dirs| dirs.config_dir().join("config.yaml"))
    }

    /// Merge another config into this one (other takes precedence)
    fn merge(&mut self, other: Config) {
        if other.catalog.is_some() {
            self.catalog = other.catalog;
        }
        if other.default_format.is_some() {
            self.default_format = other.default_format;
        }
    }

    /// Catalog to load: explicit flag, then configuration, then the default
    pub fn catalog(&self, flag: Option<&str>) -> String {
        flag.map(str::to_string)
            .or_else(|| self.catalog.clone())
            .unwrap_or_else(|| DEFAULT_CATALOG.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_prefers_later_layers() {
        let mut config = Config {
            catalog: Some("standard".to_string()),
            default_format: Some("yaml".to_string()),
        };
        config.merge(Config {
            catalog: Some("departmental".to_string()),
            default_format: None,
        });
        assert_eq!(config.catalog.as_deref(), Some("departmental"));
        assert_eq!(config.default_format.as_deref(), Some("yaml"));
    }

    #[test]
    fn test_env_layer() {
        let env = Config::from_env(|key| match key {
            "EST_CATALOG" => Some("departmental".to_string()),
            "EST_FORMAT" => Some(String::new()),
            _ => None,
        });
        assert_eq!(env.catalog.as_deref(), Some("departmental"));
        assert_eq!(env.default_format, None);
    }

    #[test]
    fn test_catalog_resolution_order() {
        let config = Config {
            catalog: Some("departmental".to_string()),
            default_format: None,
        };
        assert_eq!(config.catalog(Some("custom.yaml")), "custom.yaml");
        assert_eq!(config.catalog(None), "departmental");
        assert_eq!(Config::default().catalog(None), "standard");
    }

    #[test]
    fn test_read_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(&path, "catalog: departmental\ndefault_format: json\n").unwrap();
        let config = Config::read(&path).unwrap();
        assert_eq!(config.default_format.as_deref(), Some("json"));
        assert!(Config::read(&dir.path().join("missing.yaml")).is_none());
    }
}
