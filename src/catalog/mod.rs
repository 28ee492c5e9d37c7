//! Rate and catalog tables consumed by the estimation engine
//!
//! A [`Catalog`] is an immutable snapshot loaded once per invocation. Two
//! catalogs are compiled into the binary (`standard` and `departmental`);
//! any YAML file with the same shape can be loaded instead.

pub mod allocation;
pub mod items;
pub mod multipliers;
pub mod profile;
pub mod rates;

pub use allocation::{AllocationPolicy, DepartmentalPolicy, FlatRatePolicy, OrgUnit, PriceBase, SgaBasis, SgaRates};
pub use items::{EffortCatalog, FeatureEntry, ItemSizing, LabelIndex, PhaseItem, PriceRange};
pub use multipliers::{Complexity, Confidence, DevType, Duration, MultiplierSet, Platform};
pub use profile::{EstimationProfile, ProfileTable};
pub use rates::{RateTable, TeamMix};

use miette::Diagnostic;
use rust_embed::Embed;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

use crate::yaml::{parse_yaml_file, parse_yaml_str, YamlError, YamlSyntaxError};

#[derive(Embed)]
#[folder = "catalogs/"]
struct BuiltinCatalogs;

/// Name of the catalog used when nothing else is configured
pub const DEFAULT_CATALOG: &str = "standard";

/// Errors raised while loading or validating a catalog
#[derive(Debug, Error, Diagnostic)]
pub enum CatalogError {
    #[error("Unknown built-in catalog '{name}'")]
    #[diagnostic(
        code(est::catalog::unknown),
        help("Built-in catalogs: {available}. Or pass a path to a YAML catalog file.")
    )]
    UnknownBuiltin { name: String, available: String },

    #[error(transparent)]
    #[diagnostic(transparent)]
    Syntax(#[from] YamlSyntaxError),

    #[error("Failed to read catalog {path}: {source}")]
    #[diagnostic(code(est::catalog::io))]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Catalog '{name}' is invalid: {reason}")]
    #[diagnostic(code(est::catalog::invalid))]
    Invalid { name: String, reason: String },
}

impl From<YamlError> for CatalogError {
    fn from(err: YamlError) -> Self {
        match err {
            YamlError::Syntax(e) => CatalogError::Syntax(e),
            YamlError::Io { path, source } => CatalogError::Io { path, source },
        }
    }
}

/// Currency used for display
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Currency {
    pub code: String,
    pub symbol: String,
}

impl Default for Currency {
    fn default() -> Self {
        Self {
            code: "JPY".to_string(),
            symbol: "¥".to_string(),
        }
    }
}

/// Working calendar used to convert man-days to months and hours
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct WorkCalendar {
    pub working_days_per_month: f64,
    pub working_hours_per_day: f64,
}

impl Default for WorkCalendar {
    fn default() -> Self {
        Self {
            working_days_per_month: 20.0,
            working_hours_per_day: 8.0,
        }
    }
}

/// Function-point weights per screen and per table
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct FunctionPointWeights {
    pub screen_weight: f64,
    pub table_weight: f64,
}

impl Default for FunctionPointWeights {
    fn default() -> Self {
        Self {
            screen_weight: 20.0,
            table_weight: 15.0,
        }
    }
}

/// Complete rate and catalog configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Catalog {
    /// Version string echoed in every report
    pub config_version: String,

    #[serde(default)]
    pub currency: Currency,

    pub rates: RateTable,

    #[serde(default)]
    pub calendar: WorkCalendar,

    #[serde(default)]
    pub function_points: FunctionPointWeights,

    pub profiles: ProfileTable,

    #[serde(default)]
    pub multipliers: MultiplierSet,

    #[serde(default)]
    pub items: EffortCatalog,

    pub allocation: AllocationPolicy,
}

impl Catalog {
    /// Names of the catalogs compiled into the binary
    pub fn builtin_names() -> Vec<String> {
        let mut names: Vec<String> = BuiltinCatalogs::iter()
            .filter_map(|file| file.strip_suffix(".yaml").map(str::to_string))
            .collect();
        names.sort();
        names
    }

    /// Load a built-in catalog by name
    pub fn builtin(name: &str) -> Result<Self, CatalogError> {
        let filename = format!("{}.yaml", name);
        let file = BuiltinCatalogs::get(&filename).ok_or_else(|| CatalogError::UnknownBuiltin {
            name: name.to_string(),
            available: Self::builtin_names().join(", "),
        })?;
        let source = String::from_utf8_lossy(&file.data);
        Self::from_yaml_str(&source, &filename)
    }

    /// Load a catalog from a YAML file
    pub fn from_path(path: &Path) -> Result<Self, CatalogError> {
        let catalog: Catalog = parse_yaml_file(path)?;
        catalog.validate(&path.display().to_string())?;
        Ok(catalog)
    }

    /// Parse and validate a catalog held in memory
    pub fn from_yaml_str(source: &str, name: &str) -> Result<Self, CatalogError> {
        let catalog: Catalog = parse_yaml_str(source, name)?;
        catalog.validate(name)?;
        Ok(catalog)
    }

    /// Load either a built-in catalog or a catalog file.
    ///
    /// Built-in names win; anything else is treated as a path.
    pub fn load(name_or_path: &str) -> Result<Self, CatalogError> {
        if Self::builtin_names().iter().any(|n| n == name_or_path) {
            return Self::builtin(name_or_path);
        }
        let path = Path::new(name_or_path);
        if path.exists() {
            return Self::from_path(path);
        }
        Err(CatalogError::UnknownBuiltin {
            name: name_or_path.to_string(),
            available: Self::builtin_names().join(", "),
        })
    }

    /// The profile used when a request names none
    pub fn default_profile(&self) -> Option<&EstimationProfile> {
        self.profiles.get(&self.profiles.default)
    }

    fn validate(&self, name: &str) -> Result<(), CatalogError> {
        let invalid = |reason: String| CatalogError::Invalid {
            name: name.to_string(),
            reason,
        };

        if self.profiles.get(&self.profiles.default).is_none() {
            return Err(invalid(format!(
                "default profile '{}' is not defined",
                self.profiles.default
            )));
        }
        for (key, profile) in &self.profiles.entries {
            if !(profile.productivity_factor.is_finite() && profile.productivity_factor >= 0.0) {
                return Err(invalid(format!("profile '{}' has invalid productivity_factor", key)));
            }
        }

        if !(self.calendar.working_days_per_month > 0.0 && self.calendar.working_hours_per_day > 0.0) {
            return Err(invalid("calendar values must be positive".to_string()));
        }

        for (label, value) in self.multipliers.scalars() {
            if !(value.is_finite() && value > 0.0) {
                return Err(invalid(format!("multiplier {} must be positive, got {}", label, value)));
            }
        }

        for (rate_name, rate) in [
            ("internal_daily_rate", self.rates.internal_daily_rate),
            ("outsource_daily_rate", self.rates.outsource_daily_rate),
            ("vendor_management_fee_rate", self.rates.vendor_management_fee_rate),
        ] {
            if !(rate.is_finite() && rate >= 0.0) {
                return Err(invalid(format!("{} must be non-negative", rate_name)));
            }
        }

        self.items.check().map_err(invalid)?;

        if let Some(dept) = self.allocation.departmental() {
            if dept.unit(&dept.default_unit).is_none() {
                return Err(invalid(format!(
                    "default unit '{}' is not defined",
                    dept.default_unit
                )));
            }
        }

        Ok(())
    }
}
