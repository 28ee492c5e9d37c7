//! Indirect-cost and SG&A allocation policy

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// What the SG&A rate is charged against
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SgaBasis {
    /// Fraction of the sales price
    #[default]
    Price,
    /// Fraction of gross profit
    GrossProfit,
}

impl fmt::Display for SgaBasis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SgaBasis::Price => write!(f, "price"),
            SgaBasis::GrossProfit => write!(f, "gross_profit"),
        }
    }
}

impl FromStr for SgaBasis {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace(['-', ' '], "_").as_str() {
            "price" | "sales" => Ok(SgaBasis::Price),
            "gross_profit" | "gp" => Ok(SgaBasis::GrossProfit),
            _ => Err(format!("Unknown SG&A basis: {}", s)),
        }
    }
}

/// What the revenue multipliers are applied to when pricing an estimate
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PriceBase {
    /// Development at the internal daily rate plus design and vendor cost
    #[default]
    Development,
    /// Cost of goods sold from the rank-based labor cost
    Cogs,
}

impl fmt::Display for PriceBase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PriceBase::Development => write!(f, "development"),
            PriceBase::Cogs => write!(f, "cogs"),
        }
    }
}

/// Local and corporate SG&A rates
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SgaRates {
    pub local: f64,
    pub corporate: f64,
}

impl SgaRates {
    pub fn total(&self) -> f64 {
        self.local + self.corporate
    }
}

/// Indirect cost as a fraction of direct labor
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlatRatePolicy {
    pub indirect_cost_rate: f64,

    pub sga: SgaRates,

    #[serde(default)]
    pub sga_basis: SgaBasis,

    #[serde(default)]
    pub include_design_fees: bool,

    #[serde(default)]
    pub price_base: PriceBase,
}

/// An organizational unit with its own overhead rates
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrgUnit {
    pub label: String,

    /// Alternate names accepted in requests
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub aliases: Vec<String>,

    /// Indirect cost per labor hour
    pub indirect_per_hour: f64,

    pub local_sga_rate: f64,

    pub corporate_sga_rate: f64,
}

/// Indirect cost per labor hour of one or more organizational units
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DepartmentalPolicy {
    /// Unit charged when a request names none, or an unknown one
    pub default_unit: String,

    /// Corporate SG&A rate used when costs are split across units
    pub corporate_sga_rate: f64,

    #[serde(default = "gross_profit_basis")]
    pub sga_basis: SgaBasis,

    #[serde(default = "yes")]
    pub include_design_fees: bool,

    #[serde(default = "cogs_price_base")]
    pub price_base: PriceBase,

    pub units: BTreeMap<String, OrgUnit>,
}

fn gross_profit_basis() -> SgaBasis {
    SgaBasis::GrossProfit
}

fn cogs_price_base() -> PriceBase {
    PriceBase::Cogs
}

fn yes() -> bool {
    true
}

impl DepartmentalPolicy {
    pub fn unit(&self, key: &str) -> Option<&OrgUnit> {
        self.units.get(key)
    }

    /// Find a unit by key, label or alias (case-insensitive)
    pub fn find_unit(&self, name: &str) -> Option<&str> {
        let needle = name.trim();
        if let Some((key, _)) = self.units.get_key_value(needle) {
            return Some(key.as_str());
        }
        self.units
            .iter()
            .find(|(key, unit)| {
                key.eq_ignore_ascii_case(needle)
                    || unit.label.eq_ignore_ascii_case(needle)
                    || unit.aliases.iter().any(|alias| alias.trim().eq_ignore_ascii_case(needle))
            })
            .map(|(key, _)| key.as_str())
    }
}

/// How indirect cost and SG&A are allocated to a project
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "policy", rename_all = "snake_case")]
pub enum AllocationPolicy {
    FlatRate(FlatRatePolicy),
    Departmental(DepartmentalPolicy),
}

impl AllocationPolicy {
    pub fn name(&self) -> &'static str {
        match self {
            AllocationPolicy::FlatRate(_) => "flat_rate",
            AllocationPolicy::Departmental(_) => "departmental",
        }
    }

    pub fn sga_basis(&self) -> SgaBasis {
        match self {
            AllocationPolicy::FlatRate(p) => p.sga_basis,
            AllocationPolicy::Departmental(p) => p.sga_basis,
        }
    }

    pub fn include_design_fees(&self) -> bool {
        match self {
            AllocationPolicy::FlatRate(p) => p.include_design_fees,
            AllocationPolicy::Departmental(p) => p.include_design_fees,
        }
    }

    pub fn price_base(&self) -> PriceBase {
        match self {
            AllocationPolicy::FlatRate(p) => p.price_base,
            AllocationPolicy::Departmental(p) => p.price_base,
        }
    }

    pub fn departmental(&self) -> Option<&DepartmentalPolicy> {
        match self {
            AllocationPolicy::Departmental(p) => Some(p),
            AllocationPolicy::FlatRate(_) => None,
        }
    }
}
