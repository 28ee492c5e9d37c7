//! Effort catalog: features, design-phase items and vendor-phase items

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// An enumerated feature with a fixed effort
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeatureEntry {
    /// Descriptive label shown to callers
    pub label: String,

    /// Alternative labels that also resolve to this feature
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub aliases: Vec<String>,

    /// Development effort in man-days
    pub man_days: f64,
}

/// How a phase item is sized. Exactly one mode per item.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ItemSizing {
    /// Fixed effort regardless of project size
    Fixed { man_days: f64 },
    /// Effort per screen
    PerScreen { man_days: f64 },
    /// Fixed currency fee
    Fee { amount: f64 },
}

impl ItemSizing {
    /// Effort in man-days for the given screen count, `None` for fee items
    pub fn man_days(&self, screen_count: u32) -> Option<f64> {
        match *self {
            ItemSizing::Fixed { man_days } => Some(man_days),
            ItemSizing::PerScreen { man_days } => Some(man_days * f64::from(screen_count)),
            ItemSizing::Fee { .. } => None,
        }
    }

    /// Cost of the item when day-based effort is billed at `daily_rate`
    pub fn amount(&self, screen_count: u32, daily_rate: f64) -> f64 {
        match *self {
            ItemSizing::Fee { amount } => amount,
            _ => self.man_days(screen_count).unwrap_or(0.0) * daily_rate,
        }
    }

    /// Short name of the sizing mode
    pub fn mode(&self) -> &'static str {
        match self {
            ItemSizing::Fixed { .. } => "fixed",
            ItemSizing::PerScreen { .. } => "per_screen",
            ItemSizing::Fee { .. } => "fee",
        }
    }

    fn value(&self) -> f64 {
        match *self {
            ItemSizing::Fixed { man_days } | ItemSizing::PerScreen { man_days } => man_days,
            ItemSizing::Fee { amount } => amount,
        }
    }
}

/// Catalog price range for a vendor item
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 2]", into = "[f64; 2]")]
pub struct PriceRange {
    pub min: f64,
    pub max: f64,
}

impl From<[f64; 2]> for PriceRange {
    fn from([min, max]: [f64; 2]) -> Self {
        Self { min, max }
    }
}

impl From<PriceRange> for [f64; 2] {
    fn from(range: PriceRange) -> Self {
        [range.min, range.max]
    }
}

/// A design-phase or vendor-phase item
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "PhaseItemDef")]
pub struct PhaseItem {
    pub label: String,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub aliases: Vec<String>,

    #[serde(flatten)]
    pub sizing: ItemSizing,

    /// Quoted price range (vendor items)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price_range: Option<PriceRange>,
}

/// Phase item as written in a catalog, before its sizing fields are checked
#[derive(Deserialize)]
struct PhaseItemDef {
    label: String,
    #[serde(default)]
    aliases: Vec<String>,
    #[serde(rename = "type")]
    kind: String,
    man_days: Option<f64>,
    amount: Option<f64>,
    price_range: Option<PriceRange>,
}

impl TryFrom<PhaseItemDef> for PhaseItem {
    type Error = String;

    fn try_from(def: PhaseItemDef) -> Result<Self, Self::Error> {
        let sizing = match (def.kind.as_str(), def.man_days, def.amount) {
            (_, Some(_), Some(_)) => {
                return Err(format!("item '{}' mixes man_days and amount", def.label));
            }
            ("fixed", Some(man_days), None) => ItemSizing::Fixed { man_days },
            ("per_screen", Some(man_days), None) => ItemSizing::PerScreen { man_days },
            ("fee", None, Some(amount)) => ItemSizing::Fee { amount },
            (kind @ ("fixed" | "per_screen"), _, _) => {
                return Err(format!("{} item '{}' needs man_days", kind, def.label));
            }
            ("fee", _, _) => return Err(format!("fee item '{}' needs amount", def.label)),
            (other, _, _) => {
                return Err(format!(
                    "item '{}' has unknown sizing type '{}' (expected fixed, per_screen or fee)",
                    def.label, other
                ));
            }
        };
        Ok(Self {
            label: def.label,
            aliases: def.aliases,
            sizing,
            price_range: def.price_range,
        })
    }
}

/// Something that can be found by descriptive label
pub trait Labelled {
    fn label(&self) -> &str;
    fn aliases(&self) -> &[String];
}

impl Labelled for FeatureEntry {
    fn label(&self) -> &str {
        &self.label
    }

    fn aliases(&self) -> &[String] {
        &self.aliases
    }
}

impl Labelled for PhaseItem {
    fn label(&self) -> &str {
        &self.label
    }

    fn aliases(&self) -> &[String] {
        &self.aliases
    }
}

/// Label → canonical key lookup built from a catalog table
#[derive(Debug, Clone, Default)]
pub struct LabelIndex {
    map: BTreeMap<String, String>,
}

impl LabelIndex {
    /// Index the labels and aliases of every entry in `table`
    pub fn build<T: Labelled>(table: &BTreeMap<String, T>) -> Self {
        let mut map = BTreeMap::new();
        for (key, entry) in table {
            map.insert(entry.label().to_string(), key.clone());
            for alias in entry.aliases() {
                map.insert(alias.clone(), key.clone());
            }
        }
        Self { map }
    }

    pub fn get(&self, label: &str) -> Option<&str> {
        self.map.get(label).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

/// All effort-bearing catalog tables
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EffortCatalog {
    #[serde(default)]
    pub features: BTreeMap<String, FeatureEntry>,

    /// Internal design-phase items
    #[serde(default)]
    pub design_items: BTreeMap<String, PhaseItem>,

    /// External vendor-phase items
    #[serde(default)]
    pub vendor_items: BTreeMap<String, PhaseItem>,
}

impl EffortCatalog {
    /// Effort of a feature, zero when unknown
    pub fn feature_effort(&self, key: &str) -> f64 {
        self.features.get(key).map(|f| f.man_days).unwrap_or(0.0)
    }

    /// Check that every numeric value is finite and non-negative
    pub(crate) fn check(&self) -> Result<(), String> {
        for (key, feature) in &self.features {
            if !(feature.man_days.is_finite() && feature.man_days >= 0.0) {
                return Err(format!("feature '{}' has invalid man_days {}", key, feature.man_days));
            }
        }
        for (table, items) in [("design_items", &self.design_items), ("vendor_items", &self.vendor_items)] {
            for (key, item) in items {
                let value = item.sizing.value();
                if !(value.is_finite() && value >= 0.0) {
                    return Err(format!("{} '{}' has invalid {} value {}", table, key, item.sizing.mode(), value));
                }
                if let Some(range) = item.price_range {
                    if range.min > range.max {
                        return Err(format!("{} '{}' has price_range min above max", table, key));
                    }
                }
            }
        }
        Ok(())
    }
}
