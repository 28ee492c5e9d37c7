//! Estimation profiles (productivity settings)

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A named productivity setting
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EstimationProfile {
    pub label: String,

    /// Man-days per function point
    pub productivity_factor: f64,

    #[serde(default)]
    pub description: String,
}

/// Profiles plus the key of the default one
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileTable {
    pub default: String,
    pub entries: BTreeMap<String, EstimationProfile>,
}

impl ProfileTable {
    pub fn get(&self, key: &str) -> Option<&EstimationProfile> {
        self.entries.get(key)
    }

    /// Find a profile by key, then by label (case-insensitive)
    pub fn find(&self, name: &str) -> Option<&str> {
        let needle = name.trim();
        if let Some((key, _)) = self.entries.get_key_value(needle) {
            return Some(key.as_str());
        }
        let folded = needle.to_lowercase().replace(['-', ' '], "_");
        self.entries
            .iter()
            .find(|(key, profile)| **key == folded || profile.label.eq_ignore_ascii_case(needle))
            .map(|(key, _)| key.as_str())
    }

    /// Display string for the productivity factor, e.g. `0.075 MD/FP`
    pub fn productivity_string(profile: &EstimationProfile) -> String {
        format!("{} MD/FP", profile.productivity_factor)
    }
}
