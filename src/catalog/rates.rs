//! Labor rates and team composition

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Daily rates and monthly rank costs
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateTable {
    /// Internal cost per man-day
    pub internal_daily_rate: f64,

    /// Outsourced cost per man-day
    pub outsource_daily_rate: f64,

    /// Fraction added on top of vendor base cost
    #[serde(default)]
    pub vendor_management_fee_rate: f64,

    /// Rank → fully loaded monthly labor cost
    #[serde(default)]
    pub rank_monthly_costs: BTreeMap<String, f64>,

    /// Rank → weight used when a request gives no team mix
    #[serde(default)]
    pub standard_team_mix: BTreeMap<String, f64>,
}

impl RateTable {
    /// Monthly cost of a rank, `None` when the rank is not in the table
    pub fn monthly_cost(&self, rank: &str) -> Option<f64> {
        self.rank_monthly_costs.get(rank).copied()
    }

    /// Blended monthly cost of a normalized team mix. Unknown ranks add nothing.
    pub fn blended_monthly_cost(&self, mix: &TeamMix) -> f64 {
        mix.weights()
            .iter()
            .map(|(rank, weight)| self.monthly_cost(rank).unwrap_or(0.0) * weight)
            .sum()
    }
}

/// Rank weights that sum to one
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct TeamMix(BTreeMap<String, f64>);

impl TeamMix {
    /// Normalize raw weights. Returns `None` when the weights do not sum to a
    /// positive total.
    pub fn normalized(raw: &BTreeMap<String, f64>) -> Option<Self> {
        let total: f64 = raw.values().filter(|w| w.is_finite()).sum();
        if !(total > 0.0) {
            return None;
        }
        Some(Self(
            raw.iter()
                .filter(|(_, w)| w.is_finite())
                .map(|(rank, w)| (rank.clone(), w / total))
                .collect(),
        ))
    }

    pub fn weights(&self) -> &BTreeMap<String, f64> {
        &self.0
    }
}
