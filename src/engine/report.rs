//! Presentation record returned to callers
//!
//! Amounts are truncated to whole currency units here and only here; the
//! engine computes in `f64` throughout.

use serde::Serialize;
use std::collections::BTreeMap;

use crate::catalog::{Catalog, PriceBase, SgaBasis};
use crate::engine::cost::Range;
use crate::engine::error::InputNotice;
use crate::engine::profit::TargetPrice;
use crate::engine::request::UnitAllocation;
use crate::engine::Estimate;

/// Status-tagged result of an estimate
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Response {
    Success(Box<EstimateReport>),
    Error { message: String },
}

/// Whole-unit amount range
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AmountRange {
    pub low: i64,
    pub high: i64,
}

impl From<Range> for AmountRange {
    fn from(range: Range) -> Self {
        Self {
            low: truncate(range.low),
            high: truncate(range.high),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ManDays {
    pub development_total: f64,
    pub size_based: f64,
    pub feature_based: f64,
    pub function_points: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct InputEcho {
    pub method: &'static str,
    pub profile: String,
    pub profile_description: String,
    pub screen_count: u32,
    pub table_count: u32,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tables: Vec<String>,
    pub complexity: String,
    pub complexity_label: &'static str,
    pub duration: String,
    pub dev_type: String,
    pub target_platform: String,
    pub confidence: Option<String>,
    pub target_margin: Option<f64>,
    pub features: Vec<String>,
    pub design_items: Vec<String>,
    pub vendor_items: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub department: Option<UnitAllocation>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CostSummary {
    pub development: i64,
    pub design: i64,
    pub vendor: i64,
    pub vendor_range: AmountRange,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vendor_catalog_range: Option<AmountRange>,
    pub price_base: PriceBase,
    pub base_amount: i64,
    pub platform_multiplier: f64,
    pub duration_multiplier: f64,
    pub buffer_multiplier: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProfitBreakdown {
    pub direct_labor: i64,
    pub indirect_cost: i64,
    pub outsourcing: i64,
    pub design_fees: i64,
    pub total_sga_cost: i64,
    pub local_sga_rate: String,
    pub corporate_sga_rate: String,
    pub sga_basis: SgaBasis,
    pub allocation_policy: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub indirect_per_hour: Option<i64>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub units: BTreeMap<String, f64>,
}

/// Target price outcome as presented
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum TargetSummary {
    Attainable {
        target_margin: String,
        price: i64,
        formatted: String,
    },
    Infeasible {
        target_margin: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        max_margin: Option<String>,
        message: String,
    },
}

#[derive(Debug, Clone, Serialize)]
pub struct ProfitSummary {
    pub sales: i64,
    pub cogs: i64,
    pub gross_profit: i64,
    pub gross_margin: String,
    pub operating_profit: i64,
    pub operating_margin: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target: Option<TargetSummary>,
    pub breakdown: ProfitBreakdown,
}

/// Everything a successful estimate reports
#[derive(Debug, Clone, Serialize)]
pub struct EstimateReport {
    pub estimated_amount: String,
    pub estimated_range: String,
    pub price: i64,
    pub display_range: AmountRange,
    pub variance_range: AmountRange,
    pub man_days: ManDays,
    pub input_echo: InputEcho,
    pub cost_breakdown: CostSummary,
    pub profit_analysis: ProfitSummary,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub notices: Vec<InputNotice>,
    pub productivity: String,
    pub currency: String,
    pub config_version: String,
}

/// Truncate toward zero to whole currency units
/// Explain why a target margin has no price
pub fn infeasible_message(target_margin: f64, max_margin: Option<f64>) -> String {
    match max_margin {
        Some(max) => format!(
            "an operating margin of {} cannot be reached; margins stay below {}",
            format_percent(target_margin),
            format_percent(max)
        ),
        None => format!(
            "no sales price gives an operating margin of {}",
            format_percent(target_margin)
        ),
    }
}

pub fn truncate(amount: f64) -> i64 {
    amount.trunc() as i64
}

/// Round to one decimal place
pub fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Format an amount with thousands separators, e.g. `¥1,234,567`
pub fn format_amount(symbol: &str, amount: i64) -> String {
    let digits = amount.unsigned_abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    let sign = if amount < 0 { "-" } else { "" };
    format!("{}{}{}", symbol, sign, grouped)
}

/// Format a fraction as a percentage with one decimal, e.g. `12.3%`
pub fn format_percent(fraction: f64) -> String {
    format!("{:.1}%", fraction * 100.0)
}

impl EstimateReport {
    pub fn build(catalog: &Catalog, estimate: &Estimate) -> Self {
        let symbol = catalog.currency.symbol.as_str();
        let request = &estimate.request;
        let effort = &estimate.effort;
        let cost = &estimate.cost;
        let profit = &estimate.profit;

        let price = truncate(cost.price);
        let display_range = AmountRange::from(cost.display_range);
        let profile = catalog.profiles.get(&request.profile);

        let target = profit.target.map(|t| match t {
            TargetPrice::Attainable { target_margin, price } => TargetSummary::Attainable {
                target_margin: format_percent(target_margin),
                price: truncate(price),
                formatted: format_amount(symbol, truncate(price)),
            },
            TargetPrice::Infeasible {
                target_margin,
                max_margin,
            } => TargetSummary::Infeasible {
                target_margin: format_percent(target_margin),
                max_margin: max_margin.map(format_percent),
                message: infeasible_message(target_margin, max_margin),
            },
        });

        let has_catalog_range = cost.vendor.catalog_range != Range::default();

        Self {
            estimated_amount: format_amount(symbol, price),
            estimated_range: format!(
                "{} - {}",
                format_amount(symbol, display_range.low),
                format_amount(symbol, display_range.high)
            ),
            price,
            display_range,
            variance_range: cost.variance_range.into(),
            man_days: ManDays {
                development_total: round1(effort.total_days),
                size_based: round1(effort.size_days),
                feature_based: round1(effort.feature_days),
                function_points: round1(effort.size_fp),
            },
            input_echo: InputEcho {
                method: request.sizing.name(),
                profile: profile.map(|p| p.label.clone()).unwrap_or_else(|| request.profile.clone()),
                profile_description: profile.map(|p| p.description.clone()).unwrap_or_default(),
                screen_count: request.screen_count,
                table_count: request.table_count,
                tables: request.tables.clone(),
                complexity: request.complexity.to_string(),
                complexity_label: request.complexity.label(),
                duration: request.duration.to_string(),
                dev_type: request.dev_type.to_string(),
                target_platform: request.platform.to_string(),
                confidence: request.confidence.map(|c| c.to_string()),
                target_margin: request.target_margin,
                features: request.features.iter().cloned().collect(),
                design_items: request.design_items.iter().cloned().collect(),
                vendor_items: request.vendor_items.iter().cloned().collect(),
                department: request.allocation.clone(),
            },
            cost_breakdown: CostSummary {
                development: truncate(cost.development),
                design: truncate(cost.design.cost),
                vendor: truncate(cost.vendor.cost),
                vendor_range: cost.vendor.range.into(),
                vendor_catalog_range: has_catalog_range.then(|| cost.vendor.catalog_range.into()),
                price_base: cost.price_base,
                base_amount: truncate(cost.base_amount),
                platform_multiplier: cost.revenue.platform,
                duration_multiplier: cost.revenue.duration,
                buffer_multiplier: cost.revenue.buffer,
            },
            profit_analysis: ProfitSummary {
                sales: truncate(profit.sales),
                cogs: truncate(profit.cogs),
                gross_profit: truncate(profit.gross_profit),
                gross_margin: format_percent(profit.gross_margin),
                operating_profit: truncate(profit.operating_profit),
                operating_margin: format_percent(profit.operating_margin),
                target,
                breakdown: ProfitBreakdown {
                    direct_labor: truncate(profit.direct_labor),
                    indirect_cost: truncate(profit.indirect_cost),
                    outsourcing: truncate(profit.vendor_cost),
                    design_fees: truncate(profit.design_fees),
                    total_sga_cost: truncate(profit.sga.amount),
                    local_sga_rate: format_percent(profit.sga.local_rate),
                    corporate_sga_rate: format_percent(profit.sga.corporate_rate),
                    sga_basis: profit.sga.basis,
                    allocation_policy: profit.allocation.policy,
                    indirect_per_hour: profit.allocation.indirect_per_hour.map(truncate),
                    units: profit.allocation.units.clone(),
                },
            },
            notices: estimate.notices.clone(),
            productivity: format!("{} MD/FP", crate::engine::effort::productivity_factor(catalog, request)),
            currency: catalog.currency.code.clone(),
            config_version: catalog.config_version.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_amount() {
        assert_eq!(format_amount("¥", 0), "¥0");
        assert_eq!(format_amount("¥", 999), "¥999");
        assert_eq!(format_amount("¥", 1000), "¥1,000");
        assert_eq!(format_amount("¥", 1_650_000), "¥1,650,000");
        assert_eq!(format_amount("$", -1_234_567), "$-1,234,567");
    }

    #[test]
    fn test_format_percent() {
        assert_eq!(format_percent(0.2), "20.0%");
        assert_eq!(format_percent(0.1234), "12.3%");
        assert_eq!(format_percent(-0.05), "-5.0%");
    }

    #[test]
    fn test_truncate_and_round() {
        assert_eq!(truncate(1_485_000.9), 1_485_000);
        assert_eq!(truncate(-10.7), -10);
        assert_eq!(round1(14.96), 15.0);
        assert_eq!(round1(0.04), 0.0);
    }

    #[test]
    fn test_infeasible_message_claims_a_bound_only_when_one_exists() {
        assert_eq!(
            infeasible_message(0.9, Some(0.719)),
            "an operating margin of 90.0% cannot be reached; margins stay below 71.9%"
        );
        assert_eq!(
            infeasible_message(0.1, None),
            "no sales price gives an operating margin of 10.0%"
        );
    }

    #[test]
    fn test_error_response_shape() {
        let response = Response::Error {
            message: "Missing required input 'confidence'".to_string(),
        };
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["status"], "error");
        assert_eq!(json.as_object().unwrap().len(), 2);
    }
}
