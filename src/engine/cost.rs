//! Cost composition and sales price
//!
//! Cost-side multipliers (difficulty, dev type, vendor confidence) shape the
//! cost of each phase. Revenue-side multipliers (platform, duration, risk
//! buffer) turn the summed cost into the sales price.

use serde::Serialize;
use std::collections::BTreeMap;
use std::collections::BTreeSet;

use crate::catalog::multipliers::DisplayRange;
use crate::catalog::{Catalog, PhaseItem, PriceBase};
use crate::engine::effort::EffortBreakdown;
use crate::engine::request::EstimateRequest;

/// A closed interval of amounts
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Range {
    pub low: f64,
    pub high: f64,
}

/// Cost of one selected phase item
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ItemCost {
    pub key: String,
    pub label: String,
    pub sizing: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub man_days: Option<f64>,
    pub amount: f64,
}

/// Internal design-phase cost
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DesignCost {
    pub items: Vec<ItemCost>,
    pub base: f64,
    /// difficulty × dev-type design multiplier
    pub multiplier: f64,
    pub cost: f64,
}

/// External vendor-phase cost
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VendorCost {
    pub items: Vec<ItemCost>,
    pub base: f64,
    pub management_fee: f64,
    pub confidence_multiplier: f64,
    /// Point cost after the confidence multiplier
    pub cost: f64,
    pub variance: f64,
    /// `cost × (1 ± variance)`
    pub range: Range,
    /// Sum of the catalog price ranges of the selected items
    pub catalog_range: Range,
}

/// Revenue-side multipliers
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RevenueMultipliers {
    pub platform: f64,
    pub duration: f64,
    pub buffer: f64,
}

impl RevenueMultipliers {
    /// Apply in fixed order: platform, duration, buffer
    pub fn apply(&self, amount: f64) -> f64 {
        amount * self.platform * self.duration * self.buffer
    }
}

/// Full cost breakdown and sales price
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CostBreakdown {
    pub development: f64,
    pub design: DesignCost,
    pub vendor: VendorCost,
    pub price_base: PriceBase,
    /// Amount the revenue multipliers apply to: development + design +
    /// vendor, or COGS once rebased
    pub base_amount: f64,
    pub revenue: RevenueMultipliers,
    pub price: f64,
    /// Presentation band around the price
    pub display_range: Range,
    /// Price with the vendor cost at the ends of its variance range
    pub variance_range: Range,
}

impl CostBreakdown {
    /// Reprice from a different base amount. The vendor variance still
    /// moves the vendor share of the new base.
    pub fn rebase(&mut self, price_base: PriceBase, base_amount: f64, display: &DisplayRange) {
        let without_vendor = base_amount - self.vendor.cost;
        self.price_base = price_base;
        self.base_amount = base_amount;
        self.price = self.revenue.apply(base_amount);
        self.display_range = Range {
            low: self.price * display.low,
            high: self.price * display.high,
        };
        self.variance_range = Range {
            low: self.revenue.apply(without_vendor + self.vendor.range.low),
            high: self.revenue.apply(without_vendor + self.vendor.range.high),
        };
    }
}

fn item_costs(
    table: &BTreeMap<String, PhaseItem>,
    keys: &BTreeSet<String>,
    screen_count: u32,
    daily_rate: f64,
) -> Vec<ItemCost> {
    keys.iter()
        .filter_map(|key| table.get(key).map(|item| (key, item)))
        .map(|(key, item)| ItemCost {
            key: key.clone(),
            label: item.label.clone(),
            sizing: item.sizing.mode(),
            man_days: item.sizing.man_days(screen_count),
            amount: item.sizing.amount(screen_count, daily_rate),
        })
        .collect()
}

/// Compose phase costs and derive the sales price
pub fn compose_cost(catalog: &Catalog, request: &EstimateRequest, effort: &EffortBreakdown) -> CostBreakdown {
    let rates = &catalog.rates;
    let multipliers = &catalog.multipliers;

    let development = effort.total_days * rates.internal_daily_rate;

    let design_items = item_costs(
        &catalog.items.design_items,
        &request.design_items,
        request.screen_count,
        rates.internal_daily_rate,
    );
    let design_base: f64 = design_items.iter().map(|i| i.amount).sum();
    let design_multiplier =
        multipliers.difficulty(request.complexity) * multipliers.dev_type(request.dev_type).design;
    let design = DesignCost {
        items: design_items,
        base: design_base,
        multiplier: design_multiplier,
        cost: design_base * design_multiplier,
    };

    let vendor_items = item_costs(
        &catalog.items.vendor_items,
        &request.vendor_items,
        request.screen_count,
        rates.outsource_daily_rate,
    );
    let vendor_base: f64 = vendor_items.iter().map(|i| i.amount).sum();
    let management_fee = vendor_base * rates.vendor_management_fee_rate;
    let (confidence_multiplier, variance) = match request.confidence {
        Some(c) => (
            multipliers.confidence.cost_multiplier(c),
            multipliers.confidence.variance(c),
        ),
        None => (1.0, 0.0),
    };
    let vendor_cost = (vendor_base + management_fee) * confidence_multiplier;
    let catalog_range = request
        .vendor_items
        .iter()
        .filter_map(|key| catalog.items.vendor_items.get(key))
        .filter_map(|item| item.price_range)
        .fold(Range::default(), |acc, r| Range {
            low: acc.low + r.min,
            high: acc.high + r.max,
        });
    let vendor = VendorCost {
        items: vendor_items,
        base: vendor_base,
        management_fee,
        confidence_multiplier,
        cost: vendor_cost,
        variance,
        range: Range {
            low: vendor_cost * (1.0 - variance),
            high: vendor_cost * (1.0 + variance),
        },
        catalog_range,
    };

    let revenue = RevenueMultipliers {
        platform: multipliers.platform(request.platform),
        duration: multipliers.duration(request.duration),
        buffer: multipliers.buffer,
    };
    let base_amount = development + design.cost + vendor.cost;

    let mut cost = CostBreakdown {
        development,
        design,
        vendor,
        price_base: PriceBase::Development,
        base_amount,
        revenue,
        price: 0.0,
        display_range: Range::default(),
        variance_range: Range::default(),
    };
    cost.rebase(PriceBase::Development, base_amount, &multipliers.display_range);
    cost
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::effort::estimate_effort;
    use crate::engine::request::{ItemList, RawRequest};
    use crate::engine::resolve::resolve_request;

    fn cost_for(raw: &RawRequest) -> CostBreakdown {
        let catalog = Catalog::builtin("standard").unwrap();
        let resolved = resolve_request(&catalog, raw).unwrap();
        let effort = estimate_effort(&catalog, &resolved.request);
        compose_cost(&catalog, &resolved.request, &effort)
    }

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() <= 1e-6 * b.abs().max(1.0)
    }

    #[test]
    fn test_default_request_price() {
        let cost = cost_for(&RawRequest::default());
        assert!(close(cost.development, 1_500_000.0));
        assert_eq!(cost.design.cost, 0.0);
        assert_eq!(cost.vendor.cost, 0.0);
        assert!(close(cost.price, 1_650_000.0));
        assert!(close(cost.display_range.low, 1_485_000.0));
        assert!(close(cost.display_range.high, 1_980_000.0));
    }

    #[test]
    fn test_high_complexity_costs_more_than_low() {
        let low = cost_for(&RawRequest {
            complexity: Some("low".to_string()),
            ..Default::default()
        });
        let high = cost_for(&RawRequest {
            complexity: Some("high".to_string()),
            ..Default::default()
        });
        assert!(high.price > low.price);
    }

    #[test]
    fn test_design_items_by_sizing_mode() {
        let cost = cost_for(&RawRequest {
            screen_count: Some(4),
            design_items: ItemList::parse("basic_design, ia_design, wireframe"),
            ..Default::default()
        });
        // fee 1,000,000 + 3 days + 0.5 days × 4 screens at 100,000
        assert_eq!(cost.design.items.len(), 3);
        assert!(close(cost.design.base, 1_500_000.0));
        assert!(close(cost.design.cost, 1_500_000.0));
    }

    #[test]
    fn test_design_cost_scaled_by_difficulty_and_dev_type() {
        let cost = cost_for(&RawRequest {
            complexity: Some("high".to_string()),
            dev_type: Some("porting".to_string()),
            design_items: ItemList::parse("basic_design"),
            ..Default::default()
        });
        assert!(close(cost.design.cost, 1_000_000.0 * 1.5 * 0.5));
    }

    #[test]
    fn test_low_confidence_inflates_vendor_cost() {
        let cost = cost_for(&RawRequest {
            vendor_items: ItemList::parse("logo_creation"),
            confidence: Some("low".to_string()),
            ..Default::default()
        });
        assert!(close(cost.vendor.cost, 650_000.0 * 1.3));
        assert!(close(cost.vendor.range.low, 650_000.0 * 1.3 * 0.6));
        assert!(close(cost.vendor.range.high, 650_000.0 * 1.3 * 1.4));
        assert_eq!(cost.vendor.catalog_range, Range { low: 500_000.0, high: 800_000.0 });
        assert!(cost.variance_range.low < cost.price);
        assert!(cost.variance_range.high > cost.price);
    }

    #[test]
    fn test_per_screen_vendor_item_uses_outsource_rate() {
        let cost = cost_for(&RawRequest {
            screen_count: Some(5),
            vendor_items: ItemList::parse("ui_design"),
            confidence: Some("high".to_string()),
            ..Default::default()
        });
        assert!(close(cost.vendor.base, 5.0 * 80_000.0));
        assert!(close(cost.vendor.range.high, 400_000.0 * 1.1));
    }

    #[test]
    fn test_vendor_management_fee_before_confidence() {
        let mut catalog = Catalog::builtin("standard").unwrap();
        catalog.rates.vendor_management_fee_rate = 0.1;
        let raw = RawRequest {
            vendor_items: ItemList::parse("logo_creation, marketing_asset"),
            confidence: Some("low".to_string()),
            ..Default::default()
        };
        let request = resolve_request(&catalog, &raw).unwrap().request;
        let effort = estimate_effort(&catalog, &request);
        let cost = compose_cost(&catalog, &request, &effort);

        let base = 650_000.0 + 450_000.0;
        assert!(close(cost.vendor.base, base));
        assert!(close(cost.vendor.management_fee, base * 0.1));
        assert!(close(cost.vendor.cost, base * 1.1 * 1.3));
        assert!(close(cost.base_amount, cost.development + base * 1.1 * 1.3));
    }

    #[test]
    fn test_rebase_reprices_every_band() {
        let mut cost = cost_for(&RawRequest {
            vendor_items: ItemList::parse("logo_creation"),
            confidence: Some("medium".to_string()),
            ..Default::default()
        });
        cost.rebase(PriceBase::Cogs, 1_000_000.0, &DisplayRange::default());
        assert_eq!(cost.price_base, PriceBase::Cogs);
        assert!(close(cost.price, 1_100_000.0));
        assert!(close(cost.display_range.low, 990_000.0));
        assert!(close(cost.display_range.high, 1_320_000.0));
        // vendor 650,000 ± 20% inside the new base
        assert!(close(cost.variance_range.low, (1_000_000.0 - 130_000.0) * 1.1));
        assert!(close(cost.variance_range.high, (1_000_000.0 + 130_000.0) * 1.1));
    }

    #[test]
    fn test_revenue_multipliers_apply_in_order() {
        let cost = cost_for(&RawRequest {
            target_platform: Some("mobile".to_string()),
            duration: Some("short".to_string()),
            ..Default::default()
        });
        let expected = cost.base_amount * 1.5 * 1.2 * 1.1;
        assert_eq!(cost.price, expected);
    }
}
