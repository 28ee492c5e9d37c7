//! Estimation and profitability engine
//!
//! A pure function of a [`Catalog`] and a request:
//!
//! 1. [`resolve`] turns the loose request into a canonical [`EstimateRequest`]
//! 2. [`effort`] sizes development in man-days
//! 3. [`cost`] composes phase costs and the sales price
//! 4. [`profit`] derives COGS, margins and the target price
//!
//! [`report`] renders the result as a status-tagged record.

pub mod cost;
pub mod effort;
pub mod error;
pub mod profit;
pub mod report;
pub mod request;
pub mod resolve;

pub use cost::CostBreakdown;
pub use effort::EffortBreakdown;
pub use error::{EstimateError, InputNotice};
pub use profit::{ProfitModel, ProfitabilityReport, TargetPrice};
pub use report::{EstimateReport, Response};
pub use request::{EstimateRequest, RawRequest};

use tracing::{debug, instrument};

use crate::catalog::Catalog;

/// A completed estimate with every intermediate record
#[derive(Debug, Clone)]
pub struct Estimate {
    pub request: EstimateRequest,
    pub notices: Vec<InputNotice>,
    pub effort: EffortBreakdown,
    pub cost: CostBreakdown,
    pub profit: ProfitabilityReport,
}

/// Run the full estimate
#[instrument(skip_all, fields(catalog = %catalog.config_version))]
pub fn estimate(catalog: &Catalog, raw: &RawRequest) -> Result<Estimate, EstimateError> {
    let resolved = resolve::resolve_request(catalog, raw)?;
    let request = resolved.request;
    debug!(
        features = request.features.len(),
        design_items = request.design_items.len(),
        vendor_items = request.vendor_items.len(),
        "request resolved"
    );

    let effort = effort::estimate_effort(catalog, &request);
    debug!(
        feature_days = effort.feature_days,
        size_days = effort.size_days,
        total_days = effort.total_days,
        "effort estimated"
    );

    let mut cost = cost::compose_cost(catalog, &request, &effort);
    debug!(base_amount = cost.base_amount, price = cost.price, "cost composed");

    let profit = profit::analyze(catalog, &request, &effort, &mut cost);
    debug!(
        price_base = %cost.price_base,
        price = cost.price,
        cogs = profit.cogs,
        operating_margin = profit.operating_margin,
        "profitability analyzed"
    );

    Ok(Estimate {
        request,
        notices: resolved.notices,
        effort,
        cost,
        profit,
    })
}

/// Run the estimate and render it as a status-tagged record. Errors carry
/// only a message, never a partial computation.
pub fn respond(catalog: &Catalog, raw: &RawRequest) -> Response {
    match estimate(catalog, raw) {
        Ok(estimate) => Response::Success(Box::new(EstimateReport::build(catalog, &estimate))),
        Err(err) => Response::Error {
            message: err.to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::request::ItemList;

    fn standard() -> Catalog {
        Catalog::builtin("standard").unwrap()
    }

    #[test]
    fn test_default_estimate_report() {
        let response = respond(&standard(), &RawRequest::default());
        let Response::Success(report) = response else {
            panic!("expected success");
        };
        assert_eq!(report.estimated_amount, "¥1,650,000");
        assert_eq!(report.estimated_range, "¥1,485,000 - ¥1,980,000");
        assert_eq!(report.man_days.development_total, 15.0);
        assert_eq!(report.productivity, "0.075 MD/FP");
        assert_eq!(report.config_version, "2026-02");
        assert_eq!(report.input_echo.complexity_label, "standard");
    }

    #[test]
    fn test_vendor_items_without_confidence_give_error_record() {
        let raw = RawRequest {
            vendor_items: ItemList::parse("Logo creation"),
            ..Default::default()
        };
        let response = respond(&standard(), &raw);
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["status"], "error");
        assert!(json["message"].as_str().unwrap().contains("confidence"));
        assert!(json.get("estimated_amount").is_none());
    }

    #[test]
    fn test_identical_input_gives_identical_output() {
        let catalog = standard();
        let raw = RawRequest {
            features: ItemList::parse("payment, 管理画面, auth"),
            design_items: ItemList::parse("wireframe, basic_design"),
            vendor_items: ItemList::parse("ui_design, logo_creation"),
            confidence: Some("low".to_string()),
            target_margin: Some(0.2),
            table_count: Some(7),
            ..Default::default()
        };
        let first = serde_json::to_string(&respond(&catalog, &raw)).unwrap();
        let second = serde_json::to_string(&respond(&catalog, &raw)).unwrap();
        assert_eq!(first, second);

        let first_yaml = serde_yml::to_string(&respond(&catalog, &raw)).unwrap();
        let second_yaml = serde_yml::to_string(&respond(&catalog, &raw)).unwrap();
        assert_eq!(first_yaml, second_yaml);
    }

    #[test]
    fn test_infeasible_target_is_explicit() {
        let raw = RawRequest {
            target_margin: Some(0.9),
            ..Default::default()
        };
        let json = serde_json::to_value(respond(&standard(), &raw)).unwrap();
        let target = &json["profit_analysis"]["target"];
        assert_eq!(target["status"], "infeasible");
        assert_eq!(target["max_margin"], "71.9%");
        assert!(target.get("price").is_none());
    }

    #[test]
    fn test_notices_reach_the_report() {
        let raw = RawRequest {
            target_platform: Some("fridge".to_string()),
            ..Default::default()
        };
        let json = serde_json::to_value(respond(&standard(), &raw)).unwrap();
        assert_eq!(json["status"], "success");
        assert_eq!(json["notices"][0]["kind"], "unrecognized_enum");
        assert_eq!(json["input_echo"]["target_platform"], "web_b2e");
    }

    #[test]
    fn test_departmental_estimate() {
        let catalog = Catalog::builtin("departmental").unwrap();
        let raw = RawRequest {
            department: Some("cs-dev1".to_string()),
            target_margin: Some(0.1),
            ..Default::default()
        };
        let estimate = estimate(&catalog, &raw).unwrap();
        assert_eq!(estimate.profit.allocation.policy, "departmental");
        match estimate.profit.target {
            Some(TargetPrice::Attainable { price, .. }) => {
                let model = ProfitModel {
                    cogs: estimate.profit.cogs,
                    sga_rate: estimate.profit.sga.total_rate,
                    basis: estimate.profit.sga.basis,
                };
                assert!((model.operating_margin_at(price) - 0.1).abs() < 1e-9);
            }
            other => panic!("expected attainable target, got {:?}", other),
        }
    }

    #[test]
    fn test_departmental_default_amount() {
        let catalog = Catalog::builtin("departmental").unwrap();
        let Response::Success(report) = respond(&catalog, &RawRequest::default()) else {
            panic!("expected success");
        };
        assert_eq!(report.estimated_amount, "¥1,056,990");
        assert_eq!(report.cost_breakdown.price_base, crate::catalog::PriceBase::Cogs);
        assert_eq!(report.cost_breakdown.base_amount, 960_900);
        assert_eq!(report.profit_analysis.sales, 1_056_990);
    }

    #[test]
    fn test_unit_named_by_japanese_alias() {
        let catalog = Catalog::builtin("departmental").unwrap();
        let raw = RawRequest {
            department: Some("ＣＳ第１システム開発部".to_string()),
            ..Default::default()
        };
        let estimate = estimate(&catalog, &raw).unwrap();
        assert!(estimate.notices.is_empty());
        assert_eq!(estimate.profit.allocation.indirect_per_hour, Some(1940.0));
        assert!(estimate.profit.allocation.units.contains_key("cs-dev1"));
    }

    #[test]
    fn test_zero_screens_with_target_margin() {
        let raw = RawRequest {
            screen_count: Some(0),
            target_margin: Some(0.2),
            ..Default::default()
        };
        let json = serde_json::to_value(respond(&standard(), &raw)).unwrap();
        assert_eq!(json["status"], "success");
        assert_eq!(json["profit_analysis"]["cogs"], 0);
        assert_eq!(json["price"], 0);
        let target = &json["profit_analysis"]["target"];
        assert_eq!(target["status"], "infeasible");
        assert!(target.get("price").is_none());
        assert!(target.get("max_margin").is_none());
        assert!(!target["message"].as_str().unwrap().contains("stay below"));
    }
}
