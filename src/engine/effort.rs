//! Development effort in man-days

use serde::Serialize;

use crate::catalog::Catalog;
use crate::engine::request::{EstimateRequest, SizingMethod};

/// How total development effort was derived
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct EffortBreakdown {
    /// Effort of the enumerated features
    pub feature_days: f64,
    /// Function points from screens and tables, or the explicit count
    pub size_fp: f64,
    /// Effort driven by project size
    pub size_days: f64,
    pub base_days: f64,
    pub difficulty_multiplier: f64,
    pub dev_type_multiplier: f64,
    pub total_days: f64,
}

/// Productivity factor of the request's profile (man-days per function point)
pub fn productivity_factor(catalog: &Catalog, request: &EstimateRequest) -> f64 {
    catalog
        .profiles
        .get(&request.profile)
        .map(|p| p.productivity_factor)
        .unwrap_or(0.0)
}

/// Total development man-days for a resolved request
pub fn estimate_effort(catalog: &Catalog, request: &EstimateRequest) -> EffortBreakdown {
    let (feature_days, size_fp, size_days) = match request.sizing {
        SizingMethod::Catalog => {
            let feature_days: f64 = request
                .features
                .iter()
                .map(|key| catalog.items.feature_effort(key))
                .sum();
            let weights = &catalog.function_points;
            let size_fp = f64::from(request.screen_count) * weights.screen_weight
                + f64::from(request.table_count) * weights.table_weight;
            (feature_days, size_fp, size_fp * productivity_factor(catalog, request))
        }
        SizingMethod::Step { loc, man_days_per_unit } => (0.0, 0.0, loc * man_days_per_unit),
        SizingMethod::FunctionPoints {
            fp_count,
            man_days_per_unit,
        } => (0.0, fp_count, fp_count * man_days_per_unit),
    };

    let base_days = feature_days + size_days;
    let difficulty_multiplier = catalog.multipliers.difficulty(request.complexity);
    let dev_type_multiplier = catalog.multipliers.dev_type(request.dev_type).dev;

    EffortBreakdown {
        feature_days,
        size_fp,
        size_days,
        base_days,
        difficulty_multiplier,
        dev_type_multiplier,
        total_days: base_days * difficulty_multiplier * dev_type_multiplier,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{Complexity, DevType};
    use crate::engine::request::{ItemList, RawRequest};
    use crate::engine::resolve::resolve_request;

    fn effort_for(raw: &RawRequest) -> EffortBreakdown {
        let catalog = Catalog::builtin("standard").unwrap();
        let resolved = resolve_request(&catalog, raw).unwrap();
        estimate_effort(&catalog, &resolved.request)
    }

    #[test]
    fn test_ten_screens_poc_is_fifteen_days() {
        let effort = effort_for(&RawRequest {
            screen_count: Some(10),
            table_count: Some(0),
            complexity: Some("medium".to_string()),
            estimation_profile: Some("poc".to_string()),
            ..Default::default()
        });
        assert_eq!(effort.size_fp, 200.0);
        assert_eq!(effort.size_days, 15.0);
        assert_eq!(effort.total_days, 15.0);
    }

    #[test]
    fn test_empty_project_is_zero_days() {
        let effort = effort_for(&RawRequest {
            screen_count: Some(0),
            ..Default::default()
        });
        assert_eq!(effort.total_days, 0.0);
    }

    #[test]
    fn test_features_and_size_are_additive() {
        let effort = effort_for(&RawRequest {
            features: ItemList::parse("auth, payment"),
            ..Default::default()
        });
        assert_eq!(effort.feature_days, 8.0);
        assert_eq!(effort.base_days, effort.feature_days + effort.size_days);
    }

    #[test]
    fn test_total_days_monotonic_in_screens_and_tables() {
        let mut previous = 0.0;
        for screens in 0..30 {
            for tables in [0u32, 5, 10] {
                let effort = effort_for(&RawRequest {
                    screen_count: Some(screens),
                    table_count: Some(tables),
                    ..Default::default()
                });
                if tables == 0 {
                    assert!(effort.total_days >= previous);
                    previous = effort.total_days;
                }
                let more_tables = effort_for(&RawRequest {
                    screen_count: Some(screens),
                    table_count: Some(tables + 1),
                    ..Default::default()
                });
                assert!(more_tables.total_days >= effort.total_days);
            }
        }
    }

    #[test]
    fn test_multipliers_scale_total() {
        let catalog = Catalog::builtin("standard").unwrap();
        let effort = effort_for(&RawRequest {
            complexity: Some("high".to_string()),
            dev_type: Some("porting".to_string()),
            ..Default::default()
        });
        let expected = 15.0
            * catalog.multipliers.difficulty(Complexity::High)
            * catalog.multipliers.dev_type(DevType::Porting).dev;
        assert!((effort.total_days - expected).abs() < 1e-9);
    }

    #[test]
    fn test_step_method_replaces_catalog_sizing() {
        let effort = effort_for(&RawRequest {
            method: Some("step".to_string()),
            loc: Some(10000.0),
            man_days_per_unit: Some(0.002),
            features: ItemList::parse("auth"),
            ..Default::default()
        });
        assert_eq!(effort.feature_days, 0.0);
        assert!((effort.total_days - 20.0).abs() < 1e-9);
    }

    #[test]
    fn test_fp_method() {
        let effort = effort_for(&RawRequest {
            method: Some("fp".to_string()),
            fp_count: Some(120.0),
            man_days_per_unit: Some(0.5),
            ..Default::default()
        });
        assert_eq!(effort.size_fp, 120.0);
        assert_eq!(effort.total_days, 60.0);
    }
}
