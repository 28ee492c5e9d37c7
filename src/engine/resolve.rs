//! Input resolution: caller labels and loose values to canonical keys and enums

use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Display;
use std::str::FromStr;

use tracing::{debug, warn};

use crate::catalog::{
    AllocationPolicy, Catalog, Complexity, Confidence, DepartmentalPolicy, DevType, Duration, LabelIndex,
    Platform, TeamMix,
};
use crate::engine::error::{EstimateError, InputNotice};
use crate::engine::request::{EstimateRequest, RawRequest, SizingMethod, UnitAllocation};

/// Screen count used when a request gives neither a count nor a list
pub const DEFAULT_SCREEN_COUNT: u32 = 10;

/// A canonical request plus the notices raised while building it
#[derive(Debug, Clone)]
pub struct Resolved {
    pub request: EstimateRequest,
    pub notices: Vec<InputNotice>,
}

/// Map caller strings to catalog keys.
///
/// Each input is tried as a label (or alias) first, then as a raw key.
/// Anything else is dropped. The result is deduplicated and ordered by key.
pub fn resolve_keys<T>(inputs: &[String], labels: &LabelIndex, table: &BTreeMap<String, T>) -> BTreeSet<String> {
    let mut keys = BTreeSet::new();
    for input in inputs {
        let input = input.trim();
        if input.is_empty() {
            continue;
        }
        if let Some(key) = labels.get(input) {
            keys.insert(key.to_string());
        } else if table.contains_key(input) {
            keys.insert(input.to_string());
        } else {
            debug!(input, "dropping unresolvable selection");
        }
    }
    keys
}

/// Build the canonical request for `catalog`
pub fn resolve_request(catalog: &Catalog, raw: &RawRequest) -> Result<Resolved, EstimateError> {
    let mut notices = Vec::new();

    let sizing = resolve_sizing(raw, &mut notices)?;

    let screen_count = raw.screen_count.unwrap_or_else(|| {
        if raw.screens.is_empty() {
            DEFAULT_SCREEN_COUNT
        } else {
            raw.screens.len() as u32
        }
    });
    let table_count = match raw.table_count {
        Some(n) if n > 0 => n,
        _ if !raw.tables.is_empty() => raw.tables.len() as u32,
        other => other.unwrap_or(0),
    };

    let complexity: Complexity = parse_enum("complexity", raw.complexity.as_deref(), &mut notices);
    let duration: Duration = parse_enum("duration", raw.duration.as_deref(), &mut notices);
    let dev_type: DevType = parse_enum("dev_type", raw.dev_type.as_deref(), &mut notices);
    let platform: Platform = parse_enum("target_platform", raw.target_platform.as_deref(), &mut notices);
    let confidence = raw
        .confidence
        .as_deref()
        .filter(|s| !s.trim().is_empty())
        .map(|s| parse_enum::<Confidence>("confidence", Some(s), &mut notices));

    let profile = resolve_profile(catalog, raw.estimation_profile.as_deref(), &mut notices);

    let items = &catalog.items;
    let features = resolve_keys(raw.features.as_slice(), &LabelIndex::build(&items.features), &items.features);
    let design_items = resolve_keys(
        raw.design_items.as_slice(),
        &LabelIndex::build(&items.design_items),
        &items.design_items,
    );
    let vendor_items = resolve_keys(
        raw.vendor_items.as_slice(),
        &LabelIndex::build(&items.vendor_items),
        &items.vendor_items,
    );

    if !vendor_items.is_empty() && confidence.is_none() {
        return Err(EstimateError::missing(
            "confidence",
            "required when vendor-phase items are selected",
        ));
    }

    let team_mix = resolve_team_mix(catalog, raw.team_mix.as_ref(), &mut notices);

    let allocation = match &catalog.allocation {
        AllocationPolicy::Departmental(policy) => Some(resolve_units(policy, raw, &mut notices)),
        AllocationPolicy::FlatRate(_) => {
            if raw.department.is_some() || !raw.dept_allocation.is_empty() {
                notices.push(InputNotice::DepartmentsIgnored);
            }
            None
        }
    };

    for notice in &notices {
        warn!(%notice, "input substituted");
    }

    Ok(Resolved {
        request: EstimateRequest {
            sizing,
            screen_count,
            table_count,
            tables: raw.tables.as_slice().to_vec(),
            complexity,
            duration,
            dev_type,
            platform,
            profile,
            confidence,
            target_margin: raw.target_margin,
            features,
            design_items,
            vendor_items,
            team_mix,
            allocation,
        },
        notices,
    })
}

fn resolve_sizing(raw: &RawRequest, notices: &mut Vec<InputNotice>) -> Result<SizingMethod, EstimateError> {
    let method = raw.method.as_deref().map(str::trim).unwrap_or("");
    match method.to_lowercase().as_str() {
        "" | "catalog" | "screen" | "feature" => Ok(SizingMethod::Catalog),
        "step" | "loc" => {
            let loc = raw
                .loc
                .ok_or_else(|| EstimateError::missing("loc", "the step method needs lines of code"))?;
            let man_days_per_unit = raw.man_days_per_unit.ok_or_else(|| {
                EstimateError::missing("man_days_per_unit", "the step method needs an explicit productivity")
            })?;
            Ok(SizingMethod::Step {
                loc: positive("loc", loc)?,
                man_days_per_unit: positive("man_days_per_unit", man_days_per_unit)?,
            })
        }
        "fp" | "function_points" => {
            let fp_count = raw
                .fp_count
                .ok_or_else(|| EstimateError::missing("fp_count", "the fp method needs a function-point count"))?;
            let man_days_per_unit = raw.man_days_per_unit.ok_or_else(|| {
                EstimateError::missing("man_days_per_unit", "the fp method needs an explicit productivity")
            })?;
            Ok(SizingMethod::FunctionPoints {
                fp_count: positive("fp_count", fp_count)?,
                man_days_per_unit: positive("man_days_per_unit", man_days_per_unit)?,
            })
        }
        _ => {
            notices.push(InputNotice::UnrecognizedEnum {
                field: "method".to_string(),
                value: method.to_string(),
                substituted: SizingMethod::Catalog.name().to_string(),
            });
            Ok(SizingMethod::Catalog)
        }
    }
}

fn positive(field: &str, value: f64) -> Result<f64, EstimateError> {
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(EstimateError::invalid(field, format!("must be a positive number, got {}", value)))
    }
}

/// Parse an enumerated field, substituting the default for unknown values
fn parse_enum<E>(field: &str, value: Option<&str>, notices: &mut Vec<InputNotice>) -> E
where
    E: FromStr + Default + Display,
{
    let Some(value) = value.filter(|v| !v.trim().is_empty()) else {
        return E::default();
    };
    match value.parse::<E>() {
        Ok(parsed) => parsed,
        Err(_) => {
            let substituted = E::default();
            notices.push(InputNotice::UnrecognizedEnum {
                field: field.to_string(),
                value: value.to_string(),
                substituted: substituted.to_string(),
            });
            substituted
        }
    }
}

fn resolve_profile(catalog: &Catalog, name: Option<&str>, notices: &mut Vec<InputNotice>) -> String {
    let default = catalog.profiles.default.clone();
    let Some(name) = name.filter(|n| !n.trim().is_empty()) else {
        return default;
    };
    match catalog.profiles.find(name) {
        Some(key) => key.to_string(),
        None => {
            notices.push(InputNotice::UnrecognizedEnum {
                field: "estimation_profile".to_string(),
                value: name.to_string(),
                substituted: default.clone(),
            });
            default
        }
    }
}

fn resolve_team_mix(
    catalog: &Catalog,
    requested: Option<&BTreeMap<String, f64>>,
    notices: &mut Vec<InputNotice>,
) -> TeamMix {
    let standard = || TeamMix::normalized(&catalog.rates.standard_team_mix).unwrap_or_default();

    let mix = match requested {
        None => standard(),
        Some(raw) => match TeamMix::normalized(raw) {
            Some(mix) => mix,
            None => {
                notices.push(InputNotice::TeamMixFallback);
                standard()
            }
        },
    };

    for rank in mix.weights().keys() {
        if catalog.rates.monthly_cost(rank).is_none() {
            notices.push(InputNotice::UnknownRank { rank: rank.clone() });
        }
    }
    mix
}

fn resolve_units(policy: &DepartmentalPolicy, raw: &RawRequest, notices: &mut Vec<InputNotice>) -> UnitAllocation {
    let primary = match raw.department.as_deref().filter(|d| !d.trim().is_empty()) {
        None => policy.default_unit.clone(),
        Some(name) => match policy.find_unit(name) {
            Some(key) => key.to_string(),
            None => {
                notices.push(InputNotice::UnknownDepartment {
                    value: name.to_string(),
                });
                policy.default_unit.clone()
            }
        },
    };

    let mut shares: BTreeMap<String, f64> = BTreeMap::new();
    for entry in &raw.dept_allocation {
        match policy.find_unit(&entry.dept) {
            Some(key) if entry.share.is_finite() && entry.share > 0.0 => {
                *shares.entry(key.to_string()).or_insert(0.0) += entry.share;
            }
            Some(_) => {}
            None => notices.push(InputNotice::UnknownDepartment {
                value: entry.dept.clone(),
            }),
        }
    }

    let total: f64 = shares.values().sum();
    if shares.is_empty() || total <= 0.0 {
        return UnitAllocation::Single { unit: primary };
    }
    for share in shares.values_mut() {
        *share /= total;
    }
    UnitAllocation::Weighted { shares }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::request::{DeptShare, ItemList};

    fn standard() -> Catalog {
        Catalog::builtin("standard").unwrap()
    }

    fn departmental() -> Catalog {
        Catalog::builtin("departmental").unwrap()
    }

    #[test]
    fn test_resolve_keys_prefers_labels_then_keys() {
        let catalog = standard();
        let features = &catalog.items.features;
        let index = LabelIndex::build(features);
        let inputs: Vec<String> = vec![
            "Authentication / SSO".into(),
            "auth".into(),
            "payment".into(),
            "teleportation".into(),
            "  ".into(),
        ];
        let keys = resolve_keys(&inputs, &index, features);
        assert_eq!(keys.into_iter().collect::<Vec<_>>(), vec!["auth", "payment"]);
    }

    #[test]
    fn test_resolve_keys_accepts_aliases() {
        let catalog = standard();
        let features = &catalog.items.features;
        let keys = resolve_keys(&["管理画面".to_string()], &LabelIndex::build(features), features);
        assert!(keys.contains("admin_dashboard"));
    }

    #[test]
    fn test_defaults() {
        let resolved = resolve_request(&standard(), &RawRequest::default()).unwrap();
        let request = resolved.request;
        assert_eq!(request.screen_count, DEFAULT_SCREEN_COUNT);
        assert_eq!(request.table_count, 0);
        assert_eq!(request.complexity, Complexity::Medium);
        assert_eq!(request.platform, Platform::WebB2e);
        assert_eq!(request.profile, "poc");
        assert_eq!(request.sizing, SizingMethod::Catalog);
        assert!(request.confidence.is_none());
        assert!(request.allocation.is_none());
        assert!(resolved.notices.is_empty());
    }

    #[test]
    fn test_unknown_enum_substitutes_default_with_notice() {
        let raw = RawRequest {
            complexity: Some("ludicrous".to_string()),
            estimation_profile: Some("waterfall".to_string()),
            ..Default::default()
        };
        let resolved = resolve_request(&standard(), &raw).unwrap();
        assert_eq!(resolved.request.complexity, Complexity::Medium);
        assert_eq!(resolved.request.profile, "poc");
        assert_eq!(resolved.notices.len(), 2);
        assert!(matches!(
            &resolved.notices[0],
            InputNotice::UnrecognizedEnum { field, .. } if field == "complexity"
        ));
    }

    #[test]
    fn test_vendor_items_require_confidence() {
        let raw = RawRequest {
            vendor_items: ItemList::parse("logo_creation"),
            ..Default::default()
        };
        let err = resolve_request(&standard(), &raw).unwrap_err();
        assert!(matches!(err, EstimateError::MissingRequiredInput { ref field, .. } if field == "confidence"));
    }

    #[test]
    fn test_unresolvable_vendor_items_do_not_require_confidence() {
        let raw = RawRequest {
            vendor_items: ItemList::parse("hologram"),
            ..Default::default()
        };
        let resolved = resolve_request(&standard(), &raw).unwrap();
        assert!(resolved.request.vendor_items.is_empty());
    }

    #[test]
    fn test_step_method_requires_productivity() {
        let raw = RawRequest {
            method: Some("step".to_string()),
            loc: Some(5000.0),
            ..Default::default()
        };
        let err = resolve_request(&standard(), &raw).unwrap_err();
        assert!(err.to_string().contains("man_days_per_unit"));

        let raw = RawRequest {
            man_days_per_unit: Some(0.01),
            ..raw
        };
        let resolved = resolve_request(&standard(), &raw).unwrap();
        assert_eq!(
            resolved.request.sizing,
            SizingMethod::Step {
                loc: 5000.0,
                man_days_per_unit: 0.01
            }
        );
    }

    #[test]
    fn test_fp_method_requires_count() {
        let raw = RawRequest {
            method: Some("fp".to_string()),
            man_days_per_unit: Some(0.5),
            ..Default::default()
        };
        let err = resolve_request(&standard(), &raw).unwrap_err();
        assert!(err.to_string().contains("fp_count"));
    }

    #[test]
    fn test_sizing_inputs_must_be_positive() {
        let cases = [
            ("step", Some(-5000.0), None, Some(0.01), "loc"),
            ("step", Some(5000.0), None, Some(0.0), "man_days_per_unit"),
            ("fp", None, Some(0.0), Some(0.5), "fp_count"),
            ("fp", None, Some(120.0), Some(-0.5), "man_days_per_unit"),
            ("fp", None, Some(f64::NAN), Some(0.5), "fp_count"),
        ];
        for (method, loc, fp_count, man_days_per_unit, field) in cases {
            let raw = RawRequest {
                method: Some(method.to_string()),
                loc,
                fp_count,
                man_days_per_unit,
                ..Default::default()
            };
            match resolve_request(&standard(), &raw) {
                Err(EstimateError::InvalidInput { field: got, .. }) => assert_eq!(got, field),
                other => panic!("{} {} should be rejected, got {:?}", method, field, other),
            }
        }
    }

    #[test]
    fn test_unit_found_by_japanese_name() {
        let raw = RawRequest {
            department: Some("ＣＳ第１システム開発部".to_string()),
            ..Default::default()
        };
        let resolved = resolve_request(&departmental(), &raw).unwrap();
        assert_eq!(
            resolved.request.allocation,
            Some(UnitAllocation::Single {
                unit: "cs-dev1".to_string()
            })
        );
        assert!(resolved.notices.is_empty());
    }

    #[test]
    fn test_table_list_fills_missing_count() {
        let raw = RawRequest {
            table_count: Some(0),
            tables: ItemList::parse("users, orders, items"),
            ..Default::default()
        };
        let resolved = resolve_request(&standard(), &raw).unwrap();
        assert_eq!(resolved.request.table_count, 3);
        assert_eq!(resolved.request.tables.len(), 3);
    }

    #[test]
    fn test_screen_list_sets_count() {
        let raw = RawRequest {
            screens: ItemList::parse("login, home"),
            ..Default::default()
        };
        let resolved = resolve_request(&standard(), &raw).unwrap();
        assert_eq!(resolved.request.screen_count, 2);
    }

    #[test]
    fn test_unknown_rank_is_reported() {
        let raw = RawRequest {
            team_mix: Some(BTreeMap::from([
                ("Rank3".to_string(), 1.0),
                ("Intern".to_string(), 1.0),
            ])),
            ..Default::default()
        };
        let resolved = resolve_request(&standard(), &raw).unwrap();
        assert_eq!(resolved.request.team_mix.weights()["Rank3"], 0.5);
        assert!(resolved
            .notices
            .contains(&InputNotice::UnknownRank { rank: "Intern".to_string() }));
    }

    #[test]
    fn test_zero_team_mix_falls_back_to_standard() {
        let catalog = standard();
        let raw = RawRequest {
            team_mix: Some(BTreeMap::from([("Rank3".to_string(), 0.0)])),
            ..Default::default()
        };
        let resolved = resolve_request(&catalog, &raw).unwrap();
        assert_eq!(resolved.notices, vec![InputNotice::TeamMixFallback]);
        assert_eq!(
            resolved.request.team_mix,
            TeamMix::normalized(&catalog.rates.standard_team_mix).unwrap()
        );
    }

    #[test]
    fn test_unknown_department_falls_back_to_default_unit() {
        let raw = RawRequest {
            department: Some("Accounts Payable".to_string()),
            ..Default::default()
        };
        let resolved = resolve_request(&departmental(), &raw).unwrap();
        assert_eq!(
            resolved.request.allocation,
            Some(UnitAllocation::Single {
                unit: "bi-common".to_string()
            })
        );
        assert_eq!(resolved.notices.len(), 1);
    }

    #[test]
    fn test_department_shares_are_normalized() {
        let raw = RawRequest {
            department: Some("bi-dev".to_string()),
            dept_allocation: vec![
                DeptShare {
                    dept: "bi-dev".to_string(),
                    share: 3.0,
                },
                DeptShare {
                    dept: "cs-dev1".to_string(),
                    share: 1.0,
                },
                DeptShare {
                    dept: "nowhere".to_string(),
                    share: 5.0,
                },
            ],
            ..Default::default()
        };
        let resolved = resolve_request(&departmental(), &raw).unwrap();
        match resolved.request.allocation {
            Some(UnitAllocation::Weighted { shares }) => {
                assert_eq!(shares["bi-dev"], 0.75);
                assert_eq!(shares["cs-dev1"], 0.25);
            }
            other => panic!("expected weighted allocation, got {:?}", other),
        }
        assert!(resolved.notices.contains(&InputNotice::UnknownDepartment {
            value: "nowhere".to_string()
        }));
    }

    #[test]
    fn test_flat_rate_catalog_ignores_departments() {
        let raw = RawRequest {
            department: Some("bi-dev".to_string()),
            ..Default::default()
        };
        let resolved = resolve_request(&standard(), &raw).unwrap();
        assert!(resolved.request.allocation.is_none());
        assert_eq!(resolved.notices, vec![InputNotice::DepartmentsIgnored]);
    }
}
