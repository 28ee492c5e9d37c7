//! Estimate request documents
//!
//! [`RawRequest`] is what callers write: loosely typed, with list fields that
//! may be comma/newline separated strings and numbers that may be quoted.
//! [`EstimateRequest`] is the canonical form the engine computes on, built
//! by [`crate::engine::resolve::resolve_request`].

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use crate::catalog::{Complexity, Confidence, DevType, Duration, Platform, TeamMix};

/// List entries that mean "nothing selected"
const PLACEHOLDERS: &[&str] = &["none", "tbd", "n/a", "-", "なし", "未定", "不明"];

/// A request as written by the caller
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RawRequest {
    /// `catalog` (default), `step` or `fp`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,

    #[serde(deserialize_with = "lenient_count", skip_serializing_if = "Option::is_none")]
    pub screen_count: Option<u32>,

    /// Screen names; the count is taken from the list when `screen_count` is absent
    #[serde(skip_serializing_if = "ItemList::is_empty")]
    pub screens: ItemList,

    #[serde(deserialize_with = "lenient_count", skip_serializing_if = "Option::is_none")]
    pub table_count: Option<u32>,

    /// Table names; fills `table_count` when it is absent or zero
    #[serde(skip_serializing_if = "ItemList::is_empty")]
    pub tables: ItemList,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub complexity: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub dev_type: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_platform: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub estimation_profile: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence: Option<String>,

    /// Fraction, or a percentage such as `"20%"` or `"20"`
    #[serde(deserialize_with = "lenient_margin", skip_serializing_if = "Option::is_none")]
    pub target_margin: Option<f64>,

    #[serde(skip_serializing_if = "ItemList::is_empty")]
    pub features: ItemList,

    #[serde(alias = "phase2_items", skip_serializing_if = "ItemList::is_empty")]
    pub design_items: ItemList,

    #[serde(alias = "phase3_items", skip_serializing_if = "ItemList::is_empty")]
    pub vendor_items: ItemList,

    /// Lines of code (`step` method)
    #[serde(deserialize_with = "lenient_number", skip_serializing_if = "Option::is_none")]
    pub loc: Option<f64>,

    /// Function-point count (`fp` method)
    #[serde(deserialize_with = "lenient_number", skip_serializing_if = "Option::is_none")]
    pub fp_count: Option<f64>,

    #[serde(deserialize_with = "lenient_number", skip_serializing_if = "Option::is_none")]
    pub man_days_per_unit: Option<f64>,

    /// Primary organizational unit
    #[serde(skip_serializing_if = "Option::is_none")]
    pub department: Option<String>,

    #[serde(deserialize_with = "lenient_allocation", skip_serializing_if = "Vec::is_empty")]
    pub dept_allocation: Vec<DeptShare>,

    /// Rank → weight, re-normalized to sum to one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub team_mix: Option<BTreeMap<String, f64>>,
}

/// A share of the work charged to one organizational unit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeptShare {
    pub dept: String,
    pub share: f64,
}

/// A list of selections with placeholders removed
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ItemList(Vec<String>);

impl ItemList {
    /// Split a comma or newline separated string
    pub fn parse(text: &str) -> Self {
        text.replace('\r', "")
            .split('\n')
            .flat_map(|line| line.split(','))
            .map(str::to_string)
            .collect()
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<S: Into<String>> FromIterator<S> for ItemList {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        ItemList(
            iter.into_iter()
                .map(|s| s.into().trim().to_string())
                .filter(|s| !s.is_empty() && !is_placeholder(s))
                .collect(),
        )
    }
}

fn is_placeholder(entry: &str) -> bool {
    let lower = entry.to_lowercase();
    PLACEHOLDERS.contains(&lower.as_str())
}

impl<'de> Deserialize<'de> for ItemList {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            List(Vec<Option<ScalarText>>),
            Text(String),
        }

        Ok(match Option::<Repr>::deserialize(deserializer)? {
            Some(Repr::List(items)) => items.into_iter().flatten().map(|s| s.0).collect(),
            Some(Repr::Text(text)) => ItemList::parse(&text),
            None => ItemList::default(),
        })
    }
}

/// A scalar list entry rendered as text, so `tables: [users, 2024]` still parses
struct ScalarText(String);

impl<'de> Deserialize<'de> for ScalarText {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Scalar {
            Text(String),
            Number(f64),
            Flag(bool),
        }

        Ok(ScalarText(match Scalar::deserialize(deserializer)? {
            Scalar::Text(s) => s,
            Scalar::Number(n) => n.to_string(),
            Scalar::Flag(b) => b.to_string(),
        }))
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum NumberOrText {
    Number(f64),
    Text(String),
}

fn lenient_number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<f64>, D::Error> {
    Ok(match Option::<NumberOrText>::deserialize(deserializer)? {
        Some(NumberOrText::Number(n)) => Some(n),
        Some(NumberOrText::Text(s)) => s.trim().parse::<f64>().ok(),
        None => None,
    }
    .filter(|n| n.is_finite()))
}

fn lenient_count<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<u32>, D::Error> {
    Ok(lenient_number(deserializer)?.map(|n| n.max(0.0).min(f64::from(u32::MAX)) as u32))
}

fn lenient_margin<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<f64>, D::Error> {
    Ok(match Option::<NumberOrText>::deserialize(deserializer)? {
        Some(NumberOrText::Number(n)) if n.is_finite() => Some(n),
        Some(NumberOrText::Text(s)) => parse_margin(&s),
        _ => None,
    })
}

/// Parse a target margin. `"20%"` and `"20"` both mean 0.20; `"0.2"` stays 0.2.
pub fn parse_margin(text: &str) -> Option<f64> {
    let trimmed = text.trim();
    let (number, percent) = match trimmed.strip_suffix('%') {
        Some(rest) => (rest.trim(), true),
        None => (trimmed, false),
    };
    let value: f64 = number.parse().ok().filter(|v: &f64| v.is_finite())?;
    if percent || value > 1.0 {
        Some(value / 100.0)
    } else {
        Some(value)
    }
}

fn lenient_allocation<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<DeptShare>, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Repr {
        List(Vec<DeptShare>),
        Map(BTreeMap<String, f64>),
        Text(String),
    }

    Ok(match Option::<Repr>::deserialize(deserializer)? {
        Some(Repr::List(shares)) => shares,
        Some(Repr::Map(map)) => map
            .into_iter()
            .map(|(dept, share)| DeptShare { dept, share })
            .collect(),
        Some(Repr::Text(text)) => parse_allocation(&text),
        None => Vec::new(),
    })
}

/// Parse `dept: share` pairs separated by newlines or commas
pub fn parse_allocation(text: &str) -> Vec<DeptShare> {
    text.split(['\n', ','])
        .filter_map(|pair| {
            let (dept, share) = pair.split_once(':').or_else(|| pair.split_once('='))?;
            let share = share.trim().parse::<f64>().ok()?;
            let dept = dept.trim();
            (!dept.is_empty()).then(|| DeptShare {
                dept: dept.to_string(),
                share,
            })
        })
        .collect()
}

/// How development effort is sized
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
#[serde(tag = "method", rename_all = "snake_case")]
pub enum SizingMethod {
    /// Enumerated features plus screen/table function points
    #[default]
    Catalog,
    /// Lines of code × man-days per line
    Step { loc: f64, man_days_per_unit: f64 },
    /// Explicit function-point count × man-days per point
    FunctionPoints { fp_count: f64, man_days_per_unit: f64 },
}

impl SizingMethod {
    pub fn name(&self) -> &'static str {
        match self {
            SizingMethod::Catalog => "catalog",
            SizingMethod::Step { .. } => "step",
            SizingMethod::FunctionPoints { .. } => "fp",
        }
    }
}

/// Organizational units charged for indirect cost
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum UnitAllocation {
    /// One unit at 100 %
    Single { unit: String },
    /// Several units with normalized shares
    Weighted { shares: BTreeMap<String, f64> },
}

/// A fully resolved, immutable estimate request
#[derive(Debug, Clone, Serialize)]
pub struct EstimateRequest {
    pub sizing: SizingMethod,
    pub screen_count: u32,
    pub table_count: u32,
    pub tables: Vec<String>,
    pub complexity: Complexity,
    pub duration: Duration,
    pub dev_type: DevType,
    pub platform: Platform,
    /// Key of the active estimation profile
    pub profile: String,
    pub confidence: Option<Confidence>,
    pub target_margin: Option<f64>,
    pub features: BTreeSet<String>,
    pub design_items: BTreeSet<String>,
    pub vendor_items: BTreeSet<String>,
    pub team_mix: TeamMix,
    /// Present only under a departmental catalog
    pub allocation: Option<UnitAllocation>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_item_list_from_text_drops_placeholders() {
        let list = ItemList::parse("auth, payment\nなし\n, TBD ,admin_dashboard");
        assert_eq!(list.as_slice(), &["auth", "payment", "admin_dashboard"]);
    }

    #[test]
    fn test_raw_request_accepts_strings_and_lists() {
        let yaml = r#"
screen_count: "12"
features: "auth, payment"
phase2_items: [basic_design, null, "-"]
phase3_items:
  - logo_creation
target_margin: "20%"
"#;
        let raw: RawRequest = serde_yml::from_str(yaml).unwrap();
        assert_eq!(raw.screen_count, Some(12));
        assert_eq!(raw.features.as_slice(), &["auth", "payment"]);
        assert_eq!(raw.design_items.as_slice(), &["basic_design"]);
        assert_eq!(raw.vendor_items.as_slice(), &["logo_creation"]);
        assert_eq!(raw.target_margin, Some(0.2));
    }

    #[test]
    fn test_unparseable_count_is_absent() {
        let raw: RawRequest = serde_yml::from_str("screen_count: many\ntable_count: 3.7").unwrap();
        assert_eq!(raw.screen_count, None);
        assert_eq!(raw.table_count, Some(3));
    }

    #[test]
    fn test_parse_margin() {
        assert_eq!(parse_margin("20%"), Some(0.2));
        assert_eq!(parse_margin("20"), Some(0.2));
        assert_eq!(parse_margin("0.15"), Some(0.15));
        assert_eq!(parse_margin("lots"), None);
    }

    #[test]
    fn test_numeric_margin_is_a_fraction() {
        let raw: RawRequest = serde_yml::from_str("target_margin: 0.25").unwrap();
        assert_eq!(raw.target_margin, Some(0.25));
    }

    #[test]
    fn test_dept_allocation_forms() {
        let list: RawRequest =
            serde_yml::from_str("dept_allocation: [{dept: bi-dev, share: 0.6}, {dept: cs-dev1, share: 0.4}]")
                .unwrap();
        assert_eq!(list.dept_allocation.len(), 2);

        let map: RawRequest = serde_yml::from_str("dept_allocation: {bi-dev: 3, cs-dev1: 1}").unwrap();
        assert_eq!(map.dept_allocation[0].dept, "bi-dev");
        assert_eq!(map.dept_allocation[0].share, 3.0);

        let text: RawRequest = serde_yml::from_str("dept_allocation: \"bi-dev: 0.6\\ncs-dev1: 0.4\"").unwrap();
        assert_eq!(text.dept_allocation[1].dept, "cs-dev1");
        assert_eq!(text.dept_allocation[1].share, 0.4);
    }

    #[test]
    fn test_json_request() {
        let raw: RawRequest =
            serde_json::from_str(r#"{"screen_count": 5, "tables": ["users", "orders"], "complexity": "high"}"#)
                .unwrap();
        assert_eq!(raw.screen_count, Some(5));
        assert_eq!(raw.tables.len(), 2);
        assert_eq!(raw.complexity.as_deref(), Some("high"));
    }
}
