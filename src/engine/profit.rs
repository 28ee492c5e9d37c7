//! Profitability analysis and target-price solving
//!
//! Cost of goods is direct labor plus allocated indirect cost plus vendor
//! cost (and design fees when the allocation policy includes them). SG&A is
//! charged either on the sales price or on gross profit, which changes the
//! closed form of the reverse solve.

use serde::Serialize;
use std::collections::BTreeMap;

use crate::catalog::{
    AllocationPolicy, Catalog, DepartmentalPolicy, FlatRatePolicy, OrgUnit, PriceBase, SgaBasis, SgaRates,
    WorkCalendar,
};
use crate::engine::cost::CostBreakdown;
use crate::engine::effort::EffortBreakdown;
use crate::engine::request::{EstimateRequest, UnitAllocation};

/// Strategy for allocating indirect cost and SG&A to a project
pub trait CostAllocation {
    /// Indirect cost for the given direct labor and effort
    fn indirect_cost(&self, direct_labor: f64, total_days: f64, calendar: &WorkCalendar) -> f64;

    fn sga_rates(&self) -> SgaRates;

    fn sga_basis(&self) -> SgaBasis;

    /// Whether internal design fees count toward COGS
    fn includes_design_fees(&self) -> bool;

    /// What the revenue multipliers turn into the sales price
    fn price_base(&self) -> PriceBase;

    fn summary(&self) -> AllocationSummary;
}

/// What an allocation strategy charged, for reporting
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AllocationSummary {
    pub policy: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub indirect_cost_rate: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub indirect_per_hour: Option<f64>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub units: BTreeMap<String, f64>,
}

/// Indirect cost as a fixed fraction of direct labor
pub struct FlatRate<'a> {
    policy: &'a FlatRatePolicy,
}

impl<'a> FlatRate<'a> {
    pub fn new(policy: &'a FlatRatePolicy) -> Self {
        Self { policy }
    }
}

impl CostAllocation for FlatRate<'_> {
    fn indirect_cost(&self, direct_labor: f64, _total_days: f64, _calendar: &WorkCalendar) -> f64 {
        direct_labor * self.policy.indirect_cost_rate
    }

    fn sga_rates(&self) -> SgaRates {
        self.policy.sga
    }

    fn sga_basis(&self) -> SgaBasis {
        self.policy.sga_basis
    }

    fn includes_design_fees(&self) -> bool {
        self.policy.include_design_fees
    }

    fn price_base(&self) -> PriceBase {
        self.policy.price_base
    }

    fn summary(&self) -> AllocationSummary {
        AllocationSummary {
            policy: "flat_rate",
            indirect_cost_rate: Some(self.policy.indirect_cost_rate),
            indirect_per_hour: None,
            units: BTreeMap::new(),
        }
    }
}

/// Per-hour indirect cost of one or more organizational units.
///
/// With several units the indirect rate and local SG&A rate are
/// share-weighted averages, but the corporate SG&A rate is the policy's
/// fixed corporate constant rather than an average. A single unit keeps its
/// own corporate rate.
#[derive(Debug, Clone, PartialEq)]
pub struct WeightedDepartments {
    indirect_per_hour: f64,
    sga: SgaRates,
    basis: SgaBasis,
    include_design_fees: bool,
    price_base: PriceBase,
    units: BTreeMap<String, f64>,
}

impl WeightedDepartments {
    pub fn resolve(policy: &DepartmentalPolicy, allocation: &UnitAllocation) -> Self {
        let single = |unit: &OrgUnit, key: &str| Self {
            indirect_per_hour: unit.indirect_per_hour,
            sga: SgaRates {
                local: unit.local_sga_rate,
                corporate: unit.corporate_sga_rate,
            },
            basis: policy.sga_basis,
            include_design_fees: policy.include_design_fees,
            price_base: policy.price_base,
            units: BTreeMap::from([(key.to_string(), 1.0)]),
        };

        match allocation {
            UnitAllocation::Single { unit } => {
                let (key, found) = match policy.unit(unit) {
                    Some(found) => (unit.as_str(), Some(found)),
                    None => (policy.default_unit.as_str(), policy.unit(&policy.default_unit)),
                };
                match found {
                    Some(found) => single(found, key),
                    None => Self {
                        indirect_per_hour: 0.0,
                        sga: SgaRates {
                            local: 0.0,
                            corporate: policy.corporate_sga_rate,
                        },
                        basis: policy.sga_basis,
                        include_design_fees: policy.include_design_fees,
                        price_base: policy.price_base,
                        units: BTreeMap::new(),
                    },
                }
            }
            UnitAllocation::Weighted { shares } => {
                let mut indirect = 0.0;
                let mut local = 0.0;
                for (key, share) in shares {
                    if let Some(unit) = policy.unit(key) {
                        indirect += unit.indirect_per_hour * share;
                        local += unit.local_sga_rate * share;
                    }
                }
                Self {
                    indirect_per_hour: indirect.round(),
                    sga: SgaRates {
                        local,
                        corporate: policy.corporate_sga_rate,
                    },
                    basis: policy.sga_basis,
                    include_design_fees: policy.include_design_fees,
                    price_base: policy.price_base,
                    units: shares.clone(),
                }
            }
        }
    }

    pub fn indirect_per_hour(&self) -> f64 {
        self.indirect_per_hour
    }
}

impl CostAllocation for WeightedDepartments {
    fn indirect_cost(&self, _direct_labor: f64, total_days: f64, calendar: &WorkCalendar) -> f64 {
        total_days * calendar.working_hours_per_day * self.indirect_per_hour
    }

    fn sga_rates(&self) -> SgaRates {
        self.sga
    }

    fn sga_basis(&self) -> SgaBasis {
        self.basis
    }

    fn includes_design_fees(&self) -> bool {
        self.include_design_fees
    }

    fn price_base(&self) -> PriceBase {
        self.price_base
    }

    fn summary(&self) -> AllocationSummary {
        AllocationSummary {
            policy: "departmental",
            indirect_cost_rate: None,
            indirect_per_hour: Some(self.indirect_per_hour),
            units: self.units.clone(),
        }
    }
}

/// Select the allocation strategy for a catalog and request
pub fn allocation_for<'a>(catalog: &'a Catalog, request: &EstimateRequest) -> Box<dyn CostAllocation + 'a> {
    match &catalog.allocation {
        AllocationPolicy::FlatRate(policy) => Box::new(FlatRate::new(policy)),
        AllocationPolicy::Departmental(policy) => {
            let allocation = request.allocation.clone().unwrap_or_else(|| UnitAllocation::Single {
                unit: policy.default_unit.clone(),
            });
            Box::new(WeightedDepartments::resolve(policy, &allocation))
        }
    }
}

/// Outcome of solving for a target operating margin
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum TargetPrice {
    Attainable { target_margin: f64, price: f64 },
    /// No sales price reaches the target. When the margin has an upper
    /// bound, `max_margin` is that bound.
    Infeasible {
        target_margin: f64,
        #[serde(skip_serializing_if = "Option::is_none")]
        max_margin: Option<f64>,
    },
}

/// Margins closer than this to the target count as equal
const MARGIN_TOLERANCE: f64 = 1e-9;

/// Profit as a function of sales price for a fixed COGS
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProfitModel {
    pub cogs: f64,
    pub sga_rate: f64,
    pub basis: SgaBasis,
}

impl ProfitModel {
    pub fn gross_profit(&self, price: f64) -> f64 {
        price - self.cogs
    }

    /// SG&A cost. Stays linear when gross profit is negative.
    pub fn sga(&self, price: f64) -> f64 {
        match self.basis {
            SgaBasis::Price => price * self.sga_rate,
            SgaBasis::GrossProfit => self.gross_profit(price) * self.sga_rate,
        }
    }

    pub fn operating_profit(&self, price: f64) -> f64 {
        self.gross_profit(price) - self.sga(price)
    }

    pub fn operating_margin_at(&self, price: f64) -> f64 {
        if price > 0.0 {
            self.operating_profit(price) / price
        } else {
            0.0
        }
    }

    /// Upper bound of the operating margin as the price grows.
    ///
    /// `None` when SG&A on gross profit takes all of it or more: the margin
    /// is then `(1 - rate)(1 - cogs / price)`, which grows without bound as
    /// the price falls below COGS.
    pub fn max_margin(&self) -> Option<f64> {
        let retained = 1.0 - self.sga_rate;
        match self.basis {
            SgaBasis::Price => Some(retained),
            SgaBasis::GrossProfit if retained > 0.0 => Some(retained),
            SgaBasis::GrossProfit => None,
        }
    }

    /// Sales price at which the operating margin equals `target`
    pub fn solve_for_margin(&self, target: f64) -> TargetPrice {
        let infeasible = |max_margin| TargetPrice::Infeasible {
            target_margin: target,
            max_margin,
        };

        // Without cost every positive price gives the same margin, and a
        // price of zero gives none, so only a zero target has an answer.
        if self.cogs <= 0.0 {
            return if target.abs() <= MARGIN_TOLERANCE {
                TargetPrice::Attainable {
                    target_margin: target,
                    price: 0.0,
                }
            } else {
                infeasible(None)
            };
        }

        let denominator = match self.basis {
            SgaBasis::Price => 1.0 - self.sga_rate - target,
            SgaBasis::GrossProfit => {
                let retained = 1.0 - self.sga_rate;
                if retained <= 0.0 {
                    return infeasible(self.max_margin());
                }
                1.0 - target / retained
            }
        };
        if denominator > 0.0 {
            TargetPrice::Attainable {
                target_margin: target,
                price: self.cogs / denominator,
            }
        } else {
            infeasible(self.max_margin())
        }
    }
}

/// SG&A rates and amount
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SgaBreakdown {
    pub local_rate: f64,
    pub corporate_rate: f64,
    pub total_rate: f64,
    pub basis: SgaBasis,
    pub amount: f64,
}

/// Cost-of-goods, margins and target price for an estimate
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProfitabilityReport {
    pub sales: f64,
    pub direct_labor: f64,
    pub indirect_cost: f64,
    pub vendor_cost: f64,
    /// Design fees counted toward COGS (zero when the policy excludes them)
    pub design_fees: f64,
    pub cogs: f64,
    pub gross_profit: f64,
    pub gross_margin: f64,
    pub sga: SgaBreakdown,
    pub operating_profit: f64,
    pub operating_margin: f64,
    pub allocation: AllocationSummary,
    pub target: Option<TargetPrice>,
}

/// Direct labor cost of `total_days` for a team mix
pub fn direct_labor_cost(catalog: &Catalog, request: &EstimateRequest, total_days: f64) -> f64 {
    let man_months = total_days / catalog.calendar.working_days_per_month;
    man_months * catalog.rates.blended_monthly_cost(&request.team_mix)
}

/// Cost of goods sold, by component
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CostOfGoods {
    pub direct_labor: f64,
    pub indirect_cost: f64,
    pub vendor_cost: f64,
    pub design_fees: f64,
}

impl CostOfGoods {
    pub fn total(&self) -> f64 {
        self.direct_labor + self.indirect_cost + self.vendor_cost + self.design_fees
    }
}

pub fn cost_of_goods(
    strategy: &dyn CostAllocation,
    catalog: &Catalog,
    request: &EstimateRequest,
    effort: &EffortBreakdown,
    cost: &CostBreakdown,
) -> CostOfGoods {
    let direct_labor = direct_labor_cost(catalog, request, effort.total_days);
    CostOfGoods {
        direct_labor,
        indirect_cost: strategy.indirect_cost(direct_labor, effort.total_days, &catalog.calendar),
        vendor_cost: cost.vendor.cost,
        design_fees: if strategy.includes_design_fees() {
            cost.design.cost
        } else {
            0.0
        },
    }
}

/// Analyze the profitability of an estimate. When the allocation policy
/// prices from COGS, `cost` is rebased onto it first.
pub fn analyze(
    catalog: &Catalog,
    request: &EstimateRequest,
    effort: &EffortBreakdown,
    cost: &mut CostBreakdown,
) -> ProfitabilityReport {
    let strategy = allocation_for(catalog, request);
    let goods = cost_of_goods(strategy.as_ref(), catalog, request, effort, cost);
    if strategy.price_base() == PriceBase::Cogs {
        cost.rebase(PriceBase::Cogs, goods.total(), &catalog.multipliers.display_range);
    }
    analyze_with(strategy.as_ref(), request, goods, cost.price)
}

fn analyze_with(
    strategy: &dyn CostAllocation,
    request: &EstimateRequest,
    goods: CostOfGoods,
    sales: f64,
) -> ProfitabilityReport {
    let rates = strategy.sga_rates();
    let model = ProfitModel {
        cogs: goods.total(),
        sga_rate: rates.total(),
        basis: strategy.sga_basis(),
    };
    let gross_profit = model.gross_profit(sales);

    ProfitabilityReport {
        sales,
        direct_labor: goods.direct_labor,
        indirect_cost: goods.indirect_cost,
        vendor_cost: goods.vendor_cost,
        design_fees: goods.design_fees,
        cogs: model.cogs,
        gross_profit,
        gross_margin: if sales > 0.0 { gross_profit / sales } else { 0.0 },
        sga: SgaBreakdown {
            local_rate: rates.local,
            corporate_rate: rates.corporate,
            total_rate: rates.total(),
            basis: model.basis,
            amount: model.sga(sales),
        },
        operating_profit: model.operating_profit(sales),
        operating_margin: model.operating_margin_at(sales),
        allocation: strategy.summary(),
        target: request.target_margin.map(|t| model.solve_for_margin(t)),
    }
}
