//! `est solve` command - Sales price for a target operating margin

use console::style;
use miette::Result;
use serde::Serialize;

use crate::catalog::{AllocationPolicy, Catalog, SgaBasis};
use crate::cli::helpers::print_structured;
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::loader::load_catalog;
use crate::core::Config;
use crate::engine::report::{format_amount, format_percent, infeasible_message, truncate};
use crate::engine::request::parse_margin;
use crate::engine::{ProfitModel, TargetPrice};

#[derive(clap::Args, Debug)]
pub struct SolveArgs {
    /// Cost of goods sold
    #[arg(long)]
    pub cogs: f64,

    /// Target operating margin: 0.2, 20 or 20%
    #[arg(long, value_parser = margin_arg)]
    pub target_margin: f64,

    /// Total SG&A rate (default: from the catalog)
    #[arg(long)]
    pub sga_rate: Option<f64>,

    /// What SG&A is charged against: price or gross_profit (default: from the catalog)
    #[arg(long)]
    pub basis: Option<SgaBasis>,
}

fn margin_arg(text: &str) -> std::result::Result<f64, String> {
    parse_margin(text).ok_or_else(|| format!("'{}' is not a margin", text))
}

/// Solved price with the inputs that produced it
#[derive(Debug, Serialize)]
pub struct Solution {
    pub cogs: f64,
    pub sga_rate: f64,
    pub basis: SgaBasis,
    #[serde(flatten)]
    pub target: TargetPrice,
    /// Operating margin recomputed at the solved price
    #[serde(skip_serializing_if = "Option::is_none")]
    pub check_margin: Option<f64>,
}

/// SG&A rate and basis the catalog applies when nothing else is given
pub fn catalog_sga(catalog: &Catalog) -> (f64, SgaBasis) {
    match &catalog.allocation {
        AllocationPolicy::FlatRate(policy) => (policy.sga.total(), policy.sga_basis),
        AllocationPolicy::Departmental(policy) => {
            let rate = policy
                .unit(&policy.default_unit)
                .map(|unit| unit.local_sga_rate + unit.corporate_sga_rate)
                .unwrap_or(policy.corporate_sga_rate);
            (rate, policy.sga_basis)
        }
    }
}

pub fn solve(cogs: f64, target_margin: f64, sga_rate: f64, basis: SgaBasis) -> Solution {
    let model = ProfitModel { cogs, sga_rate, basis };
    let target = model.solve_for_margin(target_margin);
    let check_margin = match target {
        TargetPrice::Attainable { price, .. } => Some(model.operating_margin_at(price)),
        TargetPrice::Infeasible { .. } => None,
    };
    Solution {
        cogs,
        sga_rate,
        basis,
        target,
        check_margin,
    }
}

pub fn run(args: SolveArgs, global: &GlobalOpts) -> Result<()> {
    if !args.cogs.is_finite() || args.cogs < 0.0 {
        return Err(miette::miette!("--cogs must be a non-negative amount"));
    }

    let config = Config::load();
    let catalog = load_catalog(&config.catalog(global.catalog.as_deref()))?;
    let (default_rate, default_basis) = catalog_sga(&catalog);
    let sga_rate = args.sga_rate.unwrap_or(default_rate);
    let basis = args.basis.unwrap_or(default_basis);

    let solution = solve(args.cogs, args.target_margin, sga_rate, basis);
    tracing::debug!(sga_rate, %basis, "target price solved");

    let format = global.output_format(&config);
    if format != OutputFormat::Text {
        return print_structured(&solution, format);
    }

    let symbol = catalog.currency.symbol.as_str();
    println!(
        "COGS {} with SG&A {} on {}",
        style(format_amount(symbol, truncate(solution.cogs))).cyan(),
        format_percent(sga_rate),
        basis
    );
    match solution.target {
        TargetPrice::Attainable {
            target_margin,
            price,
        } => {
            println!(
                "{} Price for a {} operating margin: {}",
                style("✓").green(),
                format_percent(target_margin),
                style(format_amount(symbol, truncate(price))).bold()
            );
        }
        TargetPrice::Infeasible {
            target_margin,
            max_margin,
        } => {
            println!(
                "{} {}",
                style("✗").red(),
                infeasible_message(target_margin, max_margin)
            );
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_solve_price_basis() {
        let solution = solve(1_000_000.0, 0.2, 0.25, SgaBasis::Price);
        match solution.target {
            TargetPrice::Attainable { price, .. } => {
                assert!((price - 1_000_000.0 / 0.55).abs() < 1e-6);
            }
            other => panic!("expected attainable, got {:?}", other),
        }
        assert!((solution.check_margin.unwrap() - 0.2).abs() < 1e-9);
    }

    #[test]
    fn test_solve_infeasible_has_no_check() {
        let solution = solve(1_000_000.0, 0.8, 0.25, SgaBasis::Price);
        assert!(matches!(solution.target, TargetPrice::Infeasible { .. }));
        assert!(solution.check_margin.is_none());

        let json = serde_json::to_value(&solution).unwrap();
        assert_eq!(json["status"], "infeasible");
        assert_eq!(json["max_margin"], 0.75);
    }

    #[test]
    fn test_solve_sga_above_gross_profit_reports_no_bound() {
        let solution = solve(1_000_000.0, 0.1, 1.415, SgaBasis::GrossProfit);
        assert!(solution.check_margin.is_none());
        let json = serde_json::to_value(&solution).unwrap();
        assert_eq!(json["status"], "infeasible");
        assert!(json.get("max_margin").is_none());
    }

    #[test]
    fn test_solve_zero_cogs() {
        let solution = solve(0.0, 0.2, 0.25, SgaBasis::Price);
        assert!(matches!(solution.target, TargetPrice::Infeasible { max_margin: None, .. }));

        let solution = solve(0.0, 0.0, 0.25, SgaBasis::Price);
        assert_eq!(solution.check_margin, Some(0.0));
    }

    #[test]
    fn test_catalog_defaults() {
        let standard = Catalog::builtin("standard").unwrap();
        let (rate, basis) = catalog_sga(&standard);
        assert!((rate - 0.281).abs() < 1e-12);
        assert_eq!(basis, SgaBasis::Price);

        let departmental = Catalog::builtin("departmental").unwrap();
        let (_, basis) = catalog_sga(&departmental);
        assert_eq!(basis, SgaBasis::GrossProfit);
    }
}
