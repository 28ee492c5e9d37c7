//! `est estimate` command - Estimate effort, price and profitability

use miette::Result;
use std::path::PathBuf;
use tabled::{builder::Builder, settings::Style};

use crate::cli::helpers::{format_factor, parse_key_values, print_structured, truncate_str};
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::loader::{load_catalog, load_request};
use crate::core::Config;
use crate::engine::report::{format_amount, EstimateReport, TargetSummary};
use crate::engine::request::{parse_allocation, parse_margin, ItemList};
use crate::engine::{self, RawRequest, Response};

#[derive(clap::Args, Debug, Default)]
pub struct EstimateArgs {
    /// Request file (YAML or JSON), or `-` for stdin. Flags override its fields.
    pub request: Option<PathBuf>,

    /// Sizing method: catalog, step or fp
    #[arg(long)]
    pub method: Option<String>,

    /// Number of screens
    #[arg(long)]
    pub screens: Option<u32>,

    /// Number of database tables
    #[arg(long)]
    pub tables: Option<u32>,

    /// Complexity: low, medium, high, very_high
    #[arg(long)]
    pub complexity: Option<String>,

    /// Schedule: short, normal, long
    #[arg(long)]
    pub duration: Option<String>,

    /// Development type: new, porting
    #[arg(long)]
    pub dev_type: Option<String>,

    /// Target platform: web_b2e, web_b2c, mobile, all
    #[arg(long)]
    pub platform: Option<String>,

    /// Estimation profile, e.g. poc
    #[arg(long)]
    pub profile: Option<String>,

    /// Confidence in vendor quotes: low, medium, high
    #[arg(long)]
    pub confidence: Option<String>,

    /// Target operating margin: 0.2, 20 or 20%
    #[arg(long, value_parser = margin_arg)]
    pub target_margin: Option<f64>,

    /// Features, comma separated (keys or labels)
    #[arg(long)]
    pub features: Option<String>,

    /// Design-phase items, comma separated
    #[arg(long)]
    pub design_items: Option<String>,

    /// Vendor-phase items, comma separated
    #[arg(long)]
    pub vendor_items: Option<String>,

    /// Lines of code (step method)
    #[arg(long)]
    pub loc: Option<f64>,

    /// Function points (fp method)
    #[arg(long)]
    pub fp_count: Option<f64>,

    /// Man-days per line of code or function point
    #[arg(long)]
    pub man_days_per_unit: Option<f64>,

    /// Organizational unit charged for indirect cost
    #[arg(long)]
    pub department: Option<String>,

    /// Weighted units, e.g. "bi-dev:0.6,cs-dev1:0.4"
    #[arg(long)]
    pub dept_allocation: Option<String>,

    /// Team mix by rank, e.g. "Rank3=0.8,Rank2=0.2"
    #[arg(long)]
    pub team_mix: Option<String>,
}

fn margin_arg(text: &str) -> std::result::Result<f64, String> {
    parse_margin(text).ok_or_else(|| format!("'{}' is not a margin", text))
}

pub fn run(args: EstimateArgs, global: &GlobalOpts) -> Result<()> {
    let config = Config::load();
    let catalog = load_catalog(&config.catalog(global.catalog.as_deref()))?;

    let mut raw = match &args.request {
        Some(path) => load_request(path)?,
        None => RawRequest::default(),
    };
    apply_overrides(&mut raw, &args)?;

    let response = engine::respond(&catalog, &raw);
    let format = global.output_format(&config);

    match (&response, format) {
        (Response::Success(report), OutputFormat::Text) => {
            print!("{}", render_report(report, &catalog.currency.symbol, global.quiet));
        }
        (Response::Error { .. }, OutputFormat::Text) => {}
        _ => print_structured(&response, format)?,
    }

    match response {
        Response::Error { message } => Err(miette::miette!("{}", message)),
        Response::Success(_) => Ok(()),
    }
}

/// Apply command-line flags on top of a request document
pub fn apply_overrides(raw: &mut RawRequest, args: &EstimateArgs) -> Result<()> {
    fn set<T: Clone>(field: &mut Option<T>, flag: &Option<T>) {
        if flag.is_some() {
            *field = flag.clone();
        }
    }

    set(&mut raw.method, &args.method);
    set(&mut raw.screen_count, &args.screens);
    set(&mut raw.table_count, &args.tables);
    set(&mut raw.complexity, &args.complexity);
    set(&mut raw.duration, &args.duration);
    set(&mut raw.dev_type, &args.dev_type);
    set(&mut raw.target_platform, &args.platform);
    set(&mut raw.estimation_profile, &args.profile);
    set(&mut raw.confidence, &args.confidence);
    set(&mut raw.target_margin, &args.target_margin);
    set(&mut raw.loc, &args.loc);
    set(&mut raw.fp_count, &args.fp_count);
    set(&mut raw.man_days_per_unit, &args.man_days_per_unit);
    set(&mut raw.department, &args.department);

    if let Some(text) = &args.features {
        raw.features = ItemList::parse(text);
    }
    if let Some(text) = &args.design_items {
        raw.design_items = ItemList::parse(text);
    }
    if let Some(text) = &args.vendor_items {
        raw.vendor_items = ItemList::parse(text);
    }
    if let Some(text) = &args.dept_allocation {
        let shares = parse_allocation(text);
        if shares.is_empty() && !text.trim().is_empty() {
            return Err(miette::miette!(
                "Could not read --dept-allocation '{}', expected unit:share pairs",
                text
            ));
        }
        raw.dept_allocation = shares;
    }
    if let Some(text) = &args.team_mix {
        raw.team_mix = Some(parse_key_values(text)?);
    }
    Ok(())
}

/// Render a successful estimate as a Markdown report
pub fn render_report(report: &EstimateReport, symbol: &str, quiet: bool) -> String {
    let amount = |value: i64| format_amount(symbol, value);
    let echo = &report.input_echo;
    let cost = &report.cost_breakdown;
    let profit = &report.profit_analysis;
    let breakdown = &profit.breakdown;

    let mut output = String::new();
    output.push_str("# Estimate\n\n");

    let mut summary = Builder::default();
    summary.push_record(["Item", "Value"]);
    summary.push_record(["Estimated amount", report.estimated_amount.as_str()]);
    summary.push_record(["Range", report.estimated_range.as_str()]);
    summary.push_record([
        "Variance range",
        &format!(
            "{} - {}",
            amount(report.variance_range.low),
            amount(report.variance_range.high)
        ),
    ]);
    summary.push_record([
        "Development man-days",
        &format!("{:.1}", report.man_days.development_total),
    ]);
    summary.push_record(["Method", echo.method]);
    summary.push_record([
        "Profile",
        &format!("{} ({})", echo.profile, report.productivity),
    ]);
    summary.push_record([
        "Project",
        &format!(
            "{} screens, {} tables, {} complexity, {}, {}, {}",
            echo.screen_count,
            echo.table_count,
            echo.complexity_label,
            echo.duration,
            echo.dev_type,
            echo.target_platform
        ),
    ]);
    if !echo.features.is_empty() {
        summary.push_record(["Features", &truncate_str(&echo.features.join(", "), 60)]);
    }
    summary.push_record(["Catalog", report.config_version.as_str()]);
    output.push_str(&summary.build().with(Style::markdown()).to_string());

    output.push_str("\n\n## Cost Breakdown\n\n");
    let mut costs = Builder::default();
    costs.push_record(["Phase", "Amount", "Notes"]);
    costs.push_record([
        "Development".to_string(),
        amount(cost.development),
        format!(
            "{:.1} MD ({:.1} size, {:.1} features)",
            report.man_days.development_total, report.man_days.size_based, report.man_days.feature_based
        ),
    ]);
    costs.push_record([
        "Design".to_string(),
        amount(cost.design),
        truncate_str(&echo.design_items.join(", "), 40),
    ]);
    costs.push_record([
        "Vendor".to_string(),
        amount(cost.vendor),
        if echo.vendor_items.is_empty() {
            String::new()
        } else {
            format!(
                "{} - {}",
                amount(cost.vendor_range.low),
                amount(cost.vendor_range.high)
            )
        },
    ]);
    costs.push_record([
        format!("Base amount ({})", cost.price_base),
        amount(cost.base_amount),
        format!(
            "platform {}, duration {}, buffer {}",
            format_factor(cost.platform_multiplier),
            format_factor(cost.duration_multiplier),
            format_factor(cost.buffer_multiplier)
        ),
    ]);
    costs.push_record(["Price".to_string(), amount(report.price), String::new()]);
    output.push_str(&costs.build().with(Style::markdown()).to_string());

    output.push_str("\n\n## Profitability\n\n");
    let mut margins = Builder::default();
    margins.push_record(["Line", "Amount", "Notes"]);
    margins.push_record(["Sales".to_string(), amount(profit.sales), String::new()]);
    margins.push_record([
        "Direct labor".to_string(),
        amount(breakdown.direct_labor),
        String::new(),
    ]);
    margins.push_record([
        "Indirect cost".to_string(),
        amount(breakdown.indirect_cost),
        match breakdown.indirect_per_hour {
            Some(rate) => format!("{} per hour", amount(rate)),
            None => breakdown.allocation_policy.to_string(),
        },
    ]);
    margins.push_record([
        "Outsourcing".to_string(),
        amount(breakdown.outsourcing),
        String::new(),
    ]);
    margins.push_record([
        "Design fees".to_string(),
        amount(breakdown.design_fees),
        String::new(),
    ]);
    margins.push_record(["COGS".to_string(), amount(profit.cogs), String::new()]);
    margins.push_record([
        "Gross profit".to_string(),
        amount(profit.gross_profit),
        profit.gross_margin.clone(),
    ]);
    margins.push_record([
        "SG&A".to_string(),
        amount(breakdown.total_sga_cost),
        format!(
            "{} local + {} corporate on {}",
            breakdown.local_sga_rate, breakdown.corporate_sga_rate, breakdown.sga_basis
        ),
    ]);
    margins.push_record([
        "Operating profit".to_string(),
        amount(profit.operating_profit),
        profit.operating_margin.clone(),
    ]);
    output.push_str(&margins.build().with(Style::markdown()).to_string());
    output.push('\n');

    match &profit.target {
        Some(TargetSummary::Attainable {
            target_margin,
            formatted,
            ..
        }) => {
            output.push_str(&format!(
                "\nPrice for a {} operating margin: {}\n",
                target_margin, formatted
            ));
        }
        Some(TargetSummary::Infeasible { message, .. }) => {
            output.push_str(&format!("\nTarget margin: {}\n", message));
        }
        None => {}
    }

    if !quiet && !report.notices.is_empty() {
        output.push_str("\n## Notices\n\n");
        for notice in &report.notices {
            output.push_str(&format!("- {}\n", notice));
        }
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Catalog;

    fn report_for(raw: &RawRequest) -> EstimateReport {
        let catalog = Catalog::builtin("standard").unwrap();
        match engine::respond(&catalog, raw) {
            Response::Success(report) => *report,
            Response::Error { message } => panic!("unexpected error: {}", message),
        }
    }

    #[test]
    fn test_flags_override_request_fields() {
        let mut raw = RawRequest {
            screen_count: Some(3),
            complexity: Some("low".to_string()),
            features: ItemList::parse("auth"),
            ..Default::default()
        };
        let args = EstimateArgs {
            screens: Some(8),
            features: Some("payment, search".to_string()),
            team_mix: Some("Rank3=1".to_string()),
            dept_allocation: Some("bi-dev:0.6,cs-dev1:0.4".to_string()),
            ..Default::default()
        };

        apply_overrides(&mut raw, &args).unwrap();
        assert_eq!(raw.screen_count, Some(8));
        assert_eq!(raw.complexity.as_deref(), Some("low"));
        assert_eq!(raw.features.as_slice(), &["payment", "search"]);
        assert_eq!(raw.team_mix.unwrap()["Rank3"], 1.0);
        assert_eq!(raw.dept_allocation.len(), 2);
    }

    #[test]
    fn test_unreadable_allocation_is_rejected() {
        let mut raw = RawRequest::default();
        let args = EstimateArgs {
            dept_allocation: Some("half and half".to_string()),
            ..Default::default()
        };
        assert!(apply_overrides(&mut raw, &args).is_err());
    }

    #[test]
    fn test_margin_arg() {
        assert_eq!(margin_arg("20%"), Ok(0.2));
        assert_eq!(margin_arg("0.15"), Ok(0.15));
        assert!(margin_arg("high").is_err());
    }

    #[test]
    fn test_render_default_report() {
        let report = report_for(&RawRequest::default());
        let text = render_report(&report, "¥", false);
        assert!(text.contains("| Estimated amount"));
        assert!(text.contains("¥1,650,000"));
        assert!(text.contains("## Profitability"));
        assert!(!text.contains("## Notices"));
    }

    #[test]
    fn test_render_notices_unless_quiet() {
        let raw = RawRequest {
            target_platform: Some("fridge".to_string()),
            target_margin: Some(0.9),
            ..Default::default()
        };
        let report = report_for(&raw);

        let text = render_report(&report, "¥", false);
        assert!(text.contains("## Notices"));
        assert!(text.contains("fridge"));
        assert!(text.contains("cannot be reached"));

        let quiet = render_report(&report, "¥", true);
        assert!(!quiet.contains("## Notices"));
    }
}
