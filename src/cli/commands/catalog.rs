//! `est catalog` command - Inspect catalog tables

use clap::Subcommand;
use console::style;
use miette::Result;
use std::collections::BTreeMap;
use tabled::{builder::Builder, settings::Style};

use crate::catalog::{AllocationPolicy, Catalog, PhaseItem, ProfileTable};
use crate::cli::helpers::{print_structured, truncate_str};
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::loader::load_catalog;
use crate::core::Config;
use crate::engine::report::{format_amount, format_percent, truncate};

#[derive(Subcommand, Debug)]
pub enum CatalogCommands {
    /// List the catalogs compiled into the binary
    Builtins,

    /// Show the whole active catalog
    Show,

    /// List features and their effort
    Features,

    /// List design-phase items
    Design,

    /// List vendor-phase items
    Vendor,

    /// List estimation profiles
    Profiles,

    /// List labor ranks, monthly costs and the standard team mix
    Ranks,

    /// List organizational units (departmental catalogs)
    Departments,

    /// List every multiplier
    Multipliers,
}

pub fn run(cmd: CatalogCommands, global: &GlobalOpts) -> Result<()> {
    let config = Config::load();
    let format = global.output_format(&config);

    if let CatalogCommands::Builtins = cmd {
        let names = Catalog::builtin_names();
        if format == OutputFormat::Text {
            for name in &names {
                println!("{}", name);
            }
            return Ok(());
        }
        return print_structured(&names, format);
    }

    let catalog = load_catalog(&config.catalog(global.catalog.as_deref()))?;
    let symbol = catalog.currency.symbol.as_str();

    match cmd {
        CatalogCommands::Builtins => Ok(()),
        CatalogCommands::Show => print_structured(
            &catalog,
            if format == OutputFormat::Json {
                OutputFormat::Json
            } else {
                OutputFormat::Yaml
            },
        ),
        CatalogCommands::Features => {
            if format != OutputFormat::Text {
                return print_structured(&catalog.items.features, format);
            }
            let mut builder = Builder::default();
            builder.push_record(["Key", "Label", "Man-days"]);
            for (key, feature) in &catalog.items.features {
                builder.push_record([
                    key.clone(),
                    truncate_str(&feature.label, 40),
                    format!("{}", feature.man_days),
                ]);
            }
            print_table(builder, catalog.items.features.len(), "feature");
            Ok(())
        }
        CatalogCommands::Design => {
            if format != OutputFormat::Text {
                return print_structured(&catalog.items.design_items, format);
            }
            print_table(
                phase_table(&catalog.items.design_items, symbol),
                catalog.items.design_items.len(),
                "design item",
            );
            Ok(())
        }
        CatalogCommands::Vendor => {
            if format != OutputFormat::Text {
                return print_structured(&catalog.items.vendor_items, format);
            }
            print_table(
                phase_table(&catalog.items.vendor_items, symbol),
                catalog.items.vendor_items.len(),
                "vendor item",
            );
            Ok(())
        }
        CatalogCommands::Profiles => {
            if format != OutputFormat::Text {
                return print_structured(&catalog.profiles, format);
            }
            let mut builder = Builder::default();
            builder.push_record(["Key", "Label", "Productivity", "Description"]);
            for (key, profile) in &catalog.profiles.entries {
                let marker = if *key == catalog.profiles.default { " *" } else { "" };
                builder.push_record([
                    format!("{}{}", key, marker),
                    profile.label.clone(),
                    ProfileTable::productivity_string(profile),
                    truncate_str(&profile.description, 50),
                ]);
            }
            print_table(builder, catalog.profiles.entries.len(), "profile");
            Ok(())
        }
        CatalogCommands::Ranks => {
            if format != OutputFormat::Text {
                return print_structured(&catalog.rates, format);
            }
            let mut builder = Builder::default();
            builder.push_record(["Rank", "Monthly cost", "Standard mix"]);
            for (rank, cost) in &catalog.rates.rank_monthly_costs {
                let mix = catalog
                    .rates
                    .standard_team_mix
                    .get(rank)
                    .map(|w| format_percent(*w))
                    .unwrap_or_default();
                builder.push_record([rank.clone(), format_amount(symbol, truncate(*cost)), mix]);
            }
            print_table(builder, catalog.rates.rank_monthly_costs.len(), "rank");
            println!(
                "Daily rates: internal {}, outsourced {}",
                format_amount(symbol, truncate(catalog.rates.internal_daily_rate)),
                format_amount(symbol, truncate(catalog.rates.outsource_daily_rate))
            );
            Ok(())
        }
        CatalogCommands::Departments => {
            let AllocationPolicy::Departmental(policy) = &catalog.allocation else {
                return Err(miette::miette!(
                    "Catalog '{}' uses the {} policy and has no organizational units",
                    catalog.config_version,
                    catalog.allocation.name()
                ));
            };
            if format != OutputFormat::Text {
                return print_structured(&policy.units, format);
            }
            let mut builder = Builder::default();
            builder.push_record(["Key", "Label", "Indirect/hour", "Local SG&A", "Corporate SG&A"]);
            for (key, unit) in &policy.units {
                let marker = if *key == policy.default_unit { " *" } else { "" };
                builder.push_record([
                    format!("{}{}", key, marker),
                    truncate_str(&unit.label, 40),
                    format_amount(symbol, truncate(unit.indirect_per_hour)),
                    format_percent(unit.local_sga_rate),
                    format_percent(unit.corporate_sga_rate),
                ]);
            }
            print_table(builder, policy.units.len(), "unit");
            Ok(())
        }
        CatalogCommands::Multipliers => {
            let scalars: BTreeMap<String, f64> = catalog.multipliers.scalars().into_iter().collect();
            if format != OutputFormat::Text {
                return print_structured(&scalars, format);
            }
            let mut builder = Builder::default();
            builder.push_record(["Multiplier", "Value"]);
            for (name, value) in &scalars {
                builder.push_record([name.clone(), value.to_string()]);
            }
            print_table(builder, scalars.len(), "multiplier");
            Ok(())
        }
    }
}

fn phase_table(items: &BTreeMap<String, PhaseItem>, symbol: &str) -> Builder {
    let mut builder = Builder::default();
    builder.push_record(["Key", "Label", "Sizing", "Value", "Price range"]);
    for (key, item) in items {
        let value = match item.sizing.man_days(1) {
            Some(days) => format!("{} MD", days),
            None => format_amount(symbol, truncate(item.sizing.amount(0, 0.0))),
        };
        let range = item
            .price_range
            .map(|r| {
                format!(
                    "{} - {}",
                    format_amount(symbol, truncate(r.min)),
                    format_amount(symbol, truncate(r.max))
                )
            })
            .unwrap_or_default();
        builder.push_record([
            key.clone(),
            truncate_str(&item.label, 40),
            item.sizing.mode().to_string(),
            value,
            range,
        ]);
    }
    builder
}

fn print_table(builder: Builder, count: usize, noun: &str) {
    println!("{}", builder.build().with(Style::markdown()));
    println!();
    println!("{} {}(s)", style(count).cyan(), noun);
}
