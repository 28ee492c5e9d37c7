//! CLI argument definitions using clap derive

use clap::{Parser, Subcommand, ValueEnum};

use crate::cli::commands::{
    catalog::CatalogCommands, completions::CompletionsArgs, estimate::EstimateArgs, init::InitArgs,
    solve::SolveArgs,
};
use crate::core::Config;

#[derive(Parser)]
#[command(name = "est")]
#[command(author, version, about = "Project estimation and profitability toolkit")]
#[command(
    long_about = "Estimate effort, price and profitability of software projects from a request file and a rate catalog."
)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[command(flatten)]
    pub global: GlobalOpts,
}

#[derive(clap::Args, Clone, Debug)]
pub struct GlobalOpts {
    /// Output format
    #[arg(long, short = 'f', global = true, default_value = "auto")]
    pub format: OutputFormat,

    /// Suppress non-essential output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Enable verbose output (debug logging)
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,

    /// Catalog to use: built-in name (standard, departmental) or path to a YAML file
    #[arg(long, global = true, env = "EST_CATALOG")]
    pub catalog: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize an estimate workspace (.est/ plus a sample request)
    Init(InitArgs),

    /// Estimate effort, price and profitability for a request
    Estimate(EstimateArgs),

    /// Solve for the sales price that reaches a target operating margin
    Solve(SolveArgs),

    /// Inspect catalog tables
    #[command(subcommand)]
    Catalog(CatalogCommands),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Text on a terminal, YAML otherwise
    #[default]
    Auto,
    /// Human-readable report
    Text,
    /// YAML format (full fidelity)
    Yaml,
    /// JSON format (for programming)
    Json,
}

impl GlobalOpts {
    /// Output format after applying the configured default to `auto`
    pub fn output_format(&self, config: &Config) -> OutputFormat {
        let format = match self.format {
            OutputFormat::Auto => config
                .default_format
                .as_deref()
                .and_then(|f| OutputFormat::from_str(f, true).ok())
                .unwrap_or(OutputFormat::Auto),
            f => f,
        };
        match format {
            OutputFormat::Auto if console::Term::stdout().is_term() => OutputFormat::Text,
            OutputFormat::Auto => OutputFormat::Yaml,
            f => f,
        }
    }
}
