//! `est init` command - Initialize an estimate workspace

use console::style;
use miette::{IntoDiagnostic, Result};

use crate::core::project::{Project, ProjectError};

#[derive(clap::Args, Debug)]
pub struct InitArgs {
    /// Directory to initialize (default: current directory)
    #[arg(default_value = ".")]
    pub path: std::path::PathBuf,

    /// Rewrite .est/config.yaml even if it already exists
    #[arg(long)]
    pub force: bool,
}

pub fn run(args: InitArgs) -> Result<()> {
    let path = if args.path.as_os_str() == "." {
        std::env::current_dir().into_diagnostic()?
    } else {
        args.path.clone()
    };

    if !path.exists() {
        std::fs::create_dir_all(&path).into_diagnostic()?;
        println!(
            "{} Created directory {}",
            style("✓").green(),
            style(path.display()).cyan()
        );
    }

    match Project::init(&path, args.force) {
        Ok(project) => {
            println!(
                "{} Initialized estimate workspace at {}",
                style("✓").green(),
                style(project.root().display()).cyan()
            );
            println!();
            println!("Next steps:");
            println!(
                "  {} Estimate the sample request",
                style("est estimate requests/sample.yaml").yellow()
            );
            println!(
                "  {} Browse the feature catalog",
                style("est catalog features").yellow()
            );
            Ok(())
        }
        Err(ProjectError::AlreadyExists(root)) => {
            println!(
                "{} Workspace already exists at {}",
                style("!").yellow(),
                style(root.display()).cyan()
            );
            println!("  Use {} to rewrite the configuration", style("--force").yellow());
            Ok(())
        }
        Err(e) => Err(miette::miette!("{}", e)),
    }
}
