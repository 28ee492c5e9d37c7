use clap::Parser;
use miette::Result;
use est::cli::{Cli, Commands};
use est::core::logging::init_logging;

fn main() -> Result<()> {
    // Reset SIGPIPE to default behavior (terminate silently) for proper Unix piping.
    // Without this, piping to `head`, `grep -q`, etc. causes a panic on broken pipe.
    #[cfg(unix)]
    {
        unsafe {
            libc::signal(libc::SIGPIPE, libc::SIG_DFL);
        }
    }
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .unicode(true)
                .context_lines(2)
                .tab_width(4)
                .build(),
        )
    }))?;

    let cli = Cli::parse();
    let global = cli.global;
    init_logging(global.verbose, global.quiet);

    match cli.command {
        Commands::Init(args) => est::cli::commands::init::run(args),
        Commands::Estimate(args) => est::cli::commands::estimate::run(args, &global),
        Commands::Solve(args) => est::cli::commands::solve::run(args, &global),
        Commands::Catalog(cmd) => est::cli::commands::catalog::run(cmd, &global),
        Commands::Completions(args) => est::cli::commands::completions::run(args),
    }
}
