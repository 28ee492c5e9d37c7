//! Tracing initialization

use std::sync::Once;

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

static INIT: Once = Once::new();

/// Environment variable holding the log filter, e.g. `EST_LOG=est::engine=debug`
pub const LOG_ENV: &str = "EST_LOG";

/// Default filter directive for the given verbosity flags
pub fn default_directive(verbose: bool, quiet: bool) -> &'static str {
    if quiet {
        "error"
    } else if verbose {
        "est=debug"
    } else {
        "warn"
    }
}

/// Initialize logging to stderr.
///
/// `EST_LOG` wins over the verbosity flags. Calling this more than once is a no-op.
pub fn init_logging(verbose: bool, quiet: bool) {
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_env(LOG_ENV)
            .unwrap_or_else(|_| EnvFilter::new(default_directive(verbose, quiet)));

        let result = tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_target(verbose)
                    .without_time(),
            )
            .with(filter)
            .try_init();

        if let Err(e) = result {
            eprintln!("logging already initialized: {}", e);
        }
    });
}
