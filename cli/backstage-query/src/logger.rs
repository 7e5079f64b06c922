use tracing_subscriber::EnvFilter;
use tracing_subscriber::prelude::*;

use crate::commands::Verbosity;

/// Default filter directives for a verbosity level
///
/// `RUST_LOG` replaces these when set.
fn log_filter(verbosity: Verbosity) -> &'static str {
    match verbosity {
        // Show only errors
        Verbosity::Quiet => "off,backstage_query=error,backstage_catalog=error",
        // Only show warnings
        Verbosity::Verbose(0) => "off,backstage_query=warn,backstage_catalog=warn",
        // Show our own info logs
        Verbosity::Verbose(1) => "off,backstage_query=info,backstage_catalog=info",
        // Show debug logs including requests sent to the catalog
        Verbosity::Verbose(2) => "off,backstage_query=debug,backstage_catalog=debug",
        // Also show rejected response shapes
        Verbosity::Verbose(3) => "off,backstage_query=trace,backstage_catalog=trace",
        Verbosity::Verbose(_) => "trace",
    }
}

pub(crate) fn init_logger(verbosity: Verbosity) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(log_filter(verbosity)))
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    let log_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_filter(filter);

    // a subscriber may already be installed
    let _ = tracing_subscriber::registry().with(log_layer).try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filters_are_valid_directives() {
        for verbosity in [
            Verbosity::Quiet,
            Verbosity::Verbose(0),
            Verbosity::Verbose(1),
            Verbosity::Verbose(2),
            Verbosity::Verbose(3),
            Verbosity::Verbose(4),
        ] {
            let filter = log_filter(verbosity);
            assert!(
                EnvFilter::try_new(filter).is_ok(),
                "invalid filter for {verbosity:?}: {filter}"
            );
        }
    }
}
