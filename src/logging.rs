//! Tracing setup for the binary
//!
//! Log output goes to stderr so stdout stays free for the run summary.

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize the tracing subscriber
///
/// Reads `RUST_LOG`; when unset, this crate logs at `info` (or `debug` with
/// `verbose`) and everything else at `warn`.
pub fn init(verbose: bool) {
    let default = if verbose {
        "warn,combine_prs=debug"
    } else {
        "warn,combine_prs=info"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    // A second init (tests driving the CLI in-process) keeps the first subscriber
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).compact())
        .try_init();
}
