//! CLI commands and output

mod combine;
mod style;

pub use combine::{CombineOptions, run_combine_command};

use anstream::eprintln;
use combine_prs::error::Error;
use style::{Stylize, cross};
use tracing::error;

/// Log a fatal error and print a one-line summary
pub fn report_failure(err: &Error) {
    error!(error = %err, "run failed");
    eprintln!("{} {}", cross(), "Combine failed".error());
    for line in err.to_string().lines() {
        eprintln!("  {}", line.muted());
    }
}
