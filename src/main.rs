//! combine-prs CLI

mod cli;

use clap::Parser;
use cli::{CombineOptions, run_combine_command};
use std::path::PathBuf;
use std::process::ExitCode;

/// Combine labeled pull requests into one working tree for CI builds
#[derive(Debug, Parser)]
#[command(name = "combine-prs", version, about)]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(short, long, default_value = "combine.toml")]
    config: PathBuf,

    /// Working copy to merge into (overrides `working_directory`)
    #[arg(short, long)]
    path: Option<PathBuf>,

    /// Do not write build metadata, whatever the config says
    #[arg(long)]
    no_metadata: bool,

    /// Discover and print the merge plan without touching the working copy
    #[arg(long)]
    dry_run: bool,

    /// Log debug output
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    combine_prs::logging::init(cli.verbose);

    let options = CombineOptions {
        config_path: cli.config,
        working_directory: cli.path,
        no_metadata: cli.no_metadata,
        dry_run: cli.dry_run,
    };

    match run_combine_command(options).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            cli::report_failure(&e);
            ExitCode::FAILURE
        }
    }
}
