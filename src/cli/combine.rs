//! Combine command - merge labeled PRs and report what happened

use crate::cli::style::{CHECK, Stylize, arrow};
use anstream::println;
use combine_prs::config::Config;
use combine_prs::error::{Error, Result};
use combine_prs::exec::ProcessExecutor;
use combine_prs::merge::MergePlan;
use combine_prs::metadata::RunContext;
use combine_prs::platform::create_platform_service;
use combine_prs::run::{RunReport, plan_combine, run_combine};
use combine_prs::types::RepositoryTarget;
use std::path::PathBuf;

/// Options for the combine command
#[derive(Debug, Clone, Default)]
pub struct CombineOptions {
    /// Config file location
    pub config_path: PathBuf,
    /// Working copy override
    pub working_directory: Option<PathBuf>,
    /// Disable metadata generation
    pub no_metadata: bool,
    /// Dry run - show what would be merged without changing anything
    pub dry_run: bool,
}

/// Run the combine command
pub async fn run_combine_command(options: CombineOptions) -> Result<()> {
    let mut config = Config::load(&options.config_path)?;
    if let Some(path) = options.working_directory {
        config.working_directory = path;
    }
    if options.no_metadata {
        config.generate_metadata = false;
        for target in &mut config.repositories {
            target.generate_metadata = Some(false);
        }
    }

    if !config.working_directory.is_dir() {
        return Err(Error::Config(format!(
            "working directory {} does not exist",
            config.working_directory.display()
        )));
    }

    let make_platform = |target: &RepositoryTarget| create_platform_service(target, &config);

    if options.dry_run {
        let plans = plan_combine(&config, make_platform).await?;
        print_plans(&plans);
        return Ok(());
    }

    let invocation_dir = std::env::current_dir()?;
    let report = run_combine(
        &config,
        &ProcessExecutor,
        make_platform,
        RunContext::from_env(),
        &invocation_dir,
    )
    .await?;
    print_summary(&report);
    Ok(())
}

/// Print the plans for --dry-run
fn print_plans(plans: &[MergePlan]) {
    println!("{}:", "Merge plan".emphasis());
    println!();

    for plan in plans {
        println!("  {}", plan.repository.accent());
        if plan.is_empty() {
            println!("    {}", "No labeled PRs".muted());
            continue;
        }
        for step in &plan.steps {
            println!("    {} {}", arrow(), step);
        }
    }

    println!();
    println!("{}", "Run without --dry-run to execute.".muted());
}

/// Print the run summary
fn print_summary(report: &RunReport) {
    println!();
    for repository in &report.repositories {
        if repository.merged.is_empty() {
            println!("  {} {}", repository.repository.accent(), "nothing to merge".muted());
        } else {
            let numbers: Vec<String> = repository.merged.iter().map(|n| format!("#{n}")).collect();
            println!("  {} {}", repository.repository.accent(), numbers.join(", "));
        }
    }

    println!(
        "{} {} PR(s) merged across {} repository(ies)",
        format!("{CHECK} Combine complete:").success(),
        report.merged_count().accent(),
        report.repositories.len().accent()
    );
    if let Some(path) = &report.metadata_path {
        println!("   Metadata: {}", path.display().accent());
    }
}
