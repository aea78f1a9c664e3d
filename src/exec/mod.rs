//! External command execution
//!
//! The VCS tool is only ever consumed as "a command run with arguments in a
//! working directory". [`CommandExecutor`] is that seam; [`run_with_retry`]
//! layers bounded retries with backoff on top of it.

mod retry;

pub use retry::{RetryPolicy, run_once, run_with_retry};

use crate::types::CommandOutput;
use async_trait::async_trait;
use std::path::Path;
use tokio::process::Command;
use tracing::trace;
use url::Url;

/// Runs a program and captures its output
///
/// `Err` means the process could not be launched at all. A process that ran
/// and exited non-zero is an `Ok` with a failing [`CommandOutput`].
#[async_trait]
pub trait CommandExecutor: Send + Sync {
    /// Execute `program args...` in `cwd`
    async fn execute(
        &self,
        program: &str,
        args: &[String],
        cwd: &Path,
    ) -> std::io::Result<CommandOutput>;
}

/// Executor backed by `tokio::process`
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessExecutor;

#[async_trait]
impl CommandExecutor for ProcessExecutor {
    async fn execute(
        &self,
        program: &str,
        args: &[String],
        cwd: &Path,
    ) -> std::io::Result<CommandOutput> {
        let output = Command::new(program)
            .args(args)
            .current_dir(cwd)
            .env("GIT_TERMINAL_PROMPT", "0")
            .kill_on_drop(true)
            .output()
            .await?;

        let result = CommandOutput {
            exit_code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        };
        trace!(program, exit_code = ?result.exit_code, "command finished");
        Ok(result)
    }
}

/// Render a command line for logs, hiding credentials embedded in URLs
pub fn display_command(program: &str, args: &[String]) -> String {
    std::iter::once(program.to_string())
        .chain(args.iter().map(|a| redact_credentials(a)))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Replace the userinfo part of a URL argument with `***`
///
/// Arguments that are not URLs, or URLs without credentials, are returned as-is.
pub fn redact_credentials(arg: &str) -> String {
    let Ok(mut url) = Url::parse(arg) else {
        return arg.to_string();
    };
    if url.username().is_empty() && url.password().is_none() {
        return arg.to_string();
    }
    // Only fails for cannot-be-a-base URLs, which never carry userinfo
    let _ = url.set_username("***");
    let _ = url.set_password(None);
    url.to_string()
}
