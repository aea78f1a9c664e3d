//! Bounded retries with exponential backoff and jitter

use super::{CommandExecutor, display_command};
use crate::error::{Error, Result};
use crate::types::CommandOutput;
use rand::Rng;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, warn};

/// Backoff settings shared by every retried command
///
/// The delay before retry `n` (0-based) is
/// `min(max_delay, base_delay * 2^n) + uniform(0, jitter)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Delay before the first retry, before jitter
    pub base_delay: Duration,
    /// Upper bound of the exponential part
    pub max_delay: Duration,
    /// Upper bound of the random component added to each delay
    pub jitter: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            base_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
            jitter: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    /// A policy that never sleeps (tests, dry runs)
    pub const fn immediate() -> Self {
        Self {
            base_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
            jitter: Duration::ZERO,
        }
    }

    /// Exponential part of the delay after failed attempt `attempt_index`
    pub fn backoff(&self, attempt_index: u32) -> Duration {
        let factor = 1u32.checked_shl(attempt_index).unwrap_or(u32::MAX);
        self.base_delay
            .checked_mul(factor)
            .map_or(self.max_delay, |d| d.min(self.max_delay))
    }

    /// Full delay including a fresh random jitter
    pub fn delay(&self, attempt_index: u32) -> Duration {
        let jitter_ms = u64::try_from(self.jitter.as_millis()).unwrap_or(u64::MAX);
        let extra = if jitter_ms == 0 {
            0
        } else {
            rand::thread_rng().gen_range(0..=jitter_ms)
        };
        self.backoff(attempt_index) + Duration::from_millis(extra)
    }
}

/// Run a command once, treating a non-zero exit as an error
pub async fn run_once(
    executor: &dyn CommandExecutor,
    program: &str,
    args: &[String],
    cwd: &Path,
) -> Result<CommandOutput> {
    run_with_retry(executor, program, args, cwd, 1, &RetryPolicy::immediate()).await
}

/// Run a command, retrying non-zero exits up to `max_attempts` times in total
///
/// A command that cannot be launched is not retried. When every attempt fails the
/// returned [`Error::CommandFailed`] lists each attempt's failure in order.
pub async fn run_with_retry(
    executor: &dyn CommandExecutor,
    program: &str,
    args: &[String],
    cwd: &Path,
    max_attempts: u32,
    policy: &RetryPolicy,
) -> Result<CommandOutput> {
    let max_attempts = max_attempts.max(1);
    let command = display_command(program, args);
    let mut failures = Vec::new();

    for attempt in 0..max_attempts {
        debug!(command = %command, attempt = attempt + 1, max_attempts, "running command");

        let output = executor
            .execute(program, args, cwd)
            .await
            .map_err(|source| Error::CommandLaunch {
                program: program.to_string(),
                source,
            })?;

        if output.success() {
            return Ok(output);
        }

        let summary = output.failure_summary();
        warn!(
            command = %command,
            attempt = attempt + 1,
            max_attempts,
            failure = %summary,
            "command failed"
        );
        failures.push(summary);

        if attempt + 1 < max_attempts {
            let delay = policy.delay(attempt);
            debug!(
                command = %command,
                attempt = attempt + 1,
                delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                "backing off before retry"
            );
            tokio::time::sleep(delay).await;
        }
    }

    Err(Error::CommandFailed {
        command,
        attempts: failures,
    })
}
