//! Scripted command executor for testing
//!
//! These are test utilities - not all may be used in every test binary.

#![allow(dead_code)]

use async_trait::async_trait;
use combine_prs::exec::CommandExecutor;
use combine_prs::types::CommandOutput;
use std::collections::VecDeque;
use std::io;
use std::path::Path;
use std::sync::Mutex;

/// One scripted reply
#[derive(Debug, Clone)]
pub enum Reply {
    /// The process ran and produced this output
    Output(CommandOutput),
    /// The process could not be launched
    LaunchError,
}

impl Reply {
    /// Exit 0 with `stdout`
    pub fn ok(stdout: &str) -> Self {
        Self::Output(CommandOutput::ok(stdout))
    }

    /// Exit `code` with `stderr`
    pub fn fail(code: i32, stderr: &str) -> Self {
        Self::Output(CommandOutput::failed(code, stderr))
    }
}

struct Rule {
    prefix: Vec<String>,
    replies: VecDeque<Reply>,
}

/// Executor that answers from a script and records every call
///
/// Rules match on an argument prefix; the most recently added matching rule
/// wins. A rule's replies are consumed in order and its last reply repeats.
/// Calls no rule matches succeed with empty output.
#[derive(Default)]
pub struct MockExecutor {
    rules: Mutex<Vec<Rule>>,
    calls: Mutex<Vec<Vec<String>>>,
}

impl MockExecutor {
    /// Create an executor where every command succeeds
    pub fn new() -> Self {
        Self::default()
    }

    /// Script the replies for commands whose args start with `prefix`
    pub fn on(&self, prefix: &[&str], replies: Vec<Reply>) {
        assert!(!replies.is_empty(), "a rule needs at least one reply");
        self.rules.lock().unwrap().push(Rule {
            prefix: prefix.iter().map(ToString::to_string).collect(),
            replies: replies.into(),
        });
    }

    /// Every call as `program args...`, in order
    pub fn calls(&self) -> Vec<Vec<String>> {
        self.calls.lock().unwrap().clone()
    }

    /// Calls whose args start with `prefix`
    pub fn calls_matching(&self, prefix: &[&str]) -> Vec<Vec<String>> {
        self.calls()
            .into_iter()
            .filter(|call| starts_with(&call[1..], prefix))
            .collect()
    }

    /// Position of the first call whose args start with `prefix`
    pub fn position(&self, prefix: &[&str]) -> Option<usize> {
        self.calls()
            .iter()
            .position(|call| starts_with(&call[1..], prefix))
    }
}

fn starts_with(args: &[String], prefix: &[impl AsRef<str>]) -> bool {
    args.len() >= prefix.len() && args.iter().zip(prefix).all(|(a, p)| a == p.as_ref())
}

#[async_trait]
impl CommandExecutor for MockExecutor {
    async fn execute(
        &self,
        program: &str,
        args: &[String],
        _cwd: &Path,
    ) -> io::Result<CommandOutput> {
        let mut call = vec![program.to_string()];
        call.extend(args.iter().cloned());
        self.calls.lock().unwrap().push(call);

        let reply = {
            let mut rules = self.rules.lock().unwrap();
            rules
                .iter_mut()
                .rev()
                .find(|rule| starts_with(args, &rule.prefix))
                .map(|rule| {
                    if rule.replies.len() > 1 {
                        rule.replies.pop_front().unwrap()
                    } else {
                        rule.replies[0].clone()
                    }
                })
        };

        match reply {
            None => Ok(CommandOutput::ok("")),
            Some(Reply::Output(output)) => Ok(output),
            Some(Reply::LaunchError) => Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("{program}: not found"),
            )),
        }
    }
}
