//! Merge engine for labeled PRs
//!
//! Three-phase pattern:
//! 1. Plan - order discovered PRs into `MergePlan` steps (pure, testable)
//! 2. Execute - fetch and merge each step into the working copy (effectful)
//! 3. Report - on a failed merge, diagnose conflicts and restore a clean tree

mod conflict;
mod execute;
mod plan;

pub use conflict::{conflicted_paths, report_conflict};
pub use execute::{MergeExecutionResult, execute_merge, prepare_remote};
pub use plan::{MergePlan, MergeStep, create_merge_plan};
