//! combine-prs: merge labeled pull requests into a single working tree
//!
//! The engine discovers open PRs carrying a set of labels, fetches and merges them
//! one at a time (ascending PR number) into a shared checkout, reports conflicts
//! precisely and leaves the checkout clean, and records what was merged as a
//! build metadata document.

pub mod auth;
pub mod config;
pub mod discovery;
pub mod error;
pub mod exec;
pub mod git;
pub mod logging;
pub mod merge;
pub mod metadata;
pub mod platform;
pub mod run;
pub mod types;
