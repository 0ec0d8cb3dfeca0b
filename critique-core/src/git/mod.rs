//! Git operations for critique
//!
//! This module provides diff-target parsing and diff extraction for the
//! review pipeline. Diff text is produced by spawning `git` in the working
//! directory; repository detection uses libgit2 so "not a repository" is
//! reported without spawning anything.

mod diff;
mod target;

pub use diff::{DiffProvider, GitDiffProvider};
pub use target::DiffTarget;
