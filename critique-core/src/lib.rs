//! Critique Core - agent-orchestrated code review
//!
//! This crate assembles contextual artifacts (diffs, linked files, planning
//! documents), hands them to a remote model, and drives a bounded
//! tool-calling conversation until the model produces a review.

pub mod artifact;
pub mod config;
pub mod error;
pub mod git;
pub mod llm;
pub mod review;
pub mod secrets;
pub mod tools;

pub use config::Config;
pub use error::{Error, Result};
pub use git::DiffTarget;
pub use review::{review_with_context, ReviewOutcome, ReviewRequest};
pub use secrets::Secrets;
