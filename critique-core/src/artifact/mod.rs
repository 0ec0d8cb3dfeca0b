//! Planning-artifact loading and reference resolution
//!
//! A review draws on planning documents checked into the working directory
//! (implementation plan, task note, walkthrough). These documents may embed
//! two reference forms:
//!
//! - `render_diffs(file:///path)` - inline the diff for that file
//! - `[label](file:///path)` - inline that file's content
//!
//! Resolution rewrites both forms into literal text. It never fails: a
//! missing file or unavailable diff becomes an inline placeholder so the
//! review always proceeds.

mod links;
mod resolver;

pub use links::{normalize_uri_path, parse_file_links};
pub use resolver::{ArtifactResolver, ResolvedArtifact, ResolvedArtifacts, WELL_KNOWN_ARTIFACTS};
