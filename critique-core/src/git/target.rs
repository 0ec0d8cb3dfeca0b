//! Diff target parsing

use serde::{Deserialize, Serialize};

/// What to diff when gathering changes for a review
///
/// The symbolic targets map to `git diff --staged` and `git diff`; anything
/// else is passed through as a ref expression (e.g. `HEAD~1`, `main..topic`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DiffTarget {
    /// Staged changes (`git diff --staged`)
    Staged,
    /// Working-tree changes (`git diff`)
    Unstaged,
    /// An arbitrary git ref or range expression
    Ref(String),
}

impl Default for DiffTarget {
    fn default() -> Self {
        DiffTarget::Staged
    }
}

impl DiffTarget {
    /// Parse a target from its textual form
    ///
    /// `"staged"` and `"unstaged"` are symbolic; everything else is treated
    /// as a ref expression.
    pub fn parse(s: &str) -> Self {
        match s {
            "staged" => DiffTarget::Staged,
            "unstaged" => DiffTarget::Unstaged,
            other => DiffTarget::Ref(other.to_string()),
        }
    }

    /// The `git diff` arguments selecting this target
    pub fn diff_args(&self) -> Vec<String> {
        match self {
            DiffTarget::Staged => vec!["diff".to_string(), "--staged".to_string()],
            DiffTarget::Unstaged => vec!["diff".to_string()],
            DiffTarget::Ref(r) => vec!["diff".to_string(), r.clone()],
        }
    }
}

impl std::fmt::Display for DiffTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DiffTarget::Staged => write!(f, "staged"),
            DiffTarget::Unstaged => write!(f, "unstaged"),
            DiffTarget::Ref(r) => write!(f, "{}", r),
        }
    }
}

impl From<&str> for DiffTarget {
    fn from(s: &str) -> Self {
        DiffTarget::parse(s)
    }
}
