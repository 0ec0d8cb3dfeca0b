//! Review request data model and prompt composition
//!
//! A `ReviewRequest` captures everything the caller wants reviewed. It is
//! immutable once built; the orchestrator derives the initial conversation
//! from it plus the resolved artifacts and pre-fetched diff.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::artifact::ResolvedArtifacts;
use crate::git::DiffTarget;

/// System prompt for the reviewer conversation
pub const SYSTEM_PROMPT: &str = "You are a Senior Code Reviewer with access to tools.

Your job is to review code changes. You have access to these tools:
- get_uncommitted_changes: Get git diffs (staged, unstaged, or vs specific refs)
- read_files: Read multiple source files at once (efficient - use this to batch file reads)
- list_changed_files: See which files have been modified
- list_directory: Explore the project layout

The user will provide you with context about what to review. Use your tools
to gather any additional information you need. Be efficient - batch file reads together.

REVIEW FOCUS:
1. Does the code match the stated intent (if provided)?
2. Are there logic errors, bugs, or security risks?
3. Any missed requirements?
4. Does it follow best practices?

Be concise but thorough. Ignore minor style issues.";

/// A code-change review request
///
/// Construct with [`ReviewRequest::new`] and the `with_*` methods, in the
/// builder style used throughout this crate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewRequest {
    /// What to diff
    pub diff_target: DiffTarget,
    /// Extra planning/context documents to load alongside the well-known ones
    pub context_files: Vec<PathBuf>,
    /// Files to bias the review toward; when set, only their diffs are pre-fetched
    pub focus_files: Vec<PathBuf>,
    /// What the change is trying to accomplish
    pub task_description: Option<String>,
    /// The review's working directory
    pub workdir: PathBuf,
}

impl ReviewRequest {
    /// Create a request for the given working directory with defaults
    pub fn new(workdir: impl Into<PathBuf>) -> Self {
        Self {
            diff_target: DiffTarget::default(),
            context_files: Vec::new(),
            focus_files: Vec::new(),
            task_description: None,
            workdir: workdir.into(),
        }
    }

    /// Set the diff target
    pub fn with_diff_target(mut self, target: DiffTarget) -> Self {
        self.diff_target = target;
        self
    }

    /// Set the extra context files
    pub fn with_context_files(mut self, files: Vec<PathBuf>) -> Self {
        self.context_files = files;
        self
    }

    /// Set the focus files
    pub fn with_focus_files(mut self, files: Vec<PathBuf>) -> Self {
        self.focus_files = files;
        self
    }

    /// Set the task description
    pub fn with_task_description(mut self, task: impl Into<String>) -> Self {
        let task = task.into();
        self.task_description = if task.is_empty() { None } else { Some(task) };
        self
    }

    /// Compose the initial user turn from the request plus gathered context
    ///
    /// Sections with nothing to show are omitted; with no sections at all
    /// the message asks the model to use its tools instead.
    pub fn to_initial_prompt(
        &self,
        artifacts: &ResolvedArtifacts,
        files_to_review: &[String],
        diff: &str,
    ) -> String {
        let mut sections = Vec::new();

        if let Some(ref task) = self.task_description {
            sections.push(format!("## Task Description\n{}", task));
        }

        let artifact_section = artifacts.to_prompt_section();
        if !artifact_section.trim().is_empty() {
            sections.push(format!("## Project Artifacts\n{}", artifact_section));
        }

        if !files_to_review.is_empty() {
            sections.push(format!("## Files to Review\n{}", files_to_review.join("\n")));
        }

        if !diff.trim().is_empty() {
            sections.push(format!(
                "## Git Diff ({})\n```diff\n{}\n```",
                self.diff_target, diff
            ));
        }

        if sections.is_empty() {
            return "Please review the current code changes. Use list_changed_files and \
                    get_uncommitted_changes to see what's been modified."
                .to_string();
        }

        let mut message = format!("Please review the following:\n\n{}", sections.join("\n\n"));
        message.push_str(
            "\n\n---\nProvide a thorough code review. Use your tools if you need more information.",
        );
        message
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifact::ResolvedArtifact;

    #[test]
    fn test_defaults() {
        let request = ReviewRequest::new("/srv/project");
        assert_eq!(request.diff_target, DiffTarget::Staged);
        assert!(request.context_files.is_empty());
        assert!(request.focus_files.is_empty());
        assert!(request.task_description.is_none());
    }

    #[test]
    fn test_empty_task_description_is_none() {
        let request = ReviewRequest::new("/srv/project").with_task_description("");
        assert!(request.task_description.is_none());
    }

    #[test]
    fn test_prompt_with_no_context_asks_for_tools() {
        let request = ReviewRequest::new("/srv/project");
        let prompt = request.to_initial_prompt(&ResolvedArtifacts::default(), &[], "");
        assert!(prompt.contains("list_changed_files"));
        assert!(prompt.contains("get_uncommitted_changes"));
    }

    #[test]
    fn test_prompt_includes_task_and_diff() {
        let request = ReviewRequest::new("/srv/project")
            .with_diff_target(DiffTarget::parse("HEAD~1"))
            .with_task_description("Add login");

        let prompt = request.to_initial_prompt(&ResolvedArtifacts::default(), &[], "+ fn login()");
        assert!(prompt.contains("## Task Description\nAdd login"));
        assert!(prompt.contains("## Git Diff (HEAD~1)"));
        assert!(prompt.contains("```diff\n+ fn login()"));
    }

    #[test]
    fn test_prompt_includes_artifacts_and_files() {
        let artifacts = ResolvedArtifacts {
            artifacts: vec![ResolvedArtifact {
                name: "task.md".to_string(),
                body: "Build the widget".to_string(),
            }],
            diff_paths: Vec::new(),
        };
        let request = ReviewRequest::new("/srv/project");

        let prompt =
            request.to_initial_prompt(&artifacts, &["src/widget.rs".to_string()], "");
        assert!(prompt.contains("## Project Artifacts"));
        assert!(prompt.contains("--- ARTIFACT: task.md ---"));
        assert!(prompt.contains("Build the widget"));
        assert!(prompt.contains("## Files to Review\nsrc/widget.rs"));
        assert!(!prompt.contains("## Git Diff"));
    }
}
