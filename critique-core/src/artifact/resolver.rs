//! Recursive artifact resolution with cycle detection

use std::collections::HashSet;
use std::future::Future;
use std::ops::Range;
use std::path::{Path, PathBuf};
use std::pin::Pin;

use tracing::{debug, info};

use crate::git::{DiffProvider, DiffTarget};

use super::links::{FILE_LINK_RE, RENDER_DIFF_RE};
use super::{normalize_uri_path, parse_file_links};

/// Well-known planning documents, loaded in this order when present
pub const WELL_KNOWN_ARTIFACTS: &[&str] = &["implementation_plan.md", "task.md", "walkthrough.md"];

/// Inlined content larger than this is truncated
const MAX_INLINE_BYTES: usize = 50_000;

/// A planning document with all embedded references rewritten to literal text
#[derive(Debug, Clone)]
pub struct ResolvedArtifact {
    /// The artifact's filename (e.g. `implementation_plan.md`)
    pub name: String,
    /// The fully resolved document body
    pub body: String,
}

/// The output of a resolution pass over the working directory
#[derive(Debug, Clone, Default)]
pub struct ResolvedArtifacts {
    /// Resolved documents, in well-known order then caller order
    pub artifacts: Vec<ResolvedArtifact>,
    /// Paths named by diff-render directives across all artifacts
    pub diff_paths: Vec<PathBuf>,
}

impl ResolvedArtifacts {
    /// True if no artifacts were found
    pub fn is_empty(&self) -> bool {
        self.artifacts.is_empty()
    }

    /// Render all artifacts as a prompt section
    pub fn to_prompt_section(&self) -> String {
        let mut out = String::new();
        for artifact in &self.artifacts {
            out.push_str(&format!("\n\n--- ARTIFACT: {} ---\n{}", artifact.name, artifact.body));
        }
        out
    }
}

/// Loads planning documents and rewrites their embedded references
///
/// Resolution always succeeds: unreadable files and unavailable diffs are
/// substituted with inline placeholders, never propagated as errors.
pub struct ArtifactResolver<'a> {
    diff_provider: &'a dyn DiffProvider,
    target: DiffTarget,
    workdir: PathBuf,
}

impl<'a> ArtifactResolver<'a> {
    /// Create a resolver rooted at the given working directory
    pub fn new(
        diff_provider: &'a dyn DiffProvider,
        target: DiffTarget,
        workdir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            diff_provider,
            target,
            workdir: workdir.into(),
        }
    }

    /// Load and resolve the well-known artifacts plus any caller-supplied
    /// context files
    ///
    /// Missing files are silently skipped. Each file is read at most once,
    /// even if listed twice.
    pub async fn resolve(&self, context_files: &[PathBuf]) -> ResolvedArtifacts {
        let mut seen: HashSet<PathBuf> = HashSet::new();
        let mut resolved = ResolvedArtifacts::default();

        let paths: Vec<PathBuf> = WELL_KNOWN_ARTIFACTS
            .iter()
            .map(|name| self.workdir.join(name))
            .chain(context_files.iter().map(|p| self.absolutize(p)))
            .collect();

        for path in paths {
            let key = canonical_key(&path);
            if !seen.insert(key.clone()) {
                continue;
            }

            let content = match tokio::fs::read_to_string(&path).await {
                Ok(c) => c,
                // Absence is not an error
                Err(_) => continue,
            };

            let name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| path.display().to_string());
            info!(artifact = %name, "Loaded artifact");

            let (diff_paths, _) = parse_file_links(&content);
            resolved.diff_paths.extend(diff_paths);

            let mut stack = vec![key];
            let body = self.resolve_body(&content, &mut stack).await;
            resolved.artifacts.push(ResolvedArtifact { name, body });
        }

        resolved
    }

    /// Rewrite one document body, replacing references with literal text
    ///
    /// References are scanned from the raw document only and substituted
    /// left-to-right in a single pass, so text introduced by a substitution
    /// (e.g. a link-shaped line inside inlined diff output) is never
    /// rescanned. Linked content is itself resolved recursively; a path
    /// already on the resolution stack becomes a cycle marker instead.
    fn resolve_body<'s>(
        &'s self,
        text: &'s str,
        stack: &'s mut Vec<PathBuf>,
    ) -> Pin<Box<dyn Future<Output = String> + Send + 's>> {
        Box::pin(async move {
            let mut refs: Vec<(Range<usize>, RefKind)> = Vec::new();
            for caps in RENDER_DIFF_RE.captures_iter(text) {
                let Some(whole) = caps.get(0) else { continue };
                refs.push((
                    whole.range(),
                    RefKind::Diff(normalize_uri_path(caps[1].trim())),
                ));
            }
            for caps in FILE_LINK_RE.captures_iter(text) {
                let Some(whole) = caps.get(0) else { continue };
                let path = self.absolutize(&normalize_uri_path(caps[2].trim()));
                refs.push((whole.range(), RefKind::Link(path)));
            }
            refs.sort_by_key(|(range, _)| range.start);

            let mut out = String::with_capacity(text.len());
            let mut last = 0;

            for (range, kind) in refs {
                // Overlapping match already consumed
                if range.start < last {
                    continue;
                }
                out.push_str(&text[last..range.start]);

                match kind {
                    RefKind::Diff(path) => {
                        let diff = self
                            .diff_provider
                            .scoped_diff(&[path.clone()], &self.target, &self.workdir)
                            .await;
                        if diff.trim().is_empty() {
                            out.push_str(&format!("(No changes in {})", path.display()));
                        } else {
                            out.push_str(&format!("```diff\n{}\n```", diff));
                        }
                    }
                    RefKind::Link(path) => {
                        let key = canonical_key(&path);
                        if stack.contains(&key) {
                            debug!(path = %path.display(), "Cycle in file links");
                            out.push_str(&format!("(Cycle detected: {})", path.display()));
                        } else {
                            match tokio::fs::read_to_string(&path).await {
                                Ok(content) => {
                                    let content = truncate_inline(content);
                                    stack.push(key);
                                    let resolved = self.resolve_body(&content, stack).await;
                                    stack.pop();
                                    out.push_str(&format!(
                                        "\n--- LINKED FILE: {} ---\n{}\n--- END LINKED FILE ---\n",
                                        path.display(),
                                        resolved
                                    ));
                                }
                                Err(_) => {
                                    out.push_str(&format!(
                                        "(Linked file not found: {})",
                                        path.display()
                                    ));
                                }
                            }
                        }
                    }
                }

                last = range.end;
            }

            out.push_str(&text[last..]);
            out
        })
    }

    /// Resolve a reference against the working directory
    ///
    /// Explicit absolute paths are honored as-is: the system trusts the
    /// invoking environment to decide what it may read.
    fn absolutize(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.workdir.join(path)
        }
    }
}

/// A reference found in raw document text
enum RefKind {
    Diff(PathBuf),
    Link(PathBuf),
}

/// Stable identity for cycle detection and dedup
fn canonical_key(path: &Path) -> PathBuf {
    path.canonicalize().unwrap_or_else(|_| path.to_path_buf())
}

/// Truncate oversized inline content at a char boundary
fn truncate_inline(mut content: String) -> String {
    if content.len() > MAX_INLINE_BYTES {
        let mut idx = MAX_INLINE_BYTES;
        while !content.is_char_boundary(idx) {
            idx -= 1;
        }
        content.truncate(idx);
        content.push_str("\n\n... [TRUNCATED] ...");
    }
    content
}
