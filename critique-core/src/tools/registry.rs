//! The fixed capability registry and its dispatch boundary
//!
//! All failures raised by an underlying operation are converted to
//! error-flagged [`ToolResult`]s at this boundary; no invocation can
//! terminate the orchestration loop.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde_json::{json, Value};
use tracing::debug;

use crate::git::{DiffProvider, DiffTarget};

use super::{ToolCall, ToolResult};

/// Inlined file content larger than this is truncated
const MAX_FILE_BYTES: usize = 50_000;

/// Dispatches model tool calls against the working directory
///
/// The capability set is fixed at construction. Concurrent calls within one
/// model turn observe live filesystem state; every registered capability is
/// a read, so interleaving is benign.
pub struct ToolRegistry {
    diff_provider: Arc<dyn DiffProvider>,
    default_target: DiffTarget,
}

impl std::fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolRegistry")
            .field("default_target", &self.default_target)
            .finish_non_exhaustive()
    }
}

impl ToolRegistry {
    /// Create a registry using the given diff provider and default target
    pub fn new(diff_provider: Arc<dyn DiffProvider>, default_target: DiffTarget) -> Self {
        Self {
            diff_provider,
            default_target,
        }
    }

    /// Tool declarations in chat-completions format
    pub fn declarations(&self) -> Vec<Value> {
        vec![
            json!({
                "type": "function",
                "function": {
                    "name": "get_uncommitted_changes",
                    "description": "Get git diff output for uncommitted changes. Use this to see what code has been modified.",
                    "parameters": {
                        "type": "object",
                        "properties": {
                            "target": {
                                "type": "string",
                                "description": "'staged' for staged changes, 'unstaged' for working tree changes, or a git ref like 'HEAD~1'",
                            }
                        },
                        "required": [],
                    },
                },
            }),
            json!({
                "type": "function",
                "function": {
                    "name": "read_files",
                    "description": "Read the contents of one or more files. You can request multiple files at once to be efficient.",
                    "parameters": {
                        "type": "object",
                        "properties": {
                            "paths": {
                                "type": "array",
                                "items": {"type": "string"},
                                "description": "List of file paths to read (absolute or relative to the working directory)",
                            }
                        },
                        "required": ["paths"],
                    },
                },
            }),
            json!({
                "type": "function",
                "function": {
                    "name": "list_changed_files",
                    "description": "List all files with uncommitted changes (staged + unstaged).",
                    "parameters": {
                        "type": "object",
                        "properties": {},
                        "required": [],
                    },
                },
            }),
            json!({
                "type": "function",
                "function": {
                    "name": "list_directory",
                    "description": "List the entries of a directory. Directories are suffixed with '/'.",
                    "parameters": {
                        "type": "object",
                        "properties": {
                            "path": {
                                "type": "string",
                                "description": "Directory to list (defaults to the working directory)",
                            }
                        },
                        "required": [],
                    },
                },
            }),
        ]
    }

    /// Execute a tool call and return its result
    ///
    /// Unknown names and malformed arguments produce error-flagged results,
    /// never failures.
    pub async fn invoke(&self, call: &ToolCall, workdir: &Path) -> ToolResult {
        debug!(tool = %call.name, id = %call.id, "Invoking tool");

        let args = match call.arguments.as_object() {
            Some(map) => map.clone(),
            None => {
                return ToolResult::error(
                    &call.id,
                    format!("Arguments for '{}' must be a JSON object", call.name),
                )
            }
        };

        match call.name.as_str() {
            "get_uncommitted_changes" => {
                let target = match args.get("target") {
                    Some(Value::String(s)) => DiffTarget::parse(s),
                    Some(other) => {
                        return ToolResult::error(
                            &call.id,
                            format!("'target' must be a string, got: {}", other),
                        )
                    }
                    None => self.default_target.clone(),
                };
                let diff = self.diff_provider.diff(&target, workdir).await;
                ToolResult::ok(&call.id, diff)
            }
            "read_files" => match args.get("paths").and_then(Value::as_array) {
                Some(paths) => {
                    let paths: Vec<String> = paths
                        .iter()
                        .filter_map(Value::as_str)
                        .map(String::from)
                        .collect();
                    ToolResult::ok(&call.id, read_files(&paths, workdir).await)
                }
                None => ToolResult::error(
                    &call.id,
                    "read_files requires a 'paths' array of strings".to_string(),
                ),
            },
            // Backwards-compatible single-file form
            "read_file" => match args.get("path").and_then(Value::as_str) {
                Some(path) => {
                    ToolResult::ok(&call.id, read_files(&[path.to_string()], workdir).await)
                }
                None => ToolResult::error(
                    &call.id,
                    "read_file requires a 'path' string".to_string(),
                ),
            },
            "list_changed_files" => {
                let files = self.diff_provider.changed_files(workdir).await;
                let content = if files.is_empty() {
                    "No changed files found.".to_string()
                } else {
                    files.join("\n")
                };
                ToolResult::ok(&call.id, content)
            }
            "list_directory" => {
                let path = args
                    .get("path")
                    .and_then(Value::as_str)
                    .map(|p| absolutize(workdir, Path::new(p)))
                    .unwrap_or_else(|| workdir.to_path_buf());
                match list_directory(&path).await {
                    Ok(listing) => ToolResult::ok(&call.id, listing),
                    Err(e) => ToolResult::error(
                        &call.id,
                        format!("Cannot list '{}': {}", path.display(), e),
                    ),
                }
            }
            unknown => ToolResult::error(&call.id, format!("Unknown tool: {}", unknown)),
        }
    }
}

/// Read multiple files and format them for the conversation
///
/// Per-file failures are reported inline as notes; the read as a whole
/// still succeeds so the model can adapt.
async fn read_files(paths: &[String], workdir: &Path) -> String {
    let mut out = String::new();
    for raw in paths {
        let path = absolutize(workdir, Path::new(raw));
        match tokio::fs::read_to_string(&path).await {
            Ok(mut content) => {
                if content.len() > MAX_FILE_BYTES {
                    let mut idx = MAX_FILE_BYTES;
                    while !content.is_char_boundary(idx) {
                        idx -= 1;
                    }
                    content.truncate(idx);
                    content.push_str("\n\n... [TRUNCATED] ...");
                }
                out.push_str(&format!("\n\n--- FILE: {} ---\n{}", raw, content));
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                out.push_str(&format!("\n\n(Note: File '{}' not found)\n", raw));
            }
            Err(e) => {
                out.push_str(&format!("\n\n(Error reading '{}': {})\n", raw, e));
            }
        }
    }
    out
}

/// List a directory's entries, one per line, directories suffixed with '/'
async fn list_directory(path: &Path) -> std::io::Result<String> {
    let mut entries = tokio::fs::read_dir(path).await?;
    let mut names = Vec::new();

    while let Some(entry) = entries.next_entry().await? {
        let mut name = entry.file_name().to_string_lossy().into_owned();
        if entry.file_type().await.map(|t| t.is_dir()).unwrap_or(false) {
            name.push('/');
        }
        names.push(name);
    }

    names.sort();
    Ok(names.join("\n"))
}

/// Resolve a path against the working directory
///
/// Explicit absolute paths are honored as-is (documented trust model).
fn absolutize(workdir: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        workdir.join(path)
    }
}
