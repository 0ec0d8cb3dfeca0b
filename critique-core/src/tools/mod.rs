//! Capability set exposed to the remote model
//!
//! The model can request diffs, read files, and list directories while it
//! builds its review. The registry is fixed at construction - capabilities
//! are never registered at runtime, keeping the set auditable.
//!
//! Security posture: the model may read anything reachable from the working
//! directory, and explicit absolute paths are honored as-is. The system
//! trusts the invoking environment; there is no sandbox here.

mod registry;

pub use registry::ToolRegistry;

use serde_json::Value;

/// A structured invocation request produced by the model
#[derive(Debug, Clone)]
pub struct ToolCall {
    /// Correlation id assigned by the model
    pub id: String,
    /// Registered capability name
    pub name: String,
    /// Parsed arguments object
    pub arguments: Value,
}

/// The outcome of a tool invocation
///
/// Always produced, even on failure, so the conversation can continue.
#[derive(Debug, Clone)]
pub struct ToolResult {
    /// The originating call's id
    pub call_id: String,
    /// Result text (or a failure description)
    pub content: String,
    /// True when the invocation failed
    pub is_error: bool,
}

impl ToolResult {
    /// A successful result
    pub fn ok(call_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            call_id: call_id.into(),
            content: content.into(),
            is_error: false,
        }
    }

    /// A failed result with a descriptive message
    pub fn error(call_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            call_id: call_id.into(),
            content: message.into(),
            is_error: true,
        }
    }
}
