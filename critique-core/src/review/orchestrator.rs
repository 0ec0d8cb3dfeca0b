//! The bounded review conversation loop
//!
//! The loop is an explicit state machine with the iteration counter as
//! first-class state, so the iteration ceiling is structurally enforced:
//! no code path can re-enter the model without passing the budget check.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::artifact::ArtifactResolver;
use crate::git::DiffProvider;
use crate::llm::{ChatMessage, ModelClient, ModelTurn};
use crate::tools::{ToolCall, ToolRegistry, ToolResult};
use crate::Result;

use super::request::{ReviewRequest, SYSTEM_PROMPT};

/// Returned when the iteration budget runs out before any assistant text
pub const INCOMPLETE_MARKER: &str = "Review incomplete: iteration limit reached.";

/// The outcome of a review
///
/// `complete` distinguishes a normal finish from iteration-budget
/// exhaustion, which is a degraded success rather than an error.
#[derive(Debug, Clone)]
pub struct ReviewOutcome {
    /// The review text
    pub text: String,
    /// False when the iteration budget ran out first
    pub complete: bool,
}

impl ReviewOutcome {
    fn finished(text: String) -> Self {
        Self {
            text,
            complete: true,
        }
    }

    fn incomplete(text: String) -> Self {
        Self {
            text,
            complete: false,
        }
    }
}

/// Conversation history plus loop bookkeeping, owned by one review run
#[derive(Debug)]
struct ConversationState {
    messages: Vec<ChatMessage>,
    iterations: u32,
    last_assistant_text: Option<String>,
}

impl ConversationState {
    fn new(messages: Vec<ChatMessage>) -> Self {
        Self {
            messages,
            iterations: 0,
            last_assistant_text: None,
        }
    }

    fn push(&mut self, message: ChatMessage) {
        if let ("assistant", Some(content)) = (message.role.as_str(), message.content.as_deref()) {
            if !content.trim().is_empty() {
                self.last_assistant_text = Some(content.to_string());
            }
        }
        self.messages.push(message);
    }

    /// The best available partial answer once the budget is exhausted
    fn degraded_outcome(&self) -> ReviewOutcome {
        ReviewOutcome::incomplete(
            self.last_assistant_text
                .clone()
                .unwrap_or_else(|| INCOMPLETE_MARKER.to_string()),
        )
    }
}

/// Loop phases; `Done` carries the outcome out of the machine
enum Phase {
    AwaitingModel,
    AwaitingTools(Vec<ToolCall>),
    Done(ReviewOutcome),
}

/// Drives the bounded model/tool conversation for one review at a time
pub struct ReviewOrchestrator<'a> {
    model: &'a dyn ModelClient,
    registry: Arc<ToolRegistry>,
    diff_provider: Arc<dyn DiffProvider>,
    max_iterations: u32,
}

impl<'a> ReviewOrchestrator<'a> {
    /// Create an orchestrator over the given collaborators
    pub fn new(
        model: &'a dyn ModelClient,
        registry: Arc<ToolRegistry>,
        diff_provider: Arc<dyn DiffProvider>,
        max_iterations: u32,
    ) -> Self {
        Self {
            model,
            registry,
            diff_provider,
            max_iterations,
        }
    }

    /// Run a review to completion
    ///
    /// Always returns review-shaped text unless the model transport itself is
    /// down: tool failures and budget exhaustion both produce an outcome.
    pub async fn run(&self, request: &ReviewRequest) -> Result<ReviewOutcome> {
        let resolver = ArtifactResolver::new(
            self.diff_provider.as_ref(),
            request.diff_target.clone(),
            &request.workdir,
        );
        let resolved = resolver.resolve(&request.context_files).await;
        info!(
            artifacts = resolved.artifacts.len(),
            "Artifacts loaded"
        );

        // Priority: focus files > files named by artifact diff directives >
        // nothing pre-fetched (the model gathers what it needs)
        let files_to_diff: Vec<PathBuf> = if !request.focus_files.is_empty() {
            request.focus_files.clone()
        } else {
            resolved.diff_paths.clone()
        };

        let (diff_content, files_list) = if files_to_diff.is_empty() {
            (String::new(), Vec::new())
        } else {
            let diff = self
                .diff_provider
                .scoped_diff(&files_to_diff, &request.diff_target, &request.workdir)
                .await;
            let names = files_to_diff
                .iter()
                .map(|p| p.display().to_string())
                .collect();
            (diff, names)
        };

        let mut state = ConversationState::new(vec![
            ChatMessage::system(SYSTEM_PROMPT),
            ChatMessage::user(request.to_initial_prompt(&resolved, &files_list, &diff_content)),
        ]);
        let declarations = self.registry.declarations();

        let mut phase = Phase::AwaitingModel;
        loop {
            phase = match phase {
                Phase::AwaitingModel => {
                    if state.iterations >= self.max_iterations {
                        warn!(
                            max_iterations = self.max_iterations,
                            "Iteration limit reached without a final answer"
                        );
                        Phase::Done(state.degraded_outcome())
                    } else {
                        info!(iteration = state.iterations + 1, "Calling model");
                        match self.model.complete(&state.messages, &declarations).await? {
                            ModelTurn::Answer(text) => {
                                state.push(ChatMessage::assistant(text.clone()));
                                info!("Review complete");
                                Phase::Done(ReviewOutcome::finished(text))
                            }
                            ModelTurn::ToolCalls { assistant, calls } => {
                                debug!(count = calls.len(), "Model requested tools");
                                state.push(assistant);
                                Phase::AwaitingTools(calls)
                            }
                        }
                    }
                }
                Phase::AwaitingTools(calls) => {
                    let results = self.execute_tools(calls, &request.workdir).await;
                    for result in results {
                        state.push(ChatMessage::tool(result.call_id, result.content));
                    }
                    state.iterations += 1;
                    Phase::AwaitingModel
                }
                Phase::Done(outcome) => return Ok(outcome),
            };
        }
    }

    /// Execute one turn's tool calls concurrently, reassembling results in
    /// the original call order
    ///
    /// The model correlates results by call identity, not arrival order, so
    /// the order of the returned vector must match `calls`.
    async fn execute_tools(&self, calls: Vec<ToolCall>, workdir: &Path) -> Vec<ToolResult> {
        let mut handles = Vec::with_capacity(calls.len());
        for call in calls {
            let registry = Arc::clone(&self.registry);
            let workdir = workdir.to_path_buf();
            let call_id = call.id.clone();
            let handle = tokio::spawn(async move { registry.invoke(&call, &workdir).await });
            handles.push((call_id, handle));
        }

        let mut results = Vec::with_capacity(handles.len());
        for (call_id, handle) in handles {
            match handle.await {
                Ok(result) => results.push(result),
                Err(e) => {
                    results.push(ToolResult::error(
                        call_id,
                        format!("Tool execution failed: {}", e),
                    ));
                }
            }
        }
        results
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::git::DiffTarget;
    use crate::{Error, Result};
    use async_trait::async_trait;
    use serde_json::Value;
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::time::Duration;

    /// Model that replays a scripted sequence of turns and records what it saw
    struct ScriptedModel {
        turns: Mutex<VecDeque<Result<ModelTurn>>>,
        seen: Mutex<Vec<Vec<ChatMessage>>>,
    }

    impl ScriptedModel {
        fn new(turns: Vec<Result<ModelTurn>>) -> Self {
            Self {
                turns: Mutex::new(turns.into()),
                seen: Mutex::new(Vec::new()),
            }
        }

        fn calls_made(&self) -> usize {
            self.seen.lock().unwrap().len()
        }

        fn conversation_at(&self, index: usize) -> Vec<ChatMessage> {
            self.seen.lock().unwrap()[index].clone()
        }
    }

    #[async_trait]
    impl ModelClient for ScriptedModel {
        async fn complete(&self, messages: &[ChatMessage], _tools: &[Value]) -> Result<ModelTurn> {
            self.seen.lock().unwrap().push(messages.to_vec());
            self.turns
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(Error::Transport("script exhausted".to_string())))
        }
    }

    /// Diff provider whose per-target delay makes completion order observable
    struct DelayedDiffProvider;

    #[async_trait]
    impl DiffProvider for DelayedDiffProvider {
        async fn diff(&self, target: &DiffTarget, _workdir: &Path) -> String {
            if let DiffTarget::Ref(r) = target {
                if r == "slow" {
                    tokio::time::sleep(Duration::from_millis(50)).await;
                }
            }
            format!("diff-for-{}", target)
        }

        async fn scoped_diff(
            &self,
            paths: &[PathBuf],
            _target: &DiffTarget,
            _workdir: &Path,
        ) -> String {
            paths
                .iter()
                .map(|p| format!("# Diff for: {}\n+changed", p.display()))
                .collect::<Vec<_>>()
                .join("\n\n")
        }

        async fn changed_files(&self, _workdir: &Path) -> Vec<String> {
            Vec::new()
        }
    }

    fn tool_calls_turn(calls: Vec<ToolCall>) -> ModelTurn {
        let payloads = calls
            .iter()
            .map(|c| crate::llm::ToolCallPayload {
                id: c.id.clone(),
                kind: "function".to_string(),
                function: crate::llm::FunctionCall {
                    name: c.name.clone(),
                    arguments: c.arguments.to_string(),
                },
            })
            .collect();
        ModelTurn::ToolCalls {
            assistant: ChatMessage::assistant_tool_calls(None, payloads),
            calls,
        }
    }

    fn call(id: &str, name: &str, arguments: Value) -> ToolCall {
        ToolCall {
            id: id.to_string(),
            name: name.to_string(),
            arguments,
        }
    }

    fn orchestrator<'a>(model: &'a ScriptedModel, max_iterations: u32) -> ReviewOrchestrator<'a> {
        let provider: Arc<dyn DiffProvider> = Arc::new(DelayedDiffProvider);
        let registry = Arc::new(ToolRegistry::new(
            Arc::clone(&provider),
            DiffTarget::Staged,
        ));
        ReviewOrchestrator::new(model, registry, provider, max_iterations)
    }

    #[tokio::test]
    async fn test_immediate_answer_returned_unchanged() {
        let dir = tempfile::tempdir().unwrap();
        let model = ScriptedModel::new(vec![Ok(ModelTurn::Answer("Ship it.".to_string()))]);
        let orch = orchestrator(&model, 10);

        let outcome = orch.run(&ReviewRequest::new(dir.path())).await.unwrap();
        assert!(outcome.complete);
        assert_eq!(outcome.text, "Ship it.");
        assert_eq!(model.calls_made(), 1);
    }

    #[tokio::test]
    async fn test_empty_request_initial_turn_shape() {
        // No context/focus files, no planning documents, empty task:
        // one system turn + one user turn asking the model to use tools
        let dir = tempfile::tempdir().unwrap();
        let model = ScriptedModel::new(vec![Ok(ModelTurn::Answer("ok".to_string()))]);
        let orch = orchestrator(&model, 10);

        orch.run(&ReviewRequest::new(dir.path())).await.unwrap();

        let conversation = model.conversation_at(0);
        assert_eq!(conversation.len(), 2);
        assert_eq!(conversation[0].role, "system");
        assert_eq!(conversation[1].role, "user");
        let user = conversation[1].content.as_deref().unwrap();
        assert!(user.contains("list_changed_files"));
        assert!(!user.contains("## Project Artifacts"));
    }

    #[tokio::test]
    async fn test_iteration_limit_bounds_model_turns() {
        let dir = tempfile::tempdir().unwrap();
        // Script far more tool-call turns than the budget allows
        let turns: Vec<Result<ModelTurn>> = (0..20)
            .map(|i| {
                Ok(tool_calls_turn(vec![call(
                    &format!("c{}", i),
                    "list_changed_files",
                    serde_json::json!({}),
                )]))
            })
            .collect();
        let model = ScriptedModel::new(turns);
        let orch = orchestrator(&model, 3);

        let outcome = orch.run(&ReviewRequest::new(dir.path())).await.unwrap();
        assert!(!outcome.complete);
        assert_eq!(outcome.text, INCOMPLETE_MARKER);
        assert_eq!(model.calls_made(), 3);
    }

    #[tokio::test]
    async fn test_iteration_limit_returns_last_assistant_text() {
        let dir = tempfile::tempdir().unwrap();
        let mut turn = tool_calls_turn(vec![call("c1", "list_changed_files", serde_json::json!({}))]);
        if let ModelTurn::ToolCalls { assistant, .. } = &mut turn {
            assistant.content = Some("Partial analysis so far".to_string());
        }
        let model = ScriptedModel::new(vec![Ok(turn)]);
        let orch = orchestrator(&model, 1);

        let outcome = orch.run(&ReviewRequest::new(dir.path())).await.unwrap();
        assert!(!outcome.complete);
        assert_eq!(outcome.text, "Partial analysis so far");
    }

    #[tokio::test]
    async fn test_tool_results_preserve_call_order() {
        let dir = tempfile::tempdir().unwrap();
        // The first call is slow, the second fast; results must still come
        // back in issue order
        let model = ScriptedModel::new(vec![
            Ok(tool_calls_turn(vec![
                call(
                    "c_slow",
                    "get_uncommitted_changes",
                    serde_json::json!({"target": "slow"}),
                ),
                call(
                    "c_fast",
                    "get_uncommitted_changes",
                    serde_json::json!({"target": "fast"}),
                ),
            ])),
            Ok(ModelTurn::Answer("done".to_string())),
        ]);
        let orch = orchestrator(&model, 10);

        orch.run(&ReviewRequest::new(dir.path())).await.unwrap();

        let conversation = model.conversation_at(1);
        let tool_messages: Vec<&ChatMessage> = conversation
            .iter()
            .filter(|m| m.role == "tool")
            .collect();
        assert_eq!(tool_messages.len(), 2);
        assert_eq!(tool_messages[0].tool_call_id.as_deref(), Some("c_slow"));
        assert_eq!(
            tool_messages[0].content.as_deref(),
            Some("diff-for-slow")
        );
        assert_eq!(tool_messages[1].tool_call_id.as_deref(), Some("c_fast"));
        assert_eq!(
            tool_messages[1].content.as_deref(),
            Some("diff-for-fast")
        );
    }

    #[tokio::test]
    async fn test_unknown_tool_continues_conversation() {
        let dir = tempfile::tempdir().unwrap();
        let model = ScriptedModel::new(vec![
            Ok(tool_calls_turn(vec![call(
                "c1",
                "no_such_tool",
                serde_json::json!({}),
            )])),
            Ok(ModelTurn::Answer("recovered".to_string())),
        ]);
        let orch = orchestrator(&model, 10);

        let outcome = orch.run(&ReviewRequest::new(dir.path())).await.unwrap();
        assert!(outcome.complete);
        assert_eq!(outcome.text, "recovered");
        // Exactly one tool round-trip happened
        assert_eq!(model.calls_made(), 2);

        let conversation = model.conversation_at(1);
        let tool_message = conversation.iter().find(|m| m.role == "tool").unwrap();
        assert!(tool_message
            .content
            .as_deref()
            .unwrap()
            .contains("Unknown tool"));
    }

    #[tokio::test]
    async fn test_transport_error_is_terminal() {
        let dir = tempfile::tempdir().unwrap();
        let model = ScriptedModel::new(vec![Err(Error::Transport("unreachable".to_string()))]);
        let orch = orchestrator(&model, 10);

        let result = orch.run(&ReviewRequest::new(dir.path())).await;
        assert!(matches!(result, Err(Error::Transport(_))));
    }

    #[tokio::test]
    async fn test_focus_files_prefetch_diff_into_initial_prompt() {
        let dir = tempfile::tempdir().unwrap();
        let model = ScriptedModel::new(vec![Ok(ModelTurn::Answer("ok".to_string()))]);
        let orch = orchestrator(&model, 10);

        let request = ReviewRequest::new(dir.path())
            .with_focus_files(vec![PathBuf::from("src/widget.rs")]);
        orch.run(&request).await.unwrap();

        let user = model.conversation_at(0)[1].content.clone().unwrap();
        assert!(user.contains("## Files to Review\nsrc/widget.rs"));
        assert!(user.contains("```diff"));
        assert!(user.contains("# Diff for: src/widget.rs"));
    }
}
