//! Review orchestration
//!
//! [`review_with_context`] is the single operation the transport surface
//! exposes: it wires the git diff provider, the tool registry and the HTTP
//! model client together and drives one bounded review conversation.

mod orchestrator;
mod request;

pub use orchestrator::{ReviewOrchestrator, ReviewOutcome, INCOMPLETE_MARKER};
pub use request::{ReviewRequest, SYSTEM_PROMPT};

use std::sync::Arc;

use crate::config::Config;
use crate::git::{DiffProvider, GitDiffProvider};
use crate::llm::HttpModelClient;
use crate::secrets::Secrets;
use crate::tools::ToolRegistry;
use crate::{Error, Result};

/// Review code changes against project context
///
/// Resolves planning artifacts and the requested diff, then lets the remote
/// model gather anything further through its tools. Returns the review text;
/// an exhausted iteration budget yields a result marked incomplete rather
/// than an error.
pub async fn review_with_context(
    request: &ReviewRequest,
    config: &Config,
    secrets: &Secrets,
) -> Result<ReviewOutcome> {
    let api_key = secrets.api_key().ok_or_else(|| {
        Error::Config(
            "API key not found. Set CRITIQUE_API_KEY or add it to \
             ~/.config/critique/secrets.toml"
                .to_string(),
        )
    })?;

    let client = HttpModelClient::new(&config.model.base_url, &config.model.model, api_key);
    let diff_provider: Arc<dyn DiffProvider> = Arc::new(GitDiffProvider::new());
    let registry = Arc::new(ToolRegistry::new(
        Arc::clone(&diff_provider),
        request.diff_target.clone(),
    ));

    let orchestrator = ReviewOrchestrator::new(
        &client,
        registry,
        diff_provider,
        config.model.max_iterations,
    );
    orchestrator.run(request).await
}
