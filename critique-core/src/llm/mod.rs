//! Remote-model protocol and HTTP client
//!
//! The orchestrator talks to an OpenAI-compatible chat-completions endpoint.
//! The wire types live in [`protocol`]; the model seam is the [`ModelClient`]
//! trait so tests can drive the orchestrator with a scripted fake instead of
//! a network.

mod client;
mod protocol;

pub use client::{HttpModelClient, ModelClient, ModelTurn};
pub use protocol::{
    ChatMessage, ChatRequest, ChatResponse, Choice, FunctionCall, ResponseMessage, ToolCallPayload,
};
