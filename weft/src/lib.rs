//! # Weft
//!
//! A single-agent conversational loop with tool calling, on top of the OpenAI
//! Chat Completions API. One model drives the whole turn: it either answers
//! the user directly or requests tool calls, the agent executes them and
//! feeds the observations back, and the cycle repeats until the model settles
//! on a final answer or the round cap trips.
//!
//! ## Design principles
//!
//! - **Strictly tagged decisions**: every model consultation yields either a
//!   [`ModelResponse::FinalAnswer`] or [`ModelResponse::ToolCalls`], never an
//!   ambiguous mix.
//! - **Typed history**: the [`Conversation`] records user text, tool calls,
//!   observations and assistant replies as distinct [`Turn`]s, append-only
//!   within a turn.
//! - **Total tool execution**: tool failures become `Error: ...` observations
//!   the model can read and correct, not crashes.
//! - **Streaming without divergence**: [`Agent::chat_stream`] resolves tool
//!   use exactly like [`Agent::chat`], then streams the terminal answer so
//!   chunk concatenation always equals the committed reply.
//!
//! ## Main modules
//!
//! - [`agent`]: [`Agent`] and [`AgentConfig`], the conversational loop.
//! - [`conversation`]: [`Conversation`], [`Turn`], [`ToolCall`], [`Observation`].
//! - [`llm`]: [`ModelClient`] trait, [`ChatOpenAI`], [`MockModel`].
//! - [`tools`]: [`Tool`] trait, [`ToolRegistry`] and the built-in tools
//!   (calculator, datetime, word count, text reversal).
//! - [`stream`]: [`TokenChunk`] for incremental replies.
//! - [`error`]: [`AgentError`], [`OracleError`], [`ToolError`].
//!
//! ## Quick start
//!
//! ```rust
//! use std::sync::Arc;
//! use weft::{Agent, MockModel, ToolRegistry};
//!
//! # #[tokio::main]
//! # async fn main() {
//! let model = MockModel::answering("Hello there!");
//! let tools = Arc::new(ToolRegistry::builtin().unwrap());
//! let mut agent = Agent::from_client(Box::new(model), tools);
//!
//! let reply = agent.chat("Say hello").await.unwrap();
//! assert_eq!(reply, "Hello there!");
//! # }
//! ```
//!
//! Swap [`MockModel`] for [`Agent::new`] with an [`AgentConfig`] to talk to
//! the real API.

pub mod agent;
pub mod conversation;
pub mod error;
pub mod llm;
pub mod stream;
pub mod tools;

pub use agent::{Agent, AgentConfig, DEFAULT_MAX_TOOL_ROUNDS, DEFAULT_SYSTEM_PROMPT};
pub use conversation::{Conversation, Observation, ToolCall, Turn};
pub use error::{AgentError, OracleError, ToolError};
pub use llm::{ChatOpenAI, MockModel, ModelClient, ModelResponse, DEFAULT_MODEL};
pub use stream::TokenChunk;
pub use tokio_util::sync::CancellationToken;
pub use tools::{
    ParamKind, ParamSpec, Tool, ToolRegistry, ToolSpec, TOOL_CALCULATOR, TOOL_COUNT_WORDS,
    TOOL_CURRENT_DATETIME, TOOL_REVERSE_TEXT,
};
