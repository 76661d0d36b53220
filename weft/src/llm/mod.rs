//! Model client abstraction for the agent loop.
//!
//! The agent depends on a callable that reads the conversation and decides
//! between answering and calling tools; this module defines that trait, the
//! OpenAI-backed implementation and a scriptable mock.
//!
//! # Streaming
//!
//! [`ModelClient::complete_stream`] delivers the reply incrementally through
//! an [`mpsc::Sender`] of [`TokenChunk`]s and returns the reassembled text.
//! It is only ever asked for a text answer; the agent resolves tool calls
//! through [`ModelClient::complete`] first.

mod mock;
mod openai;

pub use mock::MockModel;
pub use openai::{ChatOpenAI, DEFAULT_MODEL};

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::conversation::{ToolCall, Turn};
use crate::error::OracleError;
use crate::stream::TokenChunk;
use crate::tools::ToolSpec;

/// What the model decided for the current round.
///
/// Exactly one of the two: a terminal text answer, or a batch of tool calls
/// to execute before consulting the model again.
#[derive(Debug, Clone, PartialEq)]
pub enum ModelResponse {
    /// The model answered directly; the turn is over.
    FinalAnswer(String),
    /// The model wants these tools run, in order.
    ToolCalls(Vec<ToolCall>),
}

/// Chat model client: given the conversation and the available tools, returns
/// the model's decision for this round.
///
/// Implementations: [`ChatOpenAI`] (real API) and [`MockModel`] (scripted).
#[async_trait]
pub trait ModelClient: Send + Sync {
    /// One completion round over the full history.
    async fn complete(
        &self,
        turns: &[Turn],
        tools: &[ToolSpec],
    ) -> Result<ModelResponse, OracleError>;

    /// Streams a text answer chunk by chunk and returns the complete text.
    ///
    /// The provider is constrained to plain text here, so a well-behaved
    /// implementation never yields tool calls from this path.
    ///
    /// Default implementation calls [`ModelClient::complete`] and forwards the
    /// answer as a single chunk.
    async fn complete_stream(
        &self,
        turns: &[Turn],
        tools: &[ToolSpec],
        chunk_tx: mpsc::Sender<TokenChunk>,
    ) -> Result<String, OracleError> {
        match self.complete(turns, tools).await? {
            ModelResponse::FinalAnswer(text) => {
                if !text.is_empty() {
                    let _ = chunk_tx.send(TokenChunk::new(text.clone())).await;
                }
                Ok(text)
            }
            ModelResponse::ToolCalls(_) => Err(OracleError::MalformedResponse(
                "expected a text answer from the streaming call, got tool calls".to_string(),
            )),
        }
    }
}
