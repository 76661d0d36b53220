//! The conversational agent loop.
//!
//! One call to [`Agent::chat`] runs one user turn: the model either answers
//! directly or requests tool calls, which are executed in order and fed back
//! as observations before the model is consulted again. The loop is capped at
//! [`AgentConfig::max_tool_rounds`] model consultations; hitting the cap is an
//! error, not a silent fallback answer.
//!
//! [`Agent::chat_stream`] behaves identically until the model settles on a
//! final answer, then re-requests that answer as a token stream so the caller
//! can render it incrementally.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace, warn};

use crate::conversation::{Conversation, ToolCall, Turn};
use crate::error::AgentError;
use crate::llm::{ChatOpenAI, ModelClient, ModelResponse, DEFAULT_MODEL};
use crate::stream::TokenChunk;
use crate::tools::ToolRegistry;

/// System prompt used when the caller does not provide one.
pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a helpful AI assistant with access to a set of \
     tools. Use the tools whenever they would help you give a more accurate or useful answer. \
     Think step-by-step when solving problems.";

/// Upper bound on model consultations within a single user turn.
pub const DEFAULT_MAX_TOOL_ROUNDS: u32 = 10;

/// Construction parameters for [`Agent::new`].
#[derive(Debug, Clone)]
pub struct AgentConfig {
    pub model: String,
    pub api_key: String,
    pub system_prompt: String,
    pub max_tool_rounds: u32,
    pub temperature: Option<f32>,
    /// Alternate OpenAI-compatible endpoint.
    pub api_base: Option<String>,
}

impl AgentConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            api_key: api_key.into(),
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
            max_tool_rounds: DEFAULT_MAX_TOOL_ROUNDS,
            temperature: None,
            api_base: None,
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = prompt.into();
        self
    }

    pub fn with_max_tool_rounds(mut self, rounds: u32) -> Self {
        self.max_tool_rounds = rounds;
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = Some(api_base.into());
        self
    }
}

/// A single-model, tool-using conversational agent.
///
/// Owns the conversation history across turns; [`Agent::reset`] starts a
/// fresh conversation without touching the system prompt, which lives in the
/// model client.
pub struct Agent {
    client: Box<dyn ModelClient>,
    tools: Arc<ToolRegistry>,
    conversation: Conversation,
    max_tool_rounds: u32,
}

impl Agent {
    /// Builds an agent backed by the OpenAI client and the built-in tools.
    pub fn new(config: AgentConfig) -> Result<Self, AgentError> {
        if config.api_key.trim().is_empty() {
            return Err(AgentError::Configuration(
                "no API key provided; set OPENAI_API_KEY or pass one explicitly".to_string(),
            ));
        }
        let mut client = ChatOpenAI::new(config.api_key)
            .with_model(config.model)
            .with_system_prompt(config.system_prompt);
        if let Some(temperature) = config.temperature {
            client = client.with_temperature(temperature);
        }
        if let Some(api_base) = config.api_base {
            client = client.with_api_base(api_base);
        }
        let tools = ToolRegistry::builtin()
            .map_err(|e| AgentError::Configuration(format!("tool registry: {e}")))?;
        Ok(Self::from_client(Box::new(client), Arc::new(tools))
            .with_max_tool_rounds(config.max_tool_rounds))
    }

    /// Builds an agent from any model client and tool set.
    pub fn from_client(client: Box<dyn ModelClient>, tools: Arc<ToolRegistry>) -> Self {
        Self {
            client,
            tools,
            conversation: Conversation::new(),
            max_tool_rounds: DEFAULT_MAX_TOOL_ROUNDS,
        }
    }

    pub fn with_max_tool_rounds(mut self, rounds: u32) -> Self {
        self.max_tool_rounds = rounds;
        self
    }

    /// The full history accumulated so far.
    pub fn conversation(&self) -> &Conversation {
        &self.conversation
    }

    /// Clears the history. The next turn starts a fresh conversation.
    pub fn reset(&mut self) {
        debug!(turns = self.conversation.len(), "clearing conversation");
        self.conversation.clear();
    }

    /// Runs one user turn and returns the final answer.
    pub async fn chat(&mut self, text: &str) -> Result<String, AgentError> {
        self.chat_with_cancellation(text, CancellationToken::new()).await
    }

    /// Like [`Agent::chat`], aborting with [`AgentError::Cancelled`] when
    /// `cancel` fires between model consultations or tool calls.
    pub async fn chat_with_cancellation(
        &mut self,
        text: &str,
        cancel: CancellationToken,
    ) -> Result<String, AgentError> {
        self.run_turn(text, None, &cancel).await
    }

    /// Runs one user turn, delivering the final answer through `chunk_tx` as
    /// it streams, and returns the complete text.
    pub async fn chat_stream(
        &mut self,
        text: &str,
        chunk_tx: mpsc::Sender<TokenChunk>,
    ) -> Result<String, AgentError> {
        self.chat_stream_with_cancellation(text, chunk_tx, CancellationToken::new())
            .await
    }

    pub async fn chat_stream_with_cancellation(
        &mut self,
        text: &str,
        chunk_tx: mpsc::Sender<TokenChunk>,
        cancel: CancellationToken,
    ) -> Result<String, AgentError> {
        self.run_turn(text, Some(chunk_tx), &cancel).await
    }

    async fn run_turn(
        &mut self,
        text: &str,
        stream_tx: Option<mpsc::Sender<TokenChunk>>,
        cancel: &CancellationToken,
    ) -> Result<String, AgentError> {
        let specs = self.tools.specs();
        self.conversation.push(Turn::user(text));

        for round in 0..self.max_tool_rounds {
            if cancel.is_cancelled() {
                return Err(AgentError::Cancelled);
            }

            debug!(round, turns = self.conversation.len(), "consulting model");
            let response = self
                .client
                .complete(self.conversation.turns(), &specs)
                .await?;

            match response {
                ModelResponse::FinalAnswer(answer) => {
                    let answer = match stream_tx {
                        // Replay the terminal step as a stream against the
                        // history without the prefetched answer.
                        Some(ref tx) => self
                            .client
                            .complete_stream(self.conversation.turns(), &specs, tx.clone())
                            .await
                            .map_err(|e| AgentError::StreamInterrupted(e.to_string()))?,
                        None => answer,
                    };
                    self.conversation.push(Turn::assistant(answer.clone()));
                    return Ok(answer);
                }
                ModelResponse::ToolCalls(calls) => {
                    for call in calls {
                        if cancel.is_cancelled() {
                            return Err(AgentError::Cancelled);
                        }
                        self.execute_tool_call(call);
                    }
                }
            }
        }

        Err(AgentError::MaxIterationsExceeded {
            limit: self.max_tool_rounds,
        })
    }

    /// Runs one tool call and records both the call and its observation.
    ///
    /// Tool failures never abort the turn; they become `Error: ...`
    /// observations the model can react to.
    fn execute_tool_call(&mut self, call: ToolCall) {
        let call_id = call.id.clone();
        let name = call.name.clone();
        let arguments = call.arguments.clone();
        self.conversation.push(Turn::tool_call(call));

        debug!(tool = %name, args = ?arguments, "calling tool");
        let content = match self.tools.invoke(&name, &arguments) {
            Ok(result) => {
                trace!(
                    tool = %name,
                    result_len = result.len(),
                    result_preview = %truncate_for_log(&result, 200),
                    "tool returned"
                );
                result
            }
            Err(e) => {
                warn!(tool = %name, error = %e, "tool call failed");
                format!("Error: {e}")
            }
        };
        self.conversation.push(Turn::observation(call_id, name, content));
    }
}

fn truncate_for_log(s: &str, max_len: usize) -> String {
    if s.len() <= max_len {
        s.to_string()
    } else {
        format!("{}...", s.chars().take(max_len).collect::<String>())
    }
}
