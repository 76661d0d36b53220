//! OpenAI Chat Completions client implementing [`ModelClient`].
//!
//! Renders the conversation into the provider's three-role protocol: tool
//! calls become assistant text and observations become user text, so the wire
//! format never needs tool-role messages. Tool specs are attached with
//! `tool_choice: auto` on the deciding call; the streaming call pins
//! `tool_choice: none` because it only ever replays a committed text answer.

use async_trait::async_trait;
use serde_json::{Map, Value};
use tokio::sync::mpsc;
use tokio_stream::StreamExt;
use tracing::{debug, trace, warn};

use crate::conversation::{ToolCall, Turn};
use crate::error::OracleError;
use crate::llm::{ModelClient, ModelResponse};
use crate::stream::TokenChunk;
use crate::tools::ToolSpec;

use async_openai::{
    config::OpenAIConfig,
    types::chat::{
        ChatCompletionMessageToolCalls, ChatCompletionRequestMessage,
        ChatCompletionRequestSystemMessage, ChatCompletionRequestUserMessage, ChatCompletionTool,
        ChatCompletionToolChoiceOption, ChatCompletionTools, CreateChatCompletionRequestArgs,
        FunctionObject, ToolChoiceOptions,
    },
    Client,
};

/// Model used when the caller does not pick one.
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

/// OpenAI Chat Completions client.
///
/// Holds the system prompt so the conversation history itself never needs a
/// system turn. Build with an explicit API key or a full [`OpenAIConfig`]
/// (custom base URL, proxy).
pub struct ChatOpenAI {
    config: OpenAIConfig,
    client: Client<OpenAIConfig>,
    model: String,
    system_prompt: String,
    temperature: Option<f32>,
}

impl ChatOpenAI {
    /// Builds a client for api.openai.com with the given key.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self::with_config(OpenAIConfig::new().with_api_key(api_key.into()))
    }

    /// Builds a client with custom config (e.g. custom API key or base URL).
    pub fn with_config(config: OpenAIConfig) -> Self {
        Self {
            client: Client::with_config(config.clone()),
            config,
            model: DEFAULT_MODEL.to_string(),
            system_prompt: String::new(),
            temperature: None,
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Sets the system prompt injected ahead of every request.
    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = prompt.into();
        self
    }

    /// Set temperature (0-2). Lower values are more deterministic.
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Points the client at an OpenAI-compatible base URL.
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.config = self.config.clone().with_api_base(api_base.into());
        self.client = Client::with_config(self.config.clone());
        self
    }

    /// Renders the system prompt and history as provider request messages.
    fn turns_to_request(&self, turns: &[Turn]) -> Vec<ChatCompletionRequestMessage> {
        let mut messages = Vec::with_capacity(turns.len() + 1);
        if !self.system_prompt.is_empty() {
            messages.push(ChatCompletionRequestMessage::System(
                ChatCompletionRequestSystemMessage::from(self.system_prompt.as_str()),
            ));
        }
        for turn in turns {
            messages.push(match turn {
                Turn::User { text } => ChatCompletionRequestMessage::User(
                    ChatCompletionRequestUserMessage::from(text.as_str()),
                ),
                Turn::Assistant { text } => {
                    ChatCompletionRequestMessage::Assistant((text.as_str()).into())
                }
                Turn::ToolCall(call) => {
                    let rendered = format!(
                        "Calling tool {} with arguments {}",
                        call.name,
                        Value::Object(call.arguments.clone())
                    );
                    ChatCompletionRequestMessage::Assistant((rendered.as_str()).into())
                }
                Turn::Observation(observation) => {
                    let rendered = format!(
                        "Tool {} returned: {}",
                        observation.tool_name, observation.content
                    );
                    ChatCompletionRequestMessage::User(ChatCompletionRequestUserMessage::from(
                        rendered.as_str(),
                    ))
                }
            });
        }
        messages
    }

    fn specs_to_tools(tools: &[ToolSpec]) -> Vec<ChatCompletionTools> {
        tools
            .iter()
            .map(|spec| {
                ChatCompletionTools::Function(ChatCompletionTool {
                    function: FunctionObject {
                        name: spec.name.clone(),
                        description: Some(spec.description.clone()),
                        parameters: Some(spec.input_schema()),
                        ..Default::default()
                    },
                })
            })
            .collect()
    }
}

/// Parses the provider's tool-call argument string into a JSON object.
///
/// Providers occasionally emit invalid JSON or double-encoded objects here.
/// Anything unusable degrades to an empty object; argument validation then
/// reports the missing arguments back to the model as a failure observation.
fn parse_arguments(raw: &str) -> Map<String, Value> {
    if raw.trim().is_empty() {
        return Map::new();
    }
    match serde_json::from_str::<Value>(raw) {
        Ok(Value::Object(map)) => map,
        Ok(Value::String(inner)) => match serde_json::from_str::<Value>(&inner) {
            Ok(Value::Object(map)) => map,
            _ => {
                warn!(arguments = %raw, "double-encoded tool arguments did not contain an object");
                Map::new()
            }
        },
        Ok(other) => {
            warn!(arguments = %other, "tool arguments are not a JSON object, ignoring");
            Map::new()
        }
        Err(e) => {
            warn!(error = %e, arguments = %raw, "tool arguments failed to parse, using empty object");
            Map::new()
        }
    }
}

#[async_trait]
impl ModelClient for ChatOpenAI {
    async fn complete(
        &self,
        turns: &[Turn],
        tools: &[ToolSpec],
    ) -> Result<ModelResponse, OracleError> {
        let messages = self.turns_to_request(turns);
        let mut args = CreateChatCompletionRequestArgs::default();
        args.model(self.model.clone());
        args.messages(messages);

        if !tools.is_empty() {
            args.tools(Self::specs_to_tools(tools));
            args.tool_choice(ChatCompletionToolChoiceOption::Mode(ToolChoiceOptions::Auto));
        }
        if let Some(t) = self.temperature {
            args.temperature(t);
        }

        let request = args
            .build()
            .map_err(|e| OracleError::Provider(format!("request build failed: {e}")))?;

        debug!(
            model = %self.model,
            turn_count = turns.len(),
            tools_count = tools.len(),
            temperature = ?self.temperature,
            "chat completion create"
        );
        if let Ok(js) = serde_json::to_string_pretty(&request) {
            trace!(request = %js, "chat completion request body");
        }

        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(|e| OracleError::Provider(e.to_string()))?;

        if let Ok(js) = serde_json::to_string_pretty(&response) {
            trace!(response = %js, "chat completion response body");
        }

        let choice = response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| OracleError::Provider("no choices in completion response".to_string()))?;
        let message = choice.message;

        let raw_calls = message.tool_calls.unwrap_or_default();
        if !raw_calls.is_empty() {
            if let Some(content) = message.content.as_deref() {
                if !content.is_empty() {
                    debug!(content = %content, "dropping assistant text that accompanied tool calls");
                }
            }
            let calls: Vec<ToolCall> = raw_calls
                .into_iter()
                .filter_map(|tc| {
                    if let ChatCompletionMessageToolCalls::Function(f) = tc {
                        Some(f)
                    } else {
                        None
                    }
                })
                .enumerate()
                .map(|(slot, f)| {
                    let id = if f.id.is_empty() {
                        format!("call-{}", slot + 1)
                    } else {
                        f.id
                    };
                    ToolCall {
                        id,
                        name: f.function.name,
                        arguments: parse_arguments(&f.function.arguments),
                    }
                })
                .collect();
            if calls.is_empty() {
                return Err(OracleError::MalformedResponse(
                    "tool calls present but none were readable".to_string(),
                ));
            }
            return Ok(ModelResponse::ToolCalls(calls));
        }

        match message.content {
            Some(text) => Ok(ModelResponse::FinalAnswer(text)),
            None => Err(OracleError::MalformedResponse(
                "response carried neither content nor tool calls".to_string(),
            )),
        }
    }

    /// Streams the terminal answer token by token.
    ///
    /// Tools stay attached so the model sees the same capabilities as the
    /// deciding call, but `tool_choice: none` forces a text reply.
    async fn complete_stream(
        &self,
        turns: &[Turn],
        tools: &[ToolSpec],
        chunk_tx: mpsc::Sender<TokenChunk>,
    ) -> Result<String, OracleError> {
        let messages = self.turns_to_request(turns);
        let mut args = CreateChatCompletionRequestArgs::default();
        args.model(self.model.clone());
        args.messages(messages);
        args.stream(true);

        if !tools.is_empty() {
            args.tools(Self::specs_to_tools(tools));
            args.tool_choice(ChatCompletionToolChoiceOption::Mode(ToolChoiceOptions::None));
        }
        if let Some(t) = self.temperature {
            args.temperature(t);
        }

        let request = args
            .build()
            .map_err(|e| OracleError::Provider(format!("request build failed: {e}")))?;

        debug!(
            model = %self.model,
            turn_count = turns.len(),
            tools_count = tools.len(),
            stream = true,
            "chat completion create_stream"
        );
        if let Ok(js) = serde_json::to_string_pretty(&request) {
            trace!(request = %js, "chat completion stream request body");
        }

        let mut stream = self
            .client
            .chat()
            .create_stream(request)
            .await
            .map_err(|e| OracleError::Provider(e.to_string()))?;

        let mut full_text = String::new();
        while let Some(result) = stream.next().await {
            let response = result.map_err(|e| OracleError::Provider(e.to_string()))?;
            for choice in response.choices {
                if let Some(ref content) = choice.delta.content {
                    if !content.is_empty() {
                        full_text.push_str(content);
                        // Ignore send errors; a dropped receiver only stops display.
                        let _ = chunk_tx.send(TokenChunk::new(content.clone())).await;
                    }
                }
            }
        }

        trace!(content = %full_text, "stream reassembled");
        Ok(full_text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::{ParamKind, ParamSpec};
    use serde_json::json;

    fn unreachable_client() -> ChatOpenAI {
        let config = OpenAIConfig::new()
            .with_api_key("test-key")
            .with_api_base("https://127.0.0.1:1");
        ChatOpenAI::with_config(config)
    }

    fn calculator_spec() -> ToolSpec {
        ToolSpec::new("calculator", "Evaluate a mathematical expression.").with_param(
            ParamSpec::required("expression", ParamKind::String, "Expression to evaluate."),
        )
    }

    /// **Scenario**: builder chain sets model, prompt and temperature without panicking.
    #[test]
    fn builder_chain_constructs_client() {
        let client = ChatOpenAI::new("test-key")
            .with_model("gpt-4o")
            .with_system_prompt("You are terse.")
            .with_temperature(0.2)
            .with_api_base("http://localhost:8080/v1");
        assert_eq!(client.model, "gpt-4o");
        assert_eq!(client.system_prompt, "You are terse.");
        assert_eq!(client.temperature, Some(0.2));
    }

    /// **Scenario**: the system prompt leads the request and history turns map to
    /// the three provider roles, with tool calls and observations as plain text.
    #[test]
    fn request_rendering_uses_three_roles_only() {
        let client = ChatOpenAI::new("test-key").with_system_prompt("Be helpful.");
        let arguments = json!({"expression": "2 + 2"}).as_object().cloned().unwrap();
        let turns = vec![
            Turn::user("What is 2 + 2?"),
            Turn::ToolCall(ToolCall {
                id: "call-1".to_string(),
                name: "calculator".to_string(),
                arguments,
            }),
            Turn::observation("call-1", "calculator", "4"),
            Turn::assistant("It is 4."),
        ];

        let messages = client.turns_to_request(&turns);
        assert_eq!(messages.len(), 5);
        assert!(matches!(messages[0], ChatCompletionRequestMessage::System(_)));
        assert!(matches!(messages[1], ChatCompletionRequestMessage::User(_)));
        assert!(matches!(messages[2], ChatCompletionRequestMessage::Assistant(_)));
        assert!(matches!(messages[3], ChatCompletionRequestMessage::User(_)));
        assert!(matches!(messages[4], ChatCompletionRequestMessage::Assistant(_)));

        let encoded = serde_json::to_string(&messages).unwrap();
        assert!(encoded.contains("Calling tool calculator with arguments"));
        assert!(encoded.contains("Tool calculator returned: 4"));
    }

    /// **Scenario**: without a system prompt no system message is rendered.
    #[test]
    fn empty_system_prompt_renders_no_system_message() {
        let client = ChatOpenAI::new("test-key");
        let messages = client.turns_to_request(&[Turn::user("hi")]);
        assert_eq!(messages.len(), 1);
        assert!(matches!(messages[0], ChatCompletionRequestMessage::User(_)));
    }

    /// **Scenario**: malformed argument payloads degrade to an empty object
    /// instead of failing the round.
    #[test]
    fn parse_arguments_handles_provider_quirks() {
        let parsed = parse_arguments(r#"{"expression": "1 + 1"}"#);
        assert_eq!(parsed.get("expression"), Some(&json!("1 + 1")));

        assert!(parse_arguments("").is_empty());
        assert!(parse_arguments("not json").is_empty());
        assert!(parse_arguments("[1, 2]").is_empty());

        let double_encoded = r#""{\"expression\": \"2 * 3\"}""#;
        let parsed = parse_arguments(double_encoded);
        assert_eq!(parsed.get("expression"), Some(&json!("2 * 3")));
    }

    /// **Scenario**: complete() against an unreachable API base returns a
    /// provider error (no real API key needed).
    #[tokio::test]
    async fn complete_with_unreachable_base_returns_provider_error() {
        let client = unreachable_client();
        let turns = [Turn::user("Hello")];

        let result = client.complete(&turns, &[calculator_spec()]).await;

        assert!(matches!(result, Err(OracleError::Provider(_))));
    }

    /// **Scenario**: complete_stream() against an unreachable API base returns a
    /// provider error before any chunk is sent.
    #[tokio::test]
    async fn complete_stream_with_unreachable_base_returns_provider_error() {
        let client = unreachable_client();
        let turns = [Turn::user("Hello")];
        let (tx, mut rx) = mpsc::channel(16);

        let result = client.complete_stream(&turns, &[], tx).await;

        assert!(matches!(result, Err(OracleError::Provider(_))));
        assert!(rx.try_recv().is_err());
    }

    /// **Scenario**: complete() against the real API answers when OPENAI_API_KEY is set.
    #[tokio::test]
    #[ignore = "Requires OPENAI_API_KEY; run with: cargo test -p weft complete_with_real_api -- --ignored"]
    async fn complete_with_real_api_returns_answer() {
        let api_key = std::env::var("OPENAI_API_KEY").expect("OPENAI_API_KEY must be set");
        let client = ChatOpenAI::new(api_key);
        let turns = [Turn::user("Say exactly: ok")];

        let response = client.complete(&turns, &[]).await.expect("completion");
        match response {
            ModelResponse::FinalAnswer(text) => assert!(!text.is_empty()),
            ModelResponse::ToolCalls(calls) => panic!("unexpected tool calls: {calls:?}"),
        }
    }

    /// **Scenario**: complete_stream() against the real API sends at least one
    /// chunk and the reassembled text matches the returned text.
    #[tokio::test]
    #[ignore = "Requires OPENAI_API_KEY; run with: cargo test -p weft complete_stream_with_real_api -- --ignored"]
    async fn complete_stream_with_real_api_sends_chunks() {
        let api_key = std::env::var("OPENAI_API_KEY").expect("OPENAI_API_KEY must be set");
        let client = ChatOpenAI::new(api_key);
        let turns = [Turn::user("Say exactly: ok")];
        let (tx, mut rx) = mpsc::channel(64);

        let text = client
            .complete_stream(&turns, &[], tx)
            .await
            .expect("streamed completion");
        assert!(!text.is_empty());

        let mut reassembled = String::new();
        while let Ok(chunk) = rx.try_recv() {
            reassembled.push_str(&chunk.text);
        }
        assert_eq!(reassembled, text);
    }
}
