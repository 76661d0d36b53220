//! Conversation history as an ordered list of typed turns.
//!
//! A [`Conversation`] is append-only while a turn is running: the agent pushes
//! a [`Turn`] for every user message, tool call, tool observation and final
//! assistant reply, in the order they happened. The only way to remove turns
//! is [`Conversation::clear`].

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A single tool invocation requested by the model.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    /// Correlation id linking the call to its observation.
    pub id: String,
    /// Name of the tool to invoke.
    pub name: String,
    /// Parsed keyword arguments for the tool.
    #[serde(default)]
    pub arguments: Map<String, Value>,
}

/// The recorded outcome of one tool call, success or failure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    /// Id of the [`ToolCall`] this observation answers.
    pub call_id: String,
    /// Name of the tool that ran.
    pub tool_name: String,
    /// Tool output, or an `Error: ...` line when the call failed.
    pub content: String,
}

/// One entry in the conversation history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Turn {
    /// Text sent by the user.
    User { text: String },
    /// Final text reply from the assistant.
    Assistant { text: String },
    /// A tool invocation the model requested.
    ToolCall(ToolCall),
    /// The result fed back to the model for a prior tool call.
    Observation(Observation),
}

impl Turn {
    pub fn user(text: impl Into<String>) -> Self {
        Self::User { text: text.into() }
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self::Assistant { text: text.into() }
    }

    pub fn tool_call(call: ToolCall) -> Self {
        Self::ToolCall(call)
    }

    pub fn observation(
        call_id: impl Into<String>,
        tool_name: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self::Observation(Observation {
            call_id: call_id.into(),
            tool_name: tool_name.into(),
            content: content.into(),
        })
    }
}

/// Ordered multi-turn history shared across agent turns.
///
/// The system prompt is not part of the history; the model client injects it
/// when rendering provider requests, so clearing the conversation never loses
/// it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Conversation {
    turns: Vec<Turn>,
}

impl Conversation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a turn at the end of the history.
    pub fn push(&mut self, turn: Turn) {
        self.turns.push(turn);
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// Drops every turn. Safe to call repeatedly.
    pub fn clear(&mut self) {
        self.turns.clear();
    }

    /// The text of the most recent assistant reply, if any.
    pub fn last_assistant_reply(&self) -> Option<&str> {
        self.turns.iter().rev().find_map(|turn| match turn {
            Turn::Assistant { text } => Some(text.as_str()),
            _ => None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_call() -> ToolCall {
        let arguments = json!({"expression": "2 + 2"})
            .as_object()
            .cloned()
            .unwrap();
        ToolCall {
            id: "call-1".to_string(),
            name: "calculator".to_string(),
            arguments,
        }
    }

    #[test]
    fn constructors_build_the_expected_variants() {
        assert!(matches!(Turn::user("hi"), Turn::User { .. }));
        assert!(matches!(Turn::assistant("hello"), Turn::Assistant { .. }));
        assert!(matches!(Turn::tool_call(sample_call()), Turn::ToolCall(_)));
        let obs = Turn::observation("call-1", "calculator", "4");
        match obs {
            Turn::Observation(o) => {
                assert_eq!(o.call_id, "call-1");
                assert_eq!(o.tool_name, "calculator");
                assert_eq!(o.content, "4");
            }
            other => panic!("expected observation, got {other:?}"),
        }
    }

    #[test]
    fn turns_serialize_with_a_kind_tag() {
        let json = serde_json::to_value(Turn::user("hi")).unwrap();
        assert_eq!(json["kind"], "user");
        assert_eq!(json["text"], "hi");

        let json = serde_json::to_value(Turn::tool_call(sample_call())).unwrap();
        assert_eq!(json["kind"], "tool_call");
        assert_eq!(json["name"], "calculator");
        assert_eq!(json["arguments"]["expression"], "2 + 2");
    }

    #[test]
    fn turn_round_trips_through_serde() {
        let turns = vec![
            Turn::user("what is 2 + 2?"),
            Turn::tool_call(sample_call()),
            Turn::observation("call-1", "calculator", "4"),
            Turn::assistant("It is 4."),
        ];
        for turn in turns {
            let encoded = serde_json::to_string(&turn).unwrap();
            let decoded: Turn = serde_json::from_str(&encoded).unwrap();
            assert_eq!(decoded, turn);
        }
    }

    #[test]
    fn conversation_appends_in_order_and_clears() {
        let mut conversation = Conversation::new();
        assert!(conversation.is_empty());

        conversation.push(Turn::user("hello"));
        conversation.push(Turn::assistant("hi there"));
        assert_eq!(conversation.len(), 2);
        assert!(matches!(conversation.turns()[0], Turn::User { .. }));
        assert!(matches!(conversation.turns()[1], Turn::Assistant { .. }));

        conversation.clear();
        assert!(conversation.is_empty());
        conversation.clear();
        assert!(conversation.is_empty());
    }

    #[test]
    fn last_assistant_reply_skips_later_non_assistant_turns() {
        let mut conversation = Conversation::new();
        assert_eq!(conversation.last_assistant_reply(), None);

        conversation.push(Turn::user("hi"));
        conversation.push(Turn::assistant("first"));
        conversation.push(Turn::user("again"));
        conversation.push(Turn::assistant("second"));
        conversation.push(Turn::observation("call-1", "calculator", "4"));
        assert_eq!(conversation.last_assistant_reply(), Some("second"));
    }
}
