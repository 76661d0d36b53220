//! Whitespace-separated word count.

use serde_json::{Map, Value};

use crate::error::ToolError;

use super::{ParamKind, ParamSpec, Tool, ToolSpec};

pub const TOOL_COUNT_WORDS: &str = "count_words";

pub struct CountWordsTool;

impl Tool for CountWordsTool {
    fn name(&self) -> &str {
        TOOL_COUNT_WORDS
    }

    fn spec(&self) -> ToolSpec {
        ToolSpec::new(TOOL_COUNT_WORDS, "Count the number of words in a piece of text.")
            .with_param(ParamSpec::required(
                "text",
                ParamKind::String,
                "The text whose words should be counted.",
            ))
    }

    fn call(&self, args: &Map<String, Value>) -> Result<String, ToolError> {
        let text = args
            .get("text")
            .and_then(Value::as_str)
            .ok_or_else(|| ToolError::MissingArgument {
                tool: TOOL_COUNT_WORDS.to_string(),
                argument: "text".to_string(),
            })?;
        Ok(text.split_whitespace().count().to_string())
    }
}
