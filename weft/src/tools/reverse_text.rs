//! Character-wise text reversal.

use serde_json::{Map, Value};

use crate::error::ToolError;

use super::{ParamKind, ParamSpec, Tool, ToolSpec};

pub const TOOL_REVERSE_TEXT: &str = "reverse_text";

pub struct ReverseTextTool;

impl Tool for ReverseTextTool {
    fn name(&self) -> &str {
        TOOL_REVERSE_TEXT
    }

    fn spec(&self) -> ToolSpec {
        ToolSpec::new(TOOL_REVERSE_TEXT, "Reverse the characters of a piece of text.")
            .with_param(ParamSpec::required(
                "text",
                ParamKind::String,
                "The text to reverse.",
            ))
    }

    fn call(&self, args: &Map<String, Value>) -> Result<String, ToolError> {
        let text = args
            .get("text")
            .and_then(Value::as_str)
            .ok_or_else(|| ToolError::MissingArgument {
                tool: TOOL_REVERSE_TEXT.to_string(),
                argument: "text".to_string(),
            })?;
        Ok(text.chars().rev().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn run(text: &str) -> String {
        let args = json!({ "text": text }).as_object().cloned().unwrap();
        ReverseTextTool.call(&args).unwrap()
    }

    #[test]
    fn reverses_characters() {
        assert_eq!(run("hello"), "olleh");
        assert_eq!(run(""), "");
        assert_eq!(run("racecar"), "racecar");
    }

    #[test]
    fn reversing_twice_is_the_identity() {
        let original = "weft agent";
        assert_eq!(run(&run(original)), original);
    }
}
