//! Tool declarations, the executor registry and the built-in tools.

mod calculator;
mod count_words;
mod current_datetime;
mod registry;
mod reverse_text;

pub use calculator::{CalculatorTool, TOOL_CALCULATOR};
pub use count_words::{CountWordsTool, TOOL_COUNT_WORDS};
pub use current_datetime::{CurrentDatetimeTool, TOOL_CURRENT_DATETIME};
pub use registry::ToolRegistry;
pub use reverse_text::{ReverseTextTool, TOOL_REVERSE_TEXT};

use serde_json::{json, Map, Value};

use crate::error::ToolError;

/// JSON type accepted for a tool parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    String,
    Number,
    Integer,
    Boolean,
}

impl ParamKind {
    /// The JSON Schema `type` keyword for this kind.
    pub fn json_type(&self) -> &'static str {
        match self {
            ParamKind::String => "string",
            ParamKind::Number => "number",
            ParamKind::Integer => "integer",
            ParamKind::Boolean => "boolean",
        }
    }

    /// Whether `value` satisfies this kind.
    ///
    /// `Number` accepts any JSON number; `Integer` only values without a
    /// fractional part.
    pub fn matches(&self, value: &Value) -> bool {
        match self {
            ParamKind::String => value.is_string(),
            ParamKind::Number => value.is_number(),
            ParamKind::Integer => value.as_i64().is_some() || value.as_u64().is_some(),
            ParamKind::Boolean => value.is_boolean(),
        }
    }
}

/// One declared parameter of a tool.
#[derive(Debug, Clone)]
pub struct ParamSpec {
    pub name: String,
    pub kind: ParamKind,
    pub required: bool,
    /// Substituted when the model omits the argument.
    pub default: Option<Value>,
    pub description: String,
}

impl ParamSpec {
    pub fn required(name: impl Into<String>, kind: ParamKind, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind,
            required: true,
            default: None,
            description: description.into(),
        }
    }

    pub fn optional(name: impl Into<String>, kind: ParamKind, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind,
            required: false,
            default: None,
            description: description.into(),
        }
    }

    pub fn with_default(mut self, value: Value) -> Self {
        self.default = Some(value);
        self
    }
}

/// Declarative description of a tool, rendered into the provider request so
/// the model knows what it may call and with which arguments.
#[derive(Debug, Clone)]
pub struct ToolSpec {
    pub name: String,
    pub description: String,
    pub params: Vec<ParamSpec>,
}

impl ToolSpec {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            params: Vec::new(),
        }
    }

    pub fn with_param(mut self, param: ParamSpec) -> Self {
        self.params.push(param);
        self
    }

    /// Renders the parameters as a JSON Schema object.
    ///
    /// Undeclared properties are rejected by the schema so the model cannot
    /// smuggle in extra arguments.
    pub fn input_schema(&self) -> Value {
        let mut properties = Map::new();
        let mut required = Vec::new();
        for param in &self.params {
            let mut property = Map::new();
            property.insert("type".to_string(), json!(param.kind.json_type()));
            if !param.description.is_empty() {
                property.insert("description".to_string(), json!(param.description));
            }
            if let Some(default) = &param.default {
                property.insert("default".to_string(), default.clone());
            }
            properties.insert(param.name.clone(), Value::Object(property));
            if param.required {
                required.push(json!(param.name));
            }
        }
        json!({
            "type": "object",
            "properties": properties,
            "required": required,
            "additionalProperties": false,
        })
    }
}

/// A single callable exposed to the model.
///
/// Each tool has a unique name, a [`ToolSpec`] describing its arguments, and
/// the call logic. Tools are registered with [`ToolRegistry`], which validates
/// arguments against the declared parameters before dispatching.
///
/// # Examples
///
/// ```
/// use serde_json::{Map, Value};
/// use weft::error::ToolError;
/// use weft::tools::{ParamKind, ParamSpec, Tool, ToolSpec};
///
/// struct Shout;
///
/// impl Tool for Shout {
///     fn name(&self) -> &str {
///         "shout"
///     }
///
///     fn spec(&self) -> ToolSpec {
///         ToolSpec::new("shout", "Uppercase the given text.").with_param(ParamSpec::required(
///             "text",
///             ParamKind::String,
///             "Text to uppercase.",
///         ))
///     }
///
///     fn call(&self, args: &Map<String, Value>) -> Result<String, ToolError> {
///         let text = args.get("text").and_then(Value::as_str).unwrap_or_default();
///         Ok(text.to_uppercase())
///     }
/// }
/// ```
pub trait Tool: Send + Sync {
    /// Unique name of this tool within a registry.
    fn name(&self) -> &str;

    /// Declared arguments and description shown to the model.
    fn spec(&self) -> ToolSpec;

    /// Runs the tool with validated arguments.
    ///
    /// Arguments have already been checked against the declared parameters
    /// and carry defaults for omitted optional ones.
    fn call(&self, args: &Map<String, Value>) -> Result<String, ToolError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn input_schema_lists_required_params_and_rejects_extras() {
        let spec = ToolSpec::new("demo", "A demo tool.")
            .with_param(ParamSpec::required("text", ParamKind::String, "Some text."))
            .with_param(
                ParamSpec::optional("limit", ParamKind::Integer, "Optional limit.")
                    .with_default(json!(10)),
            );
        let schema = spec.input_schema();

        assert_eq!(schema["type"], "object");
        assert_eq!(schema["additionalProperties"], false);
        assert_eq!(schema["properties"]["text"]["type"], "string");
        assert_eq!(schema["properties"]["limit"]["type"], "integer");
        assert_eq!(schema["properties"]["limit"]["default"], 10);
        assert_eq!(schema["required"], json!(["text"]));
    }

    #[test]
    fn param_kind_matches_json_values() {
        assert!(ParamKind::String.matches(&json!("hi")));
        assert!(!ParamKind::String.matches(&json!(1)));
        assert!(ParamKind::Number.matches(&json!(1.5)));
        assert!(ParamKind::Number.matches(&json!(3)));
        assert!(ParamKind::Integer.matches(&json!(3)));
        assert!(!ParamKind::Integer.matches(&json!(1.5)));
        assert!(ParamKind::Boolean.matches(&json!(true)));
        assert!(!ParamKind::Boolean.matches(&json!("true")));
    }
}
