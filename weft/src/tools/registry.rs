//! Name-indexed collection of tools with argument validation.

use std::collections::HashMap;

use serde_json::{Map, Value};
use tracing::trace;

use crate::error::ToolError;

use super::{
    CalculatorTool, CountWordsTool, CurrentDatetimeTool, ReverseTextTool, Tool, ToolSpec,
};

/// Holds every tool the agent may dispatch to, keyed by name.
///
/// Registration order is preserved so [`ToolRegistry::specs`] renders tools
/// deterministically. [`ToolRegistry::invoke`] is total over registered and
/// unregistered names alike: every failure comes back as a [`ToolError`]
/// rather than a panic, which the agent folds into a failure observation.
///
/// # Examples
///
/// ```
/// use serde_json::json;
/// use weft::tools::ToolRegistry;
///
/// let registry = ToolRegistry::builtin().unwrap();
/// let args = json!({"expression": "2 + 3 * 4"}).as_object().cloned().unwrap();
/// let result = registry.invoke("calculator", &args).unwrap();
/// assert_eq!(result, "14");
/// ```
pub struct ToolRegistry {
    tools: Vec<Box<dyn Tool>>,
    index: HashMap<String, usize>,
}

impl ToolRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self {
            tools: Vec::new(),
            index: HashMap::new(),
        }
    }

    /// Creates a registry with the default tool set: `calculator`,
    /// `get_current_datetime`, `count_words` and `reverse_text`.
    pub fn builtin() -> Result<Self, ToolError> {
        let mut registry = Self::new();
        registry.register(Box::new(CalculatorTool))?;
        registry.register(Box::new(CurrentDatetimeTool))?;
        registry.register(Box::new(CountWordsTool))?;
        registry.register(Box::new(ReverseTextTool))?;
        Ok(registry)
    }

    /// Adds a tool, rejecting duplicate names.
    pub fn register(&mut self, tool: Box<dyn Tool>) -> Result<(), ToolError> {
        let name = tool.name().to_string();
        if self.index.contains_key(&name) {
            return Err(ToolError::DuplicateTool(name));
        }
        self.index.insert(name, self.tools.len());
        self.tools.push(tool);
        Ok(())
    }

    /// Looks up a tool by name.
    pub fn lookup(&self, name: &str) -> Result<&dyn Tool, ToolError> {
        self.index
            .get(name)
            .map(|&slot| self.tools[slot].as_ref())
            .ok_or_else(|| ToolError::UnknownTool(name.to_string()))
    }

    /// Specs of every registered tool, in registration order.
    pub fn specs(&self) -> Vec<ToolSpec> {
        self.tools.iter().map(|tool| tool.spec()).collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Validates `args` against the tool's spec and runs the tool.
    ///
    /// Missing required arguments and type mismatches are rejected before the
    /// tool runs; defaults are substituted for omitted optional arguments.
    /// Arguments the tool does not declare are dropped.
    pub fn invoke(&self, name: &str, args: &Map<String, Value>) -> Result<String, ToolError> {
        let tool = self.lookup(name)?;
        let spec = tool.spec();
        let effective = validate_args(&spec, args)?;
        tool.call(&effective)
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

fn validate_args(spec: &ToolSpec, args: &Map<String, Value>) -> Result<Map<String, Value>, ToolError> {
    let mut effective = Map::new();
    for param in &spec.params {
        match args.get(&param.name) {
            Some(value) => {
                if !param.kind.matches(value) {
                    return Err(ToolError::TypeMismatch {
                        tool: spec.name.clone(),
                        argument: param.name.clone(),
                        expected: param.kind.json_type(),
                        actual: json_type_name(value).to_string(),
                    });
                }
                effective.insert(param.name.clone(), value.clone());
            }
            None => {
                if let Some(default) = &param.default {
                    effective.insert(param.name.clone(), default.clone());
                } else if param.required {
                    return Err(ToolError::MissingArgument {
                        tool: spec.name.clone(),
                        argument: param.name.clone(),
                    });
                }
            }
        }
    }
    for key in args.keys() {
        if !spec.params.iter().any(|param| param.name == *key) {
            trace!(tool = %spec.name, argument = %key, "dropping undeclared argument");
        }
    }
    Ok(effective)
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
