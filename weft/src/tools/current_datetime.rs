//! Local date and time lookup.

use chrono::Local;
use serde_json::{Map, Value};

use crate::error::ToolError;

use super::{Tool, ToolSpec};

pub const TOOL_CURRENT_DATETIME: &str = "get_current_datetime";

pub struct CurrentDatetimeTool;

impl Tool for CurrentDatetimeTool {
    fn name(&self) -> &str {
        TOOL_CURRENT_DATETIME
    }

    fn spec(&self) -> ToolSpec {
        ToolSpec::new(
            TOOL_CURRENT_DATETIME,
            "Get the current local date and time.",
        )
    }

    fn call(&self, _args: &Map<String, Value>) -> Result<String, ToolError> {
        Ok(Local::now().format("%Y-%m-%d %H:%M:%S").to_string())
    }
}
