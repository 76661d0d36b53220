//! Error types for the agent, the model client and the tool layer.

use thiserror::Error;

/// Errors raised while registering, validating or running tools.
///
/// Failures from [`ToolError::Evaluation`] and argument validation are
/// recoverable: the agent folds them into a failure observation so the model
/// can correct itself on the next round.
#[derive(Debug, Error)]
pub enum ToolError {
    /// The model asked for a tool that is not registered.
    #[error("unknown tool '{0}'")]
    UnknownTool(String),

    /// A tool with the same name is already registered.
    #[error("tool '{0}' is already registered")]
    DuplicateTool(String),

    /// A required argument without a default was not supplied.
    #[error("missing required argument '{argument}' for tool '{tool}'")]
    MissingArgument { tool: String, argument: String },

    /// An argument was supplied with the wrong JSON type.
    #[error("argument '{argument}' for tool '{tool}' must be of type {expected}, got {actual}")]
    TypeMismatch {
        tool: String,
        argument: String,
        expected: &'static str,
        actual: String,
    },

    /// The tool ran but could not produce a result.
    #[error("{0}")]
    Evaluation(String),
}

/// Errors from the model provider boundary.
#[derive(Debug, Error)]
pub enum OracleError {
    /// Transport or API failure when talking to the provider.
    #[error("model provider error: {0}")]
    Provider(String),

    /// The provider answered, but the payload fit no known shape.
    #[error("malformed model response: {0}")]
    MalformedResponse(String),
}

/// Top-level errors surfaced by [`crate::agent::Agent`].
#[derive(Debug, Error)]
pub enum AgentError {
    /// Invalid construction parameters, e.g. a blank API key.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The model client failed.
    #[error(transparent)]
    Oracle(#[from] OracleError),

    /// The model kept requesting tools past the round limit.
    #[error("no final answer after {limit} tool rounds")]
    MaxIterationsExceeded { limit: u32 },

    /// The streamed reply broke off before completing.
    #[error("model stream interrupted: {0}")]
    StreamInterrupted(String),

    /// The turn was cancelled before it could finish.
    #[error("turn cancelled")]
    Cancelled,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tool_error_display_includes_names() {
        let err = ToolError::UnknownTool("browser".to_string());
        assert_eq!(err.to_string(), "unknown tool 'browser'");

        let err = ToolError::MissingArgument {
            tool: "calculator".to_string(),
            argument: "expression".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "missing required argument 'expression' for tool 'calculator'"
        );

        let err = ToolError::TypeMismatch {
            tool: "calculator".to_string(),
            argument: "expression".to_string(),
            expected: "string",
            actual: "number".to_string(),
        };
        assert!(err.to_string().contains("must be of type string"));
        assert!(err.to_string().contains("got number"));
    }

    #[test]
    fn evaluation_error_displays_message_verbatim() {
        let err = ToolError::Evaluation("division by zero".to_string());
        assert_eq!(err.to_string(), "division by zero");
    }

    #[test]
    fn oracle_error_wraps_into_agent_error() {
        let err: AgentError = OracleError::Provider("connection refused".to_string()).into();
        assert!(matches!(err, AgentError::Oracle(OracleError::Provider(_))));
        assert_eq!(err.to_string(), "model provider error: connection refused");
    }

    #[test]
    fn round_limit_error_reports_the_limit() {
        let err = AgentError::MaxIterationsExceeded { limit: 10 };
        assert_eq!(err.to_string(), "no final answer after 10 tool rounds");
    }
}
