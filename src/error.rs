//! Error types shared across the runtime.

use std::time::Duration;

use thiserror::Error;

/// Error type for tool dispatch and execution.
#[derive(Debug, Error)]
pub enum ToolError {
    /// No tool is registered under the requested name.
    #[error("tool not found: {0}")]
    NotFound(String),

    /// A `required` schema field was absent from the parameters.
    #[error("missing required parameter: {0}")]
    MissingParameter(String),

    /// A declared property was present with the wrong runtime type.
    #[error("parameter {field} should be of type {expected}, got {actual}")]
    ParameterType {
        field: String,
        expected: String,
        actual: String,
    },

    /// A composed tool references a name that is not registered.
    #[error("Invalid tool in sequence: {0}")]
    InvalidToolInSequence(String),

    /// A static parameter mapping resolved to nothing.
    #[error("unresolved parameter mapping: {0}")]
    UnresolvedMapping(String),

    /// A tool implementation failed; wraps the original error.
    #[error("tool '{tool}' failed: {source}")]
    Execution {
        tool: String,
        #[source]
        source: Box<ToolError>,
    },

    /// Generic failure raised inside a tool implementation.
    #[error("execution failed: {0}")]
    ExecutionFailed(String),

    /// External service failure raised inside a tool implementation.
    #[error("external service error: {0}")]
    ExternalService(String),
}

impl From<std::io::Error> for ToolError {
    fn from(err: std::io::Error) -> Self {
        ToolError::ExecutionFailed(err.to_string())
    }
}

/// Error type for LLM providers.
#[derive(Debug, Error)]
pub enum LlmError {
    #[error("llm request failed ({provider}): {reason}")]
    RequestFailed { provider: String, reason: String },

    #[error("llm authentication failed ({provider})")]
    AuthFailed { provider: String },

    #[error("llm rate limited ({provider})")]
    RateLimited {
        provider: String,
        retry_after: Option<Duration>,
    },

    #[error("invalid llm response ({provider}): {reason}")]
    InvalidResponse { provider: String, reason: String },
}

/// Error type for recovery policies.
#[derive(Debug, Error)]
pub enum RecoveryError {
    /// The policy's output could not be parsed into a decision.
    #[error("recovery decision could not be parsed: {0}")]
    Parse(String),

    #[error(transparent)]
    Llm(#[from] LlmError),
}

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {var}: {reason}")]
    Invalid { var: String, reason: String },
}
