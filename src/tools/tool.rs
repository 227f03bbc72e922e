//! Tool trait and adapters.

use async_trait::async_trait;
use futures::future::BoxFuture;
use serde_json::Value;

use crate::error::ToolError;
use crate::tools::schema::{PropertyKind, ToolSchema};

/// Trait for operations a plan can invoke.
///
/// A tool takes one JSON parameters object and returns a JSON value.
/// Implementations fail with [`ToolError`]; the registry wraps those
/// failures into [`ToolError::Execution`] so callers can tell a tool
/// failure from a validation or lookup failure.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Unique name the tool is registered under.
    fn name(&self) -> &str;

    /// Short description of what the tool does.
    fn description(&self) -> &str;

    /// Parameter schema, if the tool wants pre-dispatch validation.
    fn schema(&self) -> Option<ToolSchema> {
        None
    }

    /// Execute the tool with the given parameters.
    async fn call(&self, params: Value) -> Result<Value, ToolError>;
}

type ToolFn = Box<dyn Fn(Value) -> BoxFuture<'static, Result<Value, ToolError>> + Send + Sync>;

/// Adapter that turns an async closure into a [`Tool`].
///
/// Lets the surrounding application register ad-hoc capabilities
/// without defining a struct per tool.
pub struct FnTool {
    name: String,
    description: String,
    schema: Option<ToolSchema>,
    func: ToolFn,
}

impl FnTool {
    /// Wrap an async closure as a named tool.
    pub fn new<F, Fut>(name: impl Into<String>, description: impl Into<String>, f: F) -> Self
    where
        F: Fn(Value) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Value, ToolError>> + Send + 'static,
    {
        Self {
            name: name.into(),
            description: description.into(),
            schema: None,
            func: Box::new(move |params| Box::pin(f(params))),
        }
    }

    /// Attach a parameter schema.
    pub fn with_schema(mut self, schema: ToolSchema) -> Self {
        self.schema = Some(schema);
        self
    }
}

#[async_trait]
impl Tool for FnTool {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn schema(&self) -> Option<ToolSchema> {
        self.schema.clone()
    }

    async fn call(&self, params: Value) -> Result<Value, ToolError> {
        (self.func)(params).await
    }
}

/// A simple echo tool for testing.
#[derive(Debug)]
pub struct EchoTool;

#[async_trait]
impl Tool for EchoTool {
    fn name(&self) -> &str {
        "echo"
    }

    fn description(&self) -> &str {
        "Echoes back the input message. Useful for testing."
    }

    fn schema(&self) -> Option<ToolSchema> {
        Some(ToolSchema::new().require("message", PropertyKind::String))
    }

    async fn call(&self, params: Value) -> Result<Value, ToolError> {
        let message = params
            .get("message")
            .and_then(Value::as_str)
            .ok_or_else(|| ToolError::MissingParameter("message".to_string()))?;

        Ok(Value::String(message.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[tokio::test]
    async fn test_echo_tool() {
        let tool = EchoTool;

        let result = tool.call(json!({"message": "hello"})).await.unwrap();

        assert_eq!(result, json!("hello"));
    }

    #[test]
    fn test_echo_schema() {
        let schema = EchoTool.schema().unwrap();

        assert_eq!(schema.required, vec!["message".to_string()]);
    }

    #[tokio::test]
    async fn test_fn_tool() {
        let tool = FnTool::new("add_one", "Adds one to 'n'.", |params: Value| async move {
            let n = params.get("n").and_then(Value::as_i64).unwrap_or(0);
            Ok(json!(n + 1))
        });

        assert_eq!(tool.name(), "add_one");
        assert_eq!(tool.call(json!({"n": 41})).await.unwrap(), json!(42));
    }
}
