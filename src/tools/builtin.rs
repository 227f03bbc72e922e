//! Builtin tools registered by the demo binary.
//!
//! Real deployments register their own capabilities; these cover the
//! common cases of fetching a URL and reading a local file.

use async_trait::async_trait;
use serde_json::{Value, json};

use crate::error::ToolError;
use crate::tools::schema::{PropertyKind, ToolSchema};
use crate::tools::tool::Tool;

/// Maximum response body length returned by [`HttpFetchTool`].
const MAX_BODY_LEN: usize = 64 * 1024;

/// Fetch a URL over HTTP GET and return status plus body text.
pub struct HttpFetchTool {
    client: reqwest::Client,
}

impl HttpFetchTool {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }
}

impl Default for HttpFetchTool {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Tool for HttpFetchTool {
    fn name(&self) -> &str {
        "http_fetch"
    }

    fn description(&self) -> &str {
        "Fetch a URL over HTTP GET and return the response body as text."
    }

    fn schema(&self) -> Option<ToolSchema> {
        Some(ToolSchema::new().require("url", PropertyKind::String))
    }

    async fn call(&self, params: Value) -> Result<Value, ToolError> {
        let url = params
            .get("url")
            .and_then(Value::as_str)
            .ok_or_else(|| ToolError::MissingParameter("url".to_string()))?;

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| ToolError::ExternalService(e.to_string()))?;

        let status = response.status().as_u16();
        let mut body = response
            .text()
            .await
            .map_err(|e| ToolError::ExternalService(e.to_string()))?;

        if body.len() > MAX_BODY_LEN {
            let mut cut = MAX_BODY_LEN;
            while !body.is_char_boundary(cut) {
                cut -= 1;
            }
            body.truncate(cut);
        }

        Ok(json!({ "status": status, "body": body }))
    }
}

/// Read a UTF-8 text file from the local filesystem.
pub struct ReadFileTool;

#[async_trait]
impl Tool for ReadFileTool {
    fn name(&self) -> &str {
        "read_file"
    }

    fn description(&self) -> &str {
        "Read a UTF-8 text file and return its contents."
    }

    fn schema(&self) -> Option<ToolSchema> {
        Some(ToolSchema::new().require("path", PropertyKind::String))
    }

    async fn call(&self, params: Value) -> Result<Value, ToolError> {
        let path = params
            .get("path")
            .and_then(Value::as_str)
            .ok_or_else(|| ToolError::MissingParameter("path".to_string()))?;

        let contents = tokio::fs::read_to_string(path).await?;
        Ok(Value::String(contents))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_read_file_missing_path_param() {
        let err = ReadFileTool.call(json!({})).await.unwrap_err();

        assert!(err.to_string().contains("path"));
    }

    #[tokio::test]
    async fn test_read_file_nonexistent() {
        let err = ReadFileTool
            .call(json!({"path": "/nonexistent/definitely-not-here.txt"}))
            .await
            .unwrap_err();

        assert!(matches!(err, ToolError::ExecutionFailed(_)));
    }

    #[test]
    fn test_http_fetch_schema_requires_url() {
        let schema = HttpFetchTool::new().schema().unwrap();

        assert!(schema.validate(&json!({})).is_err());
        assert!(schema.validate(&json!({"url": "https://example.com"})).is_ok());
    }
}
