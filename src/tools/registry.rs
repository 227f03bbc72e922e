//! Tool registry: named dispatch with validation and metrics.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock};
use std::time::Instant;

use serde_json::Value;
use uuid::Uuid;

use crate::error::ToolError;
use crate::tools::compose::{ComposedTool, SequenceStep};
use crate::tools::metrics::{MetricsBook, RegistryMetrics, ToolMetrics};
use crate::tools::schema::ToolSchema;
use crate::tools::tool::{FnTool, Tool};

/// Registry of named tools.
///
/// Clones share the same underlying registry, so a composed tool or a
/// plan executor holding a clone always sees the current tool set.
/// The tool map and metrics book sit behind `std::sync` locks; guards
/// are scoped so they are never held across an `await`.
#[derive(Clone, Default)]
pub struct ToolRegistry {
    inner: Arc<RegistryInner>,
}

#[derive(Default)]
pub(crate) struct RegistryInner {
    tools: RwLock<HashMap<String, Arc<dyn Tool>>>,
    metrics: Mutex<MetricsBook>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn from_inner(inner: Arc<RegistryInner>) -> Self {
        Self { inner }
    }

    /// Register a tool under its own name.
    ///
    /// Re-registering a name replaces the previous implementation;
    /// the name's metrics entry is kept.
    pub fn register(&self, tool: impl Tool + 'static) {
        self.register_arc(Arc::new(tool));
    }

    pub fn register_arc(&self, tool: Arc<dyn Tool>) {
        let name = tool.name().to_string();
        let replaced = {
            let mut tools = self.inner.tools.write().expect("tool map lock poisoned");
            tools.insert(name.clone(), tool).is_some()
        };
        if replaced {
            tracing::warn!(tool = %name, "re-registered tool, previous implementation replaced");
        } else {
            tracing::debug!(tool = %name, "registered tool");
        }
        self.inner
            .metrics
            .lock()
            .expect("metrics lock poisoned")
            .touch(&name);
    }

    /// Register an async closure as a tool.
    pub fn register_fn<F, Fut>(
        &self,
        name: impl Into<String>,
        description: impl Into<String>,
        schema: Option<ToolSchema>,
        f: F,
    ) where
        F: Fn(Value) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Value, ToolError>> + Send + 'static,
    {
        let mut tool = FnTool::new(name, description, f);
        if let Some(schema) = schema {
            tool = tool.with_schema(schema);
        }
        self.register(tool);
    }

    /// Register a tool that runs a fixed sequence of existing tools,
    /// threading each step's result into the next. Whether every
    /// referenced tool exists is checked when the composed tool is
    /// called, not here, so sequences may reference tools registered
    /// later.
    pub fn compose(
        &self,
        name: impl Into<String>,
        steps: Vec<SequenceStep>,
        schema: Option<ToolSchema>,
    ) {
        let tool = ComposedTool::new(name, steps, schema, Arc::downgrade(&self.inner));
        self.register(tool);
    }

    pub fn has_tool(&self, name: &str) -> bool {
        self.inner
            .tools
            .read()
            .expect("tool map lock poisoned")
            .contains_key(name)
    }

    /// Names of all registered tools, sorted.
    pub fn registered_tools(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .inner
            .tools
            .read()
            .expect("tool map lock poisoned")
            .keys()
            .cloned()
            .collect();
        names.sort();
        names
    }

    pub fn tool_schema(&self, name: &str) -> Option<ToolSchema> {
        self.inner
            .tools
            .read()
            .expect("tool map lock poisoned")
            .get(name)
            .and_then(|tool| tool.schema())
    }

    /// Dispatch a tool by name.
    ///
    /// Validates parameters against the tool's schema before invoking
    /// it (a validation failure never reaches the implementation),
    /// times the call with a monotonic clock, and records the outcome
    /// in the tool's metrics. A failure inside the tool is returned
    /// wrapped as [`ToolError::Execution`].
    pub async fn execute(&self, name: &str, params: Value) -> Result<Value, ToolError> {
        let tool = {
            let tools = self.inner.tools.read().expect("tool map lock poisoned");
            tools.get(name).cloned()
        }
        .ok_or_else(|| ToolError::NotFound(name.to_string()))?;

        if let Some(schema) = tool.schema() {
            schema.validate(&params)?;
        }

        let correlation_id = Uuid::new_v4();
        tracing::debug!(tool = %name, %correlation_id, "dispatching tool");

        let started = Instant::now();
        let outcome = tool.call(params).await;
        let elapsed = started.elapsed();

        let mut metrics = self.inner.metrics.lock().expect("metrics lock poisoned");
        match outcome {
            Ok(value) => {
                metrics.record_success(name, elapsed, correlation_id);
                Ok(value)
            }
            Err(err) => {
                tracing::error!(tool = %name, %correlation_id, error = %err, "tool failed");
                metrics.record_failure(name, &err.to_string(), elapsed, correlation_id);
                Err(ToolError::Execution {
                    tool: name.to_string(),
                    source: Box::new(err),
                })
            }
        }
    }

    /// Aggregated metrics snapshot for export.
    pub fn metrics(&self) -> RegistryMetrics {
        let registered = self.registered_tools();
        self.inner
            .metrics
            .lock()
            .expect("metrics lock poisoned")
            .snapshot(registered)
    }

    pub fn tool_metrics(&self, name: &str) -> Option<ToolMetrics> {
        self.inner
            .metrics
            .lock()
            .expect("metrics lock poisoned")
            .get(name)
    }

    /// Reset all counters, preserving the set of known tool names.
    pub fn clear_metrics(&self) {
        self.inner
            .metrics
            .lock()
            .expect("metrics lock poisoned")
            .clear();
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use serde_json::json;

    use super::*;
    use crate::tools::schema::PropertyKind;

    fn constant_tool(name: &str, value: Value) -> FnTool {
        FnTool::new(name, "returns a constant", move |_| {
            let value = value.clone();
            async move { Ok(value) }
        })
    }

    #[tokio::test]
    async fn test_reregistering_overwrites_implementation() {
        let registry = ToolRegistry::new();
        registry.register(constant_tool("x", json!(1)));
        registry.register(constant_tool("x", json!(2)));

        let result = registry.execute("x", json!({})).await.unwrap();

        assert_eq!(result, json!(2));
        assert_eq!(registry.registered_tools(), vec!["x".to_string()]);
    }

    #[tokio::test]
    async fn test_unregistered_tool_not_found() {
        let registry = ToolRegistry::new();
        registry.register(constant_tool("a", json!(1)));

        let err = registry.execute("missing", json!({})).await.unwrap_err();

        assert!(err.to_string().contains("not found"));
        // The tool map is unaffected.
        assert!(registry.has_tool("a"));
        assert!(!registry.has_tool("missing"));
    }

    #[tokio::test]
    async fn test_validation_fails_before_invocation() {
        let registry = ToolRegistry::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let spy = calls.clone();
        registry.register_fn(
            "strict",
            "requires 'a'",
            Some(ToolSchema::new().require("a", PropertyKind::String)),
            move |_| {
                spy.fetch_add(1, Ordering::SeqCst);
                async { Ok(json!(null)) }
            },
        );

        let err = registry.execute("strict", json!({})).await.unwrap_err();

        assert_eq!(err.to_string(), "missing required parameter: a");
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_type_mismatch_rejected() {
        let registry = ToolRegistry::new();
        registry.register_fn(
            "typed",
            "takes a number",
            Some(ToolSchema::new().property("a", PropertyKind::Number)),
            |params| async move { Ok(params) },
        );

        let err = registry.execute("typed", json!({"a": "x"})).await.unwrap_err();
        assert!(err.to_string().contains("should be of type number, got string"));

        let ok = registry.execute("typed", json!({"a": 3})).await.unwrap();
        assert_eq!(ok, json!({"a": 3}));
    }

    #[tokio::test]
    async fn test_failure_wrapped_as_execution_error() {
        let registry = ToolRegistry::new();
        registry.register_fn("broken", "always fails", None, |_| async {
            Err(ToolError::ExecutionFailed("boom".to_string()))
        });

        let err = registry.execute("broken", json!({})).await.unwrap_err();

        match err {
            ToolError::Execution { tool, source } => {
                assert_eq!(tool, "broken");
                assert!(source.to_string().contains("boom"));
            }
            other => panic!("expected Execution, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_average_execution_time() {
        let registry = ToolRegistry::new();
        registry.register_fn("slow", "sleeps", None, |params: Value| async move {
            let ms = params.get("ms").and_then(Value::as_u64).unwrap_or(0);
            tokio::time::sleep(Duration::from_millis(ms)).await;
            Ok(json!(ms))
        });

        for ms in [10u64, 20, 30] {
            registry.execute("slow", json!({"ms": ms})).await.unwrap();
        }

        let metrics = registry.tool_metrics("slow").unwrap();
        assert_eq!(metrics.calls, 3);
        assert_eq!(metrics.avg_time, metrics.total_time / 3);
        assert!(metrics.avg_time >= Duration::from_millis(10));
        assert!(metrics.last_execution.unwrap().success);
    }

    #[tokio::test]
    async fn test_failure_recorded_in_metrics() {
        let registry = ToolRegistry::new();
        registry.register_fn("flappy", "fails once", None, |_| async {
            Err(ToolError::ExecutionFailed("no luck".to_string()))
        });

        let _ = registry.execute("flappy", json!({})).await;

        let metrics = registry.tool_metrics("flappy").unwrap();
        assert_eq!(metrics.calls, 1);
        assert_eq!(metrics.failures, 1);
        assert!(metrics.last_error.unwrap().message.contains("no luck"));
    }

    #[tokio::test]
    async fn test_clear_metrics_preserves_names() {
        let registry = ToolRegistry::new();
        registry.register(constant_tool("kept", json!(1)));
        registry.execute("kept", json!({})).await.unwrap();

        registry.clear_metrics();

        let metrics = registry.tool_metrics("kept").unwrap();
        assert_eq!(metrics.calls, 0);
        let snapshot = registry.metrics();
        assert_eq!(snapshot.executions, 0);
        assert_eq!(snapshot.registered_tools, vec!["kept".to_string()]);
    }

    #[tokio::test]
    async fn test_validation_does_not_touch_metrics() {
        let registry = ToolRegistry::new();
        registry.register_fn(
            "strict",
            "requires 'a'",
            Some(ToolSchema::new().require("a", PropertyKind::String)),
            |params| async move { Ok(params) },
        );

        let _ = registry.execute("strict", json!({})).await;

        assert_eq!(registry.tool_metrics("strict").unwrap().calls, 0);
    }
}
