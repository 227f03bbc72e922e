//! Building new tools by chaining registered ones.
//!
//! A composed tool runs its steps strictly in order through the same
//! registry it was registered in, threading each step's result into
//! the next. Parameter maps derive a step's parameters from the
//! composed tool's input (`"params..."`) or the prior step's result
//! (`"result..."`).

use std::collections::HashMap;
use std::sync::{Arc, Weak};

use async_trait::async_trait;
use serde_json::Value;

use crate::error::ToolError;
use crate::tools::registry::{RegistryInner, ToolRegistry};
use crate::tools::schema::ToolSchema;
use crate::tools::tool::Tool;

/// How one sequence step derives its parameters.
#[derive(Clone)]
pub enum ParameterMap {
    /// Target key -> source path. Sources are `"params"`,
    /// `"params.<key>"`, `"result"`, or `"result.<key>"`; nested keys
    /// may be dotted further.
    Static(HashMap<String, String>),
    /// Closure over the composed input and the prior step's result.
    Func(Arc<dyn Fn(&Value, Option<&Value>) -> Value + Send + Sync>),
}

/// One link in a composed tool's chain.
#[derive(Clone)]
pub struct SequenceStep {
    pub tool: String,
    /// Absent map passes the composed input through unchanged.
    pub parameter_map: Option<ParameterMap>,
    /// Post-processes the step's result before it becomes the prior
    /// result of the next step.
    pub result_transform: Option<Arc<dyn Fn(Value) -> Value + Send + Sync>>,
}

impl SequenceStep {
    pub fn new(tool: impl Into<String>) -> Self {
        Self {
            tool: tool.into(),
            parameter_map: None,
            result_transform: None,
        }
    }

    /// Map parameters from static source paths.
    pub fn map_static<K, V>(mut self, mapping: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        let mapping = mapping
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        self.parameter_map = Some(ParameterMap::Static(mapping));
        self
    }

    /// Map parameters with a closure over `(input, prior_result)`.
    pub fn map_fn(
        mut self,
        f: impl Fn(&Value, Option<&Value>) -> Value + Send + Sync + 'static,
    ) -> Self {
        self.parameter_map = Some(ParameterMap::Func(Arc::new(f)));
        self
    }

    /// Transform the step's result before it is threaded onward.
    pub fn transform(mut self, f: impl Fn(Value) -> Value + Send + Sync + 'static) -> Self {
        self.result_transform = Some(Arc::new(f));
        self
    }
}

/// Tool registered by [`ToolRegistry::compose`].
///
/// Holds a `Weak` handle back to the registry so the registry owning
/// this tool does not keep itself alive through it.
pub struct ComposedTool {
    name: String,
    description: String,
    schema: Option<ToolSchema>,
    steps: Vec<SequenceStep>,
    registry: Weak<RegistryInner>,
}

impl ComposedTool {
    pub(crate) fn new(
        name: impl Into<String>,
        steps: Vec<SequenceStep>,
        schema: Option<ToolSchema>,
        registry: Weak<RegistryInner>,
    ) -> Self {
        let name = name.into();
        let description = format!(
            "Composed tool running [{}] in sequence",
            steps
                .iter()
                .map(|s| s.tool.as_str())
                .collect::<Vec<_>>()
                .join(" -> ")
        );
        Self {
            name,
            description,
            schema,
            steps,
            registry,
        }
    }
}

#[async_trait]
impl Tool for ComposedTool {
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
        let registry = self
            .registry
            .upgrade()
            .map(ToolRegistry::from_inner)
            .ok_or_else(|| ToolError::ExecutionFailed("registry dropped".to_string()))?;

        for step in &self.steps {
            if !registry.has_tool(&step.tool) {
                return Err(ToolError::InvalidToolInSequence(step.tool.clone()));
            }
        }

        let mut prior: Option<Value> = None;
        for step in &self.steps {
            let step_params = resolve_parameters(step, &params, prior.as_ref())?;
            tracing::debug!(composed = %self.name, step = %step.tool, "running sequence step");
            let result = registry.execute(&step.tool, step_params).await?;
            prior = Some(match &step.result_transform {
                Some(transform) => transform(result),
                None => result,
            });
        }

        Ok(prior.unwrap_or(Value::Null))
    }
}

fn resolve_parameters(
    step: &SequenceStep,
    input: &Value,
    prior: Option<&Value>,
) -> Result<Value, ToolError> {
    match &step.parameter_map {
        None => Ok(input.clone()),
        Some(ParameterMap::Func(f)) => Ok(f(input, prior)),
        Some(ParameterMap::Static(mapping)) => {
            let mut params = serde_json::Map::new();
            for (target, source) in mapping {
                let value = resolve_source(source, input, prior)
                    .ok_or_else(|| ToolError::UnresolvedMapping(source.clone()))?;
                params.insert(target.clone(), value);
            }
            Ok(Value::Object(params))
        }
    }
}

fn resolve_source(source: &str, input: &Value, prior: Option<&Value>) -> Option<Value> {
    let (root, path) = match source.split_once('.') {
        Some((root, rest)) => (root, Some(rest)),
        None => (source, None),
    };

    let base = match root {
        "params" => Some(input),
        "result" => prior,
        _ => None,
    }?;

    match path {
        None => Some(base.clone()),
        Some(path) => path
            .split('.')
            .try_fold(base, |value, key| value.get(key))
            .cloned(),
    }
}
