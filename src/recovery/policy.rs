//! Recovery policy contract and the deterministic adapter.

use std::collections::HashMap;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::{RecoveryError, ToolError};
use crate::plan::PlanStep;

/// Decision returned by a recovery policy for a failed step.
#[derive(Debug, Clone, PartialEq)]
pub enum RecoveryOutcome {
    /// Re-run the step, merging these parameters over the originals.
    Retry { params: Value },
    /// Run a different tool in place of the failed step.
    Alternative { tool: String, params: Value },
    /// Leave the step failed and continue with the rest of the plan.
    Skip { reason: String },
    /// Stop the plan.
    Abort { reason: String },
    /// No usable decision; the executor falls back to the no-recovery
    /// path.
    Unresolved,
}

/// Pluggable decision-maker consulted when a step fails.
///
/// The executor only depends on this contract; the language-model
/// adapter in [`crate::recovery::LlmRecoveryPolicy`] is one
/// implementation among others.
#[async_trait]
pub trait RecoveryPolicy: Send + Sync {
    async fn decide(
        &self,
        step: &PlanStep,
        error: &ToolError,
    ) -> Result<RecoveryOutcome, RecoveryError>;
}

/// Deterministic policy: a fixed outcome, optionally overridden per
/// tool. Useful in tests and offline runs.
pub struct StaticRecoveryPolicy {
    default: RecoveryOutcome,
    per_tool: HashMap<String, RecoveryOutcome>,
}

impl StaticRecoveryPolicy {
    pub fn new(default: RecoveryOutcome) -> Self {
        Self {
            default,
            per_tool: HashMap::new(),
        }
    }

    /// Return a specific outcome when the named tool fails.
    pub fn with_tool_outcome(mut self, tool: impl Into<String>, outcome: RecoveryOutcome) -> Self {
        self.per_tool.insert(tool.into(), outcome);
        self
    }
}

#[async_trait]
impl RecoveryPolicy for StaticRecoveryPolicy {
    async fn decide(
        &self,
        step: &PlanStep,
        _error: &ToolError,
    ) -> Result<RecoveryOutcome, RecoveryError> {
        Ok(self
            .per_tool
            .get(&step.tool)
            .cloned()
            .unwrap_or_else(|| self.default.clone()))
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn step(tool: &str) -> PlanStep {
        PlanStep {
            id: "s1".to_string(),
            description: String::new(),
            tool: tool.to_string(),
            parameters: json!({}),
            optional: false,
            error_handling: Some("hint".to_string()),
        }
    }

    #[tokio::test]
    async fn test_per_tool_override() {
        let policy = StaticRecoveryPolicy::new(RecoveryOutcome::Unresolved).with_tool_outcome(
            "search",
            RecoveryOutcome::Skip {
                reason: "search is best-effort".to_string(),
            },
        );
        let error = ToolError::ExecutionFailed("boom".to_string());

        let search = policy.decide(&step("search"), &error).await.unwrap();
        assert!(matches!(search, RecoveryOutcome::Skip { .. }));

        let other = policy.decide(&step("other"), &error).await.unwrap();
        assert_eq!(other, RecoveryOutcome::Unresolved);
    }
}
