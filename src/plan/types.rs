//! Plan and execution result types.
//!
//! A [`Plan`] arrives as JSON from an external planner; everything
//! here is serde-faced so results can be shipped straight back out.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Ordered sequence of tool invocations produced by an external
/// planner. Immutable input to one execution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Plan {
    /// Planner-assigned id; a UUID is generated when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub steps: Vec<PlanStep>,
}

/// One step of a plan.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanStep {
    pub id: String,
    #[serde(default)]
    pub description: String,
    /// Registered tool name to dispatch.
    pub tool: String,
    #[serde(default)]
    pub parameters: Value,
    /// Whether the plan may continue past an unrecovered failure of
    /// this step.
    #[serde(default)]
    pub optional: bool,
    /// Free-text recovery hint; its presence makes the executor
    /// consult the recovery policy when the step fails.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_handling: Option<String>,
}

/// How a failed step's recovery was resolved, recorded on the step.
///
/// Retries and alternatives are not recorded here; they show up as
/// extra [`StepResult`] entries under `<id>_retry` / `<id>_alt`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RecoveryDisposition {
    /// The policy chose to skip past the failure.
    Skipped { reason: String },
    /// The policy aborted the plan.
    Aborted { reason: String },
    /// The policy produced no usable decision; the executor fell back
    /// to the no-recovery path.
    Unresolved,
}

/// Outcome of one dispatched step attempt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepResult {
    pub step_id: String,
    pub tool: String,
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recovery: Option<RecoveryDisposition>,
}

/// Error entry on an execution result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionError {
    /// Step id, or `"overall_execution"` for executor-level failures.
    pub step: String,
    pub message: String,
}

/// Outcome of one plan execution. Partial progress before a halt is
/// preserved in `steps`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionResult {
    pub plan_id: String,
    pub steps: Vec<StepResult>,
    pub success: bool,
    pub errors: Vec<ExecutionError>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    #[test]
    fn test_plan_deserializes_with_defaults() {
        let plan: Plan = serde_json::from_value(json!({
            "steps": [
                {"id": "s1", "tool": "echo", "parameters": {"message": "hi"}}
            ]
        }))
        .unwrap();

        assert!(plan.id.is_none());
        assert_eq!(plan.steps.len(), 1);
        assert!(!plan.steps[0].optional);
        assert!(plan.steps[0].error_handling.is_none());
    }

    #[test]
    fn test_recovery_disposition_tagged() {
        let disposition = RecoveryDisposition::Skipped {
            reason: "transient".to_string(),
        };

        let value = serde_json::to_value(&disposition).unwrap();

        assert_eq!(value, json!({"kind": "skipped", "reason": "transient"}));
    }
}
