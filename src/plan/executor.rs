//! Sequential plan execution with per-step failure recovery.

use std::panic::AssertUnwindSafe;
use std::sync::{Arc, Mutex};

use chrono::Utc;
use futures::FutureExt;
use serde::Serialize;
use serde_json::Value;
use uuid::Uuid;

use crate::error::ToolError;
use crate::plan::history::ExecutionHistory;
use crate::plan::types::{
    ExecutionError, ExecutionResult, Plan, PlanStep, RecoveryDisposition, StepResult,
};
use crate::recovery::{RecoveryOutcome, RecoveryPolicy};
use crate::tools::ToolRegistry;

/// Default number of entries returned by
/// [`PlanExecutor::recent_history`].
pub const DEFAULT_HISTORY_LIMIT: usize = 10;

/// Step id used for failures of the executor itself rather than of a
/// tool.
const OVERALL_STEP: &str = "overall_execution";

/// Runs plans against a [`ToolRegistry`], one step at a time.
///
/// Steps run strictly in list order; later steps may rely on side
/// effects of earlier ones, and no retries or alternatives run
/// concurrently with anything else. A step dispatch has no built-in
/// timeout; wrap [`execute`](Self::execute) in
/// `tokio::time::timeout` if a hung tool must not block the plan
/// indefinitely.
pub struct PlanExecutor {
    registry: ToolRegistry,
    recovery: Option<Arc<dyn RecoveryPolicy>>,
    history: Mutex<ExecutionHistory>,
}

/// Snapshot of executor state for status surfaces.
#[derive(Debug, Clone, Serialize)]
pub struct ExecutorStatus {
    /// Whether the executor is ready to accept plans.
    pub initialized: bool,
    pub history_size: usize,
    pub registered_tools: usize,
}

impl PlanExecutor {
    /// Create an executor over the given registry.
    pub fn new(registry: ToolRegistry) -> Self {
        Self {
            registry,
            recovery: None,
            history: Mutex::new(ExecutionHistory::default()),
        }
    }

    /// Attach a recovery policy, consulted when a step that carries an
    /// `error_handling` hint fails.
    pub fn with_recovery_policy(mut self, policy: Arc<dyn RecoveryPolicy>) -> Self {
        self.recovery = Some(policy);
        self
    }

    /// Override the history capacity (default 100).
    pub fn with_history_capacity(mut self, capacity: usize) -> Self {
        self.history = Mutex::new(ExecutionHistory::new(capacity));
        self
    }

    /// Execute a plan to completion.
    ///
    /// Never fails: every tool error becomes a failed [`StepResult`],
    /// and a panic inside the executor or a tool is reported under the
    /// `"overall_execution"` step, so callers always receive a
    /// structured result showing how far execution progressed.
    pub async fn execute(&self, plan: Plan) -> ExecutionResult {
        let plan_id = plan
            .id
            .clone()
            .unwrap_or_else(|| Uuid::new_v4().to_string());
        let started_at = Utc::now();
        tracing::info!(plan_id = %plan_id, steps = plan.steps.len(), "executing plan");

        let mut result = ExecutionResult {
            plan_id: plan_id.clone(),
            steps: Vec::new(),
            success: true,
            errors: Vec::new(),
            started_at,
            finished_at: started_at,
        };

        let run = AssertUnwindSafe(self.run_steps(&plan, &mut result))
            .catch_unwind()
            .await;
        if let Err(panic) = run {
            let message = panic_message(panic);
            tracing::error!(plan_id = %plan_id, %message, "executor failure outside tool dispatch");
            result.success = false;
            result.errors.push(ExecutionError {
                step: OVERALL_STEP.to_string(),
                message,
            });
        }

        result.finished_at = Utc::now();
        tracing::info!(
            plan_id = %plan_id,
            success = result.success,
            steps = result.steps.len(),
            "plan finished"
        );

        self.history
            .lock()
            .expect("history lock poisoned")
            .push(result.clone());
        result
    }

    /// The most recent `limit` execution results, newest first.
    pub fn history(&self, limit: usize) -> Vec<ExecutionResult> {
        self.history
            .lock()
            .expect("history lock poisoned")
            .recent(limit)
    }

    /// The last [`DEFAULT_HISTORY_LIMIT`] execution results.
    pub fn recent_history(&self) -> Vec<ExecutionResult> {
        self.history(DEFAULT_HISTORY_LIMIT)
    }

    pub fn status(&self) -> ExecutorStatus {
        ExecutorStatus {
            initialized: true,
            history_size: self.history.lock().expect("history lock poisoned").len(),
            registered_tools: self.registry.registered_tools().len(),
        }
    }

    async fn run_steps(&self, plan: &Plan, result: &mut ExecutionResult) {
        for step in &plan.steps {
            let (attempt, error) = self.dispatch(step).await;
            match error {
                None => result.steps.push(attempt),
                Some(error) => {
                    if self.handle_failure(step, attempt, error, result).await {
                        break;
                    }
                }
            }
        }
    }

    /// Dispatch one step attempt through the registry.
    ///
    /// The `has_tool` guard keeps an unknown tool name a clean
    /// step-level error instead of a registry internal one.
    async fn dispatch(&self, step: &PlanStep) -> (StepResult, Option<ToolError>) {
        let started_at = Utc::now();

        let outcome = if self.registry.has_tool(&step.tool) {
            self.registry
                .execute(&step.tool, step.parameters.clone())
                .await
        } else {
            Err(ToolError::NotFound(step.tool.clone()))
        };

        let finished_at = Utc::now();
        match outcome {
            Ok(value) => (
                StepResult {
                    step_id: step.id.clone(),
                    tool: step.tool.clone(),
                    success: true,
                    result: Some(value),
                    error: None,
                    started_at,
                    finished_at,
                    recovery: None,
                },
                None,
            ),
            Err(error) => {
                tracing::warn!(step = %step.id, tool = %step.tool, %error, "step failed");
                (
                    StepResult {
                        step_id: step.id.clone(),
                        tool: step.tool.clone(),
                        success: false,
                        result: None,
                        error: Some(error.to_string()),
                        started_at,
                        finished_at,
                        recovery: None,
                    },
                    Some(error),
                )
            }
        }
    }

    /// Apply the recovery policy to a failed step and decide whether
    /// the plan halts. Returns `true` to halt.
    async fn handle_failure(
        &self,
        step: &PlanStep,
        mut failed: StepResult,
        error: ToolError,
        result: &mut ExecutionResult,
    ) -> bool {
        let mut recovered = false;
        let mut aborted = false;
        let mut last_error = error.to_string();

        if let (Some(_hint), Some(policy)) = (&step.error_handling, &self.recovery) {
            match policy.decide(step, &error).await {
                Ok(RecoveryOutcome::Retry { params }) => {
                    result.steps.push(failed);
                    let retry = generated_attempt(
                        step,
                        format!("{}_retry", step.id),
                        step.tool.clone(),
                        merge_params(&step.parameters, &params),
                    );
                    tracing::info!(step = %step.id, "retrying step with adjusted parameters");
                    let (attempt, attempt_error) = self.dispatch(&retry).await;
                    recovered = attempt.success;
                    if let Some(err) = attempt_error {
                        last_error = err.to_string();
                    }
                    result.steps.push(attempt);
                }
                Ok(RecoveryOutcome::Alternative { tool, params }) => {
                    result.steps.push(failed);
                    let alternative =
                        generated_attempt(step, format!("{}_alt", step.id), tool, params);
                    tracing::info!(
                        step = %step.id,
                        tool = %alternative.tool,
                        "running alternative tool for failed step"
                    );
                    let (attempt, attempt_error) = self.dispatch(&alternative).await;
                    recovered = attempt.success;
                    if let Some(err) = attempt_error {
                        last_error = err.to_string();
                    }
                    result.steps.push(attempt);
                }
                Ok(RecoveryOutcome::Skip { reason }) => {
                    tracing::info!(step = %step.id, %reason, "skipping failed step");
                    failed.recovery = Some(RecoveryDisposition::Skipped { reason });
                    result.steps.push(failed);
                    // Skip continues regardless of optionality.
                    return false;
                }
                Ok(RecoveryOutcome::Abort { reason }) => {
                    tracing::warn!(step = %step.id, %reason, "recovery policy aborted the plan");
                    failed.recovery = Some(RecoveryDisposition::Aborted { reason });
                    result.steps.push(failed);
                    aborted = true;
                }
                Ok(RecoveryOutcome::Unresolved) => {
                    failed.recovery = Some(RecoveryDisposition::Unresolved);
                    result.steps.push(failed);
                }
                Err(err) => {
                    tracing::warn!(step = %step.id, error = %err, "recovery policy failed, treating as unresolved");
                    failed.recovery = Some(RecoveryDisposition::Unresolved);
                    result.steps.push(failed);
                }
            }
        } else {
            result.steps.push(failed);
        }

        if recovered {
            return false;
        }

        // Abort overrides optionality; an optional step otherwise
        // never halts the plan.
        if step.optional && !aborted {
            tracing::debug!(step = %step.id, "optional step failed, continuing");
            return false;
        }

        result.success = false;
        result.errors.push(ExecutionError {
            step: step.id.clone(),
            message: format!("Critical step failed: {last_error}"),
        });
        true
    }
}

/// Build a policy-generated attempt. Generated attempts carry no
/// `error_handling` hint, so they are never themselves recovered.
fn generated_attempt(original: &PlanStep, id: String, tool: String, parameters: Value) -> PlanStep {
    PlanStep {
        id,
        description: original.description.clone(),
        tool,
        parameters,
        optional: original.optional,
        error_handling: None,
    }
}

/// Shallow-merge `overrides` over `base`. A null override keeps the
/// base; a non-object override replaces it wholesale.
fn merge_params(base: &Value, overrides: &Value) -> Value {
    match (base, overrides) {
        (Value::Object(base), Value::Object(overrides)) => {
            let mut merged = base.clone();
            for (key, value) in overrides {
                merged.insert(key.clone(), value.clone());
            }
            Value::Object(merged)
        }
        (_, Value::Null) => base.clone(),
        _ => overrides.clone(),
    }
}

fn panic_message(panic: Box<dyn std::any::Any + Send>) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
