//! Plan execution.
//!
//! A plan is an ordered list of tool invocations with per-step
//! optionality and recovery hints. The executor dispatches each step
//! through the tool registry, consults the recovery policy on
//! failure, and keeps a bounded history of results.

mod executor;
mod history;
mod types;

pub use executor::{DEFAULT_HISTORY_LIMIT, ExecutorStatus, PlanExecutor};
pub use history::{ExecutionHistory, HISTORY_CAPACITY};
pub use types::{
    ExecutionError, ExecutionResult, Plan, PlanStep, RecoveryDisposition, StepResult,
};
