//! Schema-validated tool dispatch and recoverable plan execution.
//!
//! `playbook` is the runtime an autonomous agent executes its plans
//! with:
//!
//! - [`ToolRegistry`] holds named, schema-validated async operations,
//!   tracks per-tool usage/timing/error metrics, and can compose new
//!   tools from existing ones.
//! - [`PlanExecutor`] runs ordered multi-step plans against the
//!   registry, applying per-step failure recovery
//!   (retry / alternative / skip / abort) and keeping a bounded
//!   history of execution results.
//! - [`RecoveryPolicy`] is the pluggable decision-maker consulted on
//!   step failure; one adapter asks a language model, another returns
//!   deterministic outcomes.
//!
//! Plans are produced by an external planner and arrive as JSON; the
//! executor always returns a structured [`ExecutionResult`], never an
//! error, so callers can see exactly how far execution progressed.

pub mod config;
pub mod error;
pub mod llm;
pub mod plan;
pub mod recovery;
pub mod tools;

pub use config::{Config, ExecutorConfig, LlmConfig};
pub use error::{ConfigError, LlmError, RecoveryError, ToolError};
pub use plan::{ExecutionResult, Plan, PlanExecutor, PlanStep, StepResult};
pub use recovery::{RecoveryOutcome, RecoveryPolicy};
pub use tools::{Tool, ToolRegistry, ToolSchema};
