//! Failure recovery for plan execution.
//!
//! When a step fails and carries an `error_handling` hint, the
//! executor asks a [`RecoveryPolicy`] what to do next:
//! retry with adjusted parameters, substitute an alternative tool,
//! skip past the failure, or abort the plan.

mod llm;
mod policy;

pub use llm::LlmRecoveryPolicy;
pub use policy::{RecoveryOutcome, RecoveryPolicy, StaticRecoveryPolicy};
