//! Language-model-backed recovery decisions.
//!
//! The prompt asks for a JSON decision object; the reply is parsed
//! from a fenced code block or the first top-level `{...}` in the
//! text. Anything unparseable becomes [`RecoveryOutcome::Unresolved`]
//! so the executor can fall back to its no-recovery path.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;

use crate::error::{RecoveryError, ToolError};
use crate::llm::{ChatMessage, CompletionRequest, LlmProvider};
use crate::plan::PlanStep;
use crate::recovery::policy::{RecoveryOutcome, RecoveryPolicy};

const DECISION_PROMPT: &str = r#"You are the failure-recovery assistant for an autonomous agent.

A step of an execution plan has failed. Decide how the agent should proceed.

Respond with a JSON object in this exact shape:
{
    "action": "retry" | "alternative" | "skip" | "abort",
    "details": {
        "params": {},            // for retry: parameter overrides
        "tool": "...",           // for alternative: replacement tool name
        "parameters": {},        // for alternative: its parameters
        "reason": "..."          // for skip/abort
    }
}"#;

/// Recovery policy that asks a language model to choose an outcome.
pub struct LlmRecoveryPolicy {
    llm: Arc<dyn LlmProvider>,
}

impl LlmRecoveryPolicy {
    pub fn new(llm: Arc<dyn LlmProvider>) -> Self {
        Self { llm }
    }

    fn build_prompt(step: &PlanStep, error: &ToolError) -> String {
        format!(
            "Failed step:\n- id: {}\n- description: {}\n- tool: {}\n- parameters: {}\n- recovery hint: {}\n\nError:\n{}",
            step.id,
            step.description,
            step.tool,
            step.parameters,
            step.error_handling.as_deref().unwrap_or("none"),
            error,
        )
    }
}

#[async_trait]
impl RecoveryPolicy for LlmRecoveryPolicy {
    async fn decide(
        &self,
        step: &PlanStep,
        error: &ToolError,
    ) -> Result<RecoveryOutcome, RecoveryError> {
        let messages = vec![
            ChatMessage::system(DECISION_PROMPT),
            ChatMessage::user(Self::build_prompt(step, error)),
        ];
        let request = CompletionRequest::new(messages)
            .with_max_tokens(512)
            .with_temperature(0.1);

        let response = self.llm.complete(request).await?;

        match parse_decision(&response.content) {
            Ok(outcome) => Ok(outcome),
            Err(err) => {
                tracing::warn!(step = %step.id, error = %err, "unparseable recovery decision");
                Ok(RecoveryOutcome::Unresolved)
            }
        }
    }
}

#[derive(Deserialize)]
struct DecisionWire {
    action: String,
    #[serde(default)]
    details: DecisionDetails,
}

#[derive(Default, Deserialize)]
struct DecisionDetails {
    #[serde(default)]
    params: Option<Value>,
    #[serde(default)]
    tool: Option<String>,
    #[serde(default)]
    parameters: Option<Value>,
    #[serde(default)]
    reason: Option<String>,
}

/// Parse a model reply into an outcome.
fn parse_decision(content: &str) -> Result<RecoveryOutcome, RecoveryError> {
    let json = extract_fenced_json(content)
        .or_else(|| extract_json(content))
        .ok_or_else(|| RecoveryError::Parse("no JSON object in response".to_string()))?;

    let wire: DecisionWire =
        serde_json::from_str(json).map_err(|e| RecoveryError::Parse(e.to_string()))?;

    match wire.action.as_str() {
        "retry" => Ok(RecoveryOutcome::Retry {
            params: wire.details.params.unwrap_or(Value::Null),
        }),
        "alternative" => {
            let tool = wire.details.tool.ok_or_else(|| {
                RecoveryError::Parse("alternative decision without a tool".to_string())
            })?;
            Ok(RecoveryOutcome::Alternative {
                tool,
                params: wire.details.parameters.unwrap_or(Value::Null),
            })
        }
        "skip" => Ok(RecoveryOutcome::Skip {
            reason: wire
                .details
                .reason
                .unwrap_or_else(|| "skipped by recovery policy".to_string()),
        }),
        "abort" => Ok(RecoveryOutcome::Abort {
            reason: wire
                .details
                .reason
                .unwrap_or_else(|| "aborted by recovery policy".to_string()),
        }),
        other => Err(RecoveryError::Parse(format!("unknown action: {other}"))),
    }
}

/// Extract the body of the first fenced code block, if any.
fn extract_fenced_json(text: &str) -> Option<&str> {
    let start = text.find("```")?;
    let after = &text[start + 3..];
    // Skip the info string ("json") up to the end of its line.
    let body_start = after.find('\n')? + 1;
    let body = &after[body_start..];
    let end = body.find("```")?;
    Some(body[..end].trim())
}

/// Extract the first top-level `{...}` span from free text.
fn extract_json(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    if start < end { Some(&text[start..=end]) } else { None }
}
