//! Demo driver: execute a plan file against the builtin tools.

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use playbook::llm::ChatCompletionsProvider;
use playbook::recovery::LlmRecoveryPolicy;
use playbook::tools::EchoTool;
use playbook::tools::builtin::{HttpFetchTool, ReadFileTool};
use playbook::{Config, Plan, PlanExecutor, ToolRegistry};

#[derive(Parser, Debug)]
#[command(
    name = "playbook",
    about = "Execute a JSON plan against the builtin tool registry"
)]
struct Args {
    /// Path to the plan JSON file: {"id": "...", "steps": [...]}.
    #[arg(long)]
    plan: PathBuf,

    /// Recovery policy: "llm" (requires LLM_API_KEY) or "none".
    #[arg(long, default_value = "none")]
    recovery: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let config = Config::from_env()?;

    let raw = std::fs::read_to_string(&args.plan)?;
    let plan: Plan = serde_json::from_str(&raw)?;

    let registry = ToolRegistry::new();
    registry.register(EchoTool);
    registry.register(HttpFetchTool::new());
    registry.register(ReadFileTool);

    let mut executor = PlanExecutor::new(registry.clone())
        .with_history_capacity(config.executor.history_capacity);

    if args.recovery == "llm" {
        let provider = ChatCompletionsProvider::new(config.llm.clone())?;
        executor = executor
            .with_recovery_policy(Arc::new(LlmRecoveryPolicy::new(Arc::new(provider))));
    }

    let result = executor.execute(plan).await;

    println!("{}", serde_json::to_string_pretty(&result)?);
    println!("{}", serde_json::to_string_pretty(&registry.metrics())?);

    if !result.success {
        std::process::exit(1);
    }
    Ok(())
}
