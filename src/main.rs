// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use anyhow::Context;
use millrace::catalog::BuiltinCatalog;
use millrace::engine::{
    EngineEnvironment, ExecutionDriver, ExecutionRequest, MemoryStepJournal,
    NodeExecutionSummary,
};
use millrace::model::load_and_validate_workflow;
use millrace::services::{
    LedgerCreditService, MemoryExecutionStore, MemoryObjectStore, NullMonitor,
    StaticCredentialProvider,
};
use std::env;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args: Vec<String> = env::args().collect();
    let pretty = args.iter().any(|arg| arg == "--pretty");
    let files: Vec<&String> = args[1..].iter().filter(|arg| *arg != "--pretty").collect();

    if files.is_empty() {
        eprintln!("Usage: {} <workflow.yaml> [workflow2.yaml ...] [--pretty]", args[0]);
        eprintln!("Example: {} demos/linear-math.yaml --pretty", args[0]);
        std::process::exit(1);
    }

    for (i, file) in files.iter().enumerate() {
        if i > 0 {
            println!("\n{}", "─".repeat(72));
        }
        run_workflow_file(file, pretty)
            .await
            .with_context(|| format!("failed to execute {}", file))?;
    }

    Ok(())
}

async fn run_workflow_file(path: &str, pretty: bool) -> anyhow::Result<()> {
    let workflow = load_and_validate_workflow(path)
        .map_err(|error| anyhow::anyhow!(error.to_string()))?;

    println!("🚀 Executing workflow '{}' ({})", workflow.name, path);

    let environment = EngineEnvironment {
        catalog: Arc::new(BuiltinCatalog::new()),
        object_store: Arc::new(MemoryObjectStore::new()),
        credits: Arc::new(LedgerCreditService::new()),
        store: Arc::new(MemoryExecutionStore::new()),
        monitor: Arc::new(NullMonitor::new()),
        credentials: Arc::new(StaticCredentialProvider::new()),
        journal: Arc::new(MemoryStepJournal::new()),
    };
    let driver = ExecutionDriver::new(environment);

    let record = driver
        .execute(ExecutionRequest::new(workflow, "local-user", "local-org"))
        .await?;

    println!("   status: {}", record.status.as_str());
    if let Some(error) = &record.error {
        println!("   error:  {}", error);
    }
    for entry in &record.node_executions {
        match entry {
            NodeExecutionSummary::Completed { node_id, usage, .. } => {
                println!("   ✔ {} (usage {})", node_id, usage)
            }
            NodeExecutionSummary::Error { node_id, error, .. } => {
                println!("   ✘ {} - {}", node_id, error)
            }
            NodeExecutionSummary::Skipped {
                node_id,
                blocked_by,
                ..
            } => println!("   ⊘ {} (blocked by {})", node_id, blocked_by.join(", ")),
            NodeExecutionSummary::Executing { node_id, .. }
            | NodeExecutionSummary::Idle { node_id, .. } => println!("   … {}", node_id),
        }
    }

    let json = if pretty {
        serde_json::to_string_pretty(&record)?
    } else {
        serde_json::to_string(&record)?
    };
    println!("{}", json);

    Ok(())
}
