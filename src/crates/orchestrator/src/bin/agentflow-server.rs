//! agentflow server binary
//!
//! Wires the engine, provider adapters, persistence, worker and HTTP API
//! into a single process.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use engine::events::EventBus;
use engine::executor::WorkflowExecutor;
use engine::pricing::PricingTable;
use llm::{AdapterRegistry, LlmSettings};
use orchestrator::api::{routes, AppState};
use orchestrator::{
    AppConfig, Database, ExecutionService, JobQueue, SqliteExecutionStore, Worker, WorkflowService,
};

#[derive(Debug, Parser)]
#[command(name = "agentflow-server", about = "Workflow execution server for LLM agent DAGs")]
struct Args {
    /// Path to a TOML configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Override the bind host
    #[arg(long)]
    host: Option<String>,

    /// Override the bind port
    #[arg(long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let mut config = AppConfig::load(args.config.as_deref()).context("loading configuration")?;
    if let Some(host) = args.host {
        config.server.host = host;
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }

    let db = Arc::new(
        Database::initialize(&config.database.path)
            .await
            .context("initializing database")?,
    );

    let pricing = Arc::new(match &config.pricing.path {
        Some(path) => PricingTable::from_file(path).context("loading pricing table")?,
        None => PricingTable::default_table(),
    });

    let events = Arc::new(EventBus::new());
    let (queue, job_rx) = JobQueue::new();

    let registry = Arc::new(AdapterRegistry::new(LlmSettings::from_env(), pricing.clone()));
    let store = Arc::new(SqliteExecutionStore::new(db.clone()));
    let executor = Arc::new(WorkflowExecutor::new(store, registry, events.clone()));
    Worker::new(job_rx, executor).spawn();

    let state = AppState {
        db: db.clone(),
        workflows: WorkflowService::new(db.clone()),
        executions: ExecutionService::new(db, pricing, queue),
        events,
    };

    let addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("binding {}", addr))?;
    info!(addr = %addr, "agentflow server listening");

    axum::serve(listener, routes::router(state))
        .await
        .context("serving")?;

    Ok(())
}
