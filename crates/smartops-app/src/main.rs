//! SmartOps application binary - composition root.
//!
//! Ties together all SmartOps crates into a single executable:
//! 1. Load configuration from TOML and apply CLI/env overrides
//! 2. Open the SQLite operation log
//! 3. Build the action registry, job table and classifier client
//! 4. Start the background dispatcher for scheduled jobs
//! 5. Serve the axum REST API until Ctrl-C

mod cli;

use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use smartops_action::{ActionRegistry, ApprovalGate, CommandOrchestrator, Dispatcher, JobTable};
use smartops_api::state::AppState;
use smartops_core::config::SmartOpsConfig;
use smartops_llm::{Classifier, HttpClassifier};
use smartops_storage::{Database, OperationLog};

use cli::{expand_home, CliArgs};

/// Filter priority: --log-level > RUST_LOG > config file.
fn init_tracing(cli_level: Option<&str>, config_level: &str) {
    let filter = match cli_level {
        Some(level) => EnvFilter::try_new(level).ok(),
        None => EnvFilter::try_from_default_env()
            .ok()
            .or_else(|| EnvFilter::try_new(config_level).ok()),
    }
    .unwrap_or_else(|| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown requested");
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = CliArgs::parse();

    // Config.
    let config_file = args.resolve_config_path();
    let config_exists = config_file.exists();
    let mut config = if config_exists {
        SmartOpsConfig::load(&config_file)?
    } else {
        SmartOpsConfig::default()
    };
    config.general.port = args.resolve_port(config.general.port);
    if let Some(dir) = args.resolve_data_dir() {
        config.general.data_dir = dir;
    }

    // Tracing.
    if let Some(level) = args.resolve_log_level() {
        config.general.log_level = level;
    }
    init_tracing(args.resolve_log_level().as_deref(), &config.general.log_level);

    tracing::info!("Starting SmartOps v{}", env!("CARGO_PKG_VERSION"));
    if config_exists {
        tracing::info!(path = %config_file.display(), "Configuration loaded");
    } else {
        tracing::info!(path = %config_file.display(), "No configuration file, using defaults");
    }

    // Storage.
    let data_dir = expand_home(&config.general.data_dir);
    if let Err(e) = std::fs::create_dir_all(&data_dir) {
        tracing::error!(path = %data_dir.display(), error = %e, "Failed to create data directory");
        return Err(e.into());
    }

    let db_path = data_dir.join("smartops.db");
    let db = Arc::new(Database::new(&db_path)?);
    tracing::info!(path = %db_path.display(), "SQLite database opened");

    // Classifier.
    let classifier: Arc<dyn Classifier> = match HttpClassifier::from_config(&config.llm) {
        Ok(client) => Arc::new(client),
        Err(e) => {
            tracing::error!(error = %e, "Classifier unavailable");
            return Err(e.into());
        }
    };
    tracing::info!(model = %config.llm.model, url = %config.llm.api_url, "Classifier ready");

    // Actions and scheduling.
    let mut registry = ActionRegistry::new();
    registry.register_defaults();
    let registry = Arc::new(registry);
    tracing::info!(tools = ?registry.registered_tools(), "Action handlers registered");

    let jobs = Arc::new(JobTable::new());
    let dispatcher = Arc::new(Dispatcher::new(
        Arc::clone(&jobs),
        Arc::clone(&registry),
        Duration::from_secs(config.execution.executor_timeout_secs),
        Duration::from_secs(config.scheduler.idle_poll_secs),
    ));
    let dispatcher_task = {
        let dispatcher = Arc::clone(&dispatcher);
        tokio::spawn(async move { dispatcher.run().await })
    };

    let orchestrator = Arc::new(CommandOrchestrator::new(
        &config,
        classifier,
        registry,
        jobs,
        ApprovalGate::new(OperationLog::new(db)),
    ));

    // === API server ===

    let state = AppState::new(config.clone(), orchestrator);
    let served = smartops_api::start_server(&config, state, shutdown_signal()).await;

    dispatcher.shutdown();
    if let Err(e) = dispatcher_task.await {
        tracing::warn!(error = %e, "Dispatcher task ended abnormally");
    }

    if let Err(e) = served {
        tracing::error!(error = %e, "API server failed");
        return Err(e.into());
    }

    tracing::info!("SmartOps stopped");
    Ok(())
}
