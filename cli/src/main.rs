//! Server entrypoint for agentflow
//!
//! This is the main binary that wires together all layers using
//! dependency injection.

use agentflow_application::{
    AgentDeps, AllowAllContent, ContentSafety, EventTracker, LlmContentSafety, LlmGateway,
    NoEventTracker, SessionRuntime, WorkflowService,
};
use agentflow_domain::UserId;
use agentflow_infrastructure::{
    ConfigLoader, FileConfig, FileLoggingConfig, JsonlEventTracker, OpenAiCompatibleGateway,
    Severity, ToolCatalogLoader, open_store,
};
use agentflow_presentation::{
    AppState, Cli, HealthCheckResult, HealthChecks, RouterConfig, create_router,
};
use anyhow::{Context, Result, anyhow, bail};
use clap::Parser;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.show_config {
        for line in ConfigLoader::describe_sources() {
            println!("{line}");
        }
        return Ok(());
    }

    let mut config = if cli.no_config {
        ConfigLoader::load_defaults()
    } else {
        ConfigLoader::load(cli.config.as_deref()).map_err(|e| anyhow!("{e}"))?
    };
    if let Some(bind) = &cli.bind {
        config.server.bind = bind.clone();
    }

    let _log_guard = init_logging(&cli, &config.logging)?;
    info!("Starting agentflow");

    let issues = config.validate();
    for issue in &issues {
        match issue.severity {
            Severity::Error => error!("{}", issue.message),
            Severity::Warning => warn!("{}", issue.message),
        }
    }
    if issues.iter().any(|i| i.is_error()) {
        bail!("Invalid configuration");
    }

    run(config).await
}

/// Console output filtered by `-v` (or `RUST_LOG`), plus a daily log file
/// when `[logging] directory` is set.
fn init_logging(cli: &Cli, logging: &FileLoggingConfig) -> Result<Option<WorkerGuard>> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(cli.log_level()));

    let (file_layer, guard) = match &logging.directory {
        Some(dir) => {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("creating log directory {}", dir.display()))?;
            let appender = tracing_appender::rolling::daily(dir, &logging.file_prefix);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer().with_writer(writer).with_ansi(false);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false))
        .with(file_layer)
        .init();

    Ok(guard)
}

async fn run(config: FileConfig) -> Result<()> {
    // === Dependency Injection ===
    let gateway: Arc<dyn LlmGateway> = Arc::new(OpenAiCompatibleGateway::from_config(&config.llm)?);
    let store = open_store(&config.store).await?;

    let tracker: Arc<dyn EventTracker> = match &config.telemetry.events_file {
        Some(path) => match JsonlEventTracker::open(path) {
            Some(tracker) => Arc::new(tracker),
            None => Arc::new(NoEventTracker),
        },
        None => Arc::new(NoEventTracker),
    };

    let catalog = ToolCatalogLoader::load(config.agents.tools_dir.as_deref());
    let params = config.agents.to_execution_params(config.llm.temperature);

    let shutdown = CancellationToken::new();
    let deps = AgentDeps {
        gateway: gateway.clone(),
        store: store.clone(),
        tracker,
        catalog: Arc::new(catalog),
        params,
        cancellation: Some(shutdown.clone()),
    };

    let safety: Arc<dyn ContentSafety> = if config.agents.content_safety {
        Arc::new(LlmContentSafety::new(gateway))
    } else {
        warn!("Content safety check disabled");
        Arc::new(AllowAllContent)
    };

    let workflow = WorkflowService::new(Arc::new(SessionRuntime::new(deps)), safety);

    let checks = HealthChecks::new().with_check("store", move || {
        let store = store.clone();
        async move {
            store
                .get_all_sessions(&UserId::new("healthz"))
                .await
                .map(|_| HealthCheckResult::new(true, "Store reachable"))
                .map_err(|e| e.to_string())
        }
    });
    let state = AppState::new(Arc::new(workflow))
        .with_health_checks(checks)
        .with_health_password(config.health.password.clone());

    let router_config = RouterConfig {
        frontend_url: config.server.frontend_url.clone(),
        request_timeout: Duration::from_secs(config.server.request_timeout_secs),
    };
    let app = create_router(Arc::new(state), &router_config);

    let listener = tokio::net::TcpListener::bind(&config.server.bind)
        .await
        .with_context(|| format!("binding {}", config.server.bind))?;
    info!("Listening on http://{}", config.server.bind);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(shutdown))
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal(token: CancellationToken) {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {e}");
    }
    info!("Shutting down");
    token.cancel();
}
