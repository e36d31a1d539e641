use client_registry::application::context::AppContext;
use client_registry::config::{self, Settings};
use client_registry::infrastructure::db::postgres::PostgresDatabase;
use client_registry::infrastructure::db::repositories::Repositories;
use client_registry::interface::http;
use client_registry::interface::http::state::AppState;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[tokio::main]
async fn main() -> Result<(), BoxError> {
    // Step 1: Load configuration.
    let settings = config::load()?;

    // Step 2: Initialise logging and the metrics recorder.
    init_tracing(&settings);
    let metrics = install_metrics();

    // Step 3: Pick the store backend.
    let repos = build_repositories(&settings).await?;

    // Step 4: Assemble shared application context and HTTP state.
    let state = AppState {
        ctx: Arc::new(AppContext::new(repos)),
        metrics,
    };

    // Step 5: Bind and serve until Ctrl-C.
    let app = http::app(state);
    let bind_addr = format!("{}:{}", settings.server.host, settings.server.port);
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    info!(addr = %bind_addr, "client_registry_listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("client_registry_stopped");
    Ok(())
}

/// `RUST_LOG` wins over the configured filter.
fn init_tracing(settings: &Settings) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&settings.log.filter));
    let json = settings.log.json;

    tracing_subscriber::registry()
        .with(filter)
        .with(json.then(|| fmt::layer().json()))
        .with((!json).then(fmt::layer))
        .init();
}

fn install_metrics() -> Option<PrometheusHandle> {
    match PrometheusBuilder::new().install_recorder() {
        Ok(handle) => Some(handle),
        Err(err) => {
            warn!(error = %err, "metrics_recorder_unavailable");
            None
        }
    }
}

async fn build_repositories(settings: &Settings) -> Result<Repositories, BoxError> {
    let Some(url) = settings.db.url.as_deref() else {
        warn!("no database url configured; clients are kept in memory and lost on restart");
        return Ok(Repositories::memory());
    };

    let db = PostgresDatabase::connect(url, settings.db.max_connections).await?;
    if settings.db.run_migrations {
        db.migrate().await?;
        info!("database_migrations_applied");
    }
    Ok(Repositories::postgres(Arc::new(db)))
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!(error = %err, "shutdown_signal_unavailable");
        std::future::pending::<()>().await;
    }
    info!("shutdown_requested");
}
