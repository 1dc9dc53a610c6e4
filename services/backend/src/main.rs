use axum::{routing::get, Router};
use backend::{build_router, build_state, config::Config, services::sync::run_periodic_sync};
use std::{net::SocketAddr, time::Duration};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize structured logging with JSON formatting (configurable via env)
    let use_json = std::env::var("LOG_FORMAT")
        .unwrap_or_else(|_| "text".to_string())
        .eq_ignore_ascii_case("json");

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "backend=info,tower_http=info".into());

    if use_json {
        // JSON structured logging for production
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        // Human-readable logging for development
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }

    tracing::info!(
        service = "backend",
        version = env!("CARGO_PKG_VERSION"),
        log_format = if use_json { "json" } else { "text" },
        "Starting backend service"
    );

    let config = Config::load()?;
    tracing::info!(
        backend = ?config.database.backend,
        sync_interval_seconds = config.sync.interval_seconds,
        "Configuration loaded"
    );

    let api_port = config.api_port;
    let metrics_port = config.metrics_port;
    let sync_interval = config.sync.interval_seconds;

    let app_state = build_state(config)?;

    if sync_interval > 0 {
        tokio::spawn(run_periodic_sync(
            app_state.store.clone(),
            Duration::from_secs(sync_interval),
        ));
    }

    let app = build_router(app_state);

    // Start metrics server
    let metrics_handle = if metrics_port > 0 {
        Some(tokio::spawn(start_metrics_server(metrics_port)))
    } else {
        None
    };

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], api_port));
    tracing::info!("Backend API listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    if let Some(handle) = metrics_handle {
        handle.await??;
    }

    Ok(())
}

async fn start_metrics_server(port: u16) -> anyhow::Result<()> {
    let builder = metrics_exporter_prometheus::PrometheusBuilder::new();
    let handle = builder.install_recorder()?;

    let app = Router::new().route("/metrics", get(|| async move { handle.render() }));

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("Metrics server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
