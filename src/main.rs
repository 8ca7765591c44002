//! starq entry point.
//!
//! Initializes logging, loads configuration, and runs the HTTP control plane.

use std::time::Duration;

use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use starq::cli::{Cli, Commands};
use starq::config::Config;
use starq::http;
use starq::http::state::AppState;
use starq::reclaimer::Reclaimer;
use starq::redis_client;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse CLI arguments first to get log_level.
    let cli = Cli::parse();

    // Priority: RUST_LOG env var > --log-level CLI arg > default "info".
    let log_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| cli.log_level.clone());

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&log_filter)))
        .init();

    let Commands::Serve(args) = cli.command;

    let mut config = Config::from_env();
    if let Some(bind) = args.bind {
        config = config.with_bind_addr(bind);
    }
    if let Some(redis_url) = args.redis_url {
        config = config.with_redis_url(redis_url);
    }

    tracing::info!(bind_addr = %config.bind_addr, "starting starq");

    let redis = redis_client::connect(&config.redis_url).await?;
    let reclaimer = Reclaimer::spawn(
        redis.clone(),
        Duration::from_secs(config.stale_job_interval_secs),
        config.job_meta_ttl_secs,
    );

    let bind_addr = config.bind_addr.clone();
    let state = AppState::new(redis, config);
    let app = http::build_router(state);

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    reclaimer.shutdown().await;
    tracing::info!("starq shut down");

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }

    tracing::info!("shutdown signal received");
}
