mod bootstrap;
mod health;
mod webhook;

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use axum::Router;
use chrono::Utc;
use tokio::sync::Notify;
use tower_http::trace::TraceLayer;
use voltwiz_chat::AdvisorService;
use voltwiz_core::config::{AppConfig, LoadOptions};

fn init_logging(config: &AppConfig) {
    use tracing::Level;
    use voltwiz_core::config::LogFormat::*;

    let log_level = config.logging.level.parse::<Level>().unwrap_or(Level::INFO);

    match config.logging.format {
        Compact => {
            tracing_subscriber::fmt().with_target(false).with_max_level(log_level).compact().init();
        }
        Pretty => {
            tracing_subscriber::fmt().with_target(false).with_max_level(log_level).pretty().init();
        }
        Json => {
            tracing_subscriber::fmt().with_target(false).with_max_level(log_level).json().init();
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    run().await
}

pub async fn run() -> Result<()> {
    let config = AppConfig::load(LoadOptions::default())?;
    init_logging(&config);

    let app = bootstrap::bootstrap_with_config(config)?;

    if let Some(idle_ttl) = app.config.sessions.idle_ttl() {
        spawn_session_sweeper(
            Arc::clone(&app.advisor),
            Duration::from_secs(app.config.sessions.sweep_interval_secs.max(1)),
            idle_ttl.num_seconds(),
        );
    }

    let router = Router::new()
        .merge(health::router(Arc::clone(&app.advisor)))
        .merge(webhook::router(webhook::WebhookState::new(
            Arc::clone(&app.dispatcher),
            Arc::clone(&app.advisor),
            app.config.webhook.shared_secret.clone(),
        )))
        .layer(TraceLayer::new_for_http());

    let address = format!("{}:{}", app.config.server.bind_address, app.config.server.port);
    let listener = tokio::net::TcpListener::bind(&address)
        .await
        .with_context(|| format!("failed to bind {address}"))?;

    tracing::info!(
        event_name = "system.server.started",
        correlation_id = "bootstrap",
        address = %address,
        plans = app.advisor.catalog().len(),
        "voltwiz-server listening"
    );

    let shutdown = Arc::new(Notify::new());
    let signal = Arc::clone(&shutdown);
    let server = tokio::spawn(async move {
        axum::serve(listener, router)
            .with_graceful_shutdown(async move { signal.notified().await })
            .await
    });

    wait_for_shutdown().await?;
    tracing::info!(
        event_name = "system.server.stopping",
        correlation_id = "shutdown",
        "voltwiz-server stopping"
    );
    shutdown.notify_one();

    let grace = Duration::from_secs(app.config.server.graceful_shutdown_secs);
    match tokio::time::timeout(grace, server).await {
        Ok(joined) => joined.context("server task panicked")??,
        Err(_) => tracing::warn!(
            event_name = "system.server.shutdown_timeout",
            correlation_id = "shutdown",
            grace_secs = grace.as_secs(),
            "in-flight requests did not finish before the shutdown deadline"
        ),
    }

    Ok(())
}

fn spawn_session_sweeper(advisor: Arc<AdvisorService>, every: Duration, idle_ttl_secs: i64) {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            match advisor.purge_expired(Utc::now()) {
                Ok(0) => {}
                Ok(purged) => tracing::info!(
                    event_name = "system.sessions.purged",
                    correlation_id = "sweeper",
                    purged,
                    idle_ttl_secs,
                    "expired sessions purged"
                ),
                Err(error) => tracing::warn!(
                    event_name = "system.sessions.purge_failed",
                    correlation_id = "sweeper",
                    error = %error,
                    "session sweep failed"
                ),
            }
        }
    });
}

async fn wait_for_shutdown() -> Result<()> {
    tokio::signal::ctrl_c().await?;
    Ok(())
}
