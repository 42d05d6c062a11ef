//! Space Controller
//!
//! Session state service for SFU-backed collaboration spaces.
//!
//! # Servers
//!
//! - HTTP API server for space/participant/room operations (default: 0.0.0.0:8080)
//! - HTTP server for health endpoints and metrics (default: 0.0.0.0:8081)
//!
//! # Startup Flow
//!
//! 1. Load configuration from environment
//! 2. Initialize Prometheus metrics recorder
//! 3. Connect the Redis session store and event bus
//! 4. Build the media backend client
//! 5. Wire the managers and spawn the reconciliation task
//! 6. Start the health and API servers
//! 7. Wait for shutdown signal; cancel the reconciler and drain

use std::sync::Arc;

use anyhow::Context;
use space_controller::config::Config;
use space_controller::events::RedisEventBus;
use space_controller::managers::{ParticipantManager, RoomAllocator, SpaceManager, UsageLedger};
use space_controller::media::HttpMediaBackend;
use space_controller::observability::{health_router, init_metrics_recorder, HealthState};
use space_controller::routes::{build_routes, AppState};
use space_controller::store::RedisSessionStore;
use space_controller::tasks::{start_reconciler, Reconciler, ReconcilerConfig};
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "space_controller=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Space Controller");

    // Load configuration
    let config = Config::from_env().map_err(|e| {
        error!("Failed to load configuration: {}", e);
        e
    })?;

    info!(
        sc_id = %config.sc_id,
        bind_address = %config.bind_address,
        health_bind_address = %config.health_bind_address,
        media_backend_url = %config.media_backend_url,
        reconcile_interval_seconds = config.reconcile_interval_seconds,
        reconcile_space_deadline_seconds = config.reconcile_space_deadline_seconds,
        "Configuration loaded successfully"
    );

    // Initialize Prometheus metrics recorder before any metrics are recorded
    let prometheus_handle = init_metrics_recorder().map_err(|e| {
        error!(error = %e, "Failed to install Prometheus metrics recorder");
        anyhow::anyhow!(e)
    })?;

    let health_state = Arc::new(HealthState::new());

    // Connect the session store
    info!("Connecting to Redis...");
    let store = Arc::new(
        RedisSessionStore::connect(&config.redis_url)
            .await
            .context("session store connection failed")?,
    );
    info!("Redis connection established");

    // Event bus publishes on its own connection to the same Redis
    let events = Arc::new(RedisEventBus::connect(&config.redis_url).await?);

    // Media backend client
    let media = Arc::new(HttpMediaBackend::new(
        config.media_backend_url.clone(),
        config.media_api_token.clone(),
    )?);

    // Wire the managers; handlers and the reconciler share them
    let usage = UsageLedger::new(store.clone());
    let participants = ParticipantManager::new(store.clone(), usage.clone());
    let rooms = RoomAllocator::new(store.clone());
    let spaces = SpaceManager::new(store.clone(), usage.clone());

    // Spawn the reconciliation task
    let cancel_token = CancellationToken::new();
    let reconciler = Reconciler::new(
        store.clone(),
        media,
        events,
        participants.clone(),
        ReconcilerConfig {
            interval_seconds: config.reconcile_interval_seconds,
            space_deadline_seconds: config.reconcile_space_deadline_seconds,
        },
    );
    let reconciler_handle = tokio::spawn(start_reconciler(reconciler, cancel_token.clone()));

    // Health/metrics server
    let health_listener = tokio::net::TcpListener::bind(&config.health_bind_address).await?;
    let health_app = health_router(health_state.clone(), prometheus_handle);
    let health_server = tokio::spawn(async move {
        if let Err(e) = axum::serve(health_listener, health_app).await {
            error!(error = %e, "Health server failed");
        }
    });

    // API server
    let state = Arc::new(AppState {
        spaces,
        participants,
        rooms,
        usage,
    });
    let app = build_routes(state);
    let listener = tokio::net::TcpListener::bind(&config.bind_address).await?;

    health_state.set_ready();
    info!(bind_address = %config.bind_address, "Space Controller ready");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // Shutdown: stop accepting, cancel the reconciler, drain
    health_state.set_not_ready();
    info!("Shutting down");

    cancel_token.cancel();
    if let Err(e) = reconciler_handle.await {
        error!(error = %e, "Reconciler task panicked during shutdown");
    }
    health_server.abort();

    info!("Space Controller stopped");
    Ok(())
}

/// Resolve when SIGINT or SIGTERM arrives.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {}
        () = terminate => {}
    }
}
