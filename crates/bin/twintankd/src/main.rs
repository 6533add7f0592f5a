//! # twintankd: twintank daemon
//!
//! Composition root that wires all adapters together and starts the server.
//!
//! ## Responsibilities
//! - Load configuration (config file, env vars)
//! - Initialise structured logging
//! - Construct the device store selected by `store.backend`
//! - Construct the control cycle, the snapshot bus and the device service
//! - Start the cycle timer in the background
//! - Build the axum router and serve until SIGINT/SIGTERM
//!
//! ## Dependency rule
//! This is the **only** crate that depends on all other crates.
//! It is the wiring layer: no domain logic belongs here.

mod config;

use std::sync::Arc;

use anyhow::Context;
use tracing_subscriber::EnvFilter;

use twintank_adapter_http_axum::router;
use twintank_adapter_http_axum::state::AppState;
use twintank_adapter_store_memory::InMemoryDeviceStore;
use twintank_adapter_store_rest::RestDeviceStore;
use twintank_app::control_cycle::ControlCycle;
use twintank_app::ports::DeviceStore;
use twintank_app::scheduler::CycleTimer;
use twintank_app::services::device_service::DeviceService;
use twintank_app::snapshot_bus::SnapshotBus;

use crate::config::{Config, StoreBackend};

/// Snapshots buffered per SSE subscriber before it starts lagging.
const SNAPSHOT_CHANNEL_CAPACITY: usize = 64;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::load().context("failed to load configuration")?;
    init_tracing(&config.logging.filter);

    match config.store.backend {
        StoreBackend::Rest => {
            let store = RestDeviceStore::new(config.rest_store())
                .context("failed to build REST device store")?;
            tracing::info!(url = %store.config().collection_url(), "using REST device store");
            serve(Arc::new(store), &config).await
        }
        StoreBackend::Memory => {
            tracing::info!("using in-memory demo installation");
            serve(
                Arc::new(InMemoryDeviceStore::with_demo_installation()),
                &config,
            )
            .await
        }
    }
}

fn init_tracing(filter: &str) {
    let env_filter = EnvFilter::try_new(filter).unwrap_or_else(|err| {
        eprintln!("invalid log filter {filter:?} ({err}), falling back to info");
        EnvFilter::new("info")
    });
    tracing_subscriber::fmt().with_env_filter(env_filter).init();
}

async fn serve<S>(store: Arc<S>, config: &Config) -> anyhow::Result<()>
where
    S: DeviceStore + 'static,
{
    let bus = Arc::new(SnapshotBus::new(SNAPSHOT_CHANNEL_CAPACITY));
    let cycle = Arc::new(ControlCycle::new(
        Arc::clone(&store),
        Arc::clone(&bus),
        config.cycle_settings(),
    ));
    let device_service = Arc::new(DeviceService::new(store));

    let timer = CycleTimer::start(Arc::clone(&cycle), config.cycle_period());

    let state = AppState::new(cycle, device_service, bus)
        .with_refresh_seconds(config.server.refresh_seconds);
    let app = router::build(state);

    let bind_addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {bind_addr}"))?;
    tracing::info!(addr = %bind_addr, "twintankd listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server failed")?;

    timer.abort();
    tracing::info!("twintankd stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!(%err, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                tracing::error!(%err, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
    tracing::info!("shutdown signal received");
}
