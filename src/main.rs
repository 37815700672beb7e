use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use collab_gateway::config::{load_config, GatewayConfig};
use collab_gateway::gateway::Gateway;
use collab_gateway::http::HttpServer;
use collab_gateway::lifecycle::{signals, startup, CoordinatorState, Lifecycle, ShutdownCoordinator};
use collab_gateway::net::{Acceptor, ResumptionCache};
use collab_gateway::observability::{logging, metrics};
use collab_gateway::persistence::{MemoryPersistence, ReadinessGate};
use collab_gateway::realtime::{LocalRealtime, MemorySessionStore};

#[derive(Parser)]
#[command(name = "collab-gateway")]
#[command(about = "Realtime session gateway for collaborative documents", long_about = None)]
struct Cli {
    /// Path to a TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() {
    logging::init();
    logging::install_panic_hook();

    let cli = Cli::parse();
    tracing::info!("collab-gateway v{} starting", env!("CARGO_PKG_VERSION"));

    let config = match &cli.config {
        Some(path) => match load_config(path) {
            Ok(config) => config,
            Err(e) => {
                tracing::error!(path = %path.display(), error = %e, "Failed to load configuration");
                std::process::exit(1);
            }
        },
        None => GatewayConfig::default(),
    };

    let prometheus = if config.observability.metrics_enabled {
        metrics::install_recorder()
    } else {
        None
    };

    let lifecycle = Arc::new(Lifecycle::new());
    let persistence = Arc::new(MemoryPersistence::new());
    let realtime = Arc::new(LocalRealtime::new());
    let sessions = Arc::new(MemorySessionStore::new());
    let gateway = Arc::new(Gateway::new(
        &config,
        lifecycle.clone(),
        realtime.clone(),
        sessions,
    ));
    let gate = ReadinessGate::new(persistence, realtime);
    let cache = Arc::new(ResumptionCache::default());

    let acceptor = match startup::admit(&gate, &lifecycle, || {
        Acceptor::bind_config(&config.listener, cache)
    })
    .await
    {
        Ok(acceptor) => acceptor,
        Err(e) => {
            tracing::error!(error = %e, "Startup failed");
            std::process::exit(1);
        }
    };
    tracing::info!("{} Server listening at {}", acceptor.scheme(), acceptor.describe());

    let signals = match signals::listen() {
        Ok(rx) => rx,
        Err(e) => {
            tracing::error!(error = %e, "Failed to install signal handlers");
            std::process::exit(1);
        }
    };

    let coordinator = ShutdownCoordinator::new(
        lifecycle,
        gateway.clone(),
        gate,
        config.shutdown.clone(),
    );
    let mut state = coordinator.subscribe();
    let server = tokio::spawn(HttpServer::new(gateway, prometheus).run(acceptor, async move {
        while *state.borrow_and_update() != CoordinatorState::Terminated {
            if state.changed().await.is_err() {
                break;
            }
        }
    }));

    let status = coordinator.run(signals).await;

    match tokio::time::timeout(Duration::from_secs(1), server).await {
        Ok(Ok(Err(e))) => tracing::error!(error = %e, "HTTP server error"),
        Ok(Err(e)) => tracing::error!(error = %e, "HTTP server task failed"),
        Err(_) => tracing::warn!("HTTP server did not stop in time"),
        Ok(Ok(Ok(()))) => {}
    }

    tracing::info!(code = status.code(), "Shutdown complete");
    std::process::exit(status.code());
}
