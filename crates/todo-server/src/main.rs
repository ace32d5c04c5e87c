use clap::Parser;
use std::sync::Arc;
use todo_server::server::{
    config::{CliArgs, ServerConfig},
    start,
    telemetry::init_telemetry,
};
use todo_server::store::{MemoryStore, SqlStore, TodoStore};
use tokio::signal;

// Using mimalloc for better performance under contention, especially in musl
// environments.
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load from .env
    let _ = dotenvy::dotenv();
    let args = CliArgs::parse();
    let config = ServerConfig::try_from(args)?;

    let providers = init_telemetry()?;
    log_startup_info(&config);

    let store: Arc<dyn TodoStore> = if config.in_memory {
        Arc::new(MemoryStore::new())
    } else {
        Arc::new(SqlStore::connect(&config.store).await?)
    };

    let handle = start(&config, store).await?;

    tokio::select! {
        () = shutdown_signal() => {},
        () = handle.closed() => {
            tracing::warn!("A listener stopped unexpectedly");
        },
    }

    tracing::info!("Shutdown signal received, terminating gracefully...");
    let res = handle.shutdown().await;
    providers.shutdown();
    res
}

fn log_startup_info(config: &ServerConfig) {
    if cfg!(debug_assertions) {
        tracing::info!("Starting todo service with full config: {:#?}", config);
    } else if config.in_memory {
        tracing::info!("Starting todo service with an in-memory store");
    } else {
        tracing::info!(
            "Starting todo service on {} with {} database connections",
            config.store.database_url,
            config.store.max_connections
        );
    }
}

async fn shutdown_signal() {
    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received Ctrl+C signal");
        },
        () = terminate => {
            tracing::info!("Received SIGTERM signal");
        },
    }
}
