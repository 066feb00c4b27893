use std::env;
use std::sync::Arc;

use gateway::config::GatewayConfig;
use gateway::connection::ConnectionManager;
use gateway::validation::ValidatorRegistry;
use gateway::{codec::JsonCodec, state::AppState};
use gateway_directory::{RedisDirectoryClient, SessionDirectory};
use gateway_wire::GatewayEvent;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let log_level = env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_owned());
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(log_level))
        .init();

    let config = GatewayConfig::from_env();

    info!(redis_url = %config.redis_url, "connecting to directory store...");
    let directory = RedisDirectoryClient::connect(&config.redis_url)
        .await
        .expect("failed to connect to directory store");

    let sessions = SessionDirectory::new(Arc::new(directory), config.namespace.clone(), config.timeout);
    let connections = Arc::new(ConnectionManager::new(Arc::new(JsonCodec)));
    let validators = Arc::new(ValidatorRegistry::new());
    let http = reqwest::Client::new();

    let state = AppState::new(
        connections,
        sessions,
        validators,
        http,
        config.broadcast_path.clone(),
        config.node_url(),
    );

    let router = gateway::build_router(state.clone(), &config);
    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .expect("failed to bind");
    info!(addr = %config.bind_addr, node_url = %config.node_url(), "gateway listening");
    state.emit(GatewayEvent::Listening {
        addr: config.bind_addr.clone(),
    });

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("server error");
    state.emit(GatewayEvent::Close);
    info!("gateway shut down gracefully");
}

/// Waits for SIGTERM or Ctrl-C (SIGINT) and returns to trigger graceful shutdown.
async fn shutdown_signal() {
    use tokio::signal;

    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => { info!("received Ctrl+C, shutting down"); },
        _ = terminate => { info!("received SIGTERM, shutting down"); },
    }
}
