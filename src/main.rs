use std::sync::Arc;

use anyhow::Context;
use crud_service::bootstrap::init_database;
use crud_service::infrastructure::config::log_dir_from_env;
use crud_service::infrastructure::logger::{init_logging, LogConfig, LogSink};
use crud_service::{create_routes, AppConfig, AppState};
use tokio::net::TcpListener;
use tracing::{error, info};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(err) => {
            let _logging = init_logging(&LogConfig::new(log_dir_from_env()));
            error!(error = %err, "invalid configuration");
            return Err(err).context("invalid configuration");
        }
    };

    let logging = init_logging(&LogConfig::new(&config.log_dir));
    if let LogSink::File(path) = &logging.sink {
        info!(path = %path.display(), "Writing logs to file");
    }

    let store = match init_database(&config).await {
        Ok(store) => Arc::new(store),
        Err(err) => {
            error!(error = %err, "server could not start");
            return Err(err).context("startup aborted");
        }
    };

    let app = create_routes(AppState::from_store(store.clone()));

    let listener = TcpListener::bind(config.listen_addr())
        .await
        .with_context(|| format!("failed to bind {}", config.listen_addr()))?;
    let addr = listener.local_addr()?;

    info!("Server listening on http://{}", addr);
    info!("Health: http://{}/health", addr);
    info!("API: http://{}/api/users", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    store.close().await;
    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            error!(error = %err, "failed to listen for Ctrl-C");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                error!(error = %err, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}
