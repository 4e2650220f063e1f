//! Server setup and lifecycle management

use tokio::net::TcpListener;

use crate::api::{create_router, AppState};
use crate::config::ServiceConfig;
use crate::error::{ServiceError, ServiceResult};

/// Detection HTTP server
pub struct Server {
    config: ServiceConfig,
}

impl Server {
    /// Create a new server with the given configuration
    pub fn new(config: ServiceConfig) -> Self {
        Self { config }
    }

    /// Run until Ctrl+C or SIGTERM
    pub async fn run(self) -> ServiceResult<()> {
        let addr = self.config.server.listen_addr;
        let app = create_router(AppState::new(self.config));

        let listener = TcpListener::bind(addr).await?;
        tracing::info!("tsad service listening on {}", addr);

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .map_err(|e| ServiceError::Server(e.to_string()))?;

        tracing::info!("tsad service shut down");
        Ok(())
    }
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown");
        }
        _ = terminate => {
            tracing::info!("Received terminate signal, initiating graceful shutdown");
        }
    }
}
