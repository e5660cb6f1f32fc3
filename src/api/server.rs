//! API Server
//!
//! Binds the listener, assembles the middleware stack and serves until a
//! shutdown signal arrives.

use super::{
    handlers::AppState,
    middleware::{create_cors_layer, request_id_middleware},
    routes::create_router,
};
use crate::{config::SupplyConfig, upstream::ChainApi};
use std::{net::SocketAddr, sync::Arc};
use tokio::signal;
use tower_http::trace::TraceLayer;
use tracing::info;

/// Supply proxy HTTP server
pub struct ApiServer {
    config: SupplyConfig,
    chain: Arc<dyn ChainApi>,
}

impl ApiServer {
    pub fn new(config: SupplyConfig, chain: Arc<dyn ChainApi>) -> Self {
        Self { config, chain }
    }

    /// Start the API server
    pub async fn run(self) -> Result<(), Box<dyn std::error::Error>> {
        let state = Arc::new(AppState::new(
            self.chain.clone(),
            self.config.token.clone(),
            env!("CARGO_PKG_VERSION"),
        ));
        let app = build_app(state, &self.config);
        let addr = self.get_socket_addr()?;

        self.log_server_info();

        let listener = tokio::net::TcpListener::bind(addr).await?;
        info!("Ready on port {}.", listener.local_addr()?.port());

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        info!("API Server stopped gracefully");
        Ok(())
    }

    /// Get socket address from config
    fn get_socket_addr(&self) -> Result<SocketAddr, Box<dyn std::error::Error>> {
        Ok(SocketAddr::from((
            self.config.server.host.parse::<std::net::IpAddr>()?,
            self.config.server.port,
        )))
    }

    fn log_server_info(&self) {
        let token = &self.config.token;
        info!("Server Configuration:");
        info!("   Upstream: {}", self.config.upstream.base_url);
        info!("   Token: {} ({}), {} decimals", token.symbol, token.contract, token.decimals);
        info!("   Excluded accounts: {:?}", token.excluded_accounts);
        info!("   CORS: {:?}", self.config.server.allowed_origins);
        match self.config.upstream.timeout_secs {
            Some(secs) => info!("   Upstream timeout: {}s", secs),
            None => info!("   Upstream timeout: none"),
        }
    }
}

/// Router plus middleware stack
pub fn build_app(state: Arc<AppState>, config: &SupplyConfig) -> axum::Router {
    create_router(state)
        // Request ID middleware (first for tracing)
        .layer(axum::middleware::from_fn(request_id_middleware))

        .layer(create_cors_layer(&config.server.allowed_origins))

        // Access log
        .layer(TraceLayer::new_for_http())
}

/// Wait for shutdown signal
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!("failed to install signal handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C signal");
        },
        _ = terminate => {
            info!("Received terminate signal");
        },
    }
}
