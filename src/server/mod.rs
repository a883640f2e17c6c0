//! Churn prediction HTTP server
//!
//! Loads the artifact pair once at startup and serves predictions from it.
//! A missing or inconsistent pair aborts startup.

mod api;
mod error;
mod handlers;
mod state;

pub use api::create_router;
pub use error::ServerError;
pub use handlers::BatchItem;
pub use state::AppState;

use anyhow::Context;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

use crate::inference::ChurnService;

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub models_dir: PathBuf,
    /// Allowed browser origin; `None` or `*` allows any
    pub cors_origin: Option<String>,
    pub max_batch_size: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: std::env::var("API_HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            port: std::env::var("API_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(8000),
            models_dir: std::env::var("MODELS_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("models")),
            cors_origin: std::env::var("CORS_ORIGIN").ok(),
            max_batch_size: std::env::var("MAX_BATCH_SIZE")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(1000),
        }
    }
}

impl ServerConfig {
    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn with_models_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.models_dir = dir.into();
        self
    }

    pub fn with_cors_origin(mut self, origin: impl Into<String>) -> Self {
        self.cors_origin = Some(origin.into());
        self
    }
}

/// Build the router around an already loaded service.
pub fn build_app(service: ChurnService, config: &ServerConfig) -> axum::Router {
    let state = Arc::new(AppState::new(service, config.max_batch_size));
    create_router(state, config)
}

/// Start the server with the given configuration
pub async fn run_server(config: ServerConfig) -> anyhow::Result<()> {
    let start_time = chrono::Utc::now();

    let service = ChurnService::load(&config.models_dir).with_context(|| {
        format!(
            "failed to load model artifacts from {}; run `retention fit` first",
            config.models_dir.display()
        )
    })?;
    let run_id = service.run_id().to_string();
    let app = build_app(service, &config);

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(
        address = %addr,
        run_id = %run_id,
        models_dir = %config.models_dir.display(),
        cors_origin = config.cors_origin.as_deref().unwrap_or("*"),
        started_at = %start_time.to_rfc3339(),
        "Server listening"
    );

    let shutdown_signal = async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Could not install ctrl+c handler, shutdown needs a kill signal");
            std::future::pending::<()>().await;
        }
        let uptime = chrono::Utc::now().signed_duration_since(start_time);
        info!(uptime_secs = uptime.num_seconds(), "Shutdown signal received, stopping server gracefully");
    };

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal)
        .await?;

    info!("Server shut down cleanly");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder() {
        let config = ServerConfig::default()
            .with_host("0.0.0.0")
            .with_port(9001)
            .with_models_dir("artifacts")
            .with_cors_origin("http://localhost:3000");
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 9001);
        assert_eq!(config.models_dir, PathBuf::from("artifacts"));
        assert_eq!(config.cors_origin.as_deref(), Some("http://localhost:3000"));
    }
}
