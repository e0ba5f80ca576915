//! HTTP server for HD documentation server.
//!
//! Serves product documentation under `/help`:
//! - `GET /help/{product}` redirects to the product's landing page
//! - `GET /help/{product}/{*tokens}` serves a page at the current or a
//!   historical version, or redirects to its canonical URL
//!
//! # Quick Start
//!
//! ```ignore
//! use std::sync::Arc;
//! use hd_server::{ServerConfig, run_server};
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = ServerConfig {
//!         host: "127.0.0.1".to_owned(),
//!         port: 8080,
//!     };
//!
//!     run_server(config, Arc::new(site)).await.unwrap();
//! }
//! ```
//!
//! # Architecture
//!
//! ```text
//! Browser ──HTTP──► axum router (hd-server)
//!                        │
//!                        └─► spawn_blocking ──► DocsSite::handle (hd-site)
//!                                                   │
//!                                                   ├─► live working tree
//!                                                   └─► git history (hd-vcs)
//! ```

mod app;
mod error;
mod handlers;
mod middleware;
mod state;

use std::net::SocketAddr;
use std::str::FromStr;
use std::sync::Arc;

use hd_site::DocsSite;

pub use app::create_router;
pub use error::ServerError;
pub use state::AppState;

/// Server configuration.
#[derive(Clone, Debug)]
pub struct ServerConfig {
    /// Host address to bind to.
    pub host: String,
    /// Port to listen on.
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_owned(),
            port: 8080,
        }
    }
}

/// Run the server until Ctrl-C.
///
/// # Errors
///
/// Returns [`ServerError`] if the address is invalid or can't be bound.
pub async fn run_server(config: ServerConfig, site: Arc<DocsSite>) -> Result<(), ServerError> {
    let state = Arc::new(AppState { site });
    let app = create_router(state);

    let addr = SocketAddr::from_str(&format!("{}:{}", config.host, config.port))?;
    tracing::info!(address = %addr, "Starting server");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

/// Wait for shutdown signal (Ctrl-C).
async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("Failed to install Ctrl+C handler");
    tracing::info!("Shutdown signal received, stopping server...");
}

/// Create server configuration from HD config.
#[must_use]
pub fn server_config_from_hd_config(config: &hd_config::Config) -> ServerConfig {
    ServerConfig {
        host: config.server.host.clone(),
        port: config.server.port,
    }
}
