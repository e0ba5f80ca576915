//! CLI error types.

use hd_config::ConfigError;
use hd_registry::RegistryError;
use hd_server::ServerError;
use hd_vcs::VcsError;

/// CLI error type.
#[derive(Debug, thiserror::Error)]
pub(crate) enum CliError {
    #[error("{0}")]
    Config(#[from] ConfigError),

    #[error("Failed to load product metadata: {0}")]
    Registry(#[from] RegistryError),

    #[error("{0}")]
    Vcs(#[from] VcsError),

    #[error("{0}")]
    Server(#[from] ServerError),

    #[error("Startup task failed: {0}")]
    Startup(#[from] tokio::task::JoinError),

    #[error("{failed} product(s) failed to synchronize")]
    SyncFailed { failed: usize },
}
