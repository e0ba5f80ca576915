//! CLI command implementations.

pub(crate) mod resolve;
pub(crate) mod serve;
pub(crate) mod sync;

use std::path::PathBuf;
use std::sync::Arc;

use clap::Args;
use hd_config::{CliSettings, Config};
use hd_registry::{JsonFileSource, MetadataSource, ProductRegistry};
use hd_site::Synchronizer;
use hd_vcs::{ContentStore, StoreConfig};

use crate::error::CliError;

pub(crate) use resolve::ResolveArgs;
pub(crate) use serve::ServeArgs;
pub(crate) use sync::SyncArgs;

/// Configuration arguments shared by every command.
#[derive(Args)]
pub(crate) struct ConfigArgs {
    /// Path to configuration file (default: auto-discover hd.toml).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Host to bind to (overrides config).
    #[arg(long)]
    host: Option<String>,

    /// Port to bind to (overrides config).
    #[arg(short, long)]
    port: Option<u16>,

    /// Local mirror directory (overrides config).
    #[arg(long, env = "HD_REPOSITORY_PATH")]
    repository_path: Option<PathBuf>,

    /// Upstream docs repository URL; empty disables sync (overrides config).
    #[arg(long, env = "HD_REPOSITORY_ORIGIN")]
    repository_origin: Option<String>,

    /// Minutes between synchronization passes (overrides config).
    #[arg(long, value_name = "MINUTES")]
    update_frequency: Option<u64>,
}

impl ConfigArgs {
    /// Load configuration with these arguments applied on top.
    pub(crate) fn load(self) -> Result<Config, CliError> {
        let cli_settings = CliSettings {
            host: self.host,
            port: self.port,
            repository_path: self.repository_path,
            repository_origin: self.repository_origin,
            interval_minutes: self.update_frequency,
        };
        Ok(Config::load(self.config.as_deref(), Some(&cli_settings))?)
    }
}

/// Registry, metadata source and content store wired from configuration.
pub(crate) struct Components {
    pub(crate) registry: Arc<ProductRegistry>,
    pub(crate) source: Arc<dyn MetadataSource>,
    pub(crate) store: Arc<ContentStore>,
}

impl Components {
    /// Open the mirror (cloning if needed) and load the registry from it.
    ///
    /// Blocks on git. A registry load failure is fatal.
    pub(crate) fn open(store_config: StoreConfig, metadata_path: PathBuf) -> Result<Self, CliError> {
        let store = Arc::new(ContentStore::open(store_config)?);
        let source: Arc<dyn MetadataSource> = Arc::new(JsonFileSource::new(metadata_path));
        let registry = Arc::new(ProductRegistry::load(source.as_ref())?);
        tracing::info!(products = registry.snapshot().len(), "Product registry loaded");

        Ok(Self {
            registry,
            source,
            store,
        })
    }

    /// Synchronizer driving these components.
    pub(crate) fn synchronizer(&self, config: &Config) -> Synchronizer {
        Synchronizer::new(
            Arc::clone(&self.registry),
            Arc::clone(&self.source),
            Arc::clone(&self.store),
            config.sync.interval(),
        )
    }
}

/// Store configuration for `config`.
pub(crate) fn store_config(config: &Config) -> StoreConfig {
    StoreConfig {
        mirror_root: config.repository_resolved.path.clone(),
        origin: config.repository_resolved.origin.clone(),
    }
}
