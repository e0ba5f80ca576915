//! `hd serve` command implementation.

use std::sync::Arc;

use clap::Args;
use hd_server::{run_server, server_config_from_hd_config};
use hd_site::DocsSite;

use super::{Components, ConfigArgs, store_config};
use crate::error::CliError;
use crate::output::Output;

/// Arguments for the serve command.
#[derive(Args)]
pub(crate) struct ServeArgs {
    #[command(flatten)]
    config: ConfigArgs,

    /// Enable verbose output (info-level logs).
    #[arg(short, long)]
    pub verbose: bool,
}

impl ServeArgs {
    /// Execute the serve command.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration fails, product metadata can't be
    /// loaded, or the server fails to start.
    pub(crate) async fn execute(self) -> Result<(), CliError> {
        let output = Output::new();
        let config = self.config.load()?;

        // Print startup info
        output.info(&format!(
            "Starting server on {}:{}",
            config.server.host, config.server.port
        ));
        output.info(&format!(
            "Repository mirror: {}",
            config.repository_resolved.path.display()
        ));
        if let Some(origin) = &config.repository_resolved.origin {
            output.info(&format!("Upstream origin: {origin}"));
            output.info(&format!(
                "Update frequency: {} minute(s)",
                config.sync.interval_minutes
            ));
        } else {
            output.warning("Upstream origin: none (static mirror, sync disabled)");
        }

        let store = store_config(&config);
        let metadata_path = config.metadata_path();
        let components =
            tokio::task::spawn_blocking(move || Components::open(store, metadata_path)).await??;

        let site = Arc::new(DocsSite::new(
            Arc::clone(&components.registry),
            Arc::clone(&components.store),
        ));
        let sync_task = Arc::new(components.synchronizer(&config)).spawn();

        let server_config = server_config_from_hd_config(&config);
        let result = run_server(server_config, site).await;
        sync_task.abort();
        result?;

        Ok(())
    }
}
