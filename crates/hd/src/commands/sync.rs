//! `hd sync` command implementation.

use clap::Args;
use hd_vcs::SyncReport;

use super::{Components, ConfigArgs, store_config};
use crate::error::CliError;
use crate::output::Output;

/// Arguments for the sync command.
#[derive(Args)]
pub(crate) struct SyncArgs {
    #[command(flatten)]
    config: ConfigArgs,

    /// Enable verbose output (info-level logs).
    #[arg(short, long)]
    pub verbose: bool,
}

impl SyncArgs {
    /// Execute the sync command: one pass, then exit.
    ///
    /// # Errors
    ///
    /// Returns an error if the pass fails or any product fails to sync.
    pub(crate) fn execute(self) -> Result<(), CliError> {
        let output = Output::new();
        let config = self.config.load()?;

        if config.repository_resolved.origin.is_none() {
            output.warning("No upstream origin configured, nothing to synchronize");
        }

        let components = Components::open(store_config(&config), config.metadata_path())?;
        let report = components.synchronizer(&config).run_pass()?;

        print_report(&output, &report);
        if report.is_success() {
            Ok(())
        } else {
            Err(CliError::SyncFailed {
                failed: report.failed.len(),
            })
        }
    }
}

fn print_report(output: &Output, report: &SyncReport) {
    for synced in &report.synced {
        output.success(&format_synced(
            &synced.product,
            synced.pinned.as_deref(),
            synced.versions.len(),
        ));
    }
    for failed in &report.failed {
        output.error(&format!("{}: {}", failed.product, failed.error));
    }
    output.highlight(&format!(
        "Synchronized {} product(s), {} failed",
        report.synced.len(),
        report.failed.len()
    ));
}

fn format_synced(product: &str, pinned: Option<&str>, versions: usize) -> String {
    match pinned {
        Some(version) => format!("{product}: pinned to {version} ({versions} version(s))"),
        None => format!("{product}: not in registry, not pinned ({versions} version(s))"),
    }
}
