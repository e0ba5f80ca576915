//! `hd resolve` command implementation.
//!
//! Shows how a `/help/<product>/<tokens...>` URL resolves without serving it.

use clap::Args;
use hd_registry::{JsonFileSource, ProductRegistry};
use hd_site::{ResolvedDocument, resolve};

use super::ConfigArgs;
use crate::error::CliError;
use crate::output::Output;

/// Arguments for the resolve command.
#[derive(Args)]
pub(crate) struct ResolveArgs {
    #[command(flatten)]
    config: ConfigArgs,

    /// Product name (first path segment after /help/).
    product: String,

    /// Remaining path segments, or a single slash-separated path.
    tokens: Vec<String>,
}

impl ResolveArgs {
    /// Execute the resolve command.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration or product metadata can't be loaded.
    pub(crate) fn execute(self) -> Result<(), CliError> {
        let output = Output::new();
        let config = self.config.load()?;

        let source = JsonFileSource::new(config.metadata_path());
        let registry = ProductRegistry::load(&source)?;

        let tokens: Vec<&str> = self
            .tokens
            .iter()
            .flat_map(|t| t.split('/'))
            .filter(|t| !t.is_empty())
            .collect();

        match resolve(&registry.snapshot(), &self.product, &tokens) {
            Some(doc) => output.result(&format_document(&doc)),
            None => output.warning(&format!("{}: not found", self.product)),
        }
        Ok(())
    }
}

fn format_document(doc: &ResolvedDocument) -> String {
    format!(
        "product={} version={} page={}",
        doc.product, doc.version, doc.page
    )
}
