//! Application state.
//!
//! Shared state for all request handlers.

use std::sync::Arc;

use hd_site::DocsSite;

/// Application state shared across all handlers.
pub struct AppState {
    /// Documentation site answering `/help` requests.
    pub site: Arc<DocsSite>,
}
