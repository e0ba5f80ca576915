//! Documentation endpoint.
//!
//! Maps `/help/{product}/{*tokens}` onto [`DocsSite::handle`] and turns the
//! outcome into a 404, a 302 or a page with caching headers.
//!
//! [`DocsSite::handle`]: hd_site::DocsSite::handle

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Response};
use hd_site::{Page, Response as SiteResponse};
use md5::{Digest, Md5};

use crate::error::ServerError;
use crate::state::AppState;

/// Handle GET /help/{product}.
pub(crate) async fn get_product(
    Path(product): Path<String>,
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Response, ServerError> {
    respond(&state, product, String::new(), &headers).await
}

/// Handle GET /help/{product}/{*tokens}.
pub(crate) async fn get_document(
    Path((product, tokens)): Path<(String, String)>,
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Response, ServerError> {
    respond(&state, product, tokens, &headers).await
}

/// Shared implementation: dispatch on the blocking pool, then map.
async fn respond(
    state: &AppState,
    product: String,
    tokens: String,
    headers: &HeaderMap,
) -> Result<Response, ServerError> {
    let site = Arc::clone(&state.site);
    let outcome = tokio::task::spawn_blocking(move || {
        let tokens: Vec<&str> = tokens.split('/').filter(|t| !t.is_empty()).collect();
        site.handle(&product, &tokens)
    })
    .await?;

    Ok(match outcome {
        SiteResponse::NotFound(name) => {
            (StatusCode::NOT_FOUND, format!("404: {name} not found")).into_response()
        }
        SiteResponse::Redirect(location) => {
            (StatusCode::FOUND, [(header::LOCATION, location)]).into_response()
        }
        SiteResponse::Page(page) => page_response(page, headers),
    })
}

/// Build a 200 (or 304) response for a page.
fn page_response(page: Page, headers: &HeaderMap) -> Response {
    let etag = compute_etag(&page.version, &page.bytes);

    // Check If-None-Match header for conditional request
    if let Some(if_none_match) = headers.get(header::IF_NONE_MATCH)
        && if_none_match.as_bytes() == etag.as_bytes()
    {
        return (StatusCode::NOT_MODIFIED, [(header::ETAG, etag)]).into_response();
    }

    (
        [
            (header::CONTENT_TYPE, page.content_type),
            (header::ETAG, etag),
            (header::CACHE_CONTROL, "private, max-age=60".to_owned()),
        ],
        page.bytes,
    )
        .into_response()
}

/// Compute `ETag` from version and content.
///
/// MD5 truncated to 64 bits (16 hex chars).
fn compute_etag(version: &str, content: &[u8]) -> String {
    let mut hasher = Md5::new();
    hasher.update(version.as_bytes());
    hasher.update(b":");
    hasher.update(content);
    format!("\"{}\"", &hex::encode(hasher.finalize())[..16])
}
