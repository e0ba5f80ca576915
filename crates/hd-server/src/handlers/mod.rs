//! HTTP request handlers.

pub(crate) mod docs;
