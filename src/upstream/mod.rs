//! The upstream is the origin web app this gateway fronts. Everything the
//! gateway serves comes from here, either ahead of time (the warm-up fetch)
//! or live per request.

use std::fmt::Display;

use crate::response::{LiveResponse, StoredResponse};

pub mod http;
pub mod memory;

#[derive(Debug, PartialEq, Eq)]
pub enum UpstreamError {
    /// The origin could not be reached at all.
    Unreachable(String),
    /// The origin was reached, but its answer could not be read.
    BadResponse(String),
}

impl Display for UpstreamError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unreachable(v) => write!(f, "Upstream unreachable: {}", v),
            Self::BadResponse(v) => write!(f, "Bad upstream response: {}", v),
        }
    }
}

// Needed so live bodies can stream through actix, which boxes body errors.
impl std::error::Error for UpstreamError {}

/// A source of origin responses.
///
/// `fetch` buffers a whole GET answer and is what the warm-up uses;
/// `forward` carries any method and body through and hands the answer back
/// as a stream, so live traffic and long-lived responses (event streams)
/// flow without being held.
pub trait Upstream {
    #[allow(async_fn_in_trait)]
    async fn fetch(&self, path: &str) -> Result<StoredResponse, UpstreamError>;

    #[allow(async_fn_in_trait)]
    async fn forward(
        &self,
        method: &str,
        path: &str,
        accept: Option<&str>,
        body: bytes::Bytes,
    ) -> Result<LiveResponse, UpstreamError>;
}
