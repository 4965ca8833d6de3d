use bytes::Bytes;
use futures::{StreamExt, stream, stream::BoxStream};

use crate::upstream::UpstreamError;

/// A fully buffered response, as held by the cache store.
/// Bodies are kept as [`Bytes`] so a hit can be served without copying.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredResponse {
    status: u16,
    content_type: Option<String>,
    body: Bytes,
}

impl StoredResponse {
    pub fn new(status: u16, content_type: Option<String>, body: Bytes) -> Self {
        Self {
            status,
            content_type,
            body,
        }
    }

    pub fn from_str(body: &str) -> Self {
        Self {
            status: 200,
            content_type: None,
            body: Bytes::from(body.to_string()),
        }
    }

    pub fn status(&self) -> u16 {
        self.status
    }

    pub fn content_type(&self) -> Option<&str> {
        self.content_type.as_deref()
    }

    pub fn body(&self) -> &Bytes {
        &self.body
    }

    pub fn into_body(self) -> Bytes {
        self.body
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// A response on its way through from the upstream, body still streaming.
pub struct LiveResponse {
    pub status: u16,
    pub content_type: Option<String>,
    pub body: BoxStream<'static, Result<Bytes, UpstreamError>>,
}

impl LiveResponse {
    /// Wraps an already buffered response as a single-chunk stream.
    pub fn from_buffered(response: StoredResponse) -> Self {
        let StoredResponse {
            status,
            content_type,
            body,
        } = response;
        Self {
            status,
            content_type,
            body: stream::once(async move { Ok(body) }).boxed(),
        }
    }
}
