use std::{
    collections::HashMap,
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
};

use crate::response::{LiveResponse, StoredResponse};

use super::{Upstream, UpstreamError};

/* -------------------------------------------------------------------------- */
/*                            In-Memory Upstream                              */
/* -------------------------------------------------------------------------- */

/// A canned origin for tests and benches. Counts how often it is asked, so
/// tests can prove a request never left the cache. Clones share the counter.
#[derive(Clone)]
pub struct MemoryUpstream {
    responses: HashMap<String, StoredResponse>,
    online: bool,
    hits: Arc<AtomicUsize>,
}

impl MemoryUpstream {
    pub fn new() -> Self {
        Self {
            responses: HashMap::new(),
            online: true,
            hits: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// An origin that refuses every request, as a dead network would.
    pub fn offline() -> Self {
        Self {
            online: false,
            ..Self::new()
        }
    }

    /// Factory function to serve a canned response at a path.
    pub fn with_response(mut self, path: &str, response: StoredResponse) -> Self {
        self.responses.insert(path.to_string(), response);
        self
    }

    /// How many requests reached this origin so far.
    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }
}

impl Default for MemoryUpstream {
    fn default() -> Self {
        Self::new()
    }
}

impl Upstream for MemoryUpstream {
    async fn fetch(&self, path: &str) -> Result<StoredResponse, UpstreamError> {
        if !self.online {
            return Err(UpstreamError::Unreachable("origin offline".to_string()));
        }

        self.hits.fetch_add(1, Ordering::SeqCst);
        match self.responses.get(path) {
            Some(v) => Ok(v.clone()),
            // A real origin answers an unknown path, it does not vanish.
            None => Ok(StoredResponse::new(
                404,
                Some("text/plain".to_string()),
                bytes::Bytes::from_static(b"not found"),
            )),
        }
    }

    async fn forward(
        &self,
        _method: &str,
        path: &str,
        _accept: Option<&str>,
        _body: bytes::Bytes,
    ) -> Result<LiveResponse, UpstreamError> {
        let response = self.fetch(path).await?;
        Ok(LiveResponse::from_buffered(response))
    }
}

/* -------------------------------------------------------------------------- */
/*                                    Tests                                   */
/* -------------------------------------------------------------------------- */

pub mod testing {
    use bytes::Bytes;

    use super::*;

    pub const PATH_INDEX: &str = "/";
    pub const PATH_STYLE: &str = "/static/style.css";
    pub const PATH_EXTRA: &str = "/static/app.js";
    pub const PATH_EVENTS: &str = "/events";

    pub const DATA_INDEX: &str = "<!doctype html><h1>kintai</h1>";
    pub const DATA_STYLE: &str = "body { margin: 0 }";
    pub const DATA_EXTRA: &str = "console.log(\"kintai\");";
    pub const DATA_EVENTS: &str = "data: tick\n\n";

    /// An example origin covering the default allow-list, one path outside
    /// it, and a streaming endpoint.
    pub fn create_example_upstream() -> MemoryUpstream {
        MemoryUpstream::new()
            .with_response(
                PATH_INDEX,
                StoredResponse::new(
                    200,
                    Some("text/html".to_string()),
                    Bytes::from_static(DATA_INDEX.as_bytes()),
                ),
            )
            .with_response(
                PATH_STYLE,
                StoredResponse::new(
                    200,
                    Some("text/css".to_string()),
                    Bytes::from_static(DATA_STYLE.as_bytes()),
                ),
            )
            .with_response(
                PATH_EXTRA,
                StoredResponse::new(
                    200,
                    Some("text/javascript".to_string()),
                    Bytes::from_static(DATA_EXTRA.as_bytes()),
                ),
            )
            .with_response(
                PATH_EVENTS,
                StoredResponse::new(
                    200,
                    Some("text/event-stream".to_string()),
                    Bytes::from_static(DATA_EVENTS.as_bytes()),
                ),
            )
    }

    /// Ensure the example origin answers its paths and counts its hits.
    #[tokio::test]
    #[cfg(test)]
    async fn example_upstream_answers() {
        let upstream = create_example_upstream();

        let index = upstream.fetch(PATH_INDEX).await.unwrap();
        assert_eq!(index.status(), 200);
        assert_eq!(index.body().as_ref(), DATA_INDEX.as_bytes());

        let missing = upstream.fetch("/nope").await.unwrap();
        assert_eq!(missing.status(), 404);

        assert_eq!(upstream.hits(), 2);
    }

    /// Ensure the offline origin refuses both kinds of request.
    #[tokio::test]
    #[cfg(test)]
    async fn offline_upstream_refuses() {
        let upstream = MemoryUpstream::offline();

        assert!(upstream.fetch(PATH_INDEX).await.is_err());
        assert!(
            upstream
                .forward("GET", PATH_INDEX, None, Bytes::new())
                .await
                .is_err()
        );
        assert_eq!(upstream.hits(), 0);
    }
}
