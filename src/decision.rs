//! The per-request decision: does a request go through the cache store, or
//! straight to the upstream? Pure, so it can be tested without a server.

/// The accept value that marks a streaming request. Compared with plain
/// equality; a composite accept header does not count.
pub const EVENT_STREAM_ACCEPT: &str = "text/event-stream";

#[derive(Debug, PartialEq, Eq)]
pub enum RequestClass {
    /// Never touch the store; forward to the upstream.
    Bypass,
    /// Answer from the store when present, the upstream otherwise.
    CacheFirst,
}

/* --------------------------- Matching Utilities --------------------------- */

/// Identifies how a request path is checked against a bypass pattern.
#[derive(Debug, PartialEq, Eq)]
pub enum PathMatchingType {
    /// Plain string comparison.
    Simple,
}

impl PathMatchingType {
    /// Checks if a path matches a pattern.
    ///
    /// Arguments:
    /// - `pattern`: What pattern to check for a match using
    /// - `path`: The request path to see if a match is present
    pub fn matches(&self, pattern: &str, path: &str) -> bool {
        match self {
            Self::Simple => pattern == path,
        }
    }
}

impl Default for PathMatchingType {
    fn default() -> Self {
        Self::Simple
    }
}

/* ------------------------------ Classification ----------------------------- */

/// Classifies a request by its method, path, and accept header.
///
/// Streaming answers must never be captured by or replayed out of the cache,
/// so an event-stream accept header or a reserved streaming path always wins
/// over store contents. The store only ever holds GET answers, so any other
/// method is the app's live traffic and goes straight through.
pub fn classify(
    method: &str,
    path: &str,
    accept: Option<&str>,
    bypass_paths: &[String],
) -> RequestClass {
    if method != "GET" {
        return RequestClass::Bypass;
    }

    match accept {
        Some(v) if v == EVENT_STREAM_ACCEPT => return RequestClass::Bypass,
        _ => {}
    }

    let matcher = PathMatchingType::default();
    if bypass_paths.iter().any(|p| matcher.matches(p, path)) {
        return RequestClass::Bypass;
    }

    RequestClass::CacheFirst
}

/* -------------------------------------------------------------------------- */
/*                                    Tests                                   */
/* -------------------------------------------------------------------------- */
