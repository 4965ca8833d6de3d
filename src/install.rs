//! The warm-up step: before the server binds, every allow-listed path is
//! fetched from the upstream and committed to the cache store in one atomic
//! bulk insert. All or nothing; a failed warm-up fails startup and the
//! supervisor decides whether to retry.

use std::fmt::Display;

use log::{debug, error, info};

use crate::{
    response::StoredResponse,
    store::{CacheStore, StoreError},
    upstream::{Upstream, UpstreamError},
};

#[derive(Debug, PartialEq, Eq)]
pub enum InstallError {
    /// A prefetch never produced an answer.
    Fetch { path: String, source: UpstreamError },
    /// A prefetch answered, but not with a success status.
    BadStatus { path: String, status: u16 },
    /// The fetched entries could not be committed to the store.
    Store(StoreError),
}

impl Display for InstallError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Fetch { path, source } => write!(f, "Prefetch of {} failed: {}", path, source),
            Self::BadStatus { path, status } => {
                write!(f, "Prefetch of {} answered status {}", path, status)
            }
            Self::Store(e) => write!(f, "Failed to commit the warm-up: {}", e),
        }
    }
}

/// Turns the configured allow-list into the bulk-fetch plan: order kept,
/// exact duplicates dropped.
pub fn precache_plan(paths: &[String]) -> Vec<String> {
    let mut plan: Vec<String> = Vec::with_capacity(paths.len());
    for path in paths {
        if !plan.iter().any(|p| p == path) {
            plan.push(path.clone());
        }
    }
    plan
}

/// Fetches every planned path from the upstream, then commits the whole set
/// to the store at once. Returns how many entries were committed.
///
/// Nothing is written until every fetch has succeeded with a success status,
/// so a mid-list failure leaves the store untouched.
pub async fn run_install<U: Upstream, S: CacheStore>(
    upstream: &U,
    store: &S,
    paths: &[String],
) -> Result<usize, InstallError> {
    let plan = precache_plan(paths);
    info!(
        "Warming cache store \"{}\" with {} asset(s)...",
        store.name(),
        plan.len()
    );

    let mut entries: Vec<(String, StoredResponse)> = Vec::with_capacity(plan.len());
    for path in plan {
        debug!("Prefetching {}...", path);
        let response = match upstream.fetch(&path).await {
            Ok(v) => v,
            Err(e) => {
                error!("Failed to prefetch {}: {}", path, e);
                return Err(InstallError::Fetch { path, source: e });
            }
        };

        if !response.is_success() {
            error!("Prefetch of {} answered status {}", path, response.status());
            return Err(InstallError::BadStatus {
                path,
                status: response.status(),
            });
        }

        entries.push((path, response));
    }

    let count = entries.len();
    match store.insert_all(entries).await {
        Ok(_) => {
            info!(
                "Cache store \"{}\" warmed ({} asset(s))",
                store.name(),
                count
            );
            Ok(count)
        }
        Err(e) => {
            error!("Failed to commit the warm-up to the store: {}", e);
            Err(InstallError::Store(e))
        }
    }
}

/* -------------------------------------------------------------------------- */
/*                                    Tests                                   */
/* -------------------------------------------------------------------------- */

#[cfg(test)]
mod tests {
    use super::precache_plan;

    fn paths(v: &[&str]) -> Vec<String> {
        v.iter().map(|p| p.to_string()).collect()
    }

    #[test]
    fn plan_keeps_order() {
        let plan = precache_plan(&paths(&["/", "/static/style.css"]));
        assert_eq!(plan, paths(&["/", "/static/style.css"]));
    }

    #[test]
    fn plan_drops_exact_duplicates() {
        let plan = precache_plan(&paths(&["/", "/static/style.css", "/", "/static/style.css"]));
        assert_eq!(plan, paths(&["/", "/static/style.css"]));
    }

    #[test]
    fn plan_of_nothing_is_empty() {
        assert!(precache_plan(&[]).is_empty());
    }
}
