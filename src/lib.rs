//! appshelf is a cache-first gateway for a web app's static assets.
//! Generally, a request moves through these steps:
//! classify -> {forward upstream, look up in the cache store}
//!
//! The store is warmed once at startup from a fixed allow-list; nothing is
//! written back to it while serving traffic.

pub mod conf;
pub mod decision;
pub mod install;
pub mod response;
pub mod routes;
pub mod store;
pub mod upstream;
