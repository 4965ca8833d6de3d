//! The per-request handler: classify, then answer from exactly one of
//! {cache store, live upstream}.

use actix_web::{HttpRequest, HttpResponse, http::StatusCode, http::header, web};
use log::{debug, error, info};

use crate::{
    decision::{RequestClass, classify},
    response::StoredResponse,
    routes::RouteSharedData,
    store::CacheStore,
    upstream::Upstream,
};

pub async fn serve_request<U: Upstream + 'static, S: CacheStore + 'static>(
    data: web::Data<RouteSharedData<U, S>>,
    req: HttpRequest,
    body: web::Bytes,
) -> HttpResponse {
    let method = req.method().as_str();
    let path = req.path();
    let accept = req
        .headers()
        .get(header::ACCEPT)
        .and_then(|v| v.to_str().ok());

    /* ------------------------------ Classification ----------------------------- */

    match classify(method, path, accept, &data.config.bypass.paths) {
        RequestClass::Bypass => {
            debug!("Bypassing the cache store for {} {}", method, path);
            forward_to_upstream(&data, method, path, accept, body).await
        }
        RequestClass::CacheFirst => {
            /* ------------------------------ Store Lookup ------------------------------ */

            let cached = match data.store.lookup(path).await {
                Ok(v) => v,
                Err(e) => {
                    // A store fault must not take the request down; the
                    // upstream can still answer it.
                    error!(
                        "Store fault while looking up {} (treating as a miss): {}",
                        path, e
                    );
                    None
                }
            };

            match cached {
                Some(stored) => {
                    info!("Cache hit: {}", path);
                    serve_stored(path, stored)
                }
                None => {
                    info!("Cache miss (loading from upstream): {}", path);
                    forward_to_upstream(&data, method, path, accept, body).await
                }
            }
        }
    }
}

/* ---------------------------- Response Building ---------------------------- */

/// Serves a stored entry verbatim: stored status, stored content type (or a
/// guess from the path when the origin supplied none), stored body bytes.
fn serve_stored(path: &str, stored: StoredResponse) -> HttpResponse {
    let status = match StatusCode::from_u16(stored.status()) {
        Ok(v) => v,
        Err(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };

    let content_type = match stored.content_type() {
        Some(v) => v.to_string(),
        None => mime_guess::from_path(path).first_or_octet_stream().to_string(),
    };

    HttpResponse::build(status)
        .content_type(content_type)
        .body(stored.into_body())
}

/// Streams a live upstream answer back unchanged. The store is never written
/// here; the gateway preloads, it does not learn.
async fn forward_to_upstream<U: Upstream + 'static, S: CacheStore + 'static>(
    data: &web::Data<RouteSharedData<U, S>>,
    method: &str,
    path: &str,
    accept: Option<&str>,
    body: web::Bytes,
) -> HttpResponse {
    match data.upstream.forward(method, path, accept, body).await {
        Ok(live) => {
            let status = match StatusCode::from_u16(live.status) {
                Ok(v) => v,
                Err(_) => StatusCode::BAD_GATEWAY,
            };

            let mut builder = HttpResponse::build(status);
            if let Some(v) = &live.content_type {
                builder.content_type(v.as_str());
            }
            builder.streaming(live.body)
        }
        Err(e) => {
            error!("Upstream fetch for {} {} failed: {}", method, path, e);
            HttpResponse::BadGateway().body("upstream unreachable")
        }
    }
}
