use std::{str::FromStr, time::Duration};

use futures::StreamExt;
use log::{debug, error};
use url::Url;

use crate::{
    conf::ServerConfig,
    response::{LiveResponse, StoredResponse},
};

use super::{Upstream, UpstreamError};

/// The real origin: a plain HTTP app behind this gateway.
#[derive(Clone)]
pub struct HttpUpstream {
    base: Url,
    client: reqwest::Client,
}

impl HttpUpstream {
    pub fn from_config(config: &ServerConfig) -> Result<Self, UpstreamError> {
        let base = match Url::from_str(&config.upstream.url) {
            Ok(v) => v,
            Err(e) => {
                error!("Failed to parse upstream URL: {}", e);
                return Err(UpstreamError::Unreachable(format!(
                    "invalid upstream url \"{}\": {}",
                    config.upstream.url, e
                )));
            }
        };

        let client = match reqwest::Client::builder()
            .pool_idle_timeout(Duration::from_secs(60))
            .pool_max_idle_per_host(8)
            .tcp_keepalive(Duration::from_secs(30))
            .build()
        {
            Ok(v) => v,
            Err(e) => {
                error!("Failed to build the upstream HTTP client: {}", e);
                return Err(UpstreamError::Unreachable(e.to_string()));
            }
        };

        Ok(Self { base, client })
    }

    fn url_for(&self, path: &str) -> Result<Url, UpstreamError> {
        match self.base.join(path) {
            Ok(v) => Ok(v),
            Err(e) => Err(UpstreamError::BadResponse(format!(
                "cannot resolve \"{}\" against the upstream: {}",
                path, e
            ))),
        }
    }
}

impl Upstream for HttpUpstream {
    async fn fetch(&self, path: &str) -> Result<StoredResponse, UpstreamError> {
        let url = self.url_for(path)?;

        debug!("Fetching {} from the upstream...", url);
        let response = match self.client.get(url).send().await {
            Ok(v) => v,
            Err(e) => {
                error!("Failed to fetch {} from the upstream: {}", path, e);
                return Err(UpstreamError::Unreachable(e.to_string()));
            }
        };

        let status = response.status().as_u16();
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.to_string());

        match response.bytes().await {
            Ok(body) => Ok(StoredResponse::new(status, content_type, body)),
            Err(e) => {
                error!("Failed to read the upstream body for {}: {}", path, e);
                Err(UpstreamError::BadResponse(e.to_string()))
            }
        }
    }

    async fn forward(
        &self,
        method: &str,
        path: &str,
        accept: Option<&str>,
        body: bytes::Bytes,
    ) -> Result<LiveResponse, UpstreamError> {
        let url = self.url_for(path)?;

        let method = match reqwest::Method::from_bytes(method.as_bytes()) {
            Ok(v) => v,
            Err(e) => {
                return Err(UpstreamError::BadResponse(format!(
                    "cannot forward method \"{}\": {}",
                    method, e
                )));
            }
        };

        debug!("Forwarding {} {} to the upstream...", method, url);
        let mut request = self.client.request(method, url);
        if let Some(v) = accept {
            request = request.header(reqwest::header::ACCEPT, v);
        }
        if !body.is_empty() {
            request = request.body(body);
        }

        let response = match request.send().await {
            Ok(v) => v,
            Err(e) => {
                error!("Failed to forward {} to the upstream: {}", path, e);
                return Err(UpstreamError::Unreachable(e.to_string()));
            }
        };

        let status = response.status().as_u16();
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.to_string());

        let body = response
            .bytes_stream()
            .map(|chunk| chunk.map_err(|e| UpstreamError::BadResponse(e.to_string())))
            .boxed();

        Ok(LiveResponse {
            status,
            content_type,
            body,
        })
    }
}
