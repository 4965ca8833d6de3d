use serde::{Deserialize, Serialize};

fn default_name() -> String {
    "Appshelf".to_string()
}

fn default_address() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_cache_name() -> String {
    "kintai-app-cache-v1".to_string()
}

fn default_precache() -> Vec<String> {
    vec!["/".to_string(), "/static/style.css".to_string()]
}

fn default_bypass_paths() -> Vec<String> {
    vec!["/events".to_string()]
}

fn default_upstream_url() -> String {
    "http://127.0.0.1:8000".to_string()
}

fn default_redis_address() -> String {
    "127.0.0.1".to_string()
}

fn default_redis_port() -> u16 {
    6379
}

fn default_general() -> ServerConfigGeneral {
    ServerConfigGeneral {
        name: default_name(),
        address: default_address(),
        port: default_port(),
    }
}

fn default_cache() -> ServerConfigCache {
    ServerConfigCache {
        name: default_cache_name(),
        precache: default_precache(),
    }
}

fn default_bypass() -> ServerConfigBypass {
    ServerConfigBypass {
        paths: default_bypass_paths(),
    }
}

fn default_upstream() -> ServerConfigUpstream {
    ServerConfigUpstream {
        url: default_upstream_url(),
    }
}

fn default_redis() -> ServerConfigRedis {
    ServerConfigRedis {
        enabled: false,
        address: default_redis_address(),
        port: default_redis_port(),
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ServerConfigGeneral {
    #[serde(default = "default_name")]
    pub name: String,
    #[serde(default = "default_address")]
    pub address: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

/// The cache store section. The name doubles as a version tag: bumping it
/// points the gateway at a disjoint store.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ServerConfigCache {
    #[serde(default = "default_cache_name")]
    pub name: String,
    /// Paths fetched from the upstream and stored before the server binds.
    #[serde(default = "default_precache")]
    pub precache: Vec<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ServerConfigBypass {
    /// Paths that always go straight to the upstream, never the store.
    #[serde(default = "default_bypass_paths")]
    pub paths: Vec<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ServerConfigUpstream {
    #[serde(default = "default_upstream_url")]
    pub url: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ServerConfigRedis {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_redis_address")]
    pub address: String,
    #[serde(default = "default_redis_port")]
    pub port: u16,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    #[serde(default = "default_general")]
    pub general: ServerConfigGeneral,
    #[serde(default = "default_cache")]
    pub cache: ServerConfigCache,
    #[serde(default = "default_bypass")]
    pub bypass: ServerConfigBypass,
    #[serde(default = "default_upstream")]
    pub upstream: ServerConfigUpstream,
    #[serde(default = "default_redis")]
    pub redis: ServerConfigRedis,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            general: default_general(),
            cache: default_cache(),
            bypass: default_bypass(),
            upstream: default_upstream(),
            redis: default_redis(),
        }
    }
}

/* -------------------------------------------------------------------------- */
/*                                    Tests                                   */
/* -------------------------------------------------------------------------- */

#[cfg(test)]
mod tests {
    use super::ServerConfig;

    #[test]
    fn defaults() {
        let config = ServerConfig::default();

        assert_eq!(config.cache.name, "kintai-app-cache-v1");
        assert_eq!(config.cache.precache, vec!["/", "/static/style.css"]);
        assert_eq!(config.bypass.paths, vec!["/events"]);
        assert_eq!(config.upstream.url, "http://127.0.0.1:8000");
        assert!(!config.redis.enabled);
    }

    /// An empty document must deserialize to the full defaults.
    #[test]
    fn empty_toml_is_defaults() {
        let config: ServerConfig = toml::from_str("").unwrap();
        assert_eq!(config, ServerConfig::default());
    }

    #[test]
    fn partial_toml_keeps_other_defaults() {
        let config: ServerConfig = toml::from_str(
            r#"
            [cache]
            name = "kintai-app-cache-v2"
            precache = ["/", "/static/style.css", "/static/app.js"]

            [upstream]
            url = "http://10.0.0.5:9000"
            "#,
        )
        .unwrap();

        assert_eq!(config.cache.name, "kintai-app-cache-v2");
        assert_eq!(config.cache.precache.len(), 3);
        assert_eq!(config.upstream.url, "http://10.0.0.5:9000");
        // Untouched sections fall back to defaults
        assert_eq!(config.bypass.paths, vec!["/events"]);
        assert_eq!(config.general.port, 8080);
    }
}
