use serde::Deserialize;

/// Application configuration loaded from environment variables
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Redis connection URL; recommendation caching is off when unset
    #[serde(default)]
    pub redis_url: Option<String>,

    /// TTL of cached recommendation lists, in seconds
    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: u64,

    /// Neighborhood size used when a request does not pass `k`
    #[serde(default = "default_neighbors")]
    pub default_neighbors: usize,

    /// List length used when a request does not pass `n`
    #[serde(default = "default_top_n")]
    pub default_top_n: usize,

    /// Server host address
    #[serde(default = "default_host")]
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_cache_ttl_secs() -> u64 {
    300
}

fn default_neighbors() -> usize {
    10
}

fn default_top_n() -> usize {
    10
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

impl Default for Config {
    fn default() -> Self {
        Self {
            redis_url: None,
            cache_ttl_secs: default_cache_ttl_secs(),
            default_neighbors: default_neighbors(),
            default_top_n: default_top_n(),
            host: default_host(),
            port: default_port(),
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        envy::from_env::<Config>().map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))
    }

    /// Address the server binds to
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
