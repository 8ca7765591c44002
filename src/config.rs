//! Service configuration, loaded from the environment with documented defaults.

/// Runtime configuration for the service.
///
/// Every field here corresponds to one of the documented environment
/// variables. `Config::from_env` is what the binary uses; the `with_*`
/// builders exist so tests can construct a `Config` without touching the
/// process environment.
#[derive(Debug, Clone)]
pub struct Config {
    /// Datastore connection string, e.g. `redis://localhost:6379/0`.
    pub redis_url: String,
    /// API keys accepted by the auth gate. Empty disables auth entirely.
    pub api_keys: Vec<String>,
    /// Seconds between reclaimer sweeps.
    pub stale_job_interval_secs: u64,
    /// Default `claim_timeout_seconds` for queues that don't specify one.
    pub default_claim_timeout_secs: u64,
    /// Default `max_retries` for queues that don't specify one.
    pub default_max_retries: u32,
    /// TTL (seconds) applied to job metadata once it reaches a terminal status.
    pub job_meta_ttl_secs: u64,
    /// Address the HTTP listener binds to.
    pub bind_addr: String,
    /// Default tracing filter directive, overridden by `RUST_LOG`.
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            redis_url: "redis://localhost:6379/0".to_string(),
            api_keys: Vec::new(),
            stale_job_interval_secs: 30,
            default_claim_timeout_secs: 300,
            default_max_retries: 3,
            job_meta_ttl_secs: 604_800,
            bind_addr: "0.0.0.0:8080".to_string(),
            log_level: "info".to_string(),
        }
    }
}

impl Config {
    /// Loads configuration from the environment, falling back to defaults for
    /// any variable that is absent or fails to parse.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            redis_url: std::env::var("REDIS_URL").unwrap_or(defaults.redis_url),
            api_keys: std::env::var("STARQ_API_KEYS")
                .map(|raw| parse_api_keys(&raw))
                .unwrap_or(defaults.api_keys),
            stale_job_interval_secs: parse_env_or("STALE_JOB_INTERVAL", defaults.stale_job_interval_secs),
            default_claim_timeout_secs: parse_env_or(
                "DEFAULT_CLAIM_TIMEOUT",
                defaults.default_claim_timeout_secs,
            ),
            default_max_retries: parse_env_or("DEFAULT_MAX_RETRIES", defaults.default_max_retries),
            job_meta_ttl_secs: parse_env_or("JOB_META_TTL", defaults.job_meta_ttl_secs),
            bind_addr: std::env::var("STARQ_BIND_ADDR").unwrap_or(defaults.bind_addr),
            log_level: std::env::var("STARQ_LOG_LEVEL").unwrap_or(defaults.log_level),
        }
    }

    /// Overrides the Redis connection string.
    pub fn with_redis_url(mut self, url: impl Into<String>) -> Self {
        self.redis_url = url.into();
        self
    }

    /// Overrides the configured API keys.
    pub fn with_api_keys(mut self, keys: Vec<String>) -> Self {
        self.api_keys = keys;
        self
    }

    /// Overrides the HTTP bind address.
    pub fn with_bind_addr(mut self, addr: impl Into<String>) -> Self {
        self.bind_addr = addr.into();
        self
    }
}

fn parse_api_keys(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|key| !key.is_empty())
        .map(str::to_string)
        .collect()
}

fn parse_env_or<T: std::str::FromStr>(name: &str, default: T) -> T {
    std::env::var(name)
        .ok()
        .and_then(|raw| raw.parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_documented_values() {
        let config = Config::default();
        assert_eq!(config.redis_url, "redis://localhost:6379/0");
        assert!(config.api_keys.is_empty());
        assert_eq!(config.stale_job_interval_secs, 30);
        assert_eq!(config.default_claim_timeout_secs, 300);
        assert_eq!(config.default_max_retries, 3);
        assert_eq!(config.job_meta_ttl_secs, 604_800);
        assert_eq!(config.bind_addr, "0.0.0.0:8080");
    }

    #[test]
    fn api_keys_split_on_comma_and_trim_whitespace() {
        assert_eq!(
            parse_api_keys(" key-a, key-b ,,key-c"),
            vec!["key-a", "key-b", "key-c"]
        );
        assert!(parse_api_keys("").is_empty());
    }

    #[test]
    fn builders_override_defaults() {
        let config = Config::default()
            .with_redis_url("redis://example:6380")
            .with_api_keys(vec!["k1".to_string()])
            .with_bind_addr("127.0.0.1:9000");
        assert_eq!(config.redis_url, "redis://example:6380");
        assert_eq!(config.api_keys, vec!["k1".to_string()]);
        assert_eq!(config.bind_addr, "127.0.0.1:9000");
    }
}
