// Configuration for the speech server, read from the environment

use std::time::Duration;

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub port: u16,
    /// Off unless `RATE_LIMIT_PER_MINUTE` is set.
    pub rate_limit_per_minute: Option<u32>,
    pub request_timeout_secs: u64,
    pub cors_allowed_origins: Option<Vec<String>>,
    pub voice_map_path: String,
    pub model_name: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 8000,
            rate_limit_per_minute: None,
            request_timeout_secs: 120,
            cors_allowed_origins: None,
            voice_map_path: "models/voices.json".to_string(),
            model_name: "piper".to_string(),
        }
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.trim().parse().ok())
}

impl ServerConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let port = env_parse("PORT").unwrap_or(defaults.port);

        let rate_limit_per_minute = env_parse("RATE_LIMIT_PER_MINUTE").filter(|v: &u32| *v > 0);

        let request_timeout_secs =
            env_parse("REQUEST_TIMEOUT_SECS").unwrap_or(defaults.request_timeout_secs);

        let cors_allowed_origins = std::env::var("CORS_ALLOWED_ORIGINS").ok().map(|origins| {
            origins
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect()
        });

        let voice_map_path = std::env::var("VOICE_MAP_PATH").unwrap_or(defaults.voice_map_path);
        let model_name = std::env::var("MODEL_NAME").unwrap_or(defaults.model_name);

        Self {
            port,
            rate_limit_per_minute,
            request_timeout_secs,
            cors_allowed_origins,
            voice_map_path,
            model_name,
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Seconds between two replenished tokens for a per-minute limit.
    pub fn replenish_secs(per_minute: u32) -> u64 {
        (60 / u64::from(per_minute.max(1))).max(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ServerConfig::default();
        assert_eq!(config.port, 8000);
        assert_eq!(config.request_timeout(), Duration::from_secs(120));
        assert!(config.cors_allowed_origins.is_none());
        assert!(config.rate_limit_per_minute.is_none());
    }

    #[test]
    fn test_rate_limit_replenish_interval() {
        assert_eq!(ServerConfig::replenish_secs(60), 1);
        assert_eq!(ServerConfig::replenish_secs(6), 10);
        assert_eq!(ServerConfig::replenish_secs(600), 1);
        assert_eq!(ServerConfig::replenish_secs(0), 60);
    }
}
