use serde::Deserialize;
use std::path::PathBuf;

/// Default artifact location shared by the trainer and the scorer.
pub const DEFAULT_MODEL_PATH: &str = "risk_model.json";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub model_path: PathBuf,
    pub request_body_limit_bytes: usize,
    /// Sustained requests per second per client IP on `/score`; 0 disables limiting.
    pub rate_limit_per_second: u64,
    pub rate_limit_burst: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            model_path: PathBuf::from(DEFAULT_MODEL_PATH),
            request_body_limit_bytes: 16 * 1024,
            rate_limit_per_second: 10,
            rate_limit_burst: 20,
        }
    }
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let config = Self {
            host: var("HOST").unwrap_or(defaults.host),
            port: var("PORT")
                .map(|p| p.trim().parse::<u16>())
                .transpose()
                .map_err(|_| anyhow::anyhow!("PORT must be a valid number between 1-65535"))?
                .unwrap_or(defaults.port),
            model_path: match lookup("MODEL_PATH") {
                Some(path) if path.trim().is_empty() => {
                    anyhow::bail!("MODEL_PATH cannot be empty")
                }
                Some(path) => PathBuf::from(path.trim()),
                None => defaults.model_path,
            },
            request_body_limit_bytes: var("REQUEST_BODY_LIMIT_BYTES")
                .map(|v| v.trim().parse::<usize>())
                .transpose()
                .map_err(|_| anyhow::anyhow!("REQUEST_BODY_LIMIT_BYTES must be a positive integer"))
                .and_then(|limit| match limit {
                    Some(0) => anyhow::bail!("REQUEST_BODY_LIMIT_BYTES must be greater than 0"),
                    other => Ok(other),
                })?
                .unwrap_or(defaults.request_body_limit_bytes),
            rate_limit_per_second: var("RATE_LIMIT_PER_SECOND")
                .map(|v| v.trim().parse::<u64>())
                .transpose()
                .map_err(|_| anyhow::anyhow!("RATE_LIMIT_PER_SECOND must be a non-negative integer"))?
                .unwrap_or(defaults.rate_limit_per_second),
            rate_limit_burst: var("RATE_LIMIT_BURST")
                .map(|v| v.trim().parse::<u32>())
                .transpose()
                .map_err(|_| anyhow::anyhow!("RATE_LIMIT_BURST must be a positive integer"))
                .and_then(|burst| match burst {
                    Some(0) => anyhow::bail!("RATE_LIMIT_BURST must be greater than 0"),
                    other => Ok(other),
                })?
                .unwrap_or(defaults.rate_limit_burst),
        };

        tracing::debug!("Server address: {}:{}", config.host, config.port);
        tracing::debug!("Model path: {}", config.model_path.display());
        if config.rate_limit_per_second == 0 {
            tracing::info!("Rate limiting disabled");
        }

        Ok(config)
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
