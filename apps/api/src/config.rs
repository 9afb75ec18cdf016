use std::time::Duration;

use anyhow::{Context, Result};

/// Application configuration loaded from environment variables.
/// Startup fails if required variables are missing.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub redis_url: String,
    pub s3_bucket: String,
    pub s3_endpoint: String,
    pub aws_access_key_id: String,
    pub aws_secret_access_key: String,
    pub anthropic_api_key: String,
    pub port: u16,
    pub rust_log: String,
    /// Chromium / Chrome binary used for HTML → PDF printing.
    pub chrome_bin: String,
    pub render_timeout: Duration,
    pub generation_timeout: Duration,
    /// Expiry of the per-user generation lock. Must outlive `generation_timeout`.
    pub generation_lock_ttl: Duration,
    /// Origins CV photos may be loaded from. Defaults to the S3 endpoint.
    pub photo_origins: Vec<String>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let generation_timeout = Duration::from_secs(optional_u64("GENERATION_TIMEOUT_SECS", 150)?);
        let generation_lock_ttl =
            Duration::from_secs(optional_u64("GENERATION_LOCK_TTL_SECS", 300)?);
        if generation_lock_ttl <= generation_timeout {
            anyhow::bail!("GENERATION_LOCK_TTL_SECS must be greater than GENERATION_TIMEOUT_SECS");
        }

        let s3_endpoint = require_env("S3_ENDPOINT")?;
        let photo_origins = match std::env::var("PHOTO_ORIGINS") {
            Ok(raw) => raw
                .split(',')
                .map(str::trim)
                .filter(|origin| !origin.is_empty())
                .map(String::from)
                .collect(),
            Err(_) => vec![s3_endpoint.clone()],
        };

        Ok(Config {
            database_url: require_env("DATABASE_URL")?,
            redis_url: require_env("REDIS_URL")?,
            s3_bucket: require_env("S3_BUCKET")?,
            s3_endpoint,
            aws_access_key_id: require_env("AWS_ACCESS_KEY_ID")?,
            aws_secret_access_key: require_env("AWS_SECRET_ACCESS_KEY")?,
            anthropic_api_key: require_env("ANTHROPIC_API_KEY")?,
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            chrome_bin: std::env::var("CHROME_BIN").unwrap_or_else(|_| "chromium".to_string()),
            render_timeout: Duration::from_secs(optional_u64("RENDER_TIMEOUT_SECS", 60)?),
            generation_timeout,
            generation_lock_ttl,
            photo_origins,
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn optional_u64(key: &str, default: u64) -> Result<u64> {
    match std::env::var(key) {
        Ok(raw) => raw
            .parse::<u64>()
            .with_context(|| format!("{key} must be a whole number of seconds")),
        Err(_) => Ok(default),
    }
}
