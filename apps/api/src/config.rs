use std::time::Duration;

use anyhow::{Context, Result};

use crate::synthesis::pipeline::{RetryPolicy, SynthesisSettings};

/// Application configuration loaded from environment variables.
/// Startup fails if required variables are missing or numbers do not parse.
#[derive(Debug, Clone)]
pub struct Config {
    pub anthropic_api_key: String,
    pub port: u16,
    pub rust_log: String,
    pub generation_timeout_secs: u64,
    pub generation_max_attempts: u32,
    pub generation_retry_base_ms: u64,
    pub generation_retry_max_ms: u64,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            anthropic_api_key: require_env("ANTHROPIC_API_KEY")?,
            port: parse_env("PORT", "8080").context("PORT must be a valid port number")?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            generation_timeout_secs: parse_env("GENERATION_TIMEOUT_SECS", "60")?,
            generation_max_attempts: parse_env("GENERATION_MAX_ATTEMPTS", "1")?,
            generation_retry_base_ms: parse_env("GENERATION_RETRY_BASE_MS", "500")?,
            generation_retry_max_ms: parse_env("GENERATION_RETRY_MAX_MS", "8000")?,
        })
    }

    /// Timeout and retry settings for the synthesis pipeline.
    pub fn synthesis_settings(&self) -> SynthesisSettings {
        SynthesisSettings {
            timeout: Duration::from_secs(self.generation_timeout_secs),
            retry: RetryPolicy {
                max_attempts: self.generation_max_attempts.max(1),
                base_delay: Duration::from_millis(self.generation_retry_base_ms),
                max_delay: Duration::from_millis(self.generation_retry_max_ms),
            },
        }
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn parse_env<T>(key: &str, default: &str) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    let raw = std::env::var(key).unwrap_or_else(|_| default.to_string());
    raw.trim()
        .parse::<T>()
        .with_context(|| format!("Environment variable '{key}' has invalid value '{raw}'"))
}
