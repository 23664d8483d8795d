use anyhow::{Context, Result};

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the frame-classifier inference sidecar.
    pub classifier_url: String,
    /// Per-call timeout for the classifier; a timeout degrades to the fallback label.
    pub classifier_timeout_ms: u64,
    /// Idle-session TTL. Unset means sessions are retained for the lifetime of
    /// the process, which is the reference behavior.
    pub session_ttl_secs: Option<u64>,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            classifier_url: require_env("CLASSIFIER_URL")?,
            classifier_timeout_ms: std::env::var("CLASSIFIER_TIMEOUT_MS")
                .unwrap_or_else(|_| "10000".to_string())
                .parse::<u64>()
                .context("CLASSIFIER_TIMEOUT_MS must be a number of milliseconds")?,
            session_ttl_secs: match std::env::var("SESSION_TTL_SECS") {
                Ok(v) => Some(
                    v.parse::<u64>()
                        .context("SESSION_TTL_SECS must be a number of seconds")?,
                ),
                Err(_) => None,
            },
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}
