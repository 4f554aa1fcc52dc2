use anyhow::{Context, Result};

/// Application configuration loaded from environment variables.
/// Startup fails if required variables are missing.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub redis_url: String,
    pub embedding_base_url: String,
    pub embedding_model: String,
    pub port: u16,
    pub rust_log: String,
    /// Page size for ranked match listings when `?limit=` is absent.
    pub default_match_limit: usize,
    /// How long a revoked token stays on the revocation list.
    pub token_revocation_ttl_secs: u64,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            database_url: require_env("DATABASE_URL")?,
            redis_url: require_env("REDIS_URL")?,
            embedding_base_url: require_env("EMBEDDING_BASE_URL")?,
            embedding_model: std::env::var("EMBEDDING_MODEL")
                .unwrap_or_else(|_| "nomic-embed-text".to_string()),
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            default_match_limit: std::env::var("DEFAULT_MATCH_LIMIT")
                .unwrap_or_else(|_| "20".to_string())
                .parse::<usize>()
                .context("DEFAULT_MATCH_LIMIT must be a positive integer")?,
            token_revocation_ttl_secs: std::env::var("TOKEN_REVOCATION_TTL_SECS")
                .unwrap_or_else(|_| "86400".to_string())
                .parse::<u64>()
                .context("TOKEN_REVOCATION_TTL_SECS must be a number of seconds")?,
        })
    }
}

#[cfg(test)]
impl Config {
    pub fn for_tests() -> Self {
        Config {
            database_url: "postgres://localhost/talentmatch_test".to_string(),
            redis_url: "redis://localhost:6379".to_string(),
            embedding_base_url: "http://localhost:11434".to_string(),
            embedding_model: crate::embedding::testing::TEST_MODEL.to_string(),
            port: 8080,
            rust_log: "debug".to_string(),
            default_match_limit: 20,
            token_revocation_ttl_secs: 60,
        }
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}
