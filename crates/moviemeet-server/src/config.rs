use std::env;
use std::time::Duration;

use anyhow::Context;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub database_max_connections: u32,
    pub jwt_secret: String,
    pub jwt_expires_in: i64,
    pub refresh_token_expires_in: i64,
    pub port: u16,
    pub tmdb: TmdbConfig,
}

/// Settings handed to the movie metadata gateway at construction.
#[derive(Debug, Clone)]
pub struct TmdbConfig {
    /// `None` leaves the gateway unconfigured; its endpoints then answer 500.
    pub api_key: Option<String>,
    pub base_url: String,
    pub image_base_url: String,
    pub timeout: Duration,
}

impl Default for TmdbConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: "https://api.themoviedb.org/3".to_string(),
            image_base_url: "https://image.tmdb.org/t/p".to_string(),
            timeout: Duration::from_secs(10),
        }
    }
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        let defaults = TmdbConfig::default();

        Ok(Self {
            database_url: env::var("DATABASE_URL").context("DATABASE_URL must be set")?,
            database_max_connections: env::var("DATABASE_MAX_CONNECTIONS")
                .unwrap_or_else(|_| "10".to_string())
                .parse()
                .context("DATABASE_MAX_CONNECTIONS must be a number")?,
            jwt_secret: env::var("JWT_SECRET").context("JWT_SECRET must be set")?,
            jwt_expires_in: env::var("JWT_EXPIRES_IN")
                .unwrap_or_else(|_| "900".to_string()) // 15 minutes
                .parse()
                .context("JWT_EXPIRES_IN must be a number of seconds")?,
            refresh_token_expires_in: env::var("REFRESH_TOKEN_EXPIRES_IN")
                .unwrap_or_else(|_| "604800".to_string()) // 7 days
                .parse()
                .context("REFRESH_TOKEN_EXPIRES_IN must be a number of seconds")?,
            port: env::var("PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()
                .context("PORT must be a valid port number")?,
            tmdb: TmdbConfig {
                api_key: env::var("TMDB_API_KEY").ok().filter(|key| !key.trim().is_empty()),
                base_url: env::var("TMDB_BASE_URL").unwrap_or(defaults.base_url),
                image_base_url: env::var("TMDB_IMAGE_BASE_URL").unwrap_or(defaults.image_base_url),
                timeout: match env::var("TMDB_TIMEOUT_SECS") {
                    Ok(secs) => Duration::from_secs(
                        secs.parse().context("TMDB_TIMEOUT_SECS must be a number")?,
                    ),
                    Err(_) => defaults.timeout,
                },
            },
        })
    }
}
