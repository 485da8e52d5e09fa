use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;

use crate::config::TmdbConfig;

#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("provider responded with status {0}")]
    Status(u16),

    #[error("unexpected payload: {0}")]
    Payload(String),
}

/// Read-only access to a third-party movie database.
///
/// Payloads are passed through as JSON; callers decide what to keep.
#[async_trait]
pub trait MovieProvider: Send + Sync {
    async fn search(&self, query: &str, page: u32) -> Result<Value, ProviderError>;

    async fn popular(&self, page: u32) -> Result<Value, ProviderError>;

    /// Full record for one movie, credits included.
    async fn details(&self, tmdb_id: i64) -> Result<Value, ProviderError>;

    async fn recommendations(&self, tmdb_id: i64, page: u32) -> Result<Value, ProviderError>;

    async fn reviews(&self, tmdb_id: i64, page: u32) -> Result<Value, ProviderError>;
}

/// HTTP client for The Movie Database v3 API.
pub struct TmdbClient {
    http: Client,
    api_key: String,
    base_url: String,
}

impl TmdbClient {
    pub fn new(api_key: String, config: &TmdbConfig) -> Result<Self, ProviderError> {
        let http = Client::builder().timeout(config.timeout).build()?;

        Ok(Self {
            http,
            api_key,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    async fn get(&self, path: &str, params: &[(&str, String)]) -> Result<Value, ProviderError> {
        tracing::debug!("TMDB request: {}", path);

        let response = self
            .http
            .get(format!("{}{}", self.base_url, path))
            .query(&[("api_key", self.api_key.as_str()), ("language", "en-US")])
            .query(params)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            tracing::warn!("TMDB {} responded with {}", path, status);
            return Err(ProviderError::Status(status.as_u16()));
        }

        Ok(response.json().await?)
    }
}

#[async_trait]
impl MovieProvider for TmdbClient {
    async fn search(&self, query: &str, page: u32) -> Result<Value, ProviderError> {
        self.get(
            "/search/movie",
            &[
                ("query", query.to_string()),
                ("page", page.to_string()),
                ("with_original_language", "en".to_string()),
                ("include_adult", "false".to_string()),
            ],
        )
        .await
    }

    async fn popular(&self, page: u32) -> Result<Value, ProviderError> {
        self.get(
            "/movie/popular",
            &[
                ("page", page.to_string()),
                ("with_original_language", "en".to_string()),
                ("include_adult", "false".to_string()),
            ],
        )
        .await
    }

    async fn details(&self, tmdb_id: i64) -> Result<Value, ProviderError> {
        self.get(
            &format!("/movie/{}", tmdb_id),
            &[("append_to_response", "credits".to_string())],
        )
        .await
    }

    async fn recommendations(&self, tmdb_id: i64, page: u32) -> Result<Value, ProviderError> {
        self.get(
            &format!("/movie/{}/recommendations", tmdb_id),
            &[("page", page.to_string())],
        )
        .await
    }

    async fn reviews(&self, tmdb_id: i64, page: u32) -> Result<Value, ProviderError> {
        self.get(
            &format!("/movie/{}/reviews", tmdb_id),
            &[("page", page.to_string())],
        )
        .await
    }
}
