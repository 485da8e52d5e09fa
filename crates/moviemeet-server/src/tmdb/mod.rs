//! Gateway to the external movie database.
//!
//! Handlers never talk to a [`MovieProvider`] directly: [`Gateway`] wraps it
//! and applies the [`ContentFilter`] to everything it hands back, so the
//! policy can be exercised with a fake provider and no network.

mod client;
mod filter;

use std::sync::Arc;

use serde_json::Value;

use crate::error::AppError;

pub use client::{MovieProvider, ProviderError, TmdbClient};
pub use filter::{ContentFilter, DEFAULT_DENYLIST};

#[derive(Clone)]
pub struct Gateway {
    provider: Arc<dyn MovieProvider>,
    filter: ContentFilter,
    image_base_url: String,
}

impl Gateway {
    pub fn new(provider: Arc<dyn MovieProvider>, image_base_url: impl Into<String>) -> Self {
        Self {
            provider,
            filter: ContentFilter::default(),
            image_base_url: image_base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn with_filter(mut self, filter: ContentFilter) -> Self {
        self.filter = filter;
        self
    }

    pub async fn search(&self, query: &str, page: u32) -> Result<Value, AppError> {
        let page = self.provider.search(query, page).await?;
        Ok(self.filter.filter_results(page))
    }

    pub async fn popular(&self, page: u32) -> Result<Value, AppError> {
        let page = self.provider.popular(page).await?;
        Ok(self.filter.filter_results(page))
    }

    /// Movie detail with credits. A movie the filter rejects is reported as missing.
    pub async fn details(&self, tmdb_id: i64) -> Result<Value, AppError> {
        let movie = self.provider.details(tmdb_id).await?;
        if !self.filter.allows(&movie) {
            tracing::debug!("TMDB movie {} withheld by content filter", tmdb_id);
            return Err(AppError::not_found("Movie"));
        }
        Ok(movie)
    }

    pub async fn recommendations(&self, tmdb_id: i64, page: u32) -> Result<Value, AppError> {
        let page = self.provider.recommendations(tmdb_id, page).await?;
        Ok(self.filter.filter_results(page))
    }

    pub async fn reviews(&self, tmdb_id: i64, page: u32) -> Result<Value, AppError> {
        Ok(self.provider.reviews(tmdb_id, page).await?)
    }

    pub fn image_base_url(&self) -> &str {
        &self.image_base_url
    }
}
