//! Read-only proxy over the movie provider.
//!
//! Payloads are passed through as the provider shapes them, minus whatever
//! the content filter withholds.

use axum::{
    extract::{Path, State},
    Json,
};
use moviemeet_shared::api::{TmdbPageParams, TmdbSearchParams};
use serde_json::Value;

use crate::error::AppError;
use crate::extract::AppQuery;
use crate::routes::AppState;
use crate::tmdb::Gateway;

fn gateway(state: &AppState) -> Result<&Gateway, AppError> {
    state.tmdb.as_ref().ok_or(AppError::ProviderNotConfigured)
}

fn page_or_first(page: Option<u32>) -> u32 {
    page.unwrap_or(1).max(1)
}

/// GET /api/v1/tmdb/search?q=&page=
pub async fn search(
    State(state): State<AppState>,
    AppQuery(params): AppQuery<TmdbSearchParams>,
) -> Result<Json<Value>, AppError> {
    let query = params.q.trim();
    if query.is_empty() {
        return Err(AppError::Validation("Query parameter is required".to_string()));
    }

    let results = gateway(&state)?
        .search(query, page_or_first(params.page))
        .await?;
    Ok(Json(results))
}

/// GET /api/v1/tmdb/popular?page=
pub async fn popular(
    State(state): State<AppState>,
    AppQuery(params): AppQuery<TmdbPageParams>,
) -> Result<Json<Value>, AppError> {
    let results = gateway(&state)?.popular(page_or_first(params.page)).await?;
    Ok(Json(results))
}

/// GET /api/v1/tmdb/:tmdb_id
pub async fn details(
    State(state): State<AppState>,
    Path(tmdb_id): Path<i64>,
) -> Result<Json<Value>, AppError> {
    Ok(Json(gateway(&state)?.details(tmdb_id).await?))
}

/// GET /api/v1/tmdb/:tmdb_id/recommendations?page=
pub async fn recommendations(
    State(state): State<AppState>,
    Path(tmdb_id): Path<i64>,
    AppQuery(params): AppQuery<TmdbPageParams>,
) -> Result<Json<Value>, AppError> {
    let results = gateway(&state)?
        .recommendations(tmdb_id, page_or_first(params.page))
        .await?;
    Ok(Json(results))
}

/// GET /api/v1/tmdb/:tmdb_id/reviews?page=
pub async fn reviews(
    State(state): State<AppState>,
    Path(tmdb_id): Path<i64>,
    AppQuery(params): AppQuery<TmdbPageParams>,
) -> Result<Json<Value>, AppError> {
    let results = gateway(&state)?
        .reviews(tmdb_id, page_or_first(params.page))
        .await?;
    Ok(Json(results))
}
