use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Extension, Json,
};
use chrono::{DateTime, Utc};
use moviemeet_shared::{
    api::{FavoriteRequest, ToggleFavoriteResponse},
    Favorite, Movie,
};
use serde_json::json;

use crate::auth::AuthUser;
use crate::catalog::{fetch_movie, MOVIE_COLUMNS};
use crate::error::AppError;
use crate::extract::AppJson;
use crate::routes::AppState;

#[derive(sqlx::FromRow)]
struct FavoriteRow {
    favorite_id: i64,
    favorited_at: DateTime<Utc>,
    #[sqlx(flatten)]
    movie: Movie,
}

/// GET /api/v1/favorites
pub async fn list_favorites(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Vec<Favorite>>, AppError> {
    let query = format!(
        r#"
        SELECT f.id AS favorite_id, f.created_at AS favorited_at, {}
        FROM favorites f
        JOIN movies m ON m.id = f.movie_id
        WHERE f.user_id = $1
        ORDER BY f.created_at DESC
        "#,
        MOVIE_COLUMNS
    );

    let rows: Vec<FavoriteRow> = sqlx::query_as(&query)
        .bind(user.id)
        .fetch_all(&state.db)
        .await?;

    let favorites = rows
        .into_iter()
        .map(|row| Favorite {
            id: row.favorite_id,
            user_id: user.id,
            movie: row.movie,
            created_at: row.favorited_at,
        })
        .collect();

    Ok(Json(favorites))
}

/// POST /api/v1/favorites
///
/// Adding a movie that is already a favorite succeeds without a second row.
pub async fn add_favorite(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    AppJson(req): AppJson<FavoriteRequest>,
) -> Result<Response, AppError> {
    let inserted: Option<(i64, DateTime<Utc>)> = sqlx::query_as(
        r#"
        INSERT INTO favorites (user_id, movie_id)
        VALUES ($1, $2)
        ON CONFLICT (user_id, movie_id) DO NOTHING
        RETURNING id, created_at
        "#,
    )
    .bind(user.id)
    .bind(req.movie_id)
    .fetch_optional(&state.db)
    .await
    .map_err(|e| AppError::on_missing_reference(e, "Movie"))?;

    let Some((id, created_at)) = inserted else {
        return Ok((
            StatusCode::OK,
            Json(json!({ "message": "Already in favorites" })),
        )
            .into_response());
    };

    let favorite = Favorite {
        id,
        user_id: user.id,
        movie: fetch_movie(&state.db, req.movie_id).await?,
        created_at,
    };

    Ok((StatusCode::CREATED, Json(favorite)).into_response())
}

/// DELETE /api/v1/favorites/:movie_id
pub async fn remove_favorite(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(movie_id): Path<i64>,
) -> Result<StatusCode, AppError> {
    let result = sqlx::query("DELETE FROM favorites WHERE user_id = $1 AND movie_id = $2")
        .bind(user.id)
        .bind(movie_id)
        .execute(&state.db)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Not in favorites".to_string()));
    }

    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/v1/favorites/toggle
pub async fn toggle_favorite(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    AppJson(req): AppJson<FavoriteRequest>,
) -> Result<Json<ToggleFavoriteResponse>, AppError> {
    let removed = sqlx::query("DELETE FROM favorites WHERE user_id = $1 AND movie_id = $2")
        .bind(user.id)
        .bind(req.movie_id)
        .execute(&state.db)
        .await?;

    if removed.rows_affected() > 0 {
        return Ok(Json(ToggleFavoriteResponse {
            movie_id: req.movie_id,
            favorited: false,
        }));
    }

    sqlx::query(
        r#"
        INSERT INTO favorites (user_id, movie_id)
        VALUES ($1, $2)
        ON CONFLICT (user_id, movie_id) DO NOTHING
        "#,
    )
    .bind(user.id)
    .bind(req.movie_id)
    .execute(&state.db)
    .await
    .map_err(|e| AppError::on_missing_reference(e, "Movie"))?;

    Ok(Json(ToggleFavoriteResponse {
        movie_id: req.movie_id,
        favorited: true,
    }))
}
