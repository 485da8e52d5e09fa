use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use moviemeet_shared::{
    api::{CreateMovieRequest, MovieListParams, MovieListResponse, UpdateMovieRequest},
    average_rating, round_rating, Movie, MovieDetail,
};

use crate::catalog::{fetch_movie, MovieCatalog, NewMovie, MOVIE_COLUMNS};
use crate::error::AppError;
use crate::extract::{AppJson, AppQuery};
use crate::routes::AppState;

use super::ratings::fetch_ratings;

const TITLE_MAX_CHARS: usize = 200;
const DEFAULT_PAGE_SIZE: u32 = 50;
const MAX_PAGE_SIZE: u32 = 100;

/// Escapes LIKE wildcards so user input only ever matches literally.
pub fn like_pattern(query: &str) -> String {
    let escaped = query
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{}%", escaped)
}

/// Page and page size clamped to their bounds, plus the row offset.
/// The offset is computed in `i64` so no query value can overflow it.
fn page_window(page: Option<u32>, limit: Option<u32>) -> (u32, u32, i64) {
    let page = page.unwrap_or(1).max(1);
    let limit = limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE);
    let offset = (i64::from(page) - 1) * i64::from(limit);
    (page, limit, offset)
}

fn validate_title(title: &str) -> Result<(), AppError> {
    if title.trim().is_empty() {
        return Err(AppError::Validation("Movie title is required".to_string()));
    }
    if title.chars().count() > TITLE_MAX_CHARS {
        return Err(AppError::Validation(format!(
            "Movie title must be at most {} characters",
            TITLE_MAX_CHARS
        )));
    }
    Ok(())
}

/// Provider-style score on a 0-10 scale, stored with one decimal.
fn validate_score(rating: Option<f64>) -> Result<Option<f64>, AppError> {
    match rating {
        Some(value) if !(0.0..=10.0).contains(&value) => Err(AppError::Validation(
            "Movie rating must be between 0 and 10".to_string(),
        )),
        other => Ok(other.map(round_rating)),
    }
}

fn validate_duration(duration: Option<i32>) -> Result<(), AppError> {
    if matches!(duration, Some(minutes) if minutes <= 0) {
        return Err(AppError::Validation(
            "Duration must be a positive number of minutes".to_string(),
        ));
    }
    Ok(())
}

/// GET /api/v1/movies
pub async fn list_movies(
    State(state): State<AppState>,
    AppQuery(params): AppQuery<MovieListParams>,
) -> Result<Json<MovieListResponse>, AppError> {
    let (page, limit, offset) = page_window(params.page, params.limit);

    let pattern = params
        .q
        .as_deref()
        .map(str::trim)
        .filter(|q| !q.is_empty())
        .map(like_pattern);

    let (where_clause, param_idx) = if pattern.is_some() {
        ("WHERE m.title ILIKE $1", 2)
    } else {
        ("", 1)
    };

    let count_query = format!("SELECT COUNT(*) FROM movies m {}", where_clause);
    let mut count_builder = sqlx::query_as::<_, (i64,)>(&count_query);
    if let Some(ref pattern) = pattern {
        count_builder = count_builder.bind(pattern);
    }
    let (total,) = count_builder.fetch_one(&state.db).await?;

    let select_query = format!(
        r#"
        SELECT {}
        FROM movies m
        {}
        ORDER BY m.release_date DESC, m.id DESC
        LIMIT ${} OFFSET ${}
        "#,
        MOVIE_COLUMNS,
        where_clause,
        param_idx,
        param_idx + 1
    );
    let mut select_builder = sqlx::query_as::<_, Movie>(&select_query);
    if let Some(ref pattern) = pattern {
        select_builder = select_builder.bind(pattern);
    }
    let movies = select_builder
        .bind(i64::from(limit))
        .bind(offset)
        .fetch_all(&state.db)
        .await?;

    Ok(Json(MovieListResponse {
        movies,
        total,
        page,
        limit,
    }))
}

/// GET /api/v1/movies/search?q=
pub async fn search_movies(
    State(state): State<AppState>,
    AppQuery(params): AppQuery<MovieListParams>,
) -> Result<Json<Vec<Movie>>, AppError> {
    let pattern = like_pattern(params.q.as_deref().unwrap_or_default().trim());

    let query = format!(
        "SELECT {} FROM movies m WHERE m.title ILIKE $1 ORDER BY m.release_date DESC, m.id DESC",
        MOVIE_COLUMNS
    );
    let movies = sqlx::query_as::<_, Movie>(&query)
        .bind(pattern)
        .fetch_all(&state.db)
        .await?;

    Ok(Json(movies))
}

/// GET /api/v1/movies/:id
pub async fn get_movie(
    State(state): State<AppState>,
    Path(movie_id): Path<i64>,
) -> Result<Json<MovieDetail>, AppError> {
    let mut movie = fetch_movie(&state.db, movie_id).await?;
    let ratings = fetch_ratings(&state.db, Some(movie_id)).await?;
    let ratings_count = ratings.len() as i64;

    // Keep the average consistent with the embedded list
    let scores: Vec<i32> = ratings.iter().map(|r| r.rating).collect();
    movie.average_user_rating = average_rating(&scores);

    Ok(Json(MovieDetail {
        movie,
        ratings,
        ratings_count,
    }))
}

/// POST /api/v1/movies
pub async fn create_movie(
    State(state): State<AppState>,
    AppJson(req): AppJson<CreateMovieRequest>,
) -> Result<(StatusCode, Json<Movie>), AppError> {
    validate_title(&req.title)?;
    validate_duration(req.duration)?;
    let rating = validate_score(req.rating)?;

    let id = state
        .db
        .insert_movie(&NewMovie {
            tmdb_id: req.tmdb_id,
            title: req.title.trim().to_string(),
            description: req.description,
            release_date: req.release_date,
            poster_url: req.poster_url,
            backdrop_url: req.backdrop_url,
            genre: req.genre,
            duration: req.duration,
            rating,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(fetch_movie(&state.db, id).await?)))
}

/// PATCH /api/v1/movies/:id
pub async fn update_movie(
    State(state): State<AppState>,
    Path(movie_id): Path<i64>,
    AppJson(req): AppJson<UpdateMovieRequest>,
) -> Result<Json<Movie>, AppError> {
    if let Some(ref title) = req.title {
        validate_title(title)?;
    }
    validate_duration(req.duration)?;
    let rating = validate_score(req.rating)?;

    let updated: Option<(i64,)> = sqlx::query_as(
        r#"
        UPDATE movies
        SET title = COALESCE($1, title),
            description = COALESCE($2, description),
            release_date = COALESCE($3, release_date),
            poster_url = COALESCE($4, poster_url),
            backdrop_url = COALESCE($5, backdrop_url),
            genre = COALESCE($6, genre),
            duration = COALESCE($7, duration),
            rating = COALESCE($8::numeric, rating),
            updated_at = NOW()
        WHERE id = $9
        RETURNING id
        "#,
    )
    .bind(req.title.as_deref().map(str::trim))
    .bind(&req.description)
    .bind(req.release_date)
    .bind(&req.poster_url)
    .bind(&req.backdrop_url)
    .bind(&req.genre)
    .bind(req.duration)
    .bind(rating)
    .bind(movie_id)
    .fetch_optional(&state.db)
    .await?;

    if updated.is_none() {
        return Err(AppError::not_found("Movie"));
    }

    Ok(Json(fetch_movie(&state.db, movie_id).await?))
}

/// DELETE /api/v1/movies/:id
pub async fn delete_movie(
    State(state): State<AppState>,
    Path(movie_id): Path<i64>,
) -> Result<StatusCode, AppError> {
    let result = sqlx::query("DELETE FROM movies WHERE id = $1")
        .bind(movie_id)
        .execute(&state.db)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::not_found("Movie"));
    }

    Ok(StatusCode::NO_CONTENT)
}
