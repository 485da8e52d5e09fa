use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::{DateTime, Utc};
use moviemeet_shared::{
    api::{CreateRatingRequest, RatingListParams, UpdateRatingRequest},
    is_valid_rating, MovieRating, UserSummary, MAX_RATING, MIN_RATING,
};

use crate::auth::AuthUser;
use crate::db::DbPool;
use crate::error::AppError;
use crate::extract::{AppJson, AppQuery};
use crate::routes::AppState;

type RatingRow = (
    i64,           // id
    i64,           // user id
    String,        // username
    String,        // first_name
    String,        // last_name
    i64,           // movie_id
    String,        // movie title
    i32,           // rating
    String,        // review
    DateTime<Utc>, // created_at
    DateTime<Utc>, // updated_at
);

const RATING_SELECT: &str = r#"
    SELECT r.id, u.id, u.username, u.first_name, u.last_name,
           r.movie_id, m.title, r.rating, r.review, r.created_at, r.updated_at
    FROM movie_ratings r
    JOIN users u ON u.id = r.user_id
    JOIN movies m ON m.id = r.movie_id
"#;

fn row_to_rating(row: RatingRow) -> MovieRating {
    MovieRating {
        id: row.0,
        user: UserSummary {
            id: row.1,
            username: row.2,
            first_name: row.3,
            last_name: row.4,
        },
        movie: row.5,
        movie_title: row.6,
        rating: row.7,
        review: row.8,
        created_at: row.9,
        updated_at: row.10,
    }
}

fn validate_score(rating: i32) -> Result<(), AppError> {
    if !is_valid_rating(rating) {
        return Err(AppError::Validation(format!(
            "Rating must be between {} and {}",
            MIN_RATING, MAX_RATING
        )));
    }
    Ok(())
}

/// Ratings newest first, optionally limited to one movie.
pub async fn fetch_ratings(db: &DbPool, movie_id: Option<i64>) -> Result<Vec<MovieRating>, AppError> {
    let rows: Vec<RatingRow> = match movie_id {
        Some(movie_id) => {
            let query = format!("{} WHERE r.movie_id = $1 ORDER BY r.created_at DESC", RATING_SELECT);
            sqlx::query_as(&query).bind(movie_id).fetch_all(db).await?
        }
        None => {
            let query = format!("{} ORDER BY r.created_at DESC", RATING_SELECT);
            sqlx::query_as(&query).fetch_all(db).await?
        }
    };

    Ok(rows.into_iter().map(row_to_rating).collect())
}

async fn fetch_rating(db: &DbPool, rating_id: i64) -> Result<MovieRating, AppError> {
    let query = format!("{} WHERE r.id = $1", RATING_SELECT);
    let row: Option<RatingRow> = sqlx::query_as(&query)
        .bind(rating_id)
        .fetch_optional(db)
        .await?;

    row.map(row_to_rating)
        .ok_or_else(|| AppError::not_found("Rating"))
}

/// Only the author may change or remove a rating.
async fn ensure_author(db: &DbPool, rating_id: i64, user_id: i64) -> Result<(), AppError> {
    let author: Option<(i64,)> = sqlx::query_as("SELECT user_id FROM movie_ratings WHERE id = $1")
        .bind(rating_id)
        .fetch_optional(db)
        .await?;

    match author {
        None => Err(AppError::not_found("Rating")),
        Some((author_id,)) if author_id != user_id => Err(AppError::Forbidden),
        Some(_) => Ok(()),
    }
}

/// GET /api/v1/ratings
pub async fn list_ratings(
    State(state): State<AppState>,
    AppQuery(params): AppQuery<RatingListParams>,
) -> Result<Json<Vec<MovieRating>>, AppError> {
    Ok(Json(fetch_ratings(&state.db, params.movie).await?))
}

/// GET /api/v1/ratings/:id
pub async fn get_rating(
    State(state): State<AppState>,
    Path(rating_id): Path<i64>,
) -> Result<Json<MovieRating>, AppError> {
    Ok(Json(fetch_rating(&state.db, rating_id).await?))
}

/// POST /api/v1/ratings
pub async fn create_rating(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    AppJson(req): AppJson<CreateRatingRequest>,
) -> Result<(StatusCode, Json<MovieRating>), AppError> {
    validate_score(req.rating)?;

    // The (user, movie) unique index is the only duplicate check
    let (id,): (i64,) = sqlx::query_as(
        r#"
        INSERT INTO movie_ratings (user_id, movie_id, rating, review)
        VALUES ($1, $2, $3, $4)
        RETURNING id
        "#,
    )
    .bind(user.id)
    .bind(req.movie)
    .bind(req.rating)
    .bind(&req.review)
    .fetch_one(&state.db)
    .await
    .map_err(|e| {
        let missing_movie = e
            .as_database_error()
            .is_some_and(|db| db.is_foreign_key_violation());
        if missing_movie {
            AppError::not_found("Movie")
        } else {
            AppError::on_unique_violation(e, "You have already rated this movie")
        }
    })?;

    Ok((StatusCode::CREATED, Json(fetch_rating(&state.db, id).await?)))
}

/// PATCH /api/v1/ratings/:id
pub async fn update_rating(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(rating_id): Path<i64>,
    AppJson(req): AppJson<UpdateRatingRequest>,
) -> Result<Json<MovieRating>, AppError> {
    if let Some(rating) = req.rating {
        validate_score(rating)?;
    }

    ensure_author(&state.db, rating_id, user.id).await?;

    sqlx::query(
        r#"
        UPDATE movie_ratings
        SET rating = COALESCE($1, rating),
            review = COALESCE($2, review),
            updated_at = NOW()
        WHERE id = $3
        "#,
    )
    .bind(req.rating)
    .bind(&req.review)
    .bind(rating_id)
    .execute(&state.db)
    .await?;

    Ok(Json(fetch_rating(&state.db, rating_id).await?))
}

/// DELETE /api/v1/ratings/:id
pub async fn delete_rating(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(rating_id): Path<i64>,
) -> Result<StatusCode, AppError> {
    ensure_author(&state.db, rating_id, user.id).await?;

    sqlx::query("DELETE FROM movie_ratings WHERE id = $1")
        .bind(rating_id)
        .execute(&state.db)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scores_outside_one_to_five_are_rejected() {
        assert!(validate_score(3).is_ok());
        assert!(matches!(validate_score(0), Err(AppError::Validation(_))));
        assert!(matches!(validate_score(6), Err(AppError::Validation(_))));
    }
}
