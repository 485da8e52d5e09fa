//! Writes into the local movie catalog.

use async_trait::async_trait;
use chrono::NaiveDate;
use moviemeet_shared::Movie;

use crate::db::DbPool;
use crate::error::AppError;

/// Columns of a [`Movie`], with the average user rating computed from the
/// ratings table on every read. Expects `movies` aliased as `m`.
pub const MOVIE_COLUMNS: &str = r#"
    m.id, m.tmdb_id, m.title, m.description, m.release_date, m.poster_url,
    m.backdrop_url, m.genre, m.duration, m.rating::float8 AS rating,
    (SELECT AVG(r.rating)::float8 FROM movie_ratings r WHERE r.movie_id = m.id)
        AS average_user_rating,
    m.created_at, m.updated_at
"#;

#[derive(Debug, Clone, PartialEq)]
pub struct NewMovie {
    pub tmdb_id: Option<i64>,
    pub title: String,
    pub description: String,
    pub release_date: NaiveDate,
    pub poster_url: String,
    pub backdrop_url: String,
    pub genre: String,
    pub duration: Option<i32>,
    pub rating: Option<f64>,
}

impl NewMovie {
    /// Minimal local-only row: a display name and a placeholder release date.
    pub fn placeholder(title: impl Into<String>, release_date: NaiveDate) -> Self {
        Self {
            tmdb_id: None,
            title: title.into(),
            description: String::new(),
            release_date,
            poster_url: String::new(),
            backdrop_url: String::new(),
            genre: String::new(),
            duration: None,
            rating: None,
        }
    }
}

#[async_trait]
pub trait MovieCatalog: Send + Sync {
    async fn movie_exists(&self, id: i64) -> Result<bool, AppError>;

    /// Local id of the row already cached for `tmdb_id`, if any.
    async fn find_by_tmdb_id(&self, tmdb_id: i64) -> Result<Option<i64>, AppError>;

    async fn insert_movie(&self, movie: &NewMovie) -> Result<i64, AppError>;

    /// Inserts the movie or refreshes the row already carrying `tmdb_id`.
    /// Repeated calls with the same id keep a single row.
    async fn upsert_by_tmdb_id(&self, tmdb_id: i64, movie: &NewMovie) -> Result<i64, AppError>;
}

#[async_trait]
impl MovieCatalog for DbPool {
    async fn movie_exists(&self, id: i64) -> Result<bool, AppError> {
        let row: Option<(i64,)> = sqlx::query_as("SELECT id FROM movies WHERE id = $1")
            .bind(id)
            .fetch_optional(self)
            .await?;

        Ok(row.is_some())
    }

    async fn find_by_tmdb_id(&self, tmdb_id: i64) -> Result<Option<i64>, AppError> {
        let row: Option<(i64,)> = sqlx::query_as("SELECT id FROM movies WHERE tmdb_id = $1")
            .bind(tmdb_id)
            .fetch_optional(self)
            .await?;

        Ok(row.map(|(id,)| id))
    }

    async fn insert_movie(&self, movie: &NewMovie) -> Result<i64, AppError> {
        let (id,): (i64,) = sqlx::query_as(
            r#"
            INSERT INTO movies (tmdb_id, title, description, release_date, poster_url,
                                backdrop_url, genre, duration, rating)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9::numeric)
            RETURNING id
            "#,
        )
        .bind(movie.tmdb_id)
        .bind(&movie.title)
        .bind(&movie.description)
        .bind(movie.release_date)
        .bind(&movie.poster_url)
        .bind(&movie.backdrop_url)
        .bind(&movie.genre)
        .bind(movie.duration)
        .bind(movie.rating)
        .fetch_one(self)
        .await
        .map_err(|e| {
            AppError::on_unique_violation(e, "A movie with this TMDB id already exists")
        })?;

        Ok(id)
    }

    async fn upsert_by_tmdb_id(&self, tmdb_id: i64, movie: &NewMovie) -> Result<i64, AppError> {
        let (id,): (i64,) = sqlx::query_as(
            r#"
            INSERT INTO movies (tmdb_id, title, description, release_date, poster_url,
                                backdrop_url, genre, duration, rating)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9::numeric)
            ON CONFLICT (tmdb_id) DO UPDATE
            SET title = EXCLUDED.title,
                description = EXCLUDED.description,
                release_date = EXCLUDED.release_date,
                poster_url = EXCLUDED.poster_url,
                backdrop_url = EXCLUDED.backdrop_url,
                genre = EXCLUDED.genre,
                duration = EXCLUDED.duration,
                rating = EXCLUDED.rating,
                updated_at = NOW()
            RETURNING id
            "#,
        )
        .bind(tmdb_id)
        .bind(&movie.title)
        .bind(&movie.description)
        .bind(movie.release_date)
        .bind(&movie.poster_url)
        .bind(&movie.backdrop_url)
        .bind(&movie.genre)
        .bind(movie.duration)
        .bind(movie.rating)
        .fetch_one(self)
        .await?;

        Ok(id)
    }
}

pub async fn fetch_movie(db: &DbPool, id: i64) -> Result<Movie, AppError> {
    let query = format!("SELECT {} FROM movies m WHERE m.id = $1", MOVIE_COLUMNS);

    sqlx::query_as::<_, Movie>(&query)
        .bind(id)
        .fetch_optional(db)
        .await?
        .ok_or_else(|| AppError::not_found("Movie"))
}
