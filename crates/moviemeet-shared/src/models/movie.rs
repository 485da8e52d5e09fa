use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::UserSummary;

/// Lowest and highest score a user can give a movie.
pub const MIN_RATING: i32 = 1;
pub const MAX_RATING: i32 = 5;

/// Catalog row. `tmdb_id` is absent for locally authored movies.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Movie {
    pub id: i64,
    pub tmdb_id: Option<i64>,
    pub title: String,
    pub description: String,
    pub release_date: NaiveDate,
    pub poster_url: String,
    pub backdrop_url: String,
    pub genre: String,
    /// Runtime in minutes.
    pub duration: Option<i32>,
    /// Provider score, one decimal place.
    pub rating: Option<f64>,
    /// Mean of local user ratings, `None` when nobody rated the movie yet.
    pub average_user_rating: Option<f64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct MovieSummary {
    pub id: i64,
    pub tmdb_id: Option<i64>,
    pub title: String,
    pub release_date: NaiveDate,
    pub poster_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MovieRating {
    pub id: i64,
    pub user: UserSummary,
    pub movie: i64,
    pub movie_title: String,
    pub rating: i32,
    pub review: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MovieDetail {
    #[serde(flatten)]
    pub movie: Movie,
    pub ratings: Vec<MovieRating>,
    pub ratings_count: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Favorite {
    pub id: i64,
    pub user_id: i64,
    pub movie: Movie,
    pub created_at: DateTime<Utc>,
}

pub fn is_valid_rating(rating: i32) -> bool {
    (MIN_RATING..=MAX_RATING).contains(&rating)
}

/// Mean of the given scores; `None` for an empty slice, never zero.
pub fn average_rating(ratings: &[i32]) -> Option<f64> {
    if ratings.is_empty() {
        return None;
    }
    let sum: i64 = ratings.iter().map(|&r| i64::from(r)).sum();
    Some(sum as f64 / ratings.len() as f64)
}

/// Rounds a provider score to the single decimal place the catalog stores.
pub fn round_rating(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
