//! Resolves the movie reference of a new meetup to a local catalog row.
//!
//! The reference is first read as a local id. When no such row exists it is
//! read as a TMDB id: a row already cached under that id is reused, otherwise
//! the detail is fetched through the gateway and upserted keyed on that id.
//! If the fetch fails, a placeholder row is created with the caller's display
//! name and today's date. That placeholder carries no TMDB id, so repeated
//! failures for the same id create separate rows.

use chrono::{NaiveDate, Utc};
use moviemeet_shared::round_rating;
use serde::Deserialize;
use serde_json::Value;

use crate::catalog::{MovieCatalog, NewMovie};
use crate::error::AppError;
use crate::tmdb::{Gateway, ProviderError};

pub const FALLBACK_TITLE: &str = "Unknown Movie";

const TITLE_MAX_CHARS: usize = 200;
const GENRE_MAX_CHARS: usize = 100;

#[derive(Debug, Deserialize)]
struct TmdbGenre {
    name: String,
}

#[derive(Debug, Deserialize)]
struct TmdbMovieDetails {
    title: String,
    #[serde(default)]
    overview: Option<String>,
    #[serde(default)]
    release_date: Option<String>,
    #[serde(default)]
    poster_path: Option<String>,
    #[serde(default)]
    backdrop_path: Option<String>,
    #[serde(default)]
    genres: Vec<TmdbGenre>,
    #[serde(default)]
    runtime: Option<i32>,
    #[serde(default)]
    vote_average: Option<f64>,
}

fn truncate(value: &str, max_chars: usize) -> String {
    value.chars().take(max_chars).collect()
}

fn image_url(base: &str, size: &str, path: Option<&str>) -> String {
    match path {
        Some(path) if !path.is_empty() => format!("{}/{}{}", base, size, path),
        _ => String::new(),
    }
}

/// Maps a TMDB movie detail payload onto a catalog row.
pub fn movie_from_details(
    tmdb_id: i64,
    details: Value,
    image_base_url: &str,
    today: NaiveDate,
) -> Result<NewMovie, ProviderError> {
    let details: TmdbMovieDetails = serde_json::from_value(details)
        .map_err(|e| ProviderError::Payload(format!("movie {}: {}", tmdb_id, e)))?;

    let release_date = details
        .release_date
        .as_deref()
        .and_then(|date| NaiveDate::parse_from_str(date, "%Y-%m-%d").ok())
        .unwrap_or(today);

    let genre = details
        .genres
        .iter()
        .map(|g| g.name.as_str())
        .collect::<Vec<_>>()
        .join(", ");

    Ok(NewMovie {
        tmdb_id: Some(tmdb_id),
        title: truncate(&details.title, TITLE_MAX_CHARS),
        description: details.overview.unwrap_or_default(),
        release_date,
        poster_url: image_url(image_base_url, "w500", details.poster_path.as_deref()),
        backdrop_url: image_url(image_base_url, "original", details.backdrop_path.as_deref()),
        genre: truncate(&genre, GENRE_MAX_CHARS),
        duration: details.runtime.filter(|minutes| *minutes > 0),
        rating: details.vote_average.map(round_rating),
    })
}

async fn fetch_from_provider(
    gateway: Option<&Gateway>,
    tmdb_id: i64,
    today: NaiveDate,
) -> Result<NewMovie, AppError> {
    let gateway = gateway.ok_or(AppError::ProviderNotConfigured)?;
    let details = gateway.details(tmdb_id).await?;
    Ok(movie_from_details(
        tmdb_id,
        details,
        gateway.image_base_url(),
        today,
    )?)
}

/// Returns the id of the local catalog row `movie_ref` refers to, creating
/// it when needed.
pub async fn resolve_movie<C>(
    catalog: &C,
    gateway: Option<&Gateway>,
    movie_ref: i64,
    display_name: Option<&str>,
) -> Result<i64, AppError>
where
    C: MovieCatalog + ?Sized,
{
    if catalog.movie_exists(movie_ref).await? {
        return Ok(movie_ref);
    }

    if let Some(id) = catalog.find_by_tmdb_id(movie_ref).await? {
        tracing::debug!("TMDB movie {} already cached as catalog row {}", movie_ref, id);
        return Ok(id);
    }

    let today = Utc::now().date_naive();

    match fetch_from_provider(gateway, movie_ref, today).await {
        Ok(movie) => {
            let id = catalog.upsert_by_tmdb_id(movie_ref, &movie).await?;
            tracing::info!("Cached TMDB movie {} as catalog row {}", movie_ref, id);
            Ok(id)
        }
        Err(e) => {
            let title = display_name
                .map(str::trim)
                .filter(|name| !name.is_empty())
                .unwrap_or(FALLBACK_TITLE);
            tracing::warn!(
                "Could not fetch TMDB movie {} ({}), creating placeholder \"{}\"",
                movie_ref,
                e,
                title
            );
            catalog
                .insert_movie(&NewMovie::placeholder(truncate(title, TITLE_MAX_CHARS), today))
                .await
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 15).unwrap()
    }

    #[test]
    fn maps_full_detail_payload() {
        let details = json!({
            "id": 693134,
            "title": "Dune: Part Two",
            "overview": "Paul unites with the Fremen.",
            "release_date": "2024-02-27",
            "poster_path": "/poster.jpg",
            "backdrop_path": "/backdrop.jpg",
            "genres": [{"id": 878, "name": "Science Fiction"}, {"id": 12, "name": "Adventure"}],
            "runtime": 167,
            "vote_average": 8.153,
            "credits": {"cast": []}
        });

        let movie =
            movie_from_details(693134, details, "https://image.tmdb.org/t/p", today()).unwrap();

        assert_eq!(movie.tmdb_id, Some(693134));
        assert_eq!(movie.title, "Dune: Part Two");
        assert_eq!(movie.description, "Paul unites with the Fremen.");
        assert_eq!(movie.release_date, NaiveDate::from_ymd_opt(2024, 2, 27).unwrap());
        assert_eq!(movie.poster_url, "https://image.tmdb.org/t/p/w500/poster.jpg");
        assert_eq!(movie.backdrop_url, "https://image.tmdb.org/t/p/original/backdrop.jpg");
        assert_eq!(movie.genre, "Science Fiction, Adventure");
        assert_eq!(movie.duration, Some(167));
        assert_eq!(movie.rating, Some(8.2));
    }

    #[test]
    fn sparse_payload_falls_back_to_today_and_blanks() {
        let details = json!({"title": "Obscure", "release_date": "", "poster_path": null, "runtime": 0});

        let movie = movie_from_details(7, details, "https://img", today()).unwrap();

        assert_eq!(movie.release_date, today());
        assert_eq!(movie.poster_url, "");
        assert_eq!(movie.backdrop_url, "");
        assert_eq!(movie.genre, "");
        assert_eq!(movie.duration, None);
        assert_eq!(movie.rating, None);
    }

    #[test]
    fn payload_without_title_is_rejected() {
        let err = movie_from_details(7, json!({"status_code": 34}), "https://img", today())
            .unwrap_err();
        assert!(matches!(err, ProviderError::Payload(_)));
    }

    #[test]
    fn placeholder_has_no_tmdb_id() {
        let movie = NewMovie::placeholder(FALLBACK_TITLE, today());
        assert_eq!(movie.tmdb_id, None);
        assert_eq!(movie.title, "Unknown Movie");
        assert_eq!(movie.release_date, today());
    }
}
