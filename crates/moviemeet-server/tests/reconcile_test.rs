mod common;

use common::{gateway, FakeProvider, InMemoryCatalog};
use moviemeet_server::catalog::{MovieCatalog, NewMovie};
use moviemeet_server::reconcile::{resolve_movie, FALLBACK_TITLE};
use serde_json::json;

fn dune_details() -> serde_json::Value {
    json!({
        "id": 693134,
        "title": "Dune: Part Two",
        "overview": "Paul unites with the Fremen.",
        "release_date": "2024-02-27",
        "poster_path": "/dune.jpg",
        "genres": [{"id": 878, "name": "Science Fiction"}],
        "runtime": 167,
        "vote_average": 8.16
    })
}

#[tokio::test]
async fn local_row_is_used_as_is() {
    let catalog = InMemoryCatalog::new();
    let today = chrono::Utc::now().date_naive();
    let id = catalog
        .insert_movie(&NewMovie::placeholder("Heat", today))
        .await
        .unwrap();

    let tmdb = gateway(FakeProvider::failing());
    let resolved = resolve_movie(&catalog, Some(&tmdb), id, None).await.unwrap();

    assert_eq!(resolved, id);
    assert_eq!(catalog.len().await, 1);
}

#[tokio::test]
async fn provider_movie_is_cached_once() {
    let catalog = InMemoryCatalog::new();
    let tmdb = gateway(FakeProvider::with_details(693134, dune_details()));

    let first = resolve_movie(&catalog, Some(&tmdb), 693134, None)
        .await
        .unwrap();
    let movie = catalog.get(first).await.unwrap();
    assert_eq!(movie.tmdb_id, Some(693134));
    assert_eq!(movie.title, "Dune: Part Two");
    assert_eq!(movie.poster_url, "https://image.test/t/p/w500/dune.jpg");
    assert_eq!(movie.rating, Some(8.2));

    // A fresh catalog id never equals the provider id, so the second call
    // finds the row through its TMDB id
    let second = resolve_movie(&catalog, Some(&tmdb), 693134, None)
        .await
        .unwrap();
    assert_eq!(first, second);
    assert_eq!(catalog.len().await, 1);
}

#[tokio::test]
async fn cached_movie_survives_provider_outage() {
    let catalog = InMemoryCatalog::new();
    let online = gateway(FakeProvider::with_details(693134, dune_details()));
    let offline = gateway(FakeProvider::failing());

    let cached = resolve_movie(&catalog, Some(&online), 693134, None)
        .await
        .unwrap();
    let again = resolve_movie(&catalog, Some(&offline), 693134, Some("Dune"))
        .await
        .unwrap();

    assert_eq!(cached, again);
    assert_eq!(catalog.len().await, 1);
    assert_eq!(catalog.get(again).await.unwrap().tmdb_id, Some(693134));
}

#[tokio::test]
async fn provider_failure_creates_named_placeholder() {
    let catalog = InMemoryCatalog::new();
    let tmdb = gateway(FakeProvider::failing());

    let id = resolve_movie(&catalog, Some(&tmdb), 550, Some("Fight Club"))
        .await
        .unwrap();

    let movie = catalog.get(id).await.unwrap();
    assert_eq!(movie.title, "Fight Club");
    assert_eq!(movie.tmdb_id, None);
    assert_eq!(movie.release_date, chrono::Utc::now().date_naive());
}

#[tokio::test]
async fn missing_provider_falls_back_to_unknown_title() {
    let catalog = InMemoryCatalog::new();

    let id = resolve_movie(&catalog, None, 550, Some("   ")).await.unwrap();

    assert_eq!(catalog.get(id).await.unwrap().title, FALLBACK_TITLE);
}

#[tokio::test]
async fn filtered_detail_falls_back_to_placeholder() {
    let catalog = InMemoryCatalog::new();
    let tmdb = gateway(FakeProvider::with_details(
        13,
        json!({"id": 13, "title": "Adult Film", "overview": ""}),
    ));

    let id = resolve_movie(&catalog, Some(&tmdb), 13, None).await.unwrap();

    let movie = catalog.get(id).await.unwrap();
    assert_eq!(movie.title, FALLBACK_TITLE);
    assert_eq!(movie.tmdb_id, None);
}

#[tokio::test]
async fn repeated_failures_create_separate_rows() {
    let catalog = InMemoryCatalog::new();
    let tmdb = gateway(FakeProvider::failing());

    let first = resolve_movie(&catalog, Some(&tmdb), 550, None).await.unwrap();
    let second = resolve_movie(&catalog, Some(&tmdb), 550, None).await.unwrap();

    assert_ne!(first, second);
    assert_eq!(catalog.len().await, 2);
}
