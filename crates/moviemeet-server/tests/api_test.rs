mod common;

use axum::http::StatusCode;
use common::{access_token, gateway, get, post_json, post_raw, send, test_app, FakeProvider};
use moviemeet_server::auth::create_refresh_token;
use serde_json::json;

#[tokio::test]
async fn health_check_is_public() {
    let app = test_app(None);
    let (status, _) = send(app, get("/health")).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn protected_routes_require_a_token() {
    let app = test_app(None);

    for uri in ["/api/v1/favorites", "/api/v1/auth/profile"] {
        let (status, body) = send(app.clone(), get(uri)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "{}", uri);
        assert_eq!(body["error"], "Authentication required");
    }

    let (status, _) = send(
        app,
        post_json("/api/v1/meetups/1/join", None, json!({})),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn malformed_token_is_rejected() {
    let app = test_app(None);
    let (status, _) = send(
        app,
        post_json("/api/v1/ratings", Some("not-a-jwt"), json!({"movie": 1, "rating": 4})),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn refresh_token_cannot_authorize_requests() {
    let app = test_app(None);
    let refresh = create_refresh_token(1, "alice", common::JWT_SECRET, 3600)
        .unwrap()
        .token;

    let (status, _) = send(
        app,
        post_json("/api/v1/ratings", Some(&refresh), json!({"movie": 1, "rating": 4})),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn refresh_rejects_access_tokens() {
    let app = test_app(None);
    let token = access_token(1, "alice");

    let (status, _) = send(
        app,
        post_json("/api/v1/auth/refresh", None, json!({"refresh_token": token})),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn registration_with_mismatched_passwords_fails_validation() {
    let app = test_app(None);
    let (status, body) = send(
        app,
        post_json(
            "/api/v1/auth/register",
            None,
            json!({
                "username": "alice",
                "email": "alice@example.com",
                "password": "correct-horse-battery",
                "password2": "correct-horse-battery-staple"
            }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Password fields didn't match");
}

#[tokio::test]
async fn rating_outside_range_is_rejected() {
    let app = test_app(None);
    let token = access_token(1, "alice");

    let (status, body) = send(
        app,
        post_json("/api/v1/ratings", Some(&token), json!({"movie": 1, "rating": 6})),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Rating must be between 1 and 5");
}

#[tokio::test]
async fn incomplete_json_body_is_a_validation_error() {
    let app = test_app(None);
    let token = access_token(1, "alice");

    let (status, body) = send(
        app,
        post_json("/api/v1/ratings", Some(&token), json!({"movie": 1})),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("rating"));
}

#[tokio::test]
async fn malformed_json_body_is_a_validation_error() {
    let app = test_app(None);
    let token = access_token(1, "alice");

    let (status, body) = send(
        app,
        post_raw("/api/v1/favorites", Some(&token), "{\"movie_id\": "),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn mistyped_query_parameter_is_a_validation_error() {
    let app = test_app(Some(gateway(FakeProvider::default())));
    let (status, body) = send(app, get("/api/v1/tmdb/popular?page=abc")).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn meetup_capacity_must_be_positive() {
    let app = test_app(None);
    let token = access_token(1, "alice");

    let (status, body) = send(
        app,
        post_json(
            "/api/v1/meetups",
            Some(&token),
            json!({
                "title": "Dune night",
                "movie": 1,
                "location": "Downtown",
                "meetup_datetime": "2030-01-01T19:00:00Z",
                "max_participants": 0
            }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Max participants must be at least 1");
}

#[tokio::test]
async fn my_meetups_requires_a_caller() {
    let app = test_app(None);
    let (status, _) = send(app, get("/api/v1/meetups?my_meetups=true")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn provider_routes_without_key_answer_500() {
    let app = test_app(None);
    let (status, body) = send(app, get("/api/v1/tmdb/popular")).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "Movie provider not configured");
}

#[tokio::test]
async fn provider_search_requires_query() {
    let app = test_app(Some(gateway(FakeProvider::default())));
    let (status, _) = send(app, get("/api/v1/tmdb/search?q=")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn provider_listings_are_filtered() {
    let listing = vec![
        json!({"id": 1, "title": "Paddington 2", "overview": "A bear in London.", "adult": false}),
        json!({"id": 2, "title": "Sexy Beast", "overview": "A heist.", "adult": false}),
        json!({"id": 3, "title": "Quiet film", "overview": "Nothing to see.", "adult": true}),
        json!({"id": 4, "title": "Late show", "overview": "An EROTIC thriller.", "adult": false}),
    ];
    let app = test_app(Some(gateway(FakeProvider::with_listing(listing))));

    for uri in [
        "/api/v1/tmdb/search?q=bear",
        "/api/v1/tmdb/popular?page=2",
        "/api/v1/tmdb/10/recommendations",
    ] {
        let (status, body) = send(app.clone(), get(uri)).await;
        assert_eq!(status, StatusCode::OK, "{}", uri);

        let ids: Vec<i64> = body["results"]
            .as_array()
            .unwrap()
            .iter()
            .map(|movie| movie["id"].as_i64().unwrap())
            .collect();
        assert_eq!(ids, vec![1], "{}", uri);
    }
}

#[tokio::test]
async fn provider_page_is_forwarded() {
    let app = test_app(Some(gateway(FakeProvider::default())));
    let (status, body) = send(app, get("/api/v1/tmdb/popular?page=3")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["page"], 3);
}

#[tokio::test]
async fn filtered_detail_is_not_found() {
    let provider = FakeProvider::with_details(
        99,
        json!({"id": 99, "title": "Adult Swim", "overview": "", "adult": false}),
    );
    let app = test_app(Some(gateway(provider)));

    let (status, _) = send(app, get("/api/v1/tmdb/99")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn clean_detail_passes_through() {
    let provider = FakeProvider::with_details(
        7,
        json!({"id": 7, "title": "Paddington", "overview": "A bear.", "credits": {"cast": []}}),
    );
    let app = test_app(Some(gateway(provider)));

    let (status, body) = send(app, get("/api/v1/tmdb/7")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["title"], "Paddington");
    assert!(body["credits"].is_object());
}

#[tokio::test]
async fn provider_failure_is_a_server_error() {
    let app = test_app(Some(gateway(FakeProvider::failing())));
    let (status, body) = send(app, get("/api/v1/tmdb/popular")).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body["error"].as_str().unwrap().contains("503"));
}
