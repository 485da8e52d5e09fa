use axum::{
    middleware,
    routing::{delete, get, patch, post},
    Router,
};
use tower_http::{compression::CompressionLayer, cors::CorsLayer, trace::TraceLayer};

use crate::auth::{auth_middleware, optional_auth_middleware};
use crate::handlers::{
    auth as auth_handlers, comments as comment_handlers, favorites as favorite_handlers,
    meetups as meetup_handlers, movies as movie_handlers, ratings as rating_handlers,
    tmdb as tmdb_handlers, users as user_handlers,
};
use crate::tmdb::Gateway;
use crate::{Config, DbPool};

#[derive(Clone)]
pub struct AppState {
    pub db: DbPool,
    pub config: Config,
    /// `None` when no provider key is configured.
    pub tmdb: Option<Gateway>,
}

pub fn create_router(state: AppState) -> Router {
    // Public routes: anonymous access, caller attached when a token is sent
    let public_routes = Router::new()
        .route("/auth/register", post(auth_handlers::register))
        .route("/auth/login", post(auth_handlers::login))
        .route("/auth/refresh", post(auth_handlers::refresh))
        .route("/users/:id", get(user_handlers::get_user))
        .route("/movies", get(movie_handlers::list_movies))
        .route("/movies/search", get(movie_handlers::search_movies))
        .route("/movies/:id", get(movie_handlers::get_movie))
        .route("/ratings", get(rating_handlers::list_ratings))
        .route("/ratings/:id", get(rating_handlers::get_rating))
        .route("/meetups", get(meetup_handlers::list_meetups))
        .route("/meetups/:id", get(meetup_handlers::get_meetup))
        .route(
            "/meetups/:id/participants",
            get(meetup_handlers::list_participants),
        )
        .route("/meetups/:id/comments", get(comment_handlers::list_comments))
        .route("/participants", get(meetup_handlers::search_participants))
        .route("/tmdb/search", get(tmdb_handlers::search))
        .route("/tmdb/popular", get(tmdb_handlers::popular))
        .route("/tmdb/:tmdb_id", get(tmdb_handlers::details))
        .route(
            "/tmdb/:tmdb_id/recommendations",
            get(tmdb_handlers::recommendations),
        )
        .route("/tmdb/:tmdb_id/reviews", get(tmdb_handlers::reviews))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            optional_auth_middleware,
        ));

    // Protected routes with auth middleware
    let protected_routes = Router::new()
        .route("/auth/logout", post(auth_handlers::logout))
        .route("/auth/profile", get(auth_handlers::profile))
        .route("/auth/profile", patch(auth_handlers::update_profile))
        .route("/movies", post(movie_handlers::create_movie))
        .route("/movies/:id", patch(movie_handlers::update_movie))
        .route("/movies/:id", delete(movie_handlers::delete_movie))
        .route("/ratings", post(rating_handlers::create_rating))
        .route("/ratings/:id", patch(rating_handlers::update_rating))
        .route("/ratings/:id", delete(rating_handlers::delete_rating))
        .route("/favorites", get(favorite_handlers::list_favorites))
        .route("/favorites", post(favorite_handlers::add_favorite))
        .route("/favorites/toggle", post(favorite_handlers::toggle_favorite))
        .route(
            "/favorites/:movie_id",
            delete(favorite_handlers::remove_favorite),
        )
        .route("/meetups", post(meetup_handlers::create_meetup))
        .route("/meetups/:id", patch(meetup_handlers::update_meetup))
        .route("/meetups/:id", delete(meetup_handlers::delete_meetup))
        .route("/meetups/:id/join", post(meetup_handlers::join_meetup))
        .route("/meetups/:id/leave", post(meetup_handlers::leave_meetup))
        .route(
            "/meetups/:id/comments",
            post(comment_handlers::create_comment),
        )
        .route(
            "/meetups/:id/comments/:comment_id",
            patch(comment_handlers::update_comment),
        )
        .route(
            "/meetups/:id/comments/:comment_id",
            delete(comment_handlers::delete_comment),
        )
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    // Same path, different methods: merge keeps each method's own layer
    let api_routes = Router::new().merge(public_routes).merge(protected_routes);

    Router::new()
        .route("/health", get(health_check))
        .nest("/api/v1", api_routes)
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn health_check() -> &'static str {
    "OK"
}
