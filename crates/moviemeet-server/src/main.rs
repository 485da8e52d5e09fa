use std::net::SocketAddr;
use std::sync::Arc;

use moviemeet_server::{
    config::Config,
    db,
    routes::{self, AppState},
    tmdb::{Gateway, TmdbClient},
};
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "moviemeet_server=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;

    let pool = db::create_pool(&config.database_url, config.database_max_connections).await?;
    db::run_migrations(&pool).await?;
    tracing::info!("Database migrations applied");

    let tmdb = match config.tmdb.api_key.clone() {
        Some(api_key) => {
            let client = TmdbClient::new(api_key, &config.tmdb)?;
            Some(Gateway::new(Arc::new(client), &config.tmdb.image_base_url))
        }
        None => {
            tracing::warn!("TMDB_API_KEY is not set; movie provider endpoints are disabled");
            None
        }
    };

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let app = routes::create_router(AppState {
        db: pool,
        config,
        tmdb,
    });

    tracing::info!("Server listening on {}", addr);

    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
