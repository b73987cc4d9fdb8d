use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use mixtape::auth::repository::{InMemoryUserRepository, PostgresUserRepository, UserRepository};
use mixtape::auth::token::TokenConfig;
use mixtape::playlist::repository::{
    InMemoryPlaylistRepository, PlaylistRepository, PostgresPlaylistRepository,
};
use mixtape::shared::AppState;

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "mixtape=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Mixtape playlist server");

    // Pick repositories once at startup: Postgres when DATABASE_URL is set,
    // in-memory otherwise
    let (user_repository, playlist_repository): (
        Arc<dyn UserRepository + Send + Sync>,
        Arc<dyn PlaylistRepository + Send + Sync>,
    ) = match std::env::var("DATABASE_URL") {
        Ok(database_url) => {
            let pool = sqlx::PgPool::connect(&database_url)
                .await
                .expect("Failed to connect to database");
            info!("Connected to PostgreSQL");
            (
                Arc::new(PostgresUserRepository::new(pool.clone())),
                Arc::new(PostgresPlaylistRepository::new(pool)),
            )
        }
        Err(_) => {
            info!("DATABASE_URL not set, using in-memory repositories");
            (
                Arc::new(InMemoryUserRepository::new()),
                Arc::new(InMemoryPlaylistRepository::new()),
            )
        }
    };

    let app_state = AppState::new(user_repository, playlist_repository, TokenConfig::new());
    let app = mixtape::build_router(app_state);

    let port = std::env::var("PORT").unwrap_or_else(|_| "5000".to_string());
    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{port}"))
        .await
        .expect("Failed to bind listener");
    info!("Server running on http://localhost:{port}");
    axum::serve(listener, app).await.expect("Server error");
}
