// Library crate for the Mixtape playlist server
// This file exposes the public API for integration tests

pub mod auth;
pub mod playlist;
pub mod shared;

use axum::{
    middleware,
    routing::{delete, get, post, put},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use shared::AppState;

// Re-export commonly used types for easier access in tests
pub use auth::{AuthResponse, AuthUser, UserResponse};
pub use playlist::{DeleteResponse, PlaylistResponse};
pub use shared::AppError;

/// Builds the full application router: open auth routes plus
/// token-protected playlist routes.
pub fn build_router(state: AppState) -> Router {
    let playlist_routes = Router::new()
        .route("/playlists", get(playlist::list_playlists).post(playlist::create_playlist))
        .route(
            "/playlists/:id",
            put(playlist::update_playlist).delete(playlist::delete_playlist),
        )
        .route("/playlists/:id/songs", post(playlist::add_song))
        .route(
            "/playlists/:id/songs/by-id/:song_id",
            delete(playlist::remove_song_by_id),
        )
        .route(
            "/playlists/:id/songs/:song_index",
            delete(playlist::remove_song),
        )
        .layer(middleware::from_fn_with_state(state.clone(), auth::jwt_auth));

    Router::new()
        .route("/", get(|| async { "API is running" }))
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .merge(playlist_routes)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
