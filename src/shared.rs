use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::sync::Arc;
use thiserror::Error;
use tracing::error;

use crate::auth::repository::UserRepository;
use crate::auth::token::TokenConfig;
use crate::playlist::repository::PlaylistRepository;

/// Shared application state containing all dependencies
#[derive(Clone)]
pub struct AppState {
    pub user_repository: Arc<dyn UserRepository + Send + Sync>,
    pub playlist_repository: Arc<dyn PlaylistRepository + Send + Sync>,
    pub token_config: TokenConfig,
}

impl AppState {
    pub fn new(
        user_repository: Arc<dyn UserRepository + Send + Sync>,
        playlist_repository: Arc<dyn PlaylistRepository + Send + Sync>,
        token_config: TokenConfig,
    ) -> Self {
        Self {
            user_repository,
            playlist_repository,
            token_config,
        }
    }
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Invalid token")]
    InvalidToken,

    #[error("Token expired")]
    TokenExpired,

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal server error")]
    Internal,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            // Unknown identifier and wrong password must be indistinguishable
            AppError::InvalidCredentials => {
                (StatusCode::UNAUTHORIZED, "Invalid credentials".to_string())
            }
            AppError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg),
            // Clients see the same 401 whether the token is malformed or expired
            AppError::InvalidToken | AppError::TokenExpired => {
                (StatusCode::UNAUTHORIZED, "Invalid token".to_string())
            }
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            // Storage detail is logged here and never reaches the response body
            AppError::Database(msg) => {
                error!(detail = %msg, "Storage failure");
                (StatusCode::INTERNAL_SERVER_ERROR, "Server error".to_string())
            }
            AppError::Internal => {
                error!("Unexpected internal failure");
                (StatusCode::INTERNAL_SERVER_ERROR, "Server error".to_string())
            }
        };

        let body = Json(json!({
            "error": error_message
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
pub mod test_utils {
    use super::*;
    use crate::auth::models::UserModel;
    use crate::playlist::models::{PlaylistModel, Song};
    use crate::playlist::repository::SongRemoval;
    use async_trait::async_trait;

    /// Dummy user repository that knows no users - for tests that don't care about auth storage
    pub struct DummyUserRepository;

    #[async_trait]
    impl UserRepository for DummyUserRepository {
        async fn create_user(&self, _user: &UserModel) -> Result<(), AppError> {
            Ok(())
        }
        async fn find_by_identifier(
            &self,
            _identifier: &str,
        ) -> Result<Option<UserModel>, AppError> {
            Ok(None)
        }
    }

    /// Dummy playlist repository that owns nothing - for tests that don't care about playlists
    pub struct DummyPlaylistRepository;

    #[async_trait]
    impl PlaylistRepository for DummyPlaylistRepository {
        async fn list_for_owner(&self, _owner_id: &str) -> Result<Vec<PlaylistModel>, AppError> {
            Ok(Vec::new())
        }
        async fn create(&self, _playlist: &PlaylistModel) -> Result<(), AppError> {
            Ok(())
        }
        async fn update_details(
            &self,
            _owner_id: &str,
            _playlist_id: &str,
            _name: &str,
            _description: &str,
        ) -> Result<Option<PlaylistModel>, AppError> {
            Ok(None)
        }
        async fn delete(&self, _owner_id: &str, _playlist_id: &str) -> Result<bool, AppError> {
            Ok(false)
        }
        async fn add_song(
            &self,
            _owner_id: &str,
            _playlist_id: &str,
            _song: Song,
        ) -> Result<Option<PlaylistModel>, AppError> {
            Ok(None)
        }
        async fn remove_song_at(
            &self,
            _owner_id: &str,
            _playlist_id: &str,
            _index: usize,
        ) -> Result<SongRemoval, AppError> {
            Ok(SongRemoval::PlaylistNotFound)
        }
        async fn remove_song_by_id(
            &self,
            _owner_id: &str,
            _playlist_id: &str,
            _song_id: &str,
        ) -> Result<SongRemoval, AppError> {
            Ok(SongRemoval::PlaylistNotFound)
        }
    }

    /// Builder for creating AppState with overrides for testing
    pub struct AppStateBuilder {
        user_repository: Option<Arc<dyn UserRepository + Send + Sync>>,
        playlist_repository: Option<Arc<dyn PlaylistRepository + Send + Sync>>,
        token_config: Option<TokenConfig>,
    }

    impl AppStateBuilder {
        pub fn new() -> Self {
            Self {
                user_repository: None,
                playlist_repository: None,
                token_config: None,
            }
        }

        pub fn with_user_repository(
            mut self,
            repo: Arc<dyn UserRepository + Send + Sync>,
        ) -> Self {
            self.user_repository = Some(repo);
            self
        }

        pub fn with_playlist_repository(
            mut self,
            repo: Arc<dyn PlaylistRepository + Send + Sync>,
        ) -> Self {
            self.playlist_repository = Some(repo);
            self
        }

        pub fn with_token_config(mut self, config: TokenConfig) -> Self {
            self.token_config = Some(config);
            self
        }

        pub fn build(self) -> AppState {
            AppState {
                user_repository: self
                    .user_repository
                    .unwrap_or_else(|| Arc::new(DummyUserRepository)),
                playlist_repository: self
                    .playlist_repository
                    .unwrap_or_else(|| Arc::new(DummyPlaylistRepository)),
                token_config: self.token_config.unwrap_or_default(),
            }
        }
    }

    impl Default for AppStateBuilder {
        fn default() -> Self {
            Self::new()
        }
    }
}
