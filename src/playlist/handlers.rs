use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use std::sync::Arc;
use tracing::{info, instrument};

use super::{
    service::PlaylistService,
    types::{AddSongRequest, DeleteResponse, PlaylistResponse, PlaylistUpsertRequest},
};
use crate::auth::AuthUser;
use crate::shared::{AppError, AppState};

/// HTTP handler for listing the caller's playlists
///
/// GET /playlists
#[instrument(name = "list_playlists", skip(state))]
pub async fn list_playlists(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Vec<PlaylistResponse>>, AppError> {
    info!(user_id = %user.id, "Listing playlists");

    let service = PlaylistService::new(Arc::clone(&state.playlist_repository));
    let playlists = service.list(&user.id).await?;

    Ok(Json(playlists))
}

/// HTTP handler for creating a playlist
///
/// POST /playlists
#[instrument(name = "create_playlist", skip(state, request))]
pub async fn create_playlist(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(request): Json<PlaylistUpsertRequest>,
) -> Result<(StatusCode, Json<PlaylistResponse>), AppError> {
    info!(user_id = %user.id, "Creating playlist");

    let service = PlaylistService::new(Arc::clone(&state.playlist_repository));
    let playlist = service.create(&user.id, request).await?;

    Ok((StatusCode::CREATED, Json(playlist)))
}

/// HTTP handler for renaming/re-describing a playlist
///
/// PUT /playlists/:id
#[instrument(name = "update_playlist", skip(state, request))]
pub async fn update_playlist(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(playlist_id): Path<String>,
    Json(request): Json<PlaylistUpsertRequest>,
) -> Result<Json<PlaylistResponse>, AppError> {
    info!(user_id = %user.id, playlist_id = %playlist_id, "Updating playlist");

    let service = PlaylistService::new(Arc::clone(&state.playlist_repository));
    let playlist = service.update(&user.id, &playlist_id, request).await?;

    Ok(Json(playlist))
}

/// HTTP handler for deleting a playlist
///
/// DELETE /playlists/:id
#[instrument(name = "delete_playlist", skip(state))]
pub async fn delete_playlist(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(playlist_id): Path<String>,
) -> Result<Json<DeleteResponse>, AppError> {
    info!(user_id = %user.id, playlist_id = %playlist_id, "Deleting playlist");

    let service = PlaylistService::new(Arc::clone(&state.playlist_repository));
    service.delete(&user.id, &playlist_id).await?;

    Ok(Json(DeleteResponse {
        message: "Playlist deleted".to_string(),
    }))
}

/// HTTP handler for appending a song
///
/// POST /playlists/:id/songs
#[instrument(name = "add_song", skip(state, request))]
pub async fn add_song(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(playlist_id): Path<String>,
    Json(request): Json<AddSongRequest>,
) -> Result<(StatusCode, Json<PlaylistResponse>), AppError> {
    info!(user_id = %user.id, playlist_id = %playlist_id, "Adding song");

    let service = PlaylistService::new(Arc::clone(&state.playlist_repository));
    let playlist = service.add_song(&user.id, &playlist_id, request).await?;

    Ok((StatusCode::CREATED, Json(playlist)))
}

/// HTTP handler for removing a song by position
///
/// DELETE /playlists/:id/songs/:songIndex
/// The index segment is taken as a raw string so a non-integer value maps
/// to 400 rather than a router-level rejection.
#[instrument(name = "remove_song", skip(state))]
pub async fn remove_song(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path((playlist_id, song_index)): Path<(String, String)>,
) -> Result<Json<PlaylistResponse>, AppError> {
    info!(user_id = %user.id, playlist_id = %playlist_id, song_index = %song_index, "Removing song");

    let service = PlaylistService::new(Arc::clone(&state.playlist_repository));
    let playlist = service
        .remove_song(&user.id, &playlist_id, &song_index)
        .await?;

    Ok(Json(playlist))
}

/// HTTP handler for removing a song by its stable id
///
/// DELETE /playlists/:id/songs/by-id/:songId
#[instrument(name = "remove_song_by_id", skip(state))]
pub async fn remove_song_by_id(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path((playlist_id, song_id)): Path<(String, String)>,
) -> Result<Json<PlaylistResponse>, AppError> {
    info!(user_id = %user.id, playlist_id = %playlist_id, song_id = %song_id, "Removing song by id");

    let service = PlaylistService::new(Arc::clone(&state.playlist_repository));
    let playlist = service
        .remove_song_by_id(&user.id, &playlist_id, &song_id)
        .await?;

    Ok(Json(playlist))
}
