use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::models::{PlaylistModel, Song};

/// Request payload for creating or updating a playlist
#[derive(Debug, Deserialize)]
pub struct PlaylistUpsertRequest {
    pub name: String,
    pub description: Option<String>,
}

/// Request payload for appending a song
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddSongRequest {
    pub title: String,
    pub artist: Option<String>,
    pub youtube_url: String,
}

/// Playlist as returned to clients
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaylistResponse {
    pub id: String,
    pub name: String,
    pub description: String,
    pub owner: String,
    pub songs: Vec<Song>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<PlaylistModel> for PlaylistResponse {
    fn from(model: PlaylistModel) -> Self {
        Self {
            id: model.id,
            name: model.name,
            description: model.description,
            owner: model.owner_id,
            songs: model.songs,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

/// Response body for playlist deletion
#[derive(Debug, Serialize, Deserialize)]
pub struct DeleteResponse {
    pub message: String,
}
