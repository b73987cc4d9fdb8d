use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A song embedded in a playlist
///
/// Songs have no existence outside their parent playlist. Each one gets a
/// generated id at insertion so clients can address it even after earlier
/// entries are removed and positions shift.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Song {
    pub id: String, // UUID v4 as string, assigned at insertion
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub artist: Option<String>,
    pub youtube_url: String,
}

impl Song {
    pub fn new(title: &str, artist: Option<String>, youtube_url: &str) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            title: title.to_string(),
            artist,
            youtube_url: youtube_url.to_string(),
        }
    }
}

/// Database model for a playlist document
///
/// The playlist is the unit of consistency: the song sequence lives inside
/// it and every mutation rewrites the document under the repository's
/// atomicity guarantee, bumping `version`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaylistModel {
    pub id: String, // UUID v4 as string
    pub name: String,
    pub description: String,
    pub owner_id: String, // Fixed at creation, never reassigned
    pub songs: Vec<Song>,
    pub version: i64, // Bumped on every mutation
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PlaylistModel {
    /// Creates a new empty playlist owned by the given user
    pub fn new(owner_id: &str, name: &str, description: &str) -> Self {
        let now = Utc::now();

        Self {
            id: Uuid::new_v4().to_string(),
            name: name.trim().to_string(),
            description: description.to_string(),
            owner_id: owner_id.to_string(),
            songs: Vec::new(),
            version: 1,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn song_count(&self) -> usize {
        self.songs.len()
    }
}
