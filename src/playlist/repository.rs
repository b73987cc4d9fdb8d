use async_trait::async_trait;
use chrono::Utc;
use sqlx::{types::Json, PgPool, Row};
use std::collections::HashMap;
use std::sync::Mutex;
use tracing::{debug, info, instrument, warn};

use super::models::{PlaylistModel, Song};
use crate::shared::AppError;

/// Result of attempting to remove a song from a playlist
#[derive(Debug, Clone)]
pub enum SongRemoval {
    /// Song removed, returns the updated playlist
    Removed(PlaylistModel),
    /// No playlist matched the id under ownership scoping
    PlaylistNotFound,
    /// Playlist matched but the index/id addressed no song
    SongNotFound,
}

/// Trait for playlist repository operations
///
/// Every operation is scoped to an owner: a playlist belonging to someone
/// else is indistinguishable from one that does not exist. Mutations are
/// atomic read-modify-writes on the playlist document and bump its version.
#[async_trait]
pub trait PlaylistRepository {
    /// Returns all playlists owned by `owner_id`, most recently created first
    async fn list_for_owner(&self, owner_id: &str) -> Result<Vec<PlaylistModel>, AppError>;

    async fn create(&self, playlist: &PlaylistModel) -> Result<(), AppError>;

    /// Updates name and description; `None` when no owned playlist matched
    async fn update_details(
        &self,
        owner_id: &str,
        playlist_id: &str,
        name: &str,
        description: &str,
    ) -> Result<Option<PlaylistModel>, AppError>;

    /// Removes the playlist permanently; `false` when no owned playlist matched
    async fn delete(&self, owner_id: &str, playlist_id: &str) -> Result<bool, AppError>;

    /// Appends a song to the end of the sequence
    async fn add_song(
        &self,
        owner_id: &str,
        playlist_id: &str,
        song: Song,
    ) -> Result<Option<PlaylistModel>, AppError>;

    /// Removes the song at a zero-based position; later songs shift down.
    /// The index is checked against the sequence inside the same atomic step
    /// that removes, so a concurrent mutation cannot invalidate it.
    async fn remove_song_at(
        &self,
        owner_id: &str,
        playlist_id: &str,
        index: usize,
    ) -> Result<SongRemoval, AppError>;

    /// Removes the song carrying the given stable id, wherever it sits
    async fn remove_song_by_id(
        &self,
        owner_id: &str,
        playlist_id: &str,
        song_id: &str,
    ) -> Result<SongRemoval, AppError>;
}

/// In-memory implementation of PlaylistRepository for development and testing
///
/// All mutations happen under a single mutex, which gives the same
/// document-level atomicity the Postgres implementation gets from
/// row locking.
pub struct InMemoryPlaylistRepository {
    playlists: Mutex<HashMap<String, PlaylistModel>>,
}

impl Default for InMemoryPlaylistRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryPlaylistRepository {
    /// Creates a new empty in-memory repository
    pub fn new() -> Self {
        Self {
            playlists: Mutex::new(HashMap::new()),
        }
    }

    /// Returns the current number of playlists in the repository
    pub fn playlist_count(&self) -> usize {
        self.playlists.lock().unwrap().len()
    }
}

/// Looks up a playlist matching both id and owner in one step
fn scoped_get_mut<'a>(
    playlists: &'a mut HashMap<String, PlaylistModel>,
    owner_id: &str,
    playlist_id: &str,
) -> Option<&'a mut PlaylistModel> {
    playlists
        .get_mut(playlist_id)
        .filter(|p| p.owner_id == owner_id)
}

#[async_trait]
impl PlaylistRepository for InMemoryPlaylistRepository {
    #[instrument(skip(self))]
    async fn list_for_owner(&self, owner_id: &str) -> Result<Vec<PlaylistModel>, AppError> {
        debug!(owner_id = %owner_id, "Listing playlists from memory");

        let playlists = self.playlists.lock().unwrap();
        let mut owned: Vec<PlaylistModel> = playlists
            .values()
            .filter(|p| p.owner_id == owner_id)
            .cloned()
            .collect();
        owned.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        debug!(count = owned.len(), "Playlists listed from memory");
        Ok(owned)
    }

    #[instrument(skip(self, playlist))]
    async fn create(&self, playlist: &PlaylistModel) -> Result<(), AppError> {
        debug!(playlist_id = %playlist.id, owner_id = %playlist.owner_id, "Creating playlist in memory");

        let mut playlists = self.playlists.lock().unwrap();
        if playlists.contains_key(&playlist.id) {
            warn!(playlist_id = %playlist.id, "Playlist already exists in memory");
            return Err(AppError::Database("Playlist already exists".to_string()));
        }
        playlists.insert(playlist.id.clone(), playlist.clone());

        debug!(playlist_id = %playlist.id, "Playlist created successfully in memory");
        Ok(())
    }

    #[instrument(skip(self, name, description))]
    async fn update_details(
        &self,
        owner_id: &str,
        playlist_id: &str,
        name: &str,
        description: &str,
    ) -> Result<Option<PlaylistModel>, AppError> {
        debug!(playlist_id = %playlist_id, "Updating playlist details in memory");

        let mut playlists = self.playlists.lock().unwrap();
        let playlist = match scoped_get_mut(&mut playlists, owner_id, playlist_id) {
            Some(playlist) => playlist,
            None => {
                debug!(playlist_id = %playlist_id, "No owned playlist matched");
                return Ok(None);
            }
        };

        playlist.name = name.to_string();
        playlist.description = description.to_string();
        playlist.version += 1;
        playlist.updated_at = Utc::now();

        info!(playlist_id = %playlist_id, "Playlist details updated in memory");
        Ok(Some(playlist.clone()))
    }

    #[instrument(skip(self))]
    async fn delete(&self, owner_id: &str, playlist_id: &str) -> Result<bool, AppError> {
        debug!(playlist_id = %playlist_id, "Deleting playlist from memory");

        let mut playlists = self.playlists.lock().unwrap();
        let owned = playlists
            .get(playlist_id)
            .map(|p| p.owner_id == owner_id)
            .unwrap_or(false);
        if !owned {
            debug!(playlist_id = %playlist_id, "No owned playlist matched");
            return Ok(false);
        }

        playlists.remove(playlist_id);
        info!(playlist_id = %playlist_id, "Playlist deleted from memory");
        Ok(true)
    }

    #[instrument(skip(self, song))]
    async fn add_song(
        &self,
        owner_id: &str,
        playlist_id: &str,
        song: Song,
    ) -> Result<Option<PlaylistModel>, AppError> {
        debug!(playlist_id = %playlist_id, title = %song.title, "Appending song in memory");

        let mut playlists = self.playlists.lock().unwrap();
        let playlist = match scoped_get_mut(&mut playlists, owner_id, playlist_id) {
            Some(playlist) => playlist,
            None => {
                debug!(playlist_id = %playlist_id, "No owned playlist matched");
                return Ok(None);
            }
        };

        playlist.songs.push(song);
        playlist.version += 1;
        playlist.updated_at = Utc::now();

        info!(
            playlist_id = %playlist_id,
            song_count = playlist.song_count(),
            "Song appended in memory"
        );
        Ok(Some(playlist.clone()))
    }

    #[instrument(skip(self))]
    async fn remove_song_at(
        &self,
        owner_id: &str,
        playlist_id: &str,
        index: usize,
    ) -> Result<SongRemoval, AppError> {
        debug!(playlist_id = %playlist_id, index, "Removing song by position in memory");

        let mut playlists = self.playlists.lock().unwrap();
        let playlist = match scoped_get_mut(&mut playlists, owner_id, playlist_id) {
            Some(playlist) => playlist,
            None => {
                debug!(playlist_id = %playlist_id, "No owned playlist matched");
                return Ok(SongRemoval::PlaylistNotFound);
            }
        };

        // Index validity is judged against the sequence as it is right now
        if index >= playlist.songs.len() {
            debug!(
                playlist_id = %playlist_id,
                index,
                song_count = playlist.song_count(),
                "Index out of range"
            );
            return Ok(SongRemoval::SongNotFound);
        }

        playlist.songs.remove(index);
        playlist.version += 1;
        playlist.updated_at = Utc::now();

        info!(
            playlist_id = %playlist_id,
            index,
            song_count = playlist.song_count(),
            "Song removed by position in memory"
        );
        Ok(SongRemoval::Removed(playlist.clone()))
    }

    #[instrument(skip(self))]
    async fn remove_song_by_id(
        &self,
        owner_id: &str,
        playlist_id: &str,
        song_id: &str,
    ) -> Result<SongRemoval, AppError> {
        debug!(playlist_id = %playlist_id, song_id = %song_id, "Removing song by id in memory");

        let mut playlists = self.playlists.lock().unwrap();
        let playlist = match scoped_get_mut(&mut playlists, owner_id, playlist_id) {
            Some(playlist) => playlist,
            None => {
                debug!(playlist_id = %playlist_id, "No owned playlist matched");
                return Ok(SongRemoval::PlaylistNotFound);
            }
        };

        let position = match playlist.songs.iter().position(|s| s.id == song_id) {
            Some(position) => position,
            None => {
                debug!(playlist_id = %playlist_id, song_id = %song_id, "No song with that id");
                return Ok(SongRemoval::SongNotFound);
            }
        };

        playlist.songs.remove(position);
        playlist.version += 1;
        playlist.updated_at = Utc::now();

        info!(
            playlist_id = %playlist_id,
            song_id = %song_id,
            song_count = playlist.song_count(),
            "Song removed by id in memory"
        );
        Ok(SongRemoval::Removed(playlist.clone()))
    }
}

/// PostgreSQL implementation of playlist repository
///
/// The playlist row is the unit of consistency: song mutations run in a
/// transaction that locks the row (`SELECT ... FOR UPDATE`), so concurrent
/// edits serialize instead of overwriting each other.
pub struct PostgresPlaylistRepository {
    pool: PgPool,
}

impl PostgresPlaylistRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn row_to_playlist(row: &sqlx::postgres::PgRow) -> PlaylistModel {
    let Json(songs): Json<Vec<Song>> = row.get("songs");
    PlaylistModel {
        id: row.get("id"),
        name: row.get("name"),
        description: row.get("description"),
        owner_id: row.get("owner_id"),
        songs,
        version: row.get("version"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

const PLAYLIST_COLUMNS: &str =
    "id, name, description, owner_id, songs, version, created_at, updated_at";

#[async_trait]
impl PlaylistRepository for PostgresPlaylistRepository {
    #[instrument(skip(self))]
    async fn list_for_owner(&self, owner_id: &str) -> Result<Vec<PlaylistModel>, AppError> {
        debug!(owner_id = %owner_id, "Listing playlists from database");

        let rows = sqlx::query(&format!(
            "SELECT {PLAYLIST_COLUMNS} FROM playlists WHERE owner_id = $1 ORDER BY created_at DESC"
        ))
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            warn!(error = %e, "Failed to list playlists from database");
            AppError::Database(e.to_string())
        })?;

        let playlists = rows.iter().map(row_to_playlist).collect::<Vec<_>>();
        debug!(count = playlists.len(), "Playlists listed from database");
        Ok(playlists)
    }

    #[instrument(skip(self, playlist))]
    async fn create(&self, playlist: &PlaylistModel) -> Result<(), AppError> {
        debug!(playlist_id = %playlist.id, owner_id = %playlist.owner_id, "Creating playlist in database");

        sqlx::query(
            "INSERT INTO playlists (id, name, description, owner_id, songs, version, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
        )
        .bind(&playlist.id)
        .bind(&playlist.name)
        .bind(&playlist.description)
        .bind(&playlist.owner_id)
        .bind(Json(&playlist.songs))
        .bind(playlist.version)
        .bind(playlist.created_at)
        .bind(playlist.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            warn!(error = %e, "Failed to create playlist in database");
            AppError::Database(e.to_string())
        })?;

        debug!(playlist_id = %playlist.id, "Playlist created successfully in database");
        Ok(())
    }

    #[instrument(skip(self, name, description))]
    async fn update_details(
        &self,
        owner_id: &str,
        playlist_id: &str,
        name: &str,
        description: &str,
    ) -> Result<Option<PlaylistModel>, AppError> {
        debug!(playlist_id = %playlist_id, "Updating playlist details in database");

        // Ownership check and write are a single statement
        let row = sqlx::query(&format!(
            "UPDATE playlists SET name = $3, description = $4, version = version + 1, updated_at = $5 \
             WHERE id = $1 AND owner_id = $2 RETURNING {PLAYLIST_COLUMNS}"
        ))
        .bind(playlist_id)
        .bind(owner_id)
        .bind(name)
        .bind(description)
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            warn!(error = %e, playlist_id = %playlist_id, "Failed to update playlist in database");
            AppError::Database(e.to_string())
        })?;

        Ok(row.as_ref().map(row_to_playlist))
    }

    #[instrument(skip(self))]
    async fn delete(&self, owner_id: &str, playlist_id: &str) -> Result<bool, AppError> {
        debug!(playlist_id = %playlist_id, "Deleting playlist from database");

        let result = sqlx::query("DELETE FROM playlists WHERE id = $1 AND owner_id = $2")
            .bind(playlist_id)
            .bind(owner_id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                warn!(error = %e, playlist_id = %playlist_id, "Failed to delete playlist from database");
                AppError::Database(e.to_string())
            })?;

        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self, song))]
    async fn add_song(
        &self,
        owner_id: &str,
        playlist_id: &str,
        song: Song,
    ) -> Result<Option<PlaylistModel>, AppError> {
        debug!(playlist_id = %playlist_id, title = %song.title, "Appending song in database");

        let mut tx = self.pool.begin().await.map_err(|e| {
            warn!(error = %e, "Failed to begin transaction");
            AppError::Database(e.to_string())
        })?;

        let row = sqlx::query(&format!(
            "SELECT {PLAYLIST_COLUMNS} FROM playlists WHERE id = $1 AND owner_id = $2 FOR UPDATE"
        ))
        .bind(playlist_id)
        .bind(owner_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| {
            warn!(error = %e, playlist_id = %playlist_id, "Failed to lock playlist row");
            AppError::Database(e.to_string())
        })?;

        let mut playlist = match row.as_ref().map(row_to_playlist) {
            Some(playlist) => playlist,
            None => return Ok(None),
        };

        playlist.songs.push(song);
        playlist.version += 1;
        playlist.updated_at = Utc::now();

        write_songs(&mut tx, &playlist).await?;
        tx.commit().await.map_err(|e| {
            warn!(error = %e, "Failed to commit transaction");
            AppError::Database(e.to_string())
        })?;

        Ok(Some(playlist))
    }

    #[instrument(skip(self))]
    async fn remove_song_at(
        &self,
        owner_id: &str,
        playlist_id: &str,
        index: usize,
    ) -> Result<SongRemoval, AppError> {
        debug!(playlist_id = %playlist_id, index, "Removing song by position in database");

        let mut tx = self.pool.begin().await.map_err(|e| {
            warn!(error = %e, "Failed to begin transaction");
            AppError::Database(e.to_string())
        })?;

        let row = sqlx::query(&format!(
            "SELECT {PLAYLIST_COLUMNS} FROM playlists WHERE id = $1 AND owner_id = $2 FOR UPDATE"
        ))
        .bind(playlist_id)
        .bind(owner_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| {
            warn!(error = %e, playlist_id = %playlist_id, "Failed to lock playlist row");
            AppError::Database(e.to_string())
        })?;

        let mut playlist = match row.as_ref().map(row_to_playlist) {
            Some(playlist) => playlist,
            None => return Ok(SongRemoval::PlaylistNotFound),
        };

        if index >= playlist.songs.len() {
            return Ok(SongRemoval::SongNotFound);
        }

        playlist.songs.remove(index);
        playlist.version += 1;
        playlist.updated_at = Utc::now();

        write_songs(&mut tx, &playlist).await?;
        tx.commit().await.map_err(|e| {
            warn!(error = %e, "Failed to commit transaction");
            AppError::Database(e.to_string())
        })?;

        Ok(SongRemoval::Removed(playlist))
    }

    #[instrument(skip(self))]
    async fn remove_song_by_id(
        &self,
        owner_id: &str,
        playlist_id: &str,
        song_id: &str,
    ) -> Result<SongRemoval, AppError> {
        debug!(playlist_id = %playlist_id, song_id = %song_id, "Removing song by id in database");

        let mut tx = self.pool.begin().await.map_err(|e| {
            warn!(error = %e, "Failed to begin transaction");
            AppError::Database(e.to_string())
        })?;

        let row = sqlx::query(&format!(
            "SELECT {PLAYLIST_COLUMNS} FROM playlists WHERE id = $1 AND owner_id = $2 FOR UPDATE"
        ))
        .bind(playlist_id)
        .bind(owner_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| {
            warn!(error = %e, playlist_id = %playlist_id, "Failed to lock playlist row");
            AppError::Database(e.to_string())
        })?;

        let mut playlist = match row.as_ref().map(row_to_playlist) {
            Some(playlist) => playlist,
            None => return Ok(SongRemoval::PlaylistNotFound),
        };

        let position = match playlist.songs.iter().position(|s| s.id == song_id) {
            Some(position) => position,
            None => return Ok(SongRemoval::SongNotFound),
        };

        playlist.songs.remove(position);
        playlist.version += 1;
        playlist.updated_at = Utc::now();

        write_songs(&mut tx, &playlist).await?;
        tx.commit().await.map_err(|e| {
            warn!(error = %e, "Failed to commit transaction");
            AppError::Database(e.to_string())
        })?;

        Ok(SongRemoval::Removed(playlist))
    }
}

/// Writes a mutated song sequence (plus version and timestamp) back inside
/// an open transaction
async fn write_songs(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    playlist: &PlaylistModel,
) -> Result<(), AppError> {
    sqlx::query("UPDATE playlists SET songs = $2, version = $3, updated_at = $4 WHERE id = $1")
        .bind(&playlist.id)
        .bind(Json(&playlist.songs))
        .bind(playlist.version)
        .bind(playlist.updated_at)
        .execute(&mut **tx)
        .await
        .map_err(|e| {
            warn!(error = %e, playlist_id = %playlist.id, "Failed to write playlist songs");
            AppError::Database(e.to_string())
        })?;
    Ok(())
}
