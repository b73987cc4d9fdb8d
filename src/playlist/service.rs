use std::sync::Arc;
use tracing::{debug, info, instrument};

use super::{
    models::{PlaylistModel, Song},
    repository::{PlaylistRepository, SongRemoval},
    types::{AddSongRequest, PlaylistResponse, PlaylistUpsertRequest},
};
use crate::shared::AppError;

/// Service for playlist business logic
///
/// Every operation takes the caller's authenticated identity and passes it
/// to the repository as the ownership scope; a foreign playlist is reported
/// exactly like a missing one.
pub struct PlaylistService {
    repository: Arc<dyn PlaylistRepository + Send + Sync>,
}

impl PlaylistService {
    pub fn new(repository: Arc<dyn PlaylistRepository + Send + Sync>) -> Self {
        Self { repository }
    }

    /// Lists the caller's playlists, newest first
    #[instrument(skip(self))]
    pub async fn list(&self, owner_id: &str) -> Result<Vec<PlaylistResponse>, AppError> {
        debug!("Listing playlists");

        let playlists = self.repository.list_for_owner(owner_id).await?;

        info!(count = playlists.len(), "Playlists retrieved successfully");

        Ok(playlists.into_iter().map(PlaylistResponse::from).collect())
    }

    /// Creates an empty playlist owned by the caller
    #[instrument(skip(self, request))]
    pub async fn create(
        &self,
        owner_id: &str,
        request: PlaylistUpsertRequest,
    ) -> Result<PlaylistResponse, AppError> {
        if request.name.trim().is_empty() {
            return Err(AppError::Validation("Name is required".to_string()));
        }

        let playlist = PlaylistModel::new(
            owner_id,
            &request.name,
            request.description.as_deref().unwrap_or(""),
        );
        self.repository.create(&playlist).await?;

        info!(playlist_id = %playlist.id, "Playlist created successfully");

        Ok(PlaylistResponse::from(playlist))
    }

    /// Renames/re-describes a playlist the caller owns
    #[instrument(skip(self, request))]
    pub async fn update(
        &self,
        owner_id: &str,
        playlist_id: &str,
        request: PlaylistUpsertRequest,
    ) -> Result<PlaylistResponse, AppError> {
        if request.name.trim().is_empty() {
            return Err(AppError::Validation("Name is required".to_string()));
        }

        let updated = self
            .repository
            .update_details(
                owner_id,
                playlist_id,
                request.name.trim(),
                request.description.as_deref().unwrap_or(""),
            )
            .await?
            .ok_or_else(|| AppError::NotFound("Playlist not found".to_string()))?;

        info!(playlist_id = %playlist_id, "Playlist updated successfully");

        Ok(PlaylistResponse::from(updated))
    }

    /// Permanently deletes a playlist the caller owns
    #[instrument(skip(self))]
    pub async fn delete(&self, owner_id: &str, playlist_id: &str) -> Result<(), AppError> {
        let deleted = self.repository.delete(owner_id, playlist_id).await?;
        if !deleted {
            return Err(AppError::NotFound("Playlist not found".to_string()));
        }

        info!(playlist_id = %playlist_id, "Playlist deleted successfully");
        Ok(())
    }

    /// Appends a song to the end of a playlist the caller owns
    #[instrument(skip(self, request))]
    pub async fn add_song(
        &self,
        owner_id: &str,
        playlist_id: &str,
        request: AddSongRequest,
    ) -> Result<PlaylistResponse, AppError> {
        if request.title.trim().is_empty() || request.youtube_url.trim().is_empty() {
            return Err(AppError::Validation(
                "title and youtubeUrl are required".to_string(),
            ));
        }

        let song = Song::new(&request.title, request.artist, &request.youtube_url);
        let updated = self
            .repository
            .add_song(owner_id, playlist_id, song)
            .await?
            .ok_or_else(|| AppError::NotFound("Playlist not found".to_string()))?;

        info!(
            playlist_id = %playlist_id,
            song_count = updated.song_count(),
            "Song added successfully"
        );

        Ok(PlaylistResponse::from(updated))
    }

    /// Removes a song by zero-based position. The raw path segment is parsed
    /// here so a non-integer index surfaces as a validation error rather
    /// than a routing miss.
    #[instrument(skip(self))]
    pub async fn remove_song(
        &self,
        owner_id: &str,
        playlist_id: &str,
        raw_index: &str,
    ) -> Result<PlaylistResponse, AppError> {
        let index: usize = raw_index
            .parse()
            .map_err(|_| AppError::Validation("Invalid song index".to_string()))?;

        match self
            .repository
            .remove_song_at(owner_id, playlist_id, index)
            .await?
        {
            SongRemoval::Removed(playlist) => {
                info!(
                    playlist_id = %playlist_id,
                    index,
                    song_count = playlist.song_count(),
                    "Song removed successfully"
                );
                Ok(PlaylistResponse::from(playlist))
            }
            SongRemoval::PlaylistNotFound => {
                Err(AppError::NotFound("Playlist not found".to_string()))
            }
            // Out-of-range position is a client input problem, not a missing resource
            SongRemoval::SongNotFound => {
                Err(AppError::Validation("Invalid song index".to_string()))
            }
        }
    }

    /// Removes a song by its stable id, immune to position shifts
    #[instrument(skip(self))]
    pub async fn remove_song_by_id(
        &self,
        owner_id: &str,
        playlist_id: &str,
        song_id: &str,
    ) -> Result<PlaylistResponse, AppError> {
        match self
            .repository
            .remove_song_by_id(owner_id, playlist_id, song_id)
            .await?
        {
            SongRemoval::Removed(playlist) => {
                info!(
                    playlist_id = %playlist_id,
                    song_id = %song_id,
                    "Song removed by id successfully"
                );
                Ok(PlaylistResponse::from(playlist))
            }
            SongRemoval::PlaylistNotFound => {
                Err(AppError::NotFound("Playlist not found".to_string()))
            }
            SongRemoval::SongNotFound => Err(AppError::NotFound("Song not found".to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::playlist::repository::InMemoryPlaylistRepository;
    use rstest::rstest;

    fn service() -> PlaylistService {
        PlaylistService::new(Arc::new(InMemoryPlaylistRepository::new()))
    }

    fn upsert(name: &str, description: Option<&str>) -> PlaylistUpsertRequest {
        PlaylistUpsertRequest {
            name: name.to_string(),
            description: description.map(|s| s.to_string()),
        }
    }

    fn add_song(title: &str, url: &str) -> AddSongRequest {
        AddSongRequest {
            title: title.to_string(),
            artist: None,
            youtube_url: url.to_string(),
        }
    }

    #[tokio::test]
    async fn test_create_requires_name() {
        let service = service();

        let result = service.create("user-a", upsert("", None)).await;
        assert!(matches!(result, Err(AppError::Validation(_))));

        let result = service.create("user-a", upsert("   ", None)).await;
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_create_defaults_description_to_empty() {
        let service = service();

        let created = service.create("user-a", upsert("Road Trip", None)).await.unwrap();
        assert_eq!(created.description, "");
        assert!(created.songs.is_empty());
        assert_eq!(created.owner, "user-a");
    }

    #[tokio::test]
    async fn test_update_missing_playlist_is_not_found() {
        let service = service();

        let result = service
            .update("user-a", "no-such-id", upsert("New", None))
            .await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_foreign_playlist_indistinguishable_from_missing() {
        let service = service();
        let created = service
            .create("user-a", upsert("Road Trip", None))
            .await
            .unwrap();

        let update_foreign = service
            .update("user-b", &created.id, upsert("Hijack", None))
            .await;
        let update_missing = service
            .update("user-b", "no-such-id", upsert("Hijack", None))
            .await;
        assert!(matches!(update_foreign, Err(AppError::NotFound(_))));
        assert!(matches!(update_missing, Err(AppError::NotFound(_))));

        let delete_foreign = service.delete("user-b", &created.id).await;
        assert!(matches!(delete_foreign, Err(AppError::NotFound(_))));

        let add_foreign = service
            .add_song("user-b", &created.id, add_song("A", "https://youtu.be/x"))
            .await;
        assert!(matches!(add_foreign, Err(AppError::NotFound(_))));

        let remove_foreign = service.remove_song("user-b", &created.id, "0").await;
        assert!(matches!(remove_foreign, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_add_song_validates_fields() {
        let service = service();
        let created = service
            .create("user-a", upsert("Road Trip", None))
            .await
            .unwrap();

        let no_title = service
            .add_song("user-a", &created.id, add_song("", "https://youtu.be/x"))
            .await;
        assert!(matches!(no_title, Err(AppError::Validation(_))));

        let no_url = service
            .add_song("user-a", &created.id, add_song("A", ""))
            .await;
        assert!(matches!(no_url, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_round_trip_add_add_remove() {
        let service = service();
        let created = service
            .create("user-a", upsert("Road Trip", None))
            .await
            .unwrap();

        service
            .add_song("user-a", &created.id, add_song("A", "https://youtu.be/x"))
            .await
            .unwrap();
        let after_b = service
            .add_song("user-a", &created.id, add_song("B", "https://youtu.be/y"))
            .await
            .unwrap();
        assert_eq!(after_b.songs.len(), 2);
        assert_eq!(after_b.songs[0].title, "A");
        assert_eq!(after_b.songs[1].title, "B");

        let after_remove = service.remove_song("user-a", &created.id, "0").await.unwrap();
        assert_eq!(after_remove.songs.len(), 1);
        assert_eq!(after_remove.songs[0].title, "B");
    }

    // Non-integer, negative, and out-of-range are all validation errors
    #[rstest]
    #[case("abc")]
    #[case("-1")]
    #[case("1")]
    #[case("0.5")]
    #[tokio::test]
    async fn test_remove_song_rejects_bad_index(#[case] raw_index: &str) {
        let service = service();
        let created = service
            .create("user-a", upsert("Road Trip", None))
            .await
            .unwrap();
        service
            .add_song("user-a", &created.id, add_song("A", "https://youtu.be/x"))
            .await
            .unwrap();

        let result = service.remove_song("user-a", &created.id, raw_index).await;
        assert!(matches!(result, Err(AppError::Validation(_))));

        // And the sequence is untouched
        let listed = service.list("user-a").await.unwrap();
        assert_eq!(listed[0].songs.len(), 1);
    }

    #[tokio::test]
    async fn test_remove_song_by_id() {
        let service = service();
        let created = service
            .create("user-a", upsert("Road Trip", None))
            .await
            .unwrap();

        let with_song = service
            .add_song("user-a", &created.id, add_song("A", "https://youtu.be/x"))
            .await
            .unwrap();
        let song_id = with_song.songs[0].id.clone();

        let after = service
            .remove_song_by_id("user-a", &created.id, &song_id)
            .await
            .unwrap();
        assert!(after.songs.is_empty());

        let missing = service
            .remove_song_by_id("user-a", &created.id, &song_id)
            .await;
        assert!(matches!(missing, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_list_empty_is_ok() {
        let service = service();
        let listed = service.list("user-a").await.unwrap();
        assert!(listed.is_empty());
    }
}
