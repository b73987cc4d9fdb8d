// Public API - what other modules can use
pub use handlers::{
    add_song, create_playlist, delete_playlist, list_playlists, remove_song, remove_song_by_id,
    update_playlist,
};
pub use types::{AddSongRequest, DeleteResponse, PlaylistResponse, PlaylistUpsertRequest};

// Internal modules
mod handlers;
pub mod models;
pub mod repository;
pub mod service;
mod types;
