//! Repository bundle the scanner works against

use core_library::repositories::{
    AlbumArtistRepository, AlbumRepository, ArtistRepository, FolderRepository,
    ReferenceRepository, ServerRepository, SongRepository, SqliteAlbumArtistRepository,
    SqliteAlbumRepository, SqliteArtistRepository, SqliteFolderRepository,
    SqliteReferenceRepository, SqliteServerRepository, SqliteSongRepository,
    SqliteTaskRepository, TaskRepository,
};
use sqlx::SqlitePool;
use std::sync::Arc;

/// All repositories a scan touches, behind trait objects so tests can stub
/// individual pieces
#[derive(Clone)]
pub struct LibraryStore {
    pub references: Arc<dyn ReferenceRepository>,
    pub artists: Arc<dyn ArtistRepository>,
    pub album_artists: Arc<dyn AlbumArtistRepository>,
    pub albums: Arc<dyn AlbumRepository>,
    pub songs: Arc<dyn SongRepository>,
    pub folders: Arc<dyn FolderRepository>,
    pub tasks: Arc<dyn TaskRepository>,
    pub servers: Arc<dyn ServerRepository>,
}

impl LibraryStore {
    /// Wire every repository to the same pool
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            references: Arc::new(SqliteReferenceRepository::new(pool.clone())),
            artists: Arc::new(SqliteArtistRepository::new(pool.clone())),
            album_artists: Arc::new(SqliteAlbumArtistRepository::new(pool.clone())),
            albums: Arc::new(SqliteAlbumRepository::new(pool.clone())),
            songs: Arc::new(SqliteSongRepository::new(pool.clone())),
            folders: Arc::new(SqliteFolderRepository::new(pool.clone())),
            tasks: Arc::new(SqliteTaskRepository::new(pool.clone())),
            servers: Arc::new(SqliteServerRepository::new(pool)),
        }
    }
}
