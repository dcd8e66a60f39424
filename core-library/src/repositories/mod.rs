//! # Repository Pattern Implementation
//!
//! This module provides repository traits and implementations for data
//! access. Each entity has a corresponding repository exposing exactly the
//! write shapes the sync engine relies on.
//!
//! ## Architecture
//!
//! - Traits define the interface for each repository
//! - SQLite implementations use sqlx for async database access
//! - All operations return `Result<T>` for error handling
//! - Natural-key upserts run their relationship connects in the same
//!   transaction as the row write
//!
//! ## Available Repositories
//!
//! - `ReferenceRepository` - Append-only genres, images, externals
//! - `ArtistRepository` - Performing-artist credits
//! - `AlbumArtistRepository` - Album artists with metadata connects
//! - `AlbumRepository` - Albums with album-artist relationships
//! - `SongRepository` - Songs with album, folder, and credit wiring
//! - `FolderRepository` - Mirrored directory tree
//! - `TaskRepository` - Scan task lifecycle
//! - `ServerRepository` - Servers and their library folders

pub mod album;
pub mod album_artist;
pub mod artist;
pub mod folder;
pub mod reference;
pub mod server;
pub mod song;
pub mod task;

pub use album::{AlbumRepository, SqliteAlbumRepository};
pub use album_artist::{AlbumArtistRepository, SqliteAlbumArtistRepository};
pub use artist::{ArtistRepository, SqliteArtistRepository};
pub use folder::{FolderRepository, SqliteFolderRepository};
pub use reference::{ReferenceRepository, SqliteReferenceRepository};
pub use server::{ServerRepository, SqliteServerRepository};
pub use song::{SongRepository, SqliteSongRepository};
pub use task::{SqliteTaskRepository, TaskRepository};
