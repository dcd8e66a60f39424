//! Domain models for the synchronized library
//!
//! Row structs map the SQLite schema one to one. Local identity is an `i64`
//! autoincrement id; remote identity is the `(remote_id, server_id)` pair.
//! Timestamps are unix epoch milliseconds.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Current wall-clock time as unix epoch milliseconds.
pub fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// A configured remote music server.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Server {
    pub id: i64,
    pub name: String,
    pub url: String,
    /// Backend family, `jellyfin` or `navidrome`.
    pub server_type: String,
    pub username: String,
    pub token: String,
    pub remote_user_id: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Payload for registering a new server.
#[derive(Debug, Clone)]
pub struct NewServer {
    pub name: String,
    pub url: String,
    pub server_type: String,
    pub username: String,
    pub token: String,
    pub remote_user_id: Option<String>,
}

/// A remote library root (music folder) on a server. Scans walk one server
/// folder at a time.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct ServerFolder {
    pub id: i64,
    pub server_id: i64,
    pub remote_id: String,
    pub name: String,
    pub enabled: bool,
    pub last_scanned_at: Option<i64>,
    pub created_at: i64,
    pub updated_at: i64,
}

/// A genre, deduplicated by name across all servers.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Genre {
    pub id: i64,
    pub name: String,
}

/// A remote image reference, deduplicated by `(remote_url, image_type)`.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Image {
    pub id: i64,
    pub remote_url: String,
    pub image_type: String,
}

/// An external catalog identifier, deduplicated by `(source, value)`.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct External {
    pub id: i64,
    pub source: String,
    pub value: String,
}

/// A performing-artist credit harvested from song listings.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Artist {
    pub id: i64,
    pub remote_id: String,
    pub server_id: i64,
    pub name: String,
    pub deleted: bool,
    pub created_at: i64,
    pub updated_at: i64,
}

/// An album artist with full metadata.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct AlbumArtist {
    pub id: i64,
    pub remote_id: String,
    pub server_id: i64,
    pub name: String,
    pub biography: Option<String>,
    pub deleted: bool,
    pub created_at: i64,
    pub updated_at: i64,
}

/// A directory in the mirrored folder tree, identified by its full path.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Folder {
    pub id: i64,
    pub server_id: i64,
    pub path: String,
    pub name: String,
    pub parent_id: Option<i64>,
    pub deleted: bool,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Album {
    pub id: i64,
    pub remote_id: String,
    pub server_id: i64,
    pub name: String,
    pub release_year: Option<i32>,
    pub release_date: Option<String>,
    pub remote_created_at: Option<String>,
    pub deleted: bool,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Song {
    pub id: i64,
    pub remote_id: String,
    pub server_id: i64,
    pub album_id: i64,
    pub folder_id: Option<i64>,
    pub name: String,
    pub track: Option<i32>,
    pub disc: Option<i32>,
    /// Duration in whole seconds.
    pub duration: Option<i64>,
    /// Bitrate in kbit/s.
    pub bitrate: Option<i64>,
    pub container: Option<String>,
    pub path: Option<String>,
    pub size: Option<i64>,
    pub remote_created_at: Option<String>,
    pub deleted: bool,
    pub created_at: i64,
    pub updated_at: i64,
}

/// A scan task. `created_at` doubles as the sweep cutoff for the scan it
/// tracks.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Task {
    pub id: i64,
    pub server_id: i64,
    pub name: String,
    pub message: Option<String>,
    pub is_completed: bool,
    pub is_error: bool,
    pub created_at: i64,
    pub updated_at: i64,
}
