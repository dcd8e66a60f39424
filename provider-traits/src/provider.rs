//! Provider Contract
//!
//! The `MusicProvider` trait is the whole surface the sync engine sees of a
//! remote backend: authenticate once, then list entity collections in pages.

use async_trait::async_trait;
use std::fmt;
use std::str::FromStr;

use crate::error::{ProviderError, Result};
use crate::records::{AlbumRecord, ArtistRecord, GenreRecord, SongRecord};

/// Remote backend family an adapter speaks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ServerKind {
    Jellyfin,
    Navidrome,
}

impl ServerKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ServerKind::Jellyfin => "jellyfin",
            ServerKind::Navidrome => "navidrome",
        }
    }
}

impl fmt::Display for ServerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ServerKind {
    type Err = ProviderError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "jellyfin" => Ok(ServerKind::Jellyfin),
            "navidrome" => Ok(ServerKind::Navidrome),
            other => Err(ProviderError::Parse(format!(
                "Unknown server kind: {}",
                other
            ))),
        }
    }
}

/// Connection details for one remote server, as the engine hands them to an
/// adapter on every call.
#[derive(Debug, Clone)]
pub struct RemoteServer {
    /// Base URL without trailing slash.
    pub url: String,
    /// Session token obtained from `authenticate`.
    pub token: String,
    /// Remote id of the authenticated user. Some backends scope item
    /// listings by user.
    pub remote_user_id: Option<String>,
}

/// Result of a successful authentication.
#[derive(Debug, Clone)]
pub struct Credential {
    pub token: String,
    pub remote_user_id: Option<String>,
}

/// One page request against a remote collection.
#[derive(Debug, Clone)]
pub struct PageQuery {
    pub offset: u64,
    pub limit: u64,
    /// Remote id of the server folder to scope the listing to, where the
    /// backend supports it.
    pub parent_remote_id: Option<String>,
}

impl PageQuery {
    pub fn new(offset: u64, limit: u64) -> Self {
        Self {
            offset,
            limit,
            parent_remote_id: None,
        }
    }

    pub fn with_parent(mut self, parent_remote_id: impl Into<String>) -> Self {
        self.parent_remote_id = Some(parent_remote_id.into());
        self
    }
}

/// One page of normalized records.
#[derive(Debug, Clone)]
pub struct RecordPage<T> {
    pub items: Vec<T>,
    /// Total collection size where the backend reports one. Pagination does
    /// not rely on it; exhaustion is detected from short pages.
    pub total: Option<u64>,
}

impl<T> RecordPage<T> {
    pub fn new(items: Vec<T>) -> Self {
        Self { items, total: None }
    }

    pub fn with_total(items: Vec<T>, total: Option<u64>) -> Self {
        Self { items, total }
    }
}

/// Provider Adapter contract.
///
/// One implementation per backend family. Adapters translate the engine's
/// uniform paged requests into backend-native API calls and map responses
/// into the common intermediate schema. Adapters are stateless between
/// calls and never retry; transport failures propagate unchanged.
#[async_trait]
pub trait MusicProvider: Send + Sync {
    /// The backend family this adapter speaks for.
    fn kind(&self) -> ServerKind;

    /// Exchange credentials for a session token.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError::AuthenticationFailed`] when the backend
    /// rejects the credentials.
    async fn authenticate(&self, url: &str, username: &str, password: &str) -> Result<Credential>;

    /// List genres.
    async fn list_genres(
        &self,
        server: &RemoteServer,
        page: &PageQuery,
    ) -> Result<RecordPage<GenreRecord>>;

    /// List album artists.
    async fn list_artists(
        &self,
        server: &RemoteServer,
        page: &PageQuery,
    ) -> Result<RecordPage<ArtistRecord>>;

    /// List albums, scoped to a server folder where supported.
    async fn list_albums(
        &self,
        server: &RemoteServer,
        page: &PageQuery,
    ) -> Result<RecordPage<AlbumRecord>>;

    /// List songs, scoped to a server folder where supported.
    async fn list_songs(
        &self,
        server: &RemoteServer,
        page: &PageQuery,
    ) -> Result<RecordPage<SongRecord>>;
}
