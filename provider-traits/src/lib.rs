//! # Provider Traits
//!
//! The seam between the sync engine and remote music-server backends.
//!
//! ## Overview
//!
//! Each remote backend family (Jellyfin, Navidrome, ...) speaks an
//! incompatible API. This crate defines what every adapter must expose so
//! the engine never depends on a concrete provider:
//!
//! - **HTTP abstraction** (`http`): a minimal async `HttpClient` trait plus
//!   a reqwest-backed production implementation
//! - **Common intermediate schema** (`records`): the normalized record
//!   shapes every adapter maps provider-native payloads into
//! - **Provider contract** (`provider`): the `MusicProvider` trait with
//!   paginated listing operations and authentication

pub mod error;
pub mod http;
pub mod provider;
pub mod records;

pub use error::{ProviderError, Result};
pub use http::{HttpClient, HttpMethod, HttpRequest, HttpResponse, ReqwestHttpClient};
pub use provider::{Credential, MusicProvider, PageQuery, RecordPage, RemoteServer, ServerKind};
pub use records::{
    AlbumRecord, ArtistCredit, ArtistRecord, ExternalRef, ExternalSource, GenreRecord, ImageKind,
    ImageRef, ReferenceSource, SongRecord,
};
