//! # Jellyfin Provider
//!
//! `MusicProvider` adapter for Jellyfin servers.
//!
//! ## Overview
//!
//! Jellyfin exposes a media-server API where item listings are scoped to an
//! authenticated user (`/users/{id}/items`) and paged with
//! `StartIndex`/`Limit`. This crate translates those payloads into the
//! engine's common intermediate schema.

pub mod connector;
pub mod error;
pub mod types;

pub use connector::JellyfinProvider;
pub use error::JellyfinError;
