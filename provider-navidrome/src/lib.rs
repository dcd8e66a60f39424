//! # Navidrome Provider
//!
//! `MusicProvider` adapter for Navidrome servers.
//!
//! ## Overview
//!
//! Navidrome's native REST API pages with `_start`/`_end` query parameters,
//! returns bare JSON arrays, and reports collection sizes in the
//! `x-total-count` response header. This crate translates those payloads
//! into the engine's common intermediate schema.

pub mod connector;
pub mod error;
pub mod types;

pub use connector::NavidromeProvider;
pub use error::NavidromeError;
