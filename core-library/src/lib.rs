//! # Library Storage Module
//!
//! Owns the canonical synchronized music library database and provides
//! repository patterns for data access.
//!
//! ## Overview
//!
//! This module manages:
//! - SQLite database schema and migrations
//! - Repository patterns for servers, genres, artists, albums, songs,
//!   folders, and scan tasks
//! - The write shapes the sync engine relies on: append-only reference
//!   inserts, natural-key upserts with relationship connects, and
//!   timestamp-cutoff tombstone sweeps

pub mod db;
pub mod error;
pub mod models;
pub mod repositories;

pub use error::{LibraryError, Result};
