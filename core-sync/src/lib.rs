//! # Library Synchronization Engine
//!
//! Mirrors remote music-server libraries into the local store.
//!
//! ## Overview
//!
//! A scan walks one server's library folders in fixed phases: genres,
//! album artists, albums, songs, then a tombstone sweep. Each phase pages
//! through the remote collection in chunks, links reference rows first,
//! and upserts entities by their remote identity. Entities the remote no
//! longer reports are soft-deleted by timestamp cutoff.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use core_sync::{LibraryScanner, ScanConfig};
//!
//! let scanner = LibraryScanner::new(pool, ScanConfig::default());
//! scanner.register_provider(Arc::new(JellyfinProvider::new(http))).await;
//! let task = scanner.start_scan(server_id).await?;
//! ```

pub mod error;
pub mod hierarchy;
pub mod linker;
pub mod pagination;
pub mod reconcile;
pub mod scanner;
pub mod store;
pub mod sweeper;
pub mod task;

pub use error::{Result, SyncError};
pub use pagination::PageWalker;
pub use reconcile::ScanContext;
pub use scanner::{LibraryScanner, ScanConfig};
pub use store::LibraryStore;
pub use sweeper::SweepStats;
pub use task::ScanPhase;
