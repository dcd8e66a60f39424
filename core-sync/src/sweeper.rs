//! Tombstone sweeper
//!
//! After every listing phase of a folder pass finishes, rows attached to
//! that library folder whose `updated_at` never moved past the scan cutoff
//! are soft-deleted. The sweep flips the `deleted` flag only; timestamps
//! stay untouched so a later resurrection can be dated precisely.

use crate::error::Result;
use crate::reconcile::ScanContext;
use crate::store::LibraryStore;
use tracing::{info, instrument};

/// Rows tombstoned per table during one folder sweep
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SweepStats {
    pub artists: u64,
    pub album_artists: u64,
    pub albums: u64,
    pub songs: u64,
    pub folders: u64,
}

impl SweepStats {
    pub fn total(&self) -> u64 {
        self.artists + self.album_artists + self.albums + self.songs + self.folders
    }
}

/// Tombstone every row of the folder the scan did not touch
#[instrument(skip(store))]
pub async fn sweep(store: &LibraryStore, ctx: &ScanContext) -> Result<SweepStats> {
    let stats = SweepStats {
        songs: store
            .songs
            .tombstone_stale(ctx.server_id, ctx.server_folder_id, ctx.cutoff)
            .await?,
        albums: store
            .albums
            .tombstone_stale(ctx.server_id, ctx.server_folder_id, ctx.cutoff)
            .await?,
        album_artists: store
            .album_artists
            .tombstone_stale(ctx.server_id, ctx.server_folder_id, ctx.cutoff)
            .await?,
        artists: store
            .artists
            .tombstone_stale(ctx.server_id, ctx.server_folder_id, ctx.cutoff)
            .await?,
        folders: store
            .folders
            .tombstone_stale(ctx.server_id, ctx.server_folder_id, ctx.cutoff)
            .await?,
    };

    info!(
        songs = stats.songs,
        albums = stats.albums,
        album_artists = stats.album_artists,
        artists = stats.artists,
        folders = stats.folders,
        "Swept stale rows"
    );

    Ok(stats)
}
