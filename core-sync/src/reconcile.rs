//! Chunk reconciliation
//!
//! Each listing phase hands the reconciler one chunk of normalized records.
//! The reconciler guarantees ordering inside the chunk: reference rows
//! first, then entity upserts, then relationship connects, so every connect
//! resolves against rows that already exist. Records pointing at entities
//! the mirror does not know are dropped rather than failing the scan.

use crate::error::Result;
use crate::hierarchy::{build_folders, song_folder_path};
use crate::linker::ReferenceBatch;
use crate::store::LibraryStore;
use core_library::models::now_ms;
use provider_traits::records::{AlbumRecord, ArtistCredit, ArtistRecord, SongRecord};
use std::collections::{HashMap, HashSet};
use tracing::{debug, instrument, warn};

/// Identity of the scan a chunk belongs to
#[derive(Debug, Clone, Copy)]
pub struct ScanContext {
    pub server_id: i64,
    pub server_folder_id: i64,
    /// Creation time of the scan task. Rows with `updated_at` at or below
    /// this value are swept at the end of the folder pass.
    pub cutoff: i64,
}

impl ScanContext {
    pub fn new(server_id: i64, server_folder_id: i64, cutoff: i64) -> Self {
        Self {
            server_id,
            server_folder_id,
            cutoff,
        }
    }

    /// Timestamp written on every row this scan touches.
    ///
    /// Clamped strictly above the cutoff so a scan finishing within the
    /// same millisecond it started cannot sweep its own rows.
    pub fn touch_stamp(&self) -> i64 {
        now_ms().max(self.cutoff + 1)
    }
}

/// Upsert one chunk of album artists with their references
#[instrument(skip(store, records), fields(count = records.len()))]
pub async fn reconcile_artist_chunk(
    store: &LibraryStore,
    ctx: &ScanContext,
    records: &[ArtistRecord],
) -> Result<()> {
    ReferenceBatch::from_records(records)
        .link(store.references.as_ref())
        .await?;

    let stamp = ctx.touch_stamp();
    for record in records {
        store
            .album_artists
            .upsert(ctx.server_id, record, ctx.server_folder_id, stamp)
            .await?;
    }

    Ok(())
}

/// Upsert one chunk of albums, resolving their album artist credits.
///
/// A credit whose remote id is unknown falls back to a name lookup; when
/// that misses too the credit is dropped and the album keeps its remaining
/// credits.
#[instrument(skip(store, records), fields(count = records.len()))]
pub async fn reconcile_album_chunk(
    store: &LibraryStore,
    ctx: &ScanContext,
    records: &[AlbumRecord],
) -> Result<()> {
    ReferenceBatch::from_records(records)
        .link(store.references.as_ref())
        .await?;

    let known = store.album_artists.known_remote_ids(ctx.server_id).await?;
    let stamp = ctx.touch_stamp();

    for record in records {
        let mut resolved = Vec::with_capacity(record.album_artists.len());
        for credit in &record.album_artists {
            if known.contains(&credit.remote_id) {
                resolved.push(credit.remote_id.clone());
                continue;
            }
            if credit.name.is_empty() {
                debug!(
                    album = %record.remote_id,
                    artist = %credit.remote_id,
                    "Dropping unresolvable album artist credit"
                );
                continue;
            }
            match store
                .album_artists
                .find_by_name(ctx.server_id, &credit.name)
                .await?
            {
                Some(found) => resolved.push(found.remote_id),
                None => {
                    debug!(
                        album = %record.remote_id,
                        artist = %credit.name,
                        "Dropping unresolvable album artist credit"
                    );
                }
            }
        }

        store
            .albums
            .upsert(
                ctx.server_id,
                record,
                &resolved,
                ctx.server_folder_id,
                stamp,
            )
            .await?;
    }

    Ok(())
}

/// Upsert one chunk of songs with their folders, performing artists and
/// album credit links.
///
/// Songs whose album is not mirrored yet are skipped with a warning; the
/// next scan picks them up once the album exists.
#[instrument(skip(store, records), fields(count = records.len()))]
pub async fn reconcile_song_chunk(
    store: &LibraryStore,
    ctx: &ScanContext,
    records: &[SongRecord],
) -> Result<()> {
    ReferenceBatch::from_records(records)
        .link(store.references.as_ref())
        .await?;

    let stamp = ctx.touch_stamp();
    let folders = build_folders(
        store.folders.as_ref(),
        ctx.server_id,
        ctx.server_folder_id,
        stamp,
        records,
    )
    .await?;

    // Performing artists only exist as song credits, so they are created
    // here rather than in a listing phase of their own
    let credits = harvest_credits(records);
    if !credits.is_empty() {
        store
            .artists
            .insert_if_absent(ctx.server_id, &credits, stamp)
            .await?;
        let ids: Vec<String> = credits.iter().map(|c| c.remote_id.clone()).collect();
        store
            .artists
            .touch_and_connect(ctx.server_id, &ids, ctx.server_folder_id, stamp)
            .await?;
    }

    let mut by_album: HashMap<&str, Vec<&SongRecord>> = HashMap::new();
    for record in records {
        match record.album_remote_id.as_deref() {
            Some(album_remote_id) => by_album.entry(album_remote_id).or_default().push(record),
            None => {
                warn!(song = %record.remote_id, "Song carries no album reference, skipping");
            }
        }
    }

    for (album_remote_id, group) in by_album {
        let Some(album) = store
            .albums
            .find_by_remote_id(ctx.server_id, album_remote_id)
            .await?
        else {
            warn!(
                album = %album_remote_id,
                songs = group.len(),
                "Album not mirrored yet, skipping its songs"
            );
            continue;
        };

        let mut credit_ids = Vec::new();
        for record in &group {
            let folder_id = record
                .path
                .as_deref()
                .and_then(song_folder_path)
                .and_then(|p| folders.get(p.as_str()))
                .map(|f| f.id);

            store
                .songs
                .upsert(
                    ctx.server_id,
                    record,
                    album.id,
                    folder_id,
                    ctx.server_folder_id,
                    stamp,
                )
                .await?;

            for credit in &record.artists {
                if !credit_ids.contains(&credit.remote_id) {
                    credit_ids.push(credit.remote_id.clone());
                }
            }
        }

        // Songs' performing artists become the album's credit list
        store
            .albums
            .connect_artist_credits(album.id, ctx.server_id, &credit_ids)
            .await?;
    }

    Ok(())
}

/// Every distinct performing artist credited on the chunk's songs
fn harvest_credits(records: &[SongRecord]) -> Vec<ArtistCredit> {
    let mut seen = HashSet::new();
    let mut credits = Vec::new();
    for record in records {
        for credit in &record.artists {
            if seen.insert(credit.remote_id.clone()) {
                credits.push(credit.clone());
            }
        }
    }
    credits
}
