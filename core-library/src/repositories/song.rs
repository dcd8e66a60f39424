//! Song repository trait and implementation

use crate::error::Result;
use crate::models::Song;
use async_trait::async_trait;
use provider_traits::records::SongRecord;
use sqlx::SqlitePool;

/// Repository interface for songs
#[async_trait]
pub trait SongRepository: Send + Sync {
    /// Insert or refresh a song by natural key, wiring its album, folder,
    /// performing credits, genres, images, externals, and the scanned
    /// server folder.
    ///
    /// The caller resolves `album_id` and `folder_id` beforehand; songs are
    /// only reconciled once their album exists locally.
    ///
    /// # Returns
    /// The local id of the upserted row
    async fn upsert(
        &self,
        server_id: i64,
        record: &SongRecord,
        album_id: i64,
        folder_id: Option<i64>,
        server_folder_id: i64,
        stamp: i64,
    ) -> Result<i64>;

    /// Find a song by its remote id
    async fn find_by_remote_id(&self, server_id: i64, remote_id: &str) -> Result<Option<Song>>;

    /// Songs on an album, ordered by disc then track
    async fn find_by_album(&self, album_id: i64) -> Result<Vec<Song>>;

    /// Soft-delete rows attached to the server folder that were not touched
    /// after the cutoff. Returns the number of rows tombstoned.
    async fn tombstone_stale(
        &self,
        server_id: i64,
        server_folder_id: i64,
        cutoff: i64,
    ) -> Result<u64>;
}

/// SQLite implementation of SongRepository
pub struct SqliteSongRepository {
    pool: SqlitePool,
}

impl SqliteSongRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SongRepository for SqliteSongRepository {
    async fn upsert(
        &self,
        server_id: i64,
        record: &SongRecord,
        album_id: i64,
        folder_id: Option<i64>,
        server_folder_id: i64,
        stamp: i64,
    ) -> Result<i64> {
        let mut tx = self.pool.begin().await?;

        let (id,): (i64,) = sqlx::query_as(
            r#"
            INSERT INTO songs (
                remote_id, server_id, album_id, folder_id, name,
                track, disc, duration, bitrate, container, path, size,
                remote_created_at, created_at, updated_at
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(remote_id, server_id) DO UPDATE SET
                album_id = excluded.album_id,
                folder_id = excluded.folder_id,
                name = excluded.name,
                track = excluded.track,
                disc = excluded.disc,
                duration = excluded.duration,
                bitrate = excluded.bitrate,
                container = excluded.container,
                path = excluded.path,
                size = excluded.size,
                remote_created_at = excluded.remote_created_at,
                deleted = 0,
                updated_at = excluded.updated_at
            RETURNING id
            "#,
        )
        .bind(&record.remote_id)
        .bind(server_id)
        .bind(album_id)
        .bind(folder_id)
        .bind(&record.name)
        .bind(record.track)
        .bind(record.disc)
        .bind(record.duration_secs)
        .bind(record.bitrate_kbps)
        .bind(&record.container)
        .bind(&record.path)
        .bind(record.size_bytes)
        .bind(&record.remote_created_at)
        .bind(stamp)
        .bind(stamp)
        .fetch_one(&mut *tx)
        .await?;

        for genre in &record.genres {
            sqlx::query(
                r#"
                INSERT OR IGNORE INTO song_genres (song_id, genre_id)
                SELECT ?, id FROM genres WHERE name = ?
                "#,
            )
            .bind(id)
            .bind(genre)
            .execute(&mut *tx)
            .await?;
        }

        for image in &record.images {
            sqlx::query(
                r#"
                INSERT OR IGNORE INTO song_images (song_id, image_id)
                SELECT ?, id FROM images WHERE remote_url = ? AND image_type = ?
                "#,
            )
            .bind(id)
            .bind(&image.remote_url)
            .bind(image.kind.as_str())
            .execute(&mut *tx)
            .await?;
        }

        for external in &record.externals {
            sqlx::query(
                r#"
                INSERT OR IGNORE INTO song_externals (song_id, external_id)
                SELECT ?, id FROM externals WHERE source = ? AND value = ?
                "#,
            )
            .bind(id)
            .bind(external.source.as_str())
            .bind(&external.value)
            .execute(&mut *tx)
            .await?;
        }

        for credit in &record.artists {
            sqlx::query(
                r#"
                INSERT OR IGNORE INTO song_artists (song_id, artist_id)
                SELECT ?, id FROM artists WHERE remote_id = ? AND server_id = ?
                "#,
            )
            .bind(id)
            .bind(&credit.remote_id)
            .bind(server_id)
            .execute(&mut *tx)
            .await?;
        }

        sqlx::query(
            r#"
            INSERT OR IGNORE INTO song_server_folders (song_id, server_folder_id)
            VALUES (?, ?)
            "#,
        )
        .bind(id)
        .bind(server_folder_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(id)
    }

    async fn find_by_remote_id(&self, server_id: i64, remote_id: &str) -> Result<Option<Song>> {
        let song =
            sqlx::query_as::<_, Song>("SELECT * FROM songs WHERE remote_id = ? AND server_id = ?")
                .bind(remote_id)
                .bind(server_id)
                .fetch_optional(&self.pool)
                .await?;

        Ok(song)
    }

    async fn find_by_album(&self, album_id: i64) -> Result<Vec<Song>> {
        let songs = sqlx::query_as::<_, Song>(
            "SELECT * FROM songs WHERE album_id = ? ORDER BY disc, track, name",
        )
        .bind(album_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(songs)
    }

    async fn tombstone_stale(
        &self,
        server_id: i64,
        server_folder_id: i64,
        cutoff: i64,
    ) -> Result<u64> {
        let result = sqlx::query(
            r#"
            UPDATE songs SET deleted = 1
            WHERE server_id = ? AND deleted = 0 AND updated_at <= ?
              AND id IN (
                SELECT song_id FROM song_server_folders WHERE server_folder_id = ?
              )
            "#,
        )
        .bind(server_id)
        .bind(cutoff)
        .bind(server_folder_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }
}
