//! Album repository trait and implementation

use crate::error::Result;
use crate::models::Album;
use async_trait::async_trait;
use provider_traits::records::AlbumRecord;
use sqlx::SqlitePool;
use std::collections::HashSet;

/// Repository interface for albums
#[async_trait]
pub trait AlbumRepository: Send + Sync {
    /// Insert or refresh an album by natural key, connecting its genres,
    /// images, externals, album artists, and the scanned server folder.
    ///
    /// `album_artist_remote_ids` is the resolved credit list; the caller
    /// filters out references the library does not know.
    ///
    /// # Returns
    /// The local id of the upserted row
    async fn upsert(
        &self,
        server_id: i64,
        record: &AlbumRecord,
        album_artist_remote_ids: &[String],
        server_folder_id: i64,
        stamp: i64,
    ) -> Result<i64>;

    /// Connect performing-artist credits harvested from the album's songs
    async fn connect_artist_credits(
        &self,
        album_id: i64,
        server_id: i64,
        artist_remote_ids: &[String],
    ) -> Result<()>;

    /// Find an album by its remote id
    async fn find_by_remote_id(&self, server_id: i64, remote_id: &str) -> Result<Option<Album>>;

    /// All remote ids known for a server, tombstoned rows included
    async fn known_remote_ids(&self, server_id: i64) -> Result<HashSet<String>>;

    /// Soft-delete rows attached to the server folder that were not touched
    /// after the cutoff. Returns the number of rows tombstoned.
    async fn tombstone_stale(
        &self,
        server_id: i64,
        server_folder_id: i64,
        cutoff: i64,
    ) -> Result<u64>;
}

/// SQLite implementation of AlbumRepository
pub struct SqliteAlbumRepository {
    pool: SqlitePool,
}

impl SqliteAlbumRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AlbumRepository for SqliteAlbumRepository {
    async fn upsert(
        &self,
        server_id: i64,
        record: &AlbumRecord,
        album_artist_remote_ids: &[String],
        server_folder_id: i64,
        stamp: i64,
    ) -> Result<i64> {
        let mut tx = self.pool.begin().await?;

        let (id,): (i64,) = sqlx::query_as(
            r#"
            INSERT INTO albums (
                remote_id, server_id, name, release_year, release_date,
                remote_created_at, created_at, updated_at
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(remote_id, server_id) DO UPDATE SET
                name = excluded.name,
                release_year = excluded.release_year,
                release_date = excluded.release_date,
                remote_created_at = excluded.remote_created_at,
                deleted = 0,
                updated_at = excluded.updated_at
            RETURNING id
            "#,
        )
        .bind(&record.remote_id)
        .bind(server_id)
        .bind(&record.name)
        .bind(record.release_year)
        .bind(&record.release_date)
        .bind(&record.remote_created_at)
        .bind(stamp)
        .bind(stamp)
        .fetch_one(&mut *tx)
        .await?;

        for genre in &record.genres {
            sqlx::query(
                r#"
                INSERT OR IGNORE INTO album_genres (album_id, genre_id)
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
                INSERT OR IGNORE INTO album_images (album_id, image_id)
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
                INSERT OR IGNORE INTO album_externals (album_id, external_id)
                SELECT ?, id FROM externals WHERE source = ? AND value = ?
                "#,
            )
            .bind(id)
            .bind(external.source.as_str())
            .bind(&external.value)
            .execute(&mut *tx)
            .await?;
        }

        for remote_id in album_artist_remote_ids {
            sqlx::query(
                r#"
                INSERT OR IGNORE INTO album_album_artists (album_id, album_artist_id)
                SELECT ?, id FROM album_artists WHERE remote_id = ? AND server_id = ?
                "#,
            )
            .bind(id)
            .bind(remote_id)
            .bind(server_id)
            .execute(&mut *tx)
            .await?;
        }

        sqlx::query(
            r#"
            INSERT OR IGNORE INTO album_server_folders (album_id, server_folder_id)
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

    async fn connect_artist_credits(
        &self,
        album_id: i64,
        server_id: i64,
        artist_remote_ids: &[String],
    ) -> Result<()> {
        if artist_remote_ids.is_empty() {
            return Ok(());
        }

        let mut tx = self.pool.begin().await?;
        for remote_id in artist_remote_ids {
            sqlx::query(
                r#"
                INSERT OR IGNORE INTO album_artist_credits (album_id, artist_id)
                SELECT ?, id FROM artists WHERE remote_id = ? AND server_id = ?
                "#,
            )
            .bind(album_id)
            .bind(remote_id)
            .bind(server_id)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;

        Ok(())
    }

    async fn find_by_remote_id(&self, server_id: i64, remote_id: &str) -> Result<Option<Album>> {
        let album = sqlx::query_as::<_, Album>(
            "SELECT * FROM albums WHERE remote_id = ? AND server_id = ?",
        )
        .bind(remote_id)
        .bind(server_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(album)
    }

    async fn known_remote_ids(&self, server_id: i64) -> Result<HashSet<String>> {
        let rows: Vec<(String,)> =
            sqlx::query_as("SELECT remote_id FROM albums WHERE server_id = ?")
                .bind(server_id)
                .fetch_all(&self.pool)
                .await?;

        Ok(rows.into_iter().map(|(id,)| id).collect())
    }

    async fn tombstone_stale(
        &self,
        server_id: i64,
        server_folder_id: i64,
        cutoff: i64,
    ) -> Result<u64> {
        let result = sqlx::query(
            r#"
            UPDATE albums SET deleted = 1
            WHERE server_id = ? AND deleted = 0 AND updated_at <= ?
              AND id IN (
                SELECT album_id FROM album_server_folders WHERE server_folder_id = ?
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
