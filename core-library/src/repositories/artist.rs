//! Artist repository trait and implementation
//!
//! Performing-artist credits are thin rows: identity plus a name. They are
//! created the first time a song listing mentions them and refreshed with a
//! touch on every later sighting.

use crate::error::Result;
use crate::models::Artist;
use async_trait::async_trait;
use provider_traits::records::ArtistCredit;
use sqlx::SqlitePool;
use std::collections::HashSet;

/// Repository interface for performing-artist credits
#[async_trait]
pub trait ArtistRepository: Send + Sync {
    /// Insert credits that do not exist yet. Existing rows are left alone;
    /// `touch_and_connect` refreshes them afterwards.
    async fn insert_if_absent(
        &self,
        server_id: i64,
        credits: &[ArtistCredit],
        now: i64,
    ) -> Result<()>;

    /// Mark credits as seen in the current scan: bump `updated_at`, clear
    /// the tombstone, and connect them to the server folder being scanned.
    async fn touch_and_connect(
        &self,
        server_id: i64,
        remote_ids: &[String],
        server_folder_id: i64,
        stamp: i64,
    ) -> Result<()>;

    /// All remote ids known for a server, tombstoned rows included
    async fn known_remote_ids(&self, server_id: i64) -> Result<HashSet<String>>;

    /// Find a credit by its remote id
    async fn find_by_remote_id(&self, server_id: i64, remote_id: &str) -> Result<Option<Artist>>;

    /// Soft-delete rows attached to the server folder that were not touched
    /// after the cutoff. Returns the number of rows tombstoned.
    async fn tombstone_stale(
        &self,
        server_id: i64,
        server_folder_id: i64,
        cutoff: i64,
    ) -> Result<u64>;
}

/// SQLite implementation of ArtistRepository
pub struct SqliteArtistRepository {
    pool: SqlitePool,
}

impl SqliteArtistRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ArtistRepository for SqliteArtistRepository {
    async fn insert_if_absent(
        &self,
        server_id: i64,
        credits: &[ArtistCredit],
        now: i64,
    ) -> Result<()> {
        if credits.is_empty() {
            return Ok(());
        }

        let mut tx = self.pool.begin().await?;
        for credit in credits {
            sqlx::query(
                r#"
                INSERT OR IGNORE INTO artists (remote_id, server_id, name, created_at, updated_at)
                VALUES (?, ?, ?, ?, ?)
                "#,
            )
            .bind(&credit.remote_id)
            .bind(server_id)
            .bind(&credit.name)
            .bind(now)
            .bind(now)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;

        Ok(())
    }

    async fn touch_and_connect(
        &self,
        server_id: i64,
        remote_ids: &[String],
        server_folder_id: i64,
        stamp: i64,
    ) -> Result<()> {
        if remote_ids.is_empty() {
            return Ok(());
        }

        let mut tx = self.pool.begin().await?;
        for remote_id in remote_ids {
            sqlx::query(
                r#"
                UPDATE artists SET updated_at = ?, deleted = 0
                WHERE remote_id = ? AND server_id = ?
                "#,
            )
            .bind(stamp)
            .bind(remote_id)
            .bind(server_id)
            .execute(&mut *tx)
            .await?;

            sqlx::query(
                r#"
                INSERT OR IGNORE INTO artist_server_folders (artist_id, server_folder_id)
                SELECT id, ? FROM artists WHERE remote_id = ? AND server_id = ?
                "#,
            )
            .bind(server_folder_id)
            .bind(remote_id)
            .bind(server_id)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;

        Ok(())
    }

    async fn known_remote_ids(&self, server_id: i64) -> Result<HashSet<String>> {
        let rows: Vec<(String,)> =
            sqlx::query_as("SELECT remote_id FROM artists WHERE server_id = ?")
                .bind(server_id)
                .fetch_all(&self.pool)
                .await?;

        Ok(rows.into_iter().map(|(id,)| id).collect())
    }

    async fn find_by_remote_id(&self, server_id: i64, remote_id: &str) -> Result<Option<Artist>> {
        let artist = sqlx::query_as::<_, Artist>(
            "SELECT * FROM artists WHERE remote_id = ? AND server_id = ?",
        )
        .bind(remote_id)
        .bind(server_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(artist)
    }

    async fn tombstone_stale(
        &self,
        server_id: i64,
        server_folder_id: i64,
        cutoff: i64,
    ) -> Result<u64> {
        let result = sqlx::query(
            r#"
            UPDATE artists SET deleted = 1
            WHERE server_id = ? AND deleted = 0 AND updated_at <= ?
              AND id IN (
                SELECT artist_id FROM artist_server_folders WHERE server_folder_id = ?
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
