//! Folder repository trait and implementation
//!
//! Folders mirror the directory tree song paths imply. Identity is the full
//! `(path, server_id)` pair; parent links are set separately once both ends
//! of an edge exist.

use crate::error::Result;
use crate::models::Folder;
use async_trait::async_trait;
use sqlx::SqlitePool;

/// Repository interface for the mirrored folder tree
#[async_trait]
pub trait FolderRepository: Send + Sync {
    /// Insert or refresh a folder by path, connecting it to the scanned
    /// server folder. Returns the full row so callers can link parents.
    async fn upsert(
        &self,
        server_id: i64,
        path: &str,
        name: &str,
        server_folder_id: i64,
        stamp: i64,
    ) -> Result<Folder>;

    /// Point a folder at its parent
    async fn set_parent(&self, folder_id: i64, parent_id: i64) -> Result<()>;

    /// Find a folder by its exact path
    async fn find_by_path(&self, server_id: i64, path: &str) -> Result<Option<Folder>>;

    /// Soft-delete rows attached to the server folder that were not touched
    /// after the cutoff. Returns the number of rows tombstoned.
    async fn tombstone_stale(
        &self,
        server_id: i64,
        server_folder_id: i64,
        cutoff: i64,
    ) -> Result<u64>;
}

/// SQLite implementation of FolderRepository
pub struct SqliteFolderRepository {
    pool: SqlitePool,
}

impl SqliteFolderRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl FolderRepository for SqliteFolderRepository {
    async fn upsert(
        &self,
        server_id: i64,
        path: &str,
        name: &str,
        server_folder_id: i64,
        stamp: i64,
    ) -> Result<Folder> {
        let mut tx = self.pool.begin().await?;

        let folder = sqlx::query_as::<_, Folder>(
            r#"
            INSERT INTO folders (server_id, path, name, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?)
            ON CONFLICT(path, server_id) DO UPDATE SET
                name = excluded.name,
                deleted = 0,
                updated_at = excluded.updated_at
            RETURNING *
            "#,
        )
        .bind(server_id)
        .bind(path)
        .bind(name)
        .bind(stamp)
        .bind(stamp)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query(
            r#"
            INSERT OR IGNORE INTO folder_server_folders (folder_id, server_folder_id)
            VALUES (?, ?)
            "#,
        )
        .bind(folder.id)
        .bind(server_folder_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(folder)
    }

    async fn set_parent(&self, folder_id: i64, parent_id: i64) -> Result<()> {
        sqlx::query("UPDATE folders SET parent_id = ? WHERE id = ?")
            .bind(parent_id)
            .bind(folder_id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn find_by_path(&self, server_id: i64, path: &str) -> Result<Option<Folder>> {
        let folder =
            sqlx::query_as::<_, Folder>("SELECT * FROM folders WHERE server_id = ? AND path = ?")
                .bind(server_id)
                .bind(path)
                .fetch_optional(&self.pool)
                .await?;

        Ok(folder)
    }

    async fn tombstone_stale(
        &self,
        server_id: i64,
        server_folder_id: i64,
        cutoff: i64,
    ) -> Result<u64> {
        let result = sqlx::query(
            r#"
            UPDATE folders SET deleted = 1
            WHERE server_id = ? AND deleted = 0 AND updated_at <= ?
              AND id IN (
                SELECT folder_id FROM folder_server_folders WHERE server_folder_id = ?
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
