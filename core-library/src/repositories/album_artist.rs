//! Album artist repository trait and implementation
//!
//! Album artists are full entities upserted by their `(remote_id,
//! server_id)` natural key. The upsert and its relationship connects run in
//! one transaction so a chunk failure leaves no half-linked rows.

use crate::error::Result;
use crate::models::AlbumArtist;
use async_trait::async_trait;
use provider_traits::records::ArtistRecord;
use sqlx::SqlitePool;
use std::collections::HashSet;

/// Repository interface for album artists
#[async_trait]
pub trait AlbumArtistRepository: Send + Sync {
    /// Insert or refresh an album artist by natural key, connecting its
    /// genres, images, externals, and the scanned server folder.
    ///
    /// Connects resolve reference rows by natural key; references that were
    /// never inserted connect nothing.
    ///
    /// # Returns
    /// The local id of the upserted row
    async fn upsert(
        &self,
        server_id: i64,
        record: &ArtistRecord,
        server_folder_id: i64,
        stamp: i64,
    ) -> Result<i64>;

    /// Find an album artist by its remote id
    async fn find_by_remote_id(
        &self,
        server_id: i64,
        remote_id: &str,
    ) -> Result<Option<AlbumArtist>>;

    /// Find an album artist by exact name, used as a fallback when an album
    /// references an unknown album-artist remote id
    async fn find_by_name(&self, server_id: i64, name: &str) -> Result<Option<AlbumArtist>>;

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

/// SQLite implementation of AlbumArtistRepository
pub struct SqliteAlbumArtistRepository {
    pool: SqlitePool,
}

impl SqliteAlbumArtistRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AlbumArtistRepository for SqliteAlbumArtistRepository {
    async fn upsert(
        &self,
        server_id: i64,
        record: &ArtistRecord,
        server_folder_id: i64,
        stamp: i64,
    ) -> Result<i64> {
        let mut tx = self.pool.begin().await?;

        let (id,): (i64,) = sqlx::query_as(
            r#"
            INSERT INTO album_artists (remote_id, server_id, name, biography, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?)
            ON CONFLICT(remote_id, server_id) DO UPDATE SET
                name = excluded.name,
                biography = excluded.biography,
                deleted = 0,
                updated_at = excluded.updated_at
            RETURNING id
            "#,
        )
        .bind(&record.remote_id)
        .bind(server_id)
        .bind(&record.name)
        .bind(&record.biography)
        .bind(stamp)
        .bind(stamp)
        .fetch_one(&mut *tx)
        .await?;

        for genre in &record.genres {
            sqlx::query(
                r#"
                INSERT OR IGNORE INTO album_artist_genres (album_artist_id, genre_id)
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
                INSERT OR IGNORE INTO album_artist_images (album_artist_id, image_id)
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
                INSERT OR IGNORE INTO album_artist_externals (album_artist_id, external_id)
                SELECT ?, id FROM externals WHERE source = ? AND value = ?
                "#,
            )
            .bind(id)
            .bind(external.source.as_str())
            .bind(&external.value)
            .execute(&mut *tx)
            .await?;
        }

        sqlx::query(
            r#"
            INSERT OR IGNORE INTO album_artist_server_folders (album_artist_id, server_folder_id)
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

    async fn find_by_remote_id(
        &self,
        server_id: i64,
        remote_id: &str,
    ) -> Result<Option<AlbumArtist>> {
        let artist = sqlx::query_as::<_, AlbumArtist>(
            "SELECT * FROM album_artists WHERE remote_id = ? AND server_id = ?",
        )
        .bind(remote_id)
        .bind(server_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(artist)
    }

    async fn find_by_name(&self, server_id: i64, name: &str) -> Result<Option<AlbumArtist>> {
        let artist = sqlx::query_as::<_, AlbumArtist>(
            "SELECT * FROM album_artists WHERE server_id = ? AND name = ? ORDER BY id LIMIT 1",
        )
        .bind(server_id)
        .bind(name)
        .fetch_optional(&self.pool)
        .await?;

        Ok(artist)
    }

    async fn known_remote_ids(&self, server_id: i64) -> Result<HashSet<String>> {
        let rows: Vec<(String,)> =
            sqlx::query_as("SELECT remote_id FROM album_artists WHERE server_id = ?")
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
            UPDATE album_artists SET deleted = 1
            WHERE server_id = ? AND deleted = 0 AND updated_at <= ?
              AND id IN (
                SELECT album_artist_id FROM album_artist_server_folders
                WHERE server_folder_id = ?
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{create_test_pool, insert_test_server};
    use crate::repositories::reference::{ReferenceRepository, SqliteReferenceRepository};
    use provider_traits::records::{ExternalRef, ExternalSource, ImageKind, ImageRef};

    fn record(remote_id: &str, name: &str) -> ArtistRecord {
        ArtistRecord {
            remote_id: remote_id.to_string(),
            name: name.to_string(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_upsert_is_idempotent_on_natural_key() {
        let pool = create_test_pool().await.unwrap();
        let (server_id, folder_id) = insert_test_server(&pool).await;
        let repo = SqliteAlbumArtistRepository::new(pool.clone());

        let first = repo
            .upsert(server_id, &record("aa1", "Band"), folder_id, 100)
            .await
            .unwrap();
        let second = repo
            .upsert(server_id, &record("aa1", "Band Renamed"), folder_id, 200)
            .await
            .unwrap();

        assert_eq!(first, second);

        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM album_artists")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(count, 1);

        let row = repo.find_by_remote_id(server_id, "aa1").await.unwrap().unwrap();
        assert_eq!(row.name, "Band Renamed");
        assert_eq!(row.updated_at, 200);
    }

    #[tokio::test]
    async fn test_upsert_resurrects_tombstoned_row() {
        let pool = create_test_pool().await.unwrap();
        let (server_id, folder_id) = insert_test_server(&pool).await;
        let repo = SqliteAlbumArtistRepository::new(pool.clone());

        repo.upsert(server_id, &record("aa1", "Band"), folder_id, 100)
            .await
            .unwrap();
        sqlx::query("UPDATE album_artists SET deleted = 1")
            .execute(&pool)
            .await
            .unwrap();

        repo.upsert(server_id, &record("aa1", "Band"), folder_id, 300)
            .await
            .unwrap();

        let row = repo.find_by_remote_id(server_id, "aa1").await.unwrap().unwrap();
        assert!(!row.deleted);
    }

    #[tokio::test]
    async fn test_upsert_connects_existing_references_only() {
        let pool = create_test_pool().await.unwrap();
        let (server_id, folder_id) = insert_test_server(&pool).await;
        let references = SqliteReferenceRepository::new(pool.clone());
        let repo = SqliteAlbumArtistRepository::new(pool.clone());

        references
            .insert_genres(&["Rock".to_string()])
            .await
            .unwrap();
        references
            .insert_images(&[ImageRef::new("https://x/1", ImageKind::Primary)])
            .await
            .unwrap();

        let mut rec = record("aa1", "Band");
        rec.genres = vec!["Rock".to_string(), "Never Inserted".to_string()];
        rec.images = vec![ImageRef::new("https://x/1", ImageKind::Primary)];
        rec.externals = vec![ExternalRef::new(ExternalSource::MusicBrainz, "missing")];

        let id = repo.upsert(server_id, &rec, folder_id, 100).await.unwrap();

        let (genres,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM album_artist_genres WHERE album_artist_id = ?")
                .bind(id)
                .fetch_one(&pool)
                .await
                .unwrap();
        let (images,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM album_artist_images WHERE album_artist_id = ?")
                .bind(id)
                .fetch_one(&pool)
                .await
                .unwrap();
        let (externals,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM album_artist_externals WHERE album_artist_id = ?",
        )
        .bind(id)
        .fetch_one(&pool)
        .await
        .unwrap();

        // Only references that exist in the reference tables connect
        assert_eq!(genres, 1);
        assert_eq!(images, 1);
        assert_eq!(externals, 0);
    }

    #[tokio::test]
    async fn test_find_by_name_fallback() {
        let pool = create_test_pool().await.unwrap();
        let (server_id, folder_id) = insert_test_server(&pool).await;
        let repo = SqliteAlbumArtistRepository::new(pool);

        repo.upsert(server_id, &record("aa1", "Same Name"), folder_id, 100)
            .await
            .unwrap();
        repo.upsert(server_id, &record("aa2", "Same Name"), folder_id, 100)
            .await
            .unwrap();

        // Deterministic: lowest local id wins
        let found = repo.find_by_name(server_id, "Same Name").await.unwrap().unwrap();
        assert_eq!(found.remote_id, "aa1");
        assert!(repo.find_by_name(server_id, "Nobody").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_tombstone_stale_sweeps_only_untouched() {
        let pool = create_test_pool().await.unwrap();
        let (server_id, folder_id) = insert_test_server(&pool).await;
        let repo = SqliteAlbumArtistRepository::new(pool);

        repo.upsert(server_id, &record("stale", "Stale"), folder_id, 100)
            .await
            .unwrap();
        repo.upsert(server_id, &record("fresh", "Fresh"), folder_id, 300)
            .await
            .unwrap();

        let swept = repo.tombstone_stale(server_id, folder_id, 200).await.unwrap();
        assert_eq!(swept, 1);

        let stale = repo.find_by_remote_id(server_id, "stale").await.unwrap().unwrap();
        assert!(stale.deleted);
        assert_eq!(stale.updated_at, 100);
    }
}
