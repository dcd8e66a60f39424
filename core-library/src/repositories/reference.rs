//! Reference repository for genres, images, and externals
//!
//! The three reference tables are append-only: rows are inserted with
//! `INSERT OR IGNORE` against their natural key and never updated, never
//! swept. Duplicate inserts are the normal case during a scan.

use crate::error::Result;
use crate::models::Genre;
use async_trait::async_trait;
use provider_traits::records::{ExternalRef, ImageRef};
use sqlx::SqlitePool;

/// Repository interface for the append-only reference tables
#[async_trait]
pub trait ReferenceRepository: Send + Sync {
    /// Bulk-insert genres by name, ignoring names that already exist
    async fn insert_genres(&self, names: &[String]) -> Result<()>;

    /// Bulk-insert image references, ignoring `(remote_url, type)` pairs
    /// that already exist
    async fn insert_images(&self, images: &[ImageRef]) -> Result<()>;

    /// Bulk-insert external references, ignoring `(source, value)` pairs
    /// that already exist
    async fn insert_externals(&self, externals: &[ExternalRef]) -> Result<()>;

    /// List all genres ordered by name
    async fn all_genres(&self) -> Result<Vec<Genre>>;
}

/// SQLite implementation of ReferenceRepository
pub struct SqliteReferenceRepository {
    pool: SqlitePool,
}

impl SqliteReferenceRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ReferenceRepository for SqliteReferenceRepository {
    async fn insert_genres(&self, names: &[String]) -> Result<()> {
        if names.is_empty() {
            return Ok(());
        }

        let mut tx = self.pool.begin().await?;
        for name in names {
            sqlx::query("INSERT OR IGNORE INTO genres (name) VALUES (?)")
                .bind(name)
                .execute(&mut *tx)
                .await?;
        }
        tx.commit().await?;

        Ok(())
    }

    async fn insert_images(&self, images: &[ImageRef]) -> Result<()> {
        if images.is_empty() {
            return Ok(());
        }

        let mut tx = self.pool.begin().await?;
        for image in images {
            sqlx::query("INSERT OR IGNORE INTO images (remote_url, image_type) VALUES (?, ?)")
                .bind(&image.remote_url)
                .bind(image.kind.as_str())
                .execute(&mut *tx)
                .await?;
        }
        tx.commit().await?;

        Ok(())
    }

    async fn insert_externals(&self, externals: &[ExternalRef]) -> Result<()> {
        if externals.is_empty() {
            return Ok(());
        }

        let mut tx = self.pool.begin().await?;
        for external in externals {
            sqlx::query("INSERT OR IGNORE INTO externals (source, value) VALUES (?, ?)")
                .bind(external.source.as_str())
                .bind(&external.value)
                .execute(&mut *tx)
                .await?;
        }
        tx.commit().await?;

        Ok(())
    }

    async fn all_genres(&self) -> Result<Vec<Genre>> {
        let genres = sqlx::query_as::<_, Genre>("SELECT * FROM genres ORDER BY name")
            .fetch_all(&self.pool)
            .await?;

        Ok(genres)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::create_test_pool;
    use provider_traits::records::{ExternalSource, ImageKind};

    #[tokio::test]
    async fn test_insert_genres_deduplicates_by_name() {
        let pool = create_test_pool().await.unwrap();
        let repo = SqliteReferenceRepository::new(pool);

        repo.insert_genres(&["Rock".to_string(), "Jazz".to_string()])
            .await
            .unwrap();
        repo.insert_genres(&["Rock".to_string(), "Ambient".to_string()])
            .await
            .unwrap();

        let genres = repo.all_genres().await.unwrap();
        let names: Vec<_> = genres.iter().map(|g| g.name.as_str()).collect();
        assert_eq!(names, ["Ambient", "Jazz", "Rock"]);
    }

    #[tokio::test]
    async fn test_insert_images_deduplicates_by_url_and_type() {
        let pool = create_test_pool().await.unwrap();
        let repo = SqliteReferenceRepository::new(pool.clone());

        let images = vec![
            ImageRef::new("https://x/img/1", ImageKind::Primary),
            ImageRef::new("https://x/img/1", ImageKind::Primary),
            ImageRef::new("https://x/img/1", ImageKind::Backdrop),
        ];
        repo.insert_images(&images).await.unwrap();

        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM images")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(count, 2);
    }

    #[tokio::test]
    async fn test_insert_externals_deduplicates_by_source_and_value() {
        let pool = create_test_pool().await.unwrap();
        let repo = SqliteReferenceRepository::new(pool.clone());

        let externals = vec![
            ExternalRef::new(ExternalSource::MusicBrainz, "mbid-1"),
            ExternalRef::new(ExternalSource::MusicBrainz, "mbid-1"),
            ExternalRef::new(ExternalSource::TheAudioDb, "mbid-1"),
        ];
        repo.insert_externals(&externals).await.unwrap();

        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM externals")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(count, 2);
    }

    #[tokio::test]
    async fn test_empty_batches_are_noops() {
        let pool = create_test_pool().await.unwrap();
        let repo = SqliteReferenceRepository::new(pool);

        repo.insert_genres(&[]).await.unwrap();
        repo.insert_images(&[]).await.unwrap();
        repo.insert_externals(&[]).await.unwrap();

        assert!(repo.all_genres().await.unwrap().is_empty());
    }
}
