//! Relationship linker
//!
//! Reference rows (genres, images, externals) must exist before entity
//! upserts run, because join-table connects resolve them by natural key and
//! silently link nothing when the row is missing. The linker collects every
//! reference a chunk of records carries, deduplicates, and bulk-inserts
//! them in one pass per table.

use crate::error::Result;
use core_library::repositories::ReferenceRepository;
use provider_traits::records::{ExternalRef, ImageRef, ReferenceSource};
use std::collections::HashSet;
use tracing::debug;

/// Deduplicated references extracted from one chunk of records
#[derive(Debug, Default)]
pub struct ReferenceBatch {
    genres: Vec<String>,
    images: Vec<ImageRef>,
    externals: Vec<ExternalRef>,
}

impl ReferenceBatch {
    /// Collect references from a chunk, keeping first-seen order
    pub fn from_records<R: ReferenceSource>(records: &[R]) -> Self {
        let mut batch = ReferenceBatch::default();
        let mut seen_genres = HashSet::new();
        let mut seen_images = HashSet::new();
        let mut seen_externals = HashSet::new();

        for record in records {
            for genre in record.genre_names() {
                if seen_genres.insert(genre.clone()) {
                    batch.genres.push(genre.clone());
                }
            }
            for image in record.image_refs() {
                if seen_images.insert(image.clone()) {
                    batch.images.push(image.clone());
                }
            }
            for external in record.external_refs() {
                if seen_externals.insert(external.clone()) {
                    batch.externals.push(external.clone());
                }
            }
        }

        batch
    }

    pub fn is_empty(&self) -> bool {
        self.genres.is_empty() && self.images.is_empty() && self.externals.is_empty()
    }

    pub fn genres(&self) -> &[String] {
        &self.genres
    }

    pub fn images(&self) -> &[ImageRef] {
        &self.images
    }

    pub fn externals(&self) -> &[ExternalRef] {
        &self.externals
    }

    /// Insert the batch into the reference tables, ignoring rows that
    /// already exist
    pub async fn link(&self, references: &dyn ReferenceRepository) -> Result<()> {
        if self.is_empty() {
            return Ok(());
        }

        debug!(
            genres = self.genres.len(),
            images = self.images.len(),
            externals = self.externals.len(),
            "Linking reference batch"
        );

        references.insert_genres(&self.genres).await?;
        references.insert_images(&self.images).await?;
        references.insert_externals(&self.externals).await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use provider_traits::records::{ExternalSource, ImageKind, SongRecord};

    fn song(genres: &[&str], image_url: Option<&str>, external: Option<&str>) -> SongRecord {
        SongRecord {
            remote_id: "s".to_string(),
            name: "song".to_string(),
            genres: genres.iter().map(|g| g.to_string()).collect(),
            images: image_url
                .map(|u| vec![ImageRef::new(u, ImageKind::Primary)])
                .unwrap_or_default(),
            externals: external
                .map(|v| vec![ExternalRef::new(ExternalSource::MusicBrainz, v)])
                .unwrap_or_default(),
            ..Default::default()
        }
    }

    #[test]
    fn test_batch_deduplicates_across_records() {
        let records = vec![
            song(&["Rock", "Jazz"], Some("https://x/1"), Some("mb-1")),
            song(&["Rock"], Some("https://x/1"), Some("mb-2")),
            song(&["Ambient"], Some("https://x/2"), Some("mb-1")),
        ];

        let batch = ReferenceBatch::from_records(&records);

        assert_eq!(batch.genres(), ["Rock", "Jazz", "Ambient"]);
        assert_eq!(batch.images().len(), 2);
        assert_eq!(batch.externals().len(), 2);
    }

    #[test]
    fn test_same_url_different_kind_are_distinct() {
        let records = vec![SongRecord {
            images: vec![
                ImageRef::new("https://x/1", ImageKind::Primary),
                ImageRef::new("https://x/1", ImageKind::Backdrop),
            ],
            ..Default::default()
        }];

        let batch = ReferenceBatch::from_records(&records);
        assert_eq!(batch.images().len(), 2);
    }

    #[test]
    fn test_empty_chunk_is_empty_batch() {
        let records: Vec<SongRecord> = Vec::new();
        let batch = ReferenceBatch::from_records(&records);
        assert!(batch.is_empty());
    }
}
