//! Common Intermediate Schema
//!
//! Every adapter maps its provider-native payloads into these normalized
//! record shapes before handing them to the sync engine. The engine never
//! sees provider wire types.

/// Kind of artwork a remote image reference carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImageKind {
    Primary,
    Backdrop,
    Logo,
}

impl ImageKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ImageKind::Primary => "primary",
            ImageKind::Backdrop => "backdrop",
            ImageKind::Logo => "logo",
        }
    }
}

/// A remote image reference. Images are stored by URL, never downloaded.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ImageRef {
    pub remote_url: String,
    pub kind: ImageKind,
}

impl ImageRef {
    pub fn new(remote_url: impl Into<String>, kind: ImageKind) -> Self {
        Self {
            remote_url: remote_url.into(),
            kind,
        }
    }
}

/// External metadata catalog a reference points into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExternalSource {
    MusicBrainz,
    TheAudioDb,
}

impl ExternalSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExternalSource::MusicBrainz => "musicbrainz",
            ExternalSource::TheAudioDb => "theaudiodb",
        }
    }
}

/// An identifier in an external metadata catalog.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ExternalRef {
    pub source: ExternalSource,
    pub value: String,
}

impl ExternalRef {
    pub fn new(source: ExternalSource, value: impl Into<String>) -> Self {
        Self {
            source,
            value: value.into(),
        }
    }
}

/// A genre as reported by the remote server. Genres are deduplicated by
/// name locally, so the name is the whole identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenreRecord {
    pub name: String,
}

/// A performing-artist credit attached to a song listing.
///
/// Credits carry only identity; full artist metadata lives on the album
/// artist entity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtistCredit {
    pub remote_id: String,
    pub name: String,
}

/// An album artist with full metadata.
#[derive(Debug, Clone, Default)]
pub struct ArtistRecord {
    pub remote_id: String,
    pub name: String,
    pub biography: Option<String>,
    pub genres: Vec<String>,
    pub images: Vec<ImageRef>,
    pub externals: Vec<ExternalRef>,
}

/// An album with its album-artist references.
#[derive(Debug, Clone, Default)]
pub struct AlbumRecord {
    pub remote_id: String,
    pub name: String,
    pub release_year: Option<i32>,
    pub release_date: Option<String>,
    /// When the remote server first saw this album, RFC 3339.
    pub remote_created_at: Option<String>,
    /// Credited album artists. May reference artists the engine has not
    /// seen; unresolvable references are dropped. Backends that list bare
    /// ids leave the credit name empty.
    pub album_artists: Vec<ArtistCredit>,
    pub genres: Vec<String>,
    pub images: Vec<ImageRef>,
    pub externals: Vec<ExternalRef>,
}

/// A song with its album reference, file facts, and performing credits.
#[derive(Debug, Clone, Default)]
pub struct SongRecord {
    pub remote_id: String,
    pub name: String,
    /// Remote id of the containing album. Songs whose album is unknown
    /// locally are skipped during reconciliation.
    pub album_remote_id: Option<String>,
    pub track: Option<i32>,
    pub disc: Option<i32>,
    pub duration_secs: Option<i64>,
    pub bitrate_kbps: Option<i64>,
    pub container: Option<String>,
    /// File path on the remote server, used to build the folder hierarchy.
    pub path: Option<String>,
    pub size_bytes: Option<i64>,
    pub remote_created_at: Option<String>,
    pub artists: Vec<ArtistCredit>,
    pub genres: Vec<String>,
    pub images: Vec<ImageRef>,
    pub externals: Vec<ExternalRef>,
}

/// Uniform access to the reference tuples a record carries.
///
/// The Relationship Linker collects genres, images, and externals from any
/// record type through this trait before the record's own upsert runs.
pub trait ReferenceSource {
    fn genre_names(&self) -> &[String];
    fn image_refs(&self) -> &[ImageRef];
    fn external_refs(&self) -> &[ExternalRef];
}

impl ReferenceSource for ArtistRecord {
    fn genre_names(&self) -> &[String] {
        &self.genres
    }
    fn image_refs(&self) -> &[ImageRef] {
        &self.images
    }
    fn external_refs(&self) -> &[ExternalRef] {
        &self.externals
    }
}

impl ReferenceSource for AlbumRecord {
    fn genre_names(&self) -> &[String] {
        &self.genres
    }
    fn image_refs(&self) -> &[ImageRef] {
        &self.images
    }
    fn external_refs(&self) -> &[ExternalRef] {
        &self.externals
    }
}

impl ReferenceSource for SongRecord {
    fn genre_names(&self) -> &[String] {
        &self.genres
    }
    fn image_refs(&self) -> &[ImageRef] {
        &self.images
    }
    fn external_refs(&self) -> &[ExternalRef] {
        &self.externals
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_image_kind_as_str() {
        assert_eq!(ImageKind::Primary.as_str(), "primary");
        assert_eq!(ImageKind::Backdrop.as_str(), "backdrop");
        assert_eq!(ImageKind::Logo.as_str(), "logo");
    }

    #[test]
    fn test_external_source_as_str() {
        assert_eq!(ExternalSource::MusicBrainz.as_str(), "musicbrainz");
        assert_eq!(ExternalSource::TheAudioDb.as_str(), "theaudiodb");
    }

    #[test]
    fn test_reference_source_over_song() {
        let song = SongRecord {
            remote_id: "s1".to_string(),
            name: "Track".to_string(),
            genres: vec!["Rock".to_string()],
            images: vec![ImageRef::new("https://x/img/1", ImageKind::Primary)],
            externals: vec![ExternalRef::new(ExternalSource::MusicBrainz, "mbid-1")],
            ..Default::default()
        };

        let source: &dyn ReferenceSource = &song;
        assert_eq!(source.genre_names(), ["Rock".to_string()]);
        assert_eq!(source.image_refs().len(), 1);
        assert_eq!(source.external_refs()[0].value, "mbid-1");
    }
}
