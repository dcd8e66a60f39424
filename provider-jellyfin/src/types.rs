//! Jellyfin API wire types
//!
//! Response shapes for the subset of the Jellyfin API the scanner uses.
//! Jellyfin serializes in PascalCase; optional fields default so partial
//! payloads still deserialize.

use serde::Deserialize;
use std::collections::HashMap;

/// Response to `POST /users/authenticatebyname`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct AuthenticationResult {
    pub user: AuthenticatedUser,
    pub access_token: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct AuthenticatedUser {
    pub id: String,
}

/// Paged item envelope returned by every listing endpoint
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ItemsPage<T> {
    #[serde(default = "Vec::new")]
    pub items: Vec<T>,
    #[serde(default)]
    pub total_record_count: Option<u64>,
}

/// A named link into an external metadata catalog
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ExternalUrl {
    pub name: String,
    pub url: String,
}

/// Compact item reference (`{Id, Name}` pairs used for credits)
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct NameIdPair {
    pub id: String,
    pub name: String,
}

/// Physical media facts for a song
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct MediaSource {
    #[serde(default)]
    pub path: Option<String>,
    #[serde(default)]
    pub container: Option<String>,
    #[serde(default)]
    pub size: Option<i64>,
    /// bit/s; the engine stores kbit/s
    #[serde(default)]
    pub bitrate: Option<i64>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct GenreItem {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ArtistItem {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub overview: Option<String>,
    #[serde(default = "Vec::new")]
    pub genres: Vec<String>,
    #[serde(default = "HashMap::new")]
    pub image_tags: HashMap<String, String>,
    #[serde(default = "Vec::new")]
    pub backdrop_image_tags: Vec<String>,
    #[serde(default = "Vec::new")]
    pub external_urls: Vec<ExternalUrl>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct AlbumItem {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub production_year: Option<i32>,
    #[serde(default)]
    pub premiere_date: Option<String>,
    #[serde(default)]
    pub date_created: Option<String>,
    #[serde(default = "Vec::new")]
    pub album_artists: Vec<NameIdPair>,
    #[serde(default = "Vec::new")]
    pub genres: Vec<String>,
    #[serde(default = "HashMap::new")]
    pub image_tags: HashMap<String, String>,
    #[serde(default = "Vec::new")]
    pub backdrop_image_tags: Vec<String>,
    #[serde(default = "Vec::new")]
    pub external_urls: Vec<ExternalUrl>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SongItem {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub album_id: Option<String>,
    /// Track number within the disc
    #[serde(default)]
    pub index_number: Option<i32>,
    /// Disc number
    #[serde(default)]
    pub parent_index_number: Option<i32>,
    /// Duration in 100ns ticks
    #[serde(default)]
    pub run_time_ticks: Option<i64>,
    #[serde(default)]
    pub date_created: Option<String>,
    #[serde(default = "Vec::new")]
    pub artist_items: Vec<NameIdPair>,
    #[serde(default = "Vec::new")]
    pub genres: Vec<String>,
    #[serde(default = "HashMap::new")]
    pub image_tags: HashMap<String, String>,
    #[serde(default = "Vec::new")]
    pub external_urls: Vec<ExternalUrl>,
    #[serde(default = "Vec::new")]
    pub media_sources: Vec<MediaSource>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_song_item_deserializes_partial_payload() {
        let json = r#"{"Id": "s1", "Name": "Track"}"#;
        let song: SongItem = serde_json::from_str(json).unwrap();

        assert_eq!(song.id, "s1");
        assert!(song.album_id.is_none());
        assert!(song.media_sources.is_empty());
        assert!(song.artist_items.is_empty());
    }

    #[test]
    fn test_items_page_defaults() {
        let json = r#"{}"#;
        let page: ItemsPage<GenreItem> = serde_json::from_str(json).unwrap();

        assert!(page.items.is_empty());
        assert!(page.total_record_count.is_none());
    }

    #[test]
    fn test_authentication_result() {
        let json = r#"{"User": {"Id": "user-1"}, "AccessToken": "abc"}"#;
        let auth: AuthenticationResult = serde_json::from_str(json).unwrap();

        assert_eq!(auth.user.id, "user-1");
        assert_eq!(auth.access_token, "abc");
    }
}
