//! Navidrome API wire types
//!
//! Navidrome's native REST API serializes in camelCase and returns listing
//! responses as bare JSON arrays.

use serde::Deserialize;

/// Response to `POST /auth/login`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub id: String,
    pub token: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenreItem {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArtistItem {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub biography: Option<String>,
    #[serde(default)]
    pub large_image_url: Option<String>,
    #[serde(default)]
    pub mbz_artist_id: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlbumItem {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub album_artist: Option<String>,
    #[serde(default)]
    pub album_artist_id: Option<String>,
    /// Space-separated remote ids of every contributing artist
    #[serde(default)]
    pub all_artist_ids: Option<String>,
    #[serde(default)]
    pub cover_art_id: Option<String>,
    /// Zero means the year is unknown
    #[serde(default)]
    pub min_year: Option<i32>,
    #[serde(default)]
    pub genre: Option<String>,
    #[serde(default)]
    pub mbz_album_id: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SongItem {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub album_id: Option<String>,
    #[serde(default)]
    pub artist_id: Option<String>,
    #[serde(default)]
    pub artist: Option<String>,
    #[serde(default)]
    pub track_number: Option<i32>,
    #[serde(default)]
    pub disc_number: Option<i32>,
    /// Seconds, fractional
    #[serde(default)]
    pub duration: Option<f64>,
    /// kbit/s
    #[serde(default)]
    pub bit_rate: Option<i64>,
    /// File extension, doubles as the container name
    #[serde(default)]
    pub suffix: Option<String>,
    #[serde(default)]
    pub path: Option<String>,
    #[serde(default)]
    pub size: Option<i64>,
    #[serde(default)]
    pub genre: Option<String>,
    #[serde(default)]
    pub mbz_track_id: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_album_item_partial_payload() {
        let json = r#"{"id": "al1", "name": "Album"}"#;
        let album: AlbumItem = serde_json::from_str(json).unwrap();

        assert_eq!(album.id, "al1");
        assert!(album.album_artist_id.is_none());
        assert!(album.min_year.is_none());
    }

    #[test]
    fn test_song_item_camel_case_fields() {
        let json = r#"{
            "id": "s1",
            "title": "Track",
            "albumId": "al1",
            "trackNumber": 4,
            "discNumber": 1,
            "duration": 215.68,
            "bitRate": 320,
            "suffix": "flac",
            "mbzTrackId": "mbid-1"
        }"#;
        let song: SongItem = serde_json::from_str(json).unwrap();

        assert_eq!(song.album_id.as_deref(), Some("al1"));
        assert_eq!(song.track_number, Some(4));
        assert_eq!(song.bit_rate, Some(320));
        assert_eq!(song.mbz_track_id.as_deref(), Some("mbid-1"));
    }
}
