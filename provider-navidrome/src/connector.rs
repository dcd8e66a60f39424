//! Navidrome API connector implementation
//!
//! Implements the `MusicProvider` trait against Navidrome's native REST
//! API. Navidrome has no per-folder library scoping, so `parent_remote_id`
//! is ignored.

use async_trait::async_trait;
use provider_traits::error::Result;
use provider_traits::http::{HttpClient, HttpMethod, HttpRequest, HttpResponse};
use provider_traits::provider::{
    Credential, MusicProvider, PageQuery, RecordPage, RemoteServer, ServerKind,
};
use provider_traits::records::{
    AlbumRecord, ArtistCredit, ArtistRecord, ExternalRef, ExternalSource, GenreRecord, ImageKind,
    ImageRef, SongRecord,
};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

use crate::error::NavidromeError;
use crate::types::{AlbumItem, ArtistItem, GenreItem, LoginResponse, SongItem};

/// Navidrome API connector
///
/// Stateless between calls: the session token travels in the
/// `RemoteServer` handed to every listing.
pub struct NavidromeProvider {
    http_client: Arc<dyn HttpClient>,
}

impl NavidromeProvider {
    pub fn new(http_client: Arc<dyn HttpClient>) -> Self {
        Self { http_client }
    }

    /// Execute a GET against a listing endpoint.
    ///
    /// Returns the parsed array plus the total from `x-total-count`, when
    /// the header is present and numeric.
    async fn get_list<T: DeserializeOwned>(
        &self,
        server: &RemoteServer,
        url: String,
    ) -> Result<(Vec<T>, Option<u64>)> {
        let request = HttpRequest::new(HttpMethod::Get, url)
            .header("x-nd-authorization", format!("Bearer {}", server.token))
            .header("Accept", "application/json")
            .timeout(Duration::from_secs(30));

        let response = self.http_client.execute(request).await?;
        if !response.is_success() {
            warn!(status = response.status, "Navidrome API request failed");
            return Err(NavidromeError::ApiError {
                status_code: response.status,
                message: String::from_utf8_lossy(&response.body).to_string(),
            }
            .into());
        }

        let total = Self::total_count(&response);
        let items = serde_json::from_slice(&response.body)
            .map_err(|e| NavidromeError::ParseError(e.to_string()))?;

        Ok((items, total))
    }

    fn total_count(response: &HttpResponse) -> Option<u64> {
        response
            .headers
            .get("x-total-count")
            .and_then(|v| v.parse().ok())
    }

    /// Window query-string shared by all listings
    fn page_params(page: &PageQuery) -> String {
        format!("_start={}&_end={}", page.offset, page.offset + page.limit)
    }

    fn cover_art(base_url: &str, cover_art_id: &str) -> ImageRef {
        ImageRef::new(
            format!(
                "{}/rest/getCoverArt?id={}",
                base_url,
                urlencoding::encode(cover_art_id)
            ),
            ImageKind::Primary,
        )
    }

    fn convert_artist(item: ArtistItem) -> ArtistRecord {
        let images = item
            .large_image_url
            .iter()
            // Already an absolute URL, unlike album cover art ids
            .map(|url| ImageRef::new(url.clone(), ImageKind::Primary))
            .collect();

        let externals = item
            .mbz_artist_id
            .iter()
            .map(|id| ExternalRef::new(ExternalSource::MusicBrainz, id.clone()))
            .collect();

        ArtistRecord {
            remote_id: item.id,
            name: item.name,
            biography: item.biography,
            genres: Vec::new(),
            images,
            externals,
        }
    }

    fn convert_album(base_url: &str, item: AlbumItem) -> AlbumRecord {
        let mut album_artists: Vec<ArtistCredit> = Vec::new();
        if let Some(id) = &item.album_artist_id {
            album_artists.push(ArtistCredit {
                remote_id: id.clone(),
                name: item.album_artist.clone().unwrap_or_default(),
            });
        }
        // allArtistIds lists bare ids, so those credits carry no name
        if let Some(all) = &item.all_artist_ids {
            for id in all.split(' ').filter(|s| !s.is_empty()) {
                if !album_artists.iter().any(|known| known.remote_id == id) {
                    album_artists.push(ArtistCredit {
                        remote_id: id.to_string(),
                        name: String::new(),
                    });
                }
            }
        }

        let images = item
            .cover_art_id
            .iter()
            .map(|id| Self::cover_art(base_url, id))
            .collect();
        let externals = item
            .mbz_album_id
            .iter()
            .map(|id| ExternalRef::new(ExternalSource::MusicBrainz, id.clone()))
            .collect();

        AlbumRecord {
            remote_id: item.id,
            name: item.name,
            // Navidrome reports 0 when the year is unknown
            release_year: item.min_year.filter(|y| *y != 0),
            release_date: None,
            remote_created_at: item.created_at,
            album_artists,
            genres: item.genre.into_iter().filter(|g| !g.is_empty()).collect(),
            images,
            externals,
        }
    }

    fn convert_song(item: SongItem) -> SongRecord {
        let artists = match (&item.artist_id, &item.artist) {
            (Some(id), Some(name)) => vec![ArtistCredit {
                remote_id: id.clone(),
                name: name.clone(),
            }],
            _ => Vec::new(),
        };

        let externals = item
            .mbz_track_id
            .iter()
            .map(|id| ExternalRef::new(ExternalSource::MusicBrainz, id.clone()))
            .collect();

        SongRecord {
            remote_id: item.id,
            name: item.title,
            album_remote_id: item.album_id,
            track: item.track_number,
            disc: item.disc_number,
            duration_secs: item.duration.map(|d| d as i64),
            bitrate_kbps: item.bit_rate,
            container: item.suffix,
            path: item.path,
            size_bytes: item.size,
            remote_created_at: item.created_at,
            artists,
            genres: item.genre.into_iter().filter(|g| !g.is_empty()).collect(),
            images: Vec::new(),
            externals,
        }
    }
}

#[async_trait]
impl MusicProvider for NavidromeProvider {
    fn kind(&self) -> ServerKind {
        ServerKind::Navidrome
    }

    #[instrument(skip(self, password), fields(url = %url, username = %username))]
    async fn authenticate(&self, url: &str, username: &str, password: &str) -> Result<Credential> {
        info!("Authenticating against Navidrome");

        let body = serde_json::json!({ "username": username, "password": password });
        let request =
            HttpRequest::new(HttpMethod::Post, format!("{}/auth/login", url)).json(&body)?;

        let response = self.http_client.execute(request).await?;
        if !response.is_success() {
            warn!(status = response.status, "Navidrome rejected credentials");
            return Err(NavidromeError::AuthenticationFailed(format!(
                "login returned status {}",
                response.status
            ))
            .into());
        }

        let login: LoginResponse = response
            .json()
            .map_err(|e| NavidromeError::ParseError(e.to_string()))?;

        debug!(user_id = %login.id, "Navidrome authentication succeeded");

        Ok(Credential {
            token: login.token,
            remote_user_id: Some(login.id),
        })
    }

    #[instrument(skip(self, server), fields(offset = page.offset, limit = page.limit))]
    async fn list_genres(
        &self,
        server: &RemoteServer,
        page: &PageQuery,
    ) -> Result<RecordPage<GenreRecord>> {
        let url = format!("{}/api/genre?{}", server.url, Self::page_params(page));
        let (items, total): (Vec<GenreItem>, _) = self.get_list(server, url).await?;

        let records = items
            .into_iter()
            .map(|g| GenreRecord { name: g.name })
            .collect();

        Ok(RecordPage::with_total(records, total))
    }

    #[instrument(skip(self, server), fields(offset = page.offset, limit = page.limit))]
    async fn list_artists(
        &self,
        server: &RemoteServer,
        page: &PageQuery,
    ) -> Result<RecordPage<ArtistRecord>> {
        let url = format!("{}/api/artist?{}", server.url, Self::page_params(page));
        let (items, total): (Vec<ArtistItem>, _) = self.get_list(server, url).await?;

        let records = items.into_iter().map(Self::convert_artist).collect();

        Ok(RecordPage::with_total(records, total))
    }

    #[instrument(skip(self, server), fields(offset = page.offset, limit = page.limit))]
    async fn list_albums(
        &self,
        server: &RemoteServer,
        page: &PageQuery,
    ) -> Result<RecordPage<AlbumRecord>> {
        let url = format!("{}/api/album?{}", server.url, Self::page_params(page));
        let (items, total): (Vec<AlbumItem>, _) = self.get_list(server, url).await?;

        let records = items
            .into_iter()
            .map(|item| Self::convert_album(&server.url, item))
            .collect();

        Ok(RecordPage::with_total(records, total))
    }

    #[instrument(skip(self, server), fields(offset = page.offset, limit = page.limit))]
    async fn list_songs(
        &self,
        server: &RemoteServer,
        page: &PageQuery,
    ) -> Result<RecordPage<SongRecord>> {
        let url = format!("{}/api/song?{}", server.url, Self::page_params(page));
        let (items, total): (Vec<SongItem>, _) = self.get_list(server, url).await?;

        let records = items.into_iter().map(Self::convert_song).collect();

        Ok(RecordPage::with_total(records, total))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use mockall::mock;
    use std::collections::HashMap;

    mock! {
        HttpClient {}

        #[async_trait]
        impl HttpClient for HttpClient {
            async fn execute(&self, request: HttpRequest) -> Result<HttpResponse>;
        }
    }

    fn server() -> RemoteServer {
        RemoteServer {
            url: "http://navidrome.local".to_string(),
            token: "token".to_string(),
            remote_user_id: Some("user-1".to_string()),
        }
    }

    fn ok_with_total(body: &str, total: Option<&str>) -> Result<HttpResponse> {
        let mut headers = HashMap::new();
        if let Some(total) = total {
            headers.insert("x-total-count".to_string(), total.to_string());
        }
        Ok(HttpResponse {
            status: 200,
            headers,
            body: Bytes::from(body.as_bytes().to_vec()),
        })
    }

    #[tokio::test]
    async fn test_authenticate_success() {
        let mut mock_http = MockHttpClient::new();
        mock_http.expect_execute().times(1).returning(|req| {
            assert!(req.url.ends_with("/auth/login"));
            assert_eq!(
                req.headers.get("Content-Type"),
                Some(&"application/json".to_string())
            );
            ok_with_total(r#"{"id": "user-1", "token": "session-token"}"#, None)
        });

        let provider = NavidromeProvider::new(Arc::new(mock_http));
        let credential = provider
            .authenticate("http://navidrome.local", "admin", "pw")
            .await
            .unwrap();

        assert_eq!(credential.token, "session-token");
        assert_eq!(credential.remote_user_id.as_deref(), Some("user-1"));
    }

    #[tokio::test]
    async fn test_list_genres_uses_window_params_and_bearer() {
        let mut mock_http = MockHttpClient::new();
        mock_http.expect_execute().times(1).returning(|req| {
            assert!(req.url.contains("/api/genre"));
            assert!(req.url.contains("_start=100"));
            assert!(req.url.contains("_end=150"));
            assert_eq!(
                req.headers.get("x-nd-authorization"),
                Some(&"Bearer token".to_string())
            );
            ok_with_total(r#"[{"id": "g1", "name": "Rock"}]"#, Some("101"))
        });

        let provider = NavidromeProvider::new(Arc::new(mock_http));
        let page = provider
            .list_genres(&server(), &PageQuery::new(100, 50))
            .await
            .unwrap();

        assert_eq!(page.items[0].name, "Rock");
        assert_eq!(page.total, Some(101));
    }

    #[tokio::test]
    async fn test_list_albums_merges_artist_id_lists() {
        let mut mock_http = MockHttpClient::new();
        mock_http.expect_execute().times(1).returning(|_| {
            ok_with_total(
                r#"[{
                    "id": "al1",
                    "name": "Album",
                    "albumArtist": "Band",
                    "albumArtistId": "aa1",
                    "allArtistIds": "aa1 aa2  aa3",
                    "coverArtId": "al-al1",
                    "minYear": 0,
                    "genre": "Jazz",
                    "mbzAlbumId": "mb-al-1"
                }]"#,
                Some("1"),
            )
        });

        let provider = NavidromeProvider::new(Arc::new(mock_http));
        let page = provider
            .list_albums(&server(), &PageQuery::new(0, 100))
            .await
            .unwrap();

        let album = &page.items[0];
        let ids: Vec<_> = album
            .album_artists
            .iter()
            .map(|c| c.remote_id.as_str())
            .collect();
        assert_eq!(ids, ["aa1", "aa2", "aa3"]);
        assert_eq!(album.album_artists[0].name, "Band");
        assert!(album.album_artists[1].name.is_empty());
        // minYear 0 means unknown
        assert_eq!(album.release_year, None);
        assert_eq!(album.genres, ["Jazz".to_string()]);
        assert_eq!(album.images[0].kind, ImageKind::Primary);
        assert!(album.images[0].remote_url.contains("getCoverArt?id=al-al1"));
        assert_eq!(album.externals[0].value, "mb-al-1");
    }

    #[tokio::test]
    async fn test_list_songs_maps_file_facts() {
        let mut mock_http = MockHttpClient::new();
        mock_http.expect_execute().times(1).returning(|_| {
            ok_with_total(
                r#"[{
                    "id": "s1",
                    "title": "Track",
                    "albumId": "al1",
                    "artistId": "a1",
                    "artist": "Artist",
                    "trackNumber": 2,
                    "discNumber": 1,
                    "duration": 215.68,
                    "bitRate": 320,
                    "suffix": "flac",
                    "path": "music/rock/album/track.flac",
                    "size": 31457280
                }]"#,
                Some("1"),
            )
        });

        let provider = NavidromeProvider::new(Arc::new(mock_http));
        let page = provider
            .list_songs(&server(), &PageQuery::new(0, 100))
            .await
            .unwrap();

        let song = &page.items[0];
        assert_eq!(song.album_remote_id.as_deref(), Some("al1"));
        assert_eq!(song.duration_secs, Some(215));
        assert_eq!(song.bitrate_kbps, Some(320));
        assert_eq!(song.container.as_deref(), Some("flac"));
        assert_eq!(song.artists[0].remote_id, "a1");
        assert_eq!(song.artists[0].name, "Artist");
    }

    #[tokio::test]
    async fn test_missing_total_header_yields_none() {
        let mut mock_http = MockHttpClient::new();
        mock_http
            .expect_execute()
            .times(1)
            .returning(|_| ok_with_total("[]", None));

        let provider = NavidromeProvider::new(Arc::new(mock_http));
        let page = provider
            .list_songs(&server(), &PageQuery::new(0, 100))
            .await
            .unwrap();

        assert!(page.items.is_empty());
        assert!(page.total.is_none());
    }

    #[tokio::test]
    async fn test_api_error_propagates_status() {
        let mut mock_http = MockHttpClient::new();
        mock_http.expect_execute().times(1).returning(|_| {
            Ok(HttpResponse {
                status: 500,
                headers: HashMap::new(),
                body: Bytes::from("internal error"),
            })
        });

        let provider = NavidromeProvider::new(Arc::new(mock_http));
        let result = provider.list_artists(&server(), &PageQuery::new(0, 100)).await;

        assert!(matches!(
            result,
            Err(provider_traits::ProviderError::Api { status: 500, .. })
        ));
    }
}
