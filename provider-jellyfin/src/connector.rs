//! Jellyfin API connector implementation
//!
//! Implements the `MusicProvider` trait against the Jellyfin HTTP API.

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

use crate::error::JellyfinError;
use crate::types::{
    AlbumItem, ArtistItem, AuthenticationResult, ExternalUrl, GenreItem, ItemsPage, SongItem,
};

/// Identity Jellyfin requires on the authentication request
const CLIENT_IDENTITY: &str = "MediaBrowser Client=\"library-sync-engine\", \
     Device=\"server\", DeviceId=\"library-sync-engine\", Version=\"0.1.0\"";

/// Extra fields requested on artist and album listings
const LISTING_FIELDS: &str = "Genres,DateCreated,ExternalUrls,Overview";

/// Extra fields requested on song listings
const SONG_FIELDS: &str = "Genres,DateCreated,ExternalUrls,MediaSources";

/// One second expressed in Jellyfin's 100ns ticks
const TICKS_PER_SECOND: i64 = 10_000_000;

/// Jellyfin API connector
///
/// Stateless between calls: the session token and user id travel in the
/// `RemoteServer` handed to every listing.
///
/// # Example
///
/// ```ignore
/// use provider_jellyfin::JellyfinProvider;
/// use provider_traits::{MusicProvider, PageQuery};
///
/// let provider = JellyfinProvider::new(http_client);
/// let credential = provider.authenticate(url, username, password).await?;
/// let page = provider.list_genres(&server, &PageQuery::new(0, 500)).await?;
/// ```
pub struct JellyfinProvider {
    http_client: Arc<dyn HttpClient>,
}

impl JellyfinProvider {
    pub fn new(http_client: Arc<dyn HttpClient>) -> Self {
        Self { http_client }
    }

    /// Execute a GET carrying the session token and parse the JSON body
    async fn get_json<T: DeserializeOwned>(&self, server: &RemoteServer, url: String) -> Result<T> {
        let request = HttpRequest::new(HttpMethod::Get, url)
            .header("X-MediaBrowser-Token", &server.token)
            .header("Accept", "application/json")
            .timeout(Duration::from_secs(30));

        let response = self.http_client.execute(request).await?;
        Self::parse_json(&response)
    }

    fn parse_json<T: DeserializeOwned>(response: &HttpResponse) -> Result<T> {
        if !response.is_success() {
            warn!(status = response.status, "Jellyfin API request failed");
            return Err(JellyfinError::ApiError {
                status_code: response.status,
                message: String::from_utf8_lossy(&response.body).to_string(),
            }
            .into());
        }

        serde_json::from_slice(&response.body)
            .map_err(|e| JellyfinError::ParseError(e.to_string()).into())
    }

    /// Paging and scoping query-string suffix shared by all listings
    fn page_params(page: &PageQuery) -> String {
        let mut params = format!("StartIndex={}&Limit={}", page.offset, page.limit);
        if let Some(parent) = &page.parent_remote_id {
            params.push_str(&format!("&ParentId={}", urlencoding::encode(parent)));
        }
        params
    }

    /// The user id item listings are scoped by
    fn user_id(server: &RemoteServer) -> Result<&str> {
        server.remote_user_id.as_deref().ok_or_else(|| {
            JellyfinError::AuthenticationFailed(
                "server has no authenticated user id".to_string(),
            )
            .into()
        })
    }

    /// Build image references from an item's tag sets
    fn image_refs(
        base_url: &str,
        item_id: &str,
        image_tags: &std::collections::HashMap<String, String>,
        backdrop_tags: &[String],
    ) -> Vec<ImageRef> {
        let mut images = Vec::new();

        if let Some(tag) = image_tags.get("Primary") {
            images.push(ImageRef::new(
                format!("{}/items/{}/images/Primary?tag={}", base_url, item_id, tag),
                ImageKind::Primary,
            ));
        }
        if let Some(tag) = image_tags.get("Logo") {
            images.push(ImageRef::new(
                format!("{}/items/{}/images/Logo?tag={}", base_url, item_id, tag),
                ImageKind::Logo,
            ));
        }
        if let Some(tag) = backdrop_tags.first() {
            images.push(ImageRef::new(
                format!("{}/items/{}/images/Backdrop?tag={}", base_url, item_id, tag),
                ImageKind::Backdrop,
            ));
        }

        images
    }

    /// Build external references from Jellyfin's named URL list.
    ///
    /// The catalog id is the last path segment of the linked URL.
    fn external_refs(urls: &[ExternalUrl]) -> Vec<ExternalRef> {
        urls.iter()
            .filter_map(|link| {
                let source = match link.name.as_str() {
                    "MusicBrainz" => ExternalSource::MusicBrainz,
                    "TheAudioDb" => ExternalSource::TheAudioDb,
                    _ => return None,
                };
                let value = link.url.rsplit('/').next()?;
                if value.is_empty() {
                    return None;
                }
                Some(ExternalRef::new(source, value))
            })
            .collect()
    }

    fn convert_artist(base_url: &str, item: ArtistItem) -> ArtistRecord {
        let images =
            Self::image_refs(base_url, &item.id, &item.image_tags, &item.backdrop_image_tags);
        let externals = Self::external_refs(&item.external_urls);

        ArtistRecord {
            remote_id: item.id,
            name: item.name,
            biography: item.overview,
            genres: item.genres,
            images,
            externals,
        }
    }

    fn convert_album(base_url: &str, item: AlbumItem) -> AlbumRecord {
        let images =
            Self::image_refs(base_url, &item.id, &item.image_tags, &item.backdrop_image_tags);
        let externals = Self::external_refs(&item.external_urls);

        AlbumRecord {
            remote_id: item.id,
            name: item.name,
            release_year: item.production_year,
            release_date: item.premiere_date,
            remote_created_at: item.date_created,
            album_artists: item
                .album_artists
                .into_iter()
                .map(|a| ArtistCredit {
                    remote_id: a.id,
                    name: a.name,
                })
                .collect(),
            genres: item.genres,
            images,
            externals,
        }
    }

    fn convert_song(base_url: &str, item: SongItem) -> SongRecord {
        let images = Self::image_refs(base_url, &item.id, &item.image_tags, &[]);
        let externals = Self::external_refs(&item.external_urls);
        let media = item.media_sources.first();

        SongRecord {
            remote_id: item.id,
            name: item.name,
            album_remote_id: item.album_id,
            track: item.index_number,
            disc: item.parent_index_number,
            duration_secs: item.run_time_ticks.map(|t| t / TICKS_PER_SECOND),
            bitrate_kbps: media.and_then(|m| m.bitrate).map(|b| b / 1000),
            container: media.and_then(|m| m.container.clone()),
            path: media.and_then(|m| m.path.clone()),
            size_bytes: media.and_then(|m| m.size),
            remote_created_at: item.date_created,
            artists: item
                .artist_items
                .into_iter()
                .map(|a| ArtistCredit {
                    remote_id: a.id,
                    name: a.name,
                })
                .collect(),
            genres: item.genres,
            images,
            externals,
        }
    }
}

#[async_trait]
impl MusicProvider for JellyfinProvider {
    fn kind(&self) -> ServerKind {
        ServerKind::Jellyfin
    }

    #[instrument(skip(self, password), fields(url = %url, username = %username))]
    async fn authenticate(&self, url: &str, username: &str, password: &str) -> Result<Credential> {
        info!("Authenticating against Jellyfin");

        let body = serde_json::json!({ "Username": username, "Pw": password });
        let request = HttpRequest::new(
            HttpMethod::Post,
            format!("{}/users/authenticatebyname", url),
        )
        .header("X-Emby-Authorization", CLIENT_IDENTITY)
        .json(&body)?;

        let response = self.http_client.execute(request).await?;
        if !response.is_success() {
            warn!(status = response.status, "Jellyfin rejected credentials");
            return Err(JellyfinError::AuthenticationFailed(format!(
                "authentication returned status {}",
                response.status
            ))
            .into());
        }

        let auth: AuthenticationResult = response
            .json()
            .map_err(|e| JellyfinError::ParseError(e.to_string()))?;

        debug!(user_id = %auth.user.id, "Jellyfin authentication succeeded");

        Ok(Credential {
            token: auth.access_token,
            remote_user_id: Some(auth.user.id),
        })
    }

    #[instrument(skip(self, server), fields(offset = page.offset, limit = page.limit))]
    async fn list_genres(
        &self,
        server: &RemoteServer,
        page: &PageQuery,
    ) -> Result<RecordPage<GenreRecord>> {
        let url = format!("{}/genres?{}", server.url, Self::page_params(page));
        let response: ItemsPage<GenreItem> = self.get_json(server, url).await?;

        let items = response
            .items
            .into_iter()
            .map(|g| GenreRecord { name: g.name })
            .collect();

        Ok(RecordPage::with_total(items, response.total_record_count))
    }

    #[instrument(skip(self, server), fields(offset = page.offset, limit = page.limit))]
    async fn list_artists(
        &self,
        server: &RemoteServer,
        page: &PageQuery,
    ) -> Result<RecordPage<ArtistRecord>> {
        let url = format!(
            "{}/artists/albumArtists?Fields={}&{}",
            server.url,
            LISTING_FIELDS,
            Self::page_params(page)
        );
        let response: ItemsPage<ArtistItem> = self.get_json(server, url).await?;

        let items = response
            .items
            .into_iter()
            .map(|item| Self::convert_artist(&server.url, item))
            .collect();

        Ok(RecordPage::with_total(items, response.total_record_count))
    }

    #[instrument(skip(self, server), fields(offset = page.offset, limit = page.limit))]
    async fn list_albums(
        &self,
        server: &RemoteServer,
        page: &PageQuery,
    ) -> Result<RecordPage<AlbumRecord>> {
        let user_id = Self::user_id(server)?;
        let url = format!(
            "{}/users/{}/items?IncludeItemTypes=MusicAlbum&Recursive=true&Fields={}&{}",
            server.url,
            user_id,
            LISTING_FIELDS,
            Self::page_params(page)
        );
        let response: ItemsPage<AlbumItem> = self.get_json(server, url).await?;

        let items = response
            .items
            .into_iter()
            .map(|item| Self::convert_album(&server.url, item))
            .collect();

        Ok(RecordPage::with_total(items, response.total_record_count))
    }

    #[instrument(skip(self, server), fields(offset = page.offset, limit = page.limit))]
    async fn list_songs(
        &self,
        server: &RemoteServer,
        page: &PageQuery,
    ) -> Result<RecordPage<SongRecord>> {
        let user_id = Self::user_id(server)?;
        let url = format!(
            "{}/users/{}/items?IncludeItemTypes=Audio&Recursive=true&Fields={}&{}",
            server.url,
            user_id,
            SONG_FIELDS,
            Self::page_params(page)
        );
        let response: ItemsPage<SongItem> = self.get_json(server, url).await?;

        let items = response
            .items
            .into_iter()
            .map(|item| Self::convert_song(&server.url, item))
            .collect();

        Ok(RecordPage::with_total(items, response.total_record_count))
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
            url: "http://jellyfin.local".to_string(),
            token: "token".to_string(),
            remote_user_id: Some("user-1".to_string()),
        }
    }

    fn ok(body: &str) -> Result<HttpResponse> {
        Ok(HttpResponse {
            status: 200,
            headers: HashMap::new(),
            body: Bytes::from(body.as_bytes().to_vec()),
        })
    }

    #[tokio::test]
    async fn test_authenticate_success() {
        let mut mock_http = MockHttpClient::new();
        mock_http.expect_execute().times(1).returning(|req| {
            assert!(req.url.ends_with("/users/authenticatebyname"));
            assert!(req.headers.contains_key("X-Emby-Authorization"));
            ok(r#"{"User": {"Id": "user-1"}, "AccessToken": "session-token"}"#)
        });

        let provider = JellyfinProvider::new(Arc::new(mock_http));
        let credential = provider
            .authenticate("http://jellyfin.local", "admin", "pw")
            .await
            .unwrap();

        assert_eq!(credential.token, "session-token");
        assert_eq!(credential.remote_user_id.as_deref(), Some("user-1"));
    }

    #[tokio::test]
    async fn test_authenticate_rejected() {
        let mut mock_http = MockHttpClient::new();
        mock_http.expect_execute().times(1).returning(|_| {
            Ok(HttpResponse {
                status: 401,
                headers: HashMap::new(),
                body: Bytes::new(),
            })
        });

        let provider = JellyfinProvider::new(Arc::new(mock_http));
        let result = provider
            .authenticate("http://jellyfin.local", "admin", "wrong")
            .await;

        assert!(matches!(
            result,
            Err(provider_traits::ProviderError::AuthenticationFailed(_))
        ));
    }

    #[tokio::test]
    async fn test_list_genres_sends_token_and_paging() {
        let mut mock_http = MockHttpClient::new();
        mock_http.expect_execute().times(1).returning(|req| {
            assert_eq!(
                req.headers.get("X-MediaBrowser-Token"),
                Some(&"token".to_string())
            );
            assert!(req.url.contains("StartIndex=10"));
            assert!(req.url.contains("Limit=5"));
            ok(r#"{"Items": [{"Id": "g1", "Name": "Rock"}], "TotalRecordCount": 11}"#)
        });

        let provider = JellyfinProvider::new(Arc::new(mock_http));
        let page = provider
            .list_genres(&server(), &PageQuery::new(10, 5))
            .await
            .unwrap();

        assert_eq!(page.items.len(), 1);
        assert_eq!(page.items[0].name, "Rock");
        assert_eq!(page.total, Some(11));
    }

    #[tokio::test]
    async fn test_list_albums_scopes_to_user_and_parent() {
        let mut mock_http = MockHttpClient::new();
        mock_http.expect_execute().times(1).returning(|req| {
            assert!(req.url.contains("/users/user-1/items"));
            assert!(req.url.contains("IncludeItemTypes=MusicAlbum"));
            assert!(req.url.contains("ParentId=lib%201"));
            ok(r#"{
                "Items": [{
                    "Id": "al1",
                    "Name": "Album",
                    "ProductionYear": 1997,
                    "AlbumArtists": [{"Id": "aa1", "Name": "Band"}],
                    "Genres": ["Rock"],
                    "ExternalUrls": [
                        {"Name": "MusicBrainz", "Url": "https://musicbrainz.org/release/mb-al-1"}
                    ]
                }],
                "TotalRecordCount": 1
            }"#)
        });

        let provider = JellyfinProvider::new(Arc::new(mock_http));
        let page = provider
            .list_albums(&server(), &PageQuery::new(0, 100).with_parent("lib 1"))
            .await
            .unwrap();

        let album = &page.items[0];
        assert_eq!(album.remote_id, "al1");
        assert_eq!(album.release_year, Some(1997));
        assert_eq!(album.album_artists.len(), 1);
        assert_eq!(album.album_artists[0].remote_id, "aa1");
        assert_eq!(album.album_artists[0].name, "Band");
        assert_eq!(album.externals[0].value, "mb-al-1");
    }

    #[tokio::test]
    async fn test_list_albums_without_user_id_fails() {
        let provider = JellyfinProvider::new(Arc::new(MockHttpClient::new()));
        let mut server = server();
        server.remote_user_id = None;

        let result = provider.list_albums(&server, &PageQuery::new(0, 100)).await;
        assert!(matches!(
            result,
            Err(provider_traits::ProviderError::AuthenticationFailed(_))
        ));
    }

    #[tokio::test]
    async fn test_list_songs_maps_media_source_and_ticks() {
        let mut mock_http = MockHttpClient::new();
        mock_http.expect_execute().times(1).returning(|req| {
            assert!(req.url.contains("IncludeItemTypes=Audio"));
            assert!(req.url.contains("MediaSources"));
            ok(r#"{
                "Items": [{
                    "Id": "s1",
                    "Name": "Track",
                    "AlbumId": "al1",
                    "IndexNumber": 3,
                    "ParentIndexNumber": 1,
                    "RunTimeTicks": 2150000000,
                    "ArtistItems": [{"Id": "a1", "Name": "Artist"}],
                    "MediaSources": [{
                        "Path": "music/rock/album/track.flac",
                        "Container": "flac",
                        "Size": 31457280,
                        "Bitrate": 1024000
                    }]
                }],
                "TotalRecordCount": 1
            }"#)
        });

        let provider = JellyfinProvider::new(Arc::new(mock_http));
        let page = provider
            .list_songs(&server(), &PageQuery::new(0, 100))
            .await
            .unwrap();

        let song = &page.items[0];
        assert_eq!(song.album_remote_id.as_deref(), Some("al1"));
        assert_eq!(song.track, Some(3));
        assert_eq!(song.disc, Some(1));
        assert_eq!(song.duration_secs, Some(215));
        assert_eq!(song.bitrate_kbps, Some(1024));
        assert_eq!(song.path.as_deref(), Some("music/rock/album/track.flac"));
        assert_eq!(song.container.as_deref(), Some("flac"));
        assert_eq!(song.artists[0].remote_id, "a1");
    }

    #[tokio::test]
    async fn test_image_and_external_mapping() {
        let mut tags = HashMap::new();
        tags.insert("Primary".to_string(), "tag-p".to_string());
        tags.insert("Logo".to_string(), "tag-l".to_string());
        let backdrops = vec!["tag-b".to_string()];

        let images = JellyfinProvider::image_refs("http://j", "it1", &tags, &backdrops);
        assert_eq!(images.len(), 3);
        assert!(images
            .iter()
            .any(|i| i.kind == ImageKind::Primary && i.remote_url.contains("Primary?tag=tag-p")));

        let externals = JellyfinProvider::external_refs(&[
            ExternalUrl {
                name: "MusicBrainz".to_string(),
                url: "https://musicbrainz.org/artist/mbid-1".to_string(),
            },
            ExternalUrl {
                name: "IMDb".to_string(),
                url: "https://imdb.com/x".to_string(),
            },
        ]);
        assert_eq!(externals.len(), 1);
        assert_eq!(externals[0].value, "mbid-1");
    }

    #[tokio::test]
    async fn test_api_error_propagates_status() {
        let mut mock_http = MockHttpClient::new();
        mock_http.expect_execute().times(1).returning(|_| {
            Ok(HttpResponse {
                status: 503,
                headers: HashMap::new(),
                body: Bytes::from("down for maintenance"),
            })
        });

        let provider = JellyfinProvider::new(Arc::new(mock_http));
        let result = provider.list_genres(&server(), &PageQuery::new(0, 100)).await;

        match result {
            Err(provider_traits::ProviderError::Api { status, .. }) => assert_eq!(status, 503),
            other => panic!("expected Api error, got {:?}", other.map(|p| p.items.len())),
        }
    }
}
