use color_eyre::eyre::{Result, WrapErr};
use tokio::sync::OnceCell;

use crate::config::SpotifyConfig;
use crate::http::{ApiClient, HttpSettings, headers};
use crate::models::{Album, PlaylistRef, Track};
use crate::ports::catalog::{Catalog, Page, PageKind};
use crate::spotify_rs::client;
use crate::spotify_rs::types::{Paging, SearchHit, SpotifyAlbum, SpotifyTrack, SpotifyUser};

const PLAYLIST_BATCH_LIMIT: usize = 100;
/// A few spare candidates, so a `null` first hit does not hide a real one.
const SEARCH_LIMIT: usize = 5;

/// Spotify Web API behind the [`Catalog`] port.
pub struct SpotifyCatalog {
    api: ApiClient,
    user: OnceCell<SpotifyUser>,
}

impl SpotifyCatalog {
    pub fn new(access_token: &str, config: &SpotifyConfig, http: &HttpSettings) -> Result<Self> {
        let headers = headers(&[("authorization", format!("Bearer {access_token}"))])?;
        let api = ApiClient::new(&config.api_base_url, headers, http)
            .wrap_err("Failed to set up Spotify client")?;
        Ok(Self {
            api,
            user: OnceCell::new(),
        })
    }

    /// Current user, fetched once per instance.
    async fn user(&self) -> Result<&SpotifyUser> {
        self.user
            .get_or_try_init(|| async {
                client::get_current_user(&self.api)
                    .await
                    .wrap_err("Failed to fetch Spotify profile")
            })
            .await
    }
}

fn to_track(track: SpotifyTrack) -> Option<Track> {
    track.id.as_ref()?;
    Some(Track {
        name: track.name,
        artist: track
            .artists
            .into_iter()
            .next()
            .map(|a| a.name)
            .unwrap_or_default(),
        album: track.album.map(|a| a.name),
        isrc: track.external_ids.and_then(|ids| ids.isrc),
        duration_ms: track.duration_ms,
    })
}

fn to_album(album: SpotifyAlbum) -> Album {
    Album {
        name: album.name,
        artist: album
            .artists
            .into_iter()
            .next()
            .map(|a| a.name)
            .unwrap_or_default(),
        upc: album.external_ids.and_then(|ids| ids.upc),
    }
}

fn ids(hits: Option<Paging<Option<SearchHit>>>) -> Vec<String> {
    hits.map(|page| page.items.into_iter().flatten().map(|hit| hit.id).collect())
        .unwrap_or_default()
}

/// Strip characters Spotify treats as field syntax inside a search value.
fn search_value(value: &str) -> String {
    value.replace([':', '"'], " ").trim().to_string()
}

#[async_trait::async_trait]
impl Catalog for SpotifyCatalog {
    fn name(&self) -> &'static str {
        "Spotify"
    }

    async fn verify(&self) -> Result<String> {
        let user = self.user().await?;
        Ok(user.display_name.clone().unwrap_or_else(|| user.id.clone()))
    }

    fn page_size(&self, kind: PageKind) -> usize {
        match kind {
            PageKind::LikedSongs | PageKind::Playlists | PageKind::SavedAlbums => 50,
            PageKind::PlaylistTracks => 100,
        }
    }

    fn playlist_batch_limit(&self) -> usize {
        PLAYLIST_BATCH_LIMIT
    }

    async fn liked_songs_page(&self, offset: usize, limit: usize) -> Result<Page<Track>> {
        let page = client::get_saved_tracks(&self.api, offset, limit).await?;
        let fetched = page.items.len();
        let items = page
            .items
            .into_iter()
            .filter_map(|item| item.track.and_then(to_track))
            .collect();
        Ok(Page { items, fetched })
    }

    async fn playlists_page(&self, offset: usize, limit: usize) -> Result<Page<PlaylistRef>> {
        let user_id = self.user().await?.id.clone();
        let page = client::get_user_playlists(&self.api, offset, limit).await?;
        let fetched = page.items.len();
        let items = page
            .items
            .into_iter()
            .filter(|playlist| {
                let owned = playlist.owner.id == user_id;
                if !owned {
                    tracing::debug!(
                        "Skipping playlist '{}' owned by {}",
                        playlist.name,
                        playlist.owner.id
                    );
                }
                owned
            })
            .map(|playlist| PlaylistRef {
                id: playlist.id,
                name: playlist.name,
                description: playlist.description.filter(|d| !d.is_empty()),
            })
            .collect();
        Ok(Page { items, fetched })
    }

    async fn playlist_tracks_page(
        &self,
        playlist_id: &str,
        offset: usize,
        limit: usize,
    ) -> Result<Page<Track>> {
        let page = client::get_playlist_items(&self.api, playlist_id, offset, limit).await?;
        let fetched = page.items.len();
        let items = page
            .items
            .into_iter()
            .filter_map(|item| item.track.and_then(to_track))
            .collect();
        Ok(Page { items, fetched })
    }

    async fn saved_albums_page(&self, offset: usize, limit: usize) -> Result<Page<Album>> {
        let page = client::get_saved_albums(&self.api, offset, limit).await?;
        let items = page.items.into_iter().map(|saved| to_album(saved.album)).collect();
        Ok(Page::unfiltered(items))
    }

    async fn search_track_by_code(&self, isrc: &str) -> Result<Vec<String>> {
        let query = format!("isrc:{isrc}");
        let response = client::search(&self.api, &query, "track", SEARCH_LIMIT).await?;
        Ok(ids(response.tracks))
    }

    async fn search_track_by_text(&self, track: &Track) -> Result<Vec<String>> {
        let query = format!(
            "track:{} artist:{}",
            search_value(&track.name),
            search_value(&track.artist)
        );
        let response = client::search(&self.api, &query, "track", SEARCH_LIMIT).await?;
        Ok(ids(response.tracks))
    }

    async fn search_album_by_code(&self, upc: &str) -> Result<Vec<String>> {
        let query = format!("upc:{upc}");
        let response = client::search(&self.api, &query, "album", SEARCH_LIMIT).await?;
        Ok(ids(response.albums))
    }

    async fn search_album_by_text(&self, album: &Album) -> Result<Vec<String>> {
        let query = format!(
            "album:{} artist:{}",
            search_value(&album.name),
            search_value(&album.artist)
        );
        let response = client::search(&self.api, &query, "album", SEARCH_LIMIT).await?;
        Ok(ids(response.albums))
    }

    async fn like_track(&self, track_id: &str) -> Result<()> {
        client::save_tracks(&self.api, &[track_id.to_string()]).await?;
        Ok(())
    }

    async fn save_album(&self, album_id: &str) -> Result<()> {
        client::save_albums(&self.api, &[album_id.to_string()]).await?;
        Ok(())
    }

    async fn create_playlist<'a>(
        &self,
        name: &str,
        description: Option<&'a str>,
    ) -> Result<String> {
        let user_id = self.user().await?.id.clone();
        let created =
            client::create_playlist(&self.api, &user_id, name, description.unwrap_or_default())
                .await?;
        Ok(created.id)
    }

    async fn add_to_playlist(&self, playlist_id: &str, track_ids: &[String]) -> Result<()> {
        let uris: Vec<String> = track_ids
            .iter()
            .map(|id| format!("spotify:track:{id}"))
            .collect();
        client::add_playlist_items(&self.api, playlist_id, &uris).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn catalog(server: &MockServer) -> SpotifyCatalog {
        let config = SpotifyConfig {
            access_token: None,
            api_base_url: format!("{}/v1", server.uri()),
        };
        let http = HttpSettings {
            max_retries: 0,
            requests_per_second: 1000,
            ..HttpSettings::default()
        };
        SpotifyCatalog::new("sp-token", &config, &http).unwrap()
    }

    async fn mount_me(server: &MockServer) {
        Mock::given(method("GET"))
            .and(path("/v1/me"))
            .and(header("authorization", "Bearer sp-token"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"id": "alice", "display_name": "Alice"})),
            )
            .expect(1)
            .mount(server)
            .await;
    }

    fn track_json(id: Option<&str>, name: &str, isrc: Option<&str>) -> serde_json::Value {
        json!({
            "id": id,
            "name": name,
            "artists": [{"name": "Band"}, {"name": "Guest"}],
            "album": {"name": "Record"},
            "duration_ms": 200000,
            "external_ids": {"isrc": isrc},
        })
    }

    #[tokio::test]
    async fn test_verify_fetches_profile_once() {
        let server = MockServer::start().await;
        mount_me(&server).await;
        let catalog = catalog(&server);

        assert_eq!(catalog.verify().await.unwrap(), "Alice");
        assert_eq!(catalog.verify().await.unwrap(), "Alice");
    }

    #[tokio::test]
    async fn test_liked_songs_page_skips_null_tracks_but_counts_them() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/me/tracks"))
            .and(query_param("offset", "50"))
            .and(query_param("limit", "50"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "items": [
                    {"track": track_json(Some("t1"), "Song", Some("USRC1"))},
                    {"track": null},
                    {"track": track_json(None, "Local file", None)},
                ]
            })))
            .mount(&server)
            .await;
        let catalog = catalog(&server);

        let page = catalog.liked_songs_page(50, 50).await.unwrap();

        assert_eq!(page.fetched, 3);
        assert_eq!(page.items.len(), 1);
        let track = &page.items[0];
        assert_eq!(track.artist, "Band");
        assert_eq!(track.album.as_deref(), Some("Record"));
        assert_eq!(track.isrc.as_deref(), Some("USRC1"));
    }

    #[tokio::test]
    async fn test_playlists_page_keeps_only_owned() {
        let server = MockServer::start().await;
        mount_me(&server).await;
        Mock::given(method("GET"))
            .and(path("/v1/me/playlists"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "items": [
                    {"id": "p1", "name": "Mine", "description": "", "owner": {"id": "alice"}},
                    {"id": "p2", "name": "Followed", "description": null, "owner": {"id": "bob"}},
                ]
            })))
            .mount(&server)
            .await;
        let catalog = catalog(&server);

        let page = catalog.playlists_page(0, 50).await.unwrap();

        assert_eq!(page.fetched, 2);
        assert_eq!(
            page.items,
            vec![PlaylistRef {
                id: "p1".into(),
                name: "Mine".into(),
                description: None,
            }]
        );
    }

    #[tokio::test]
    async fn test_isrc_search_query() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/search"))
            .and(query_param("q", "isrc:USRC17607839"))
            .and(query_param("type", "track"))
            .and(query_param("limit", "5"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"tracks": {"items": [{"id": "abc"}]}})),
            )
            .expect(1)
            .mount(&server)
            .await;
        let catalog = catalog(&server);

        let ids = catalog.search_track_by_code("USRC17607839").await.unwrap();
        assert_eq!(ids, vec!["abc"]);
    }

    #[tokio::test]
    async fn test_null_search_hits_are_skipped() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/search"))
            .and(query_param("q", "upc:00602537518357"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"albums": {"items": [null, {"id": "alb-1"}, null]}})),
            )
            .expect(1)
            .mount(&server)
            .await;
        let catalog = catalog(&server);

        let ids = catalog.search_album_by_code("00602537518357").await.unwrap();
        assert_eq!(ids, vec!["alb-1"]);
    }

    #[tokio::test]
    async fn test_text_search_query() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/search"))
            .and(query_param("q", "album:Record artist:Band"))
            .and(query_param("type", "album"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"albums": {"items": []}})),
            )
            .expect(1)
            .mount(&server)
            .await;
        let catalog = catalog(&server);

        let ids = catalog
            .search_album_by_text(&Album::new("Record", "Band"))
            .await
            .unwrap();
        assert!(ids.is_empty());
    }

    #[tokio::test]
    async fn test_create_and_populate_playlist() {
        let server = MockServer::start().await;
        mount_me(&server).await;
        Mock::given(method("POST"))
            .and(path("/v1/users/alice/playlists"))
            .and(body_json(json!({"name": "Road Trip", "description": "", "public": false})))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({"id": "new-pl"})))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/v1/playlists/new-pl/tracks"))
            .and(body_json(json!({"uris": ["spotify:track:a", "spotify:track:b"]})))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({"snapshot_id": "s"})))
            .expect(1)
            .mount(&server)
            .await;
        let catalog = catalog(&server);

        let id = catalog.create_playlist("Road Trip", None).await.unwrap();
        assert_eq!(id, "new-pl");
        catalog
            .add_to_playlist(&id, &["a".to_string(), "b".to_string()])
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_like_track_uses_put() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path("/v1/me/tracks"))
            .and(query_param("ids", "abc"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;
        let catalog = catalog(&server);

        catalog.like_track("abc").await.unwrap();
    }

    #[tokio::test]
    async fn test_unauthorized_verify_fails() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/me"))
            .respond_with(ResponseTemplate::new(401).set_body_string("invalid token"))
            .mount(&server)
            .await;
        let catalog = catalog(&server);

        let err = catalog.verify().await.unwrap_err();
        assert!(format!("{err:#}").contains("401"));
    }
}
