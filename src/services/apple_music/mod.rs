use color_eyre::eyre::{OptionExt, Result, WrapErr};

use crate::apple_music_rs::client;
use crate::apple_music_rs::types::{LibrarySong, ResourceId, ResourceList};
use crate::config::AppleMusicConfig;
use crate::http::{ApiClient, HttpSettings, headers};
use crate::models::{Album, PlaylistRef, Track};
use crate::ports::catalog::{Catalog, Page, PageKind};

const PAGE_SIZE: usize = 100;
const PLAYLIST_BATCH_LIMIT: usize = 100;

/// Apple Music API behind the [`Catalog`] port.
pub struct AppleMusicCatalog {
    api: ApiClient,
    storefront: String,
}

impl AppleMusicCatalog {
    pub fn new(
        developer_token: &str,
        user_token: &str,
        config: &AppleMusicConfig,
        http: &HttpSettings,
    ) -> Result<Self> {
        let headers = headers(&[
            ("authorization", format!("Bearer {developer_token}")),
            ("music-user-token", user_token.to_string()),
        ])?;
        let api = ApiClient::new(&config.api_base_url, headers, http)
            .wrap_err("Failed to set up Apple Music client")?;
        Ok(Self {
            api,
            storefront: config.storefront.clone(),
        })
    }
}

/// Library entries without attributes carry nothing to match on and are dropped.
fn song_page(list: ResourceList<LibrarySong>) -> Page<Track> {
    let fetched = list.data.len();
    let items = list
        .data
        .into_iter()
        .filter_map(|song| song.attributes)
        .map(|attrs| Track {
            name: attrs.name,
            artist: attrs.artist_name,
            album: attrs.album_name,
            isrc: attrs.isrc,
            duration_ms: attrs.duration_in_millis,
        })
        .collect();
    Page { items, fetched }
}

fn ids(list: Option<ResourceList<ResourceId>>) -> Vec<String> {
    list.map(|list| list.data.into_iter().map(|r| r.id).collect())
        .unwrap_or_default()
}

#[async_trait::async_trait]
impl Catalog for AppleMusicCatalog {
    fn name(&self) -> &'static str {
        "Apple Music"
    }

    async fn verify(&self) -> Result<String> {
        let storefronts = client::get_storefront(&self.api)
            .await
            .wrap_err("Failed to fetch Apple Music storefront")?;
        let storefront = storefronts
            .data
            .into_iter()
            .next()
            .ok_or_eyre("Apple Music returned no storefront for this account")?;
        let name = storefront
            .attributes
            .map(|a| a.name)
            .unwrap_or_else(|| storefront.id.clone());
        Ok(format!("{} storefront", name))
    }

    fn page_size(&self, _kind: PageKind) -> usize {
        PAGE_SIZE
    }

    fn playlist_batch_limit(&self) -> usize {
        PLAYLIST_BATCH_LIMIT
    }

    async fn liked_songs_page(&self, offset: usize, limit: usize) -> Result<Page<Track>> {
        let list = client::get_library_songs(&self.api, offset, limit).await?;
        Ok(song_page(list))
    }

    async fn playlists_page(&self, offset: usize, limit: usize) -> Result<Page<PlaylistRef>> {
        let list = client::get_library_playlists(&self.api, offset, limit).await?;
        let fetched = list.data.len();
        let items = list
            .data
            .into_iter()
            .filter_map(|playlist| {
                let attrs = playlist.attributes?;
                if attrs.can_edit == Some(false) {
                    tracing::debug!("Skipping read-only playlist '{}'", attrs.name);
                    return None;
                }
                Some(PlaylistRef {
                    id: playlist.id,
                    name: attrs.name,
                    description: attrs
                        .description
                        .and_then(|d| d.standard)
                        .filter(|d| !d.is_empty()),
                })
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
        let list =
            client::get_library_playlist_tracks(&self.api, playlist_id, offset, limit).await?;
        Ok(song_page(list))
    }

    async fn saved_albums_page(&self, offset: usize, limit: usize) -> Result<Page<Album>> {
        let list = client::get_library_albums(&self.api, offset, limit).await?;
        let fetched = list.data.len();
        let items = list
            .data
            .into_iter()
            .filter_map(|album| album.attributes)
            .map(|attrs| Album {
                name: attrs.name,
                artist: attrs.artist_name,
                upc: attrs.upc,
            })
            .collect();
        Ok(Page { items, fetched })
    }

    async fn search_track_by_code(&self, isrc: &str) -> Result<Vec<String>> {
        let list = client::get_songs_by_isrc(&self.api, &self.storefront, isrc).await?;
        Ok(ids(Some(list)))
    }

    async fn search_track_by_text(&self, track: &Track) -> Result<Vec<String>> {
        let term = format!("{} {}", track.name, track.artist);
        let response =
            client::search_catalog(&self.api, &self.storefront, term.trim(), "songs", 1).await?;
        Ok(ids(response.results.songs))
    }

    async fn search_album_by_code(&self, upc: &str) -> Result<Vec<String>> {
        let list = client::get_albums_by_upc(&self.api, &self.storefront, upc).await?;
        Ok(ids(Some(list)))
    }

    async fn search_album_by_text(&self, album: &Album) -> Result<Vec<String>> {
        let term = format!("{} {}", album.name, album.artist);
        let response =
            client::search_catalog(&self.api, &self.storefront, term.trim(), "albums", 1).await?;
        Ok(ids(response.results.albums))
    }

    async fn like_track(&self, track_id: &str) -> Result<()> {
        client::add_to_library(&self.api, "songs", &[track_id.to_string()]).await?;
        Ok(())
    }

    async fn save_album(&self, album_id: &str) -> Result<()> {
        client::add_to_library(&self.api, "albums", &[album_id.to_string()]).await?;
        Ok(())
    }

    async fn create_playlist<'a>(
        &self,
        name: &str,
        description: Option<&'a str>,
    ) -> Result<String> {
        let created =
            client::create_library_playlist(&self.api, name, description.unwrap_or_default())
                .await?;
        let playlist = created
            .data
            .into_iter()
            .next()
            .ok_or_eyre("Apple Music did not return the new playlist")?;
        Ok(playlist.id)
    }

    async fn add_to_playlist(&self, playlist_id: &str, track_ids: &[String]) -> Result<()> {
        client::add_tracks_to_playlist(&self.api, playlist_id, track_ids).await?;
        Ok(())
    }
}
