use color_eyre::eyre::Result;

use crate::models::{Album, PlaylistRef, Track};

/// The collections a catalog can page through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageKind {
    LikedSongs,
    Playlists,
    PlaylistTracks,
    SavedAlbums,
}

/// One page of a library collection.
///
/// `fetched` is the number of records the service returned before any
/// filtering, so `items.len()` may be smaller. Pagination decisions are made
/// on `fetched`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub fetched: usize,
}

impl<T> Page<T> {
    /// A page where nothing was filtered out.
    pub fn unfiltered(items: Vec<T>) -> Self {
        let fetched = items.len();
        Self { items, fetched }
    }

    #[cfg(test)]
    pub fn empty() -> Self {
        Self {
            items: Vec::new(),
            fetched: 0,
        }
    }
}

/// Port trait wrapping the low-level capabilities of one music service.
///
/// Implementations live in `services::spotify` and `services::apple_music`
/// (production) or test fakes. Everything above this trait is service-agnostic.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait Catalog: Send + Sync {
    /// Human readable service name, used in logs and summaries.
    fn name(&self) -> &'static str;

    /// Check the credentials work. Returns a display name for the account.
    async fn verify(&self) -> Result<String>;

    /// Page size requested for the given collection.
    fn page_size(&self, kind: PageKind) -> usize;

    /// Maximum number of tracks accepted by one `add_to_playlist` call.
    fn playlist_batch_limit(&self) -> usize;

    async fn liked_songs_page(&self, offset: usize, limit: usize) -> Result<Page<Track>>;

    async fn playlists_page(&self, offset: usize, limit: usize) -> Result<Page<PlaylistRef>>;

    async fn playlist_tracks_page(
        &self,
        playlist_id: &str,
        offset: usize,
        limit: usize,
    ) -> Result<Page<Track>>;

    async fn saved_albums_page(&self, offset: usize, limit: usize) -> Result<Page<Album>>;

    /// Exact lookup by ISRC. Returns candidate catalog ids, best first.
    async fn search_track_by_code(&self, isrc: &str) -> Result<Vec<String>>;

    /// Free-text lookup built from the track's name and artist.
    async fn search_track_by_text(&self, track: &Track) -> Result<Vec<String>>;

    /// Exact lookup by UPC.
    async fn search_album_by_code(&self, upc: &str) -> Result<Vec<String>>;

    async fn search_album_by_text(&self, album: &Album) -> Result<Vec<String>>;

    async fn like_track(&self, track_id: &str) -> Result<()>;

    async fn save_album(&self, album_id: &str) -> Result<()>;

    /// Create an empty playlist and return its id.
    async fn create_playlist<'a>(
        &self,
        name: &str,
        description: Option<&'a str>,
    ) -> Result<String>;

    /// Append tracks, in order. Callers chunk by `playlist_batch_limit`.
    async fn add_to_playlist(&self, playlist_id: &str, track_ids: &[String]) -> Result<()>;
}
