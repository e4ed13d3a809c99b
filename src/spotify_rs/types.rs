use serde::{Deserialize, Serialize};

/// Offset-paged list as returned by every Spotify library endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct Paging<T> {
    pub items: Vec<T>,
}

/// Spotify user profile
#[derive(Debug, Clone, Deserialize)]
pub struct SpotifyUser {
    pub id: String,
    pub display_name: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SpotifyExternalIds {
    pub isrc: Option<String>,
    pub upc: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SpotifyArtist {
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SpotifyAlbumRef {
    pub name: String,
}

/// Track object. `id` is null for local files; episodes in playlists carry no artists.
#[derive(Debug, Clone, Deserialize)]
pub struct SpotifyTrack {
    pub id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub artists: Vec<SpotifyArtist>,
    pub album: Option<SpotifyAlbumRef>,
    pub duration_ms: Option<u64>,
    #[serde(default)]
    pub external_ids: Option<SpotifyExternalIds>,
}

/// Entry of `me/tracks`.
#[derive(Debug, Clone, Deserialize)]
pub struct SavedTrack {
    pub track: Option<SpotifyTrack>,
}

/// Entry of `playlists/{id}/tracks`.
#[derive(Debug, Clone, Deserialize)]
pub struct PlaylistItem {
    pub track: Option<SpotifyTrack>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PlaylistOwner {
    pub id: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SpotifyPlaylist {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub owner: PlaylistOwner,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SpotifyAlbum {
    pub name: String,
    #[serde(default)]
    pub artists: Vec<SpotifyArtist>,
    #[serde(default)]
    pub external_ids: Option<SpotifyExternalIds>,
}

/// Entry of `me/albums`.
#[derive(Debug, Clone, Deserialize)]
pub struct SavedAlbum {
    pub album: SpotifyAlbum,
}

/// Only the id of a search hit is used.
#[derive(Debug, Clone, Deserialize)]
pub struct SearchHit {
    pub id: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SearchResponse {
    // Search pages can carry `null` entries.
    pub tracks: Option<Paging<Option<SearchHit>>>,
    pub albums: Option<Paging<Option<SearchHit>>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CreatePlaylistRequest<'a> {
    pub name: &'a str,
    pub description: &'a str,
    pub public: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct AddItemsRequest<'a> {
    pub uris: &'a [String],
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreatedPlaylist {
    pub id: String,
}
