use serde::{Deserialize, Serialize};

/// Standard `{ "data": [...] }` document returned by the Apple Music API.
#[derive(Debug, Clone, Deserialize)]
pub struct ResourceList<T> {
    // A plain `default` would demand `T: Default`.
    #[serde(default = "Vec::new")]
    pub data: Vec<T>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Resource<A> {
    pub id: String,
    pub attributes: Option<A>,
}

/// Only ids are read from catalog lookups.
#[derive(Debug, Clone, Deserialize)]
pub struct ResourceId {
    pub id: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SongAttributes {
    pub name: String,
    #[serde(default)]
    pub artist_name: String,
    pub album_name: Option<String>,
    pub isrc: Option<String>,
    pub duration_in_millis: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlbumAttributes {
    pub name: String,
    #[serde(default)]
    pub artist_name: String,
    pub upc: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PlaylistDescription {
    pub standard: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaylistAttributes {
    pub name: String,
    pub description: Option<PlaylistDescription>,
    /// Missing means editable.
    pub can_edit: Option<bool>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorefrontAttributes {
    pub name: String,
}

pub type LibrarySong = Resource<SongAttributes>;
pub type LibraryAlbum = Resource<AlbumAttributes>;
pub type LibraryPlaylist = Resource<PlaylistAttributes>;
pub type Storefront = Resource<StorefrontAttributes>;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchResults {
    pub songs: Option<ResourceList<ResourceId>>,
    pub albums: Option<ResourceList<ResourceId>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SearchResponse {
    #[serde(default)]
    pub results: SearchResults,
}

#[derive(Debug, Clone, Serialize)]
pub struct NewPlaylistAttributes<'a> {
    pub name: &'a str,
    pub description: &'a str,
}

#[derive(Debug, Clone, Serialize)]
pub struct CreatePlaylistRequest<'a> {
    pub attributes: NewPlaylistAttributes<'a>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TrackReference<'a> {
    pub id: &'a str,
    #[serde(rename = "type")]
    pub kind: &'static str,
}

#[derive(Debug, Clone, Serialize)]
pub struct AddTracksRequest<'a> {
    pub data: Vec<TrackReference<'a>>,
}
