use reqwest::Method;

use crate::apple_music_rs::types::{
    AddTracksRequest, CreatePlaylistRequest, LibraryAlbum, LibraryPlaylist, LibrarySong,
    NewPlaylistAttributes, ResourceId, ResourceList, SearchResponse, Storefront, TrackReference,
};
use crate::http::{ApiClient, ApiError};

/// Docs:
/// https://developer.apple.com/documentation/applemusicapi
pub const API_BASE_URL: &str = "https://api.music.apple.com/v1/";

fn page_query(offset: usize, limit: usize) -> [(&'static str, String); 2] {
    [("offset", offset.to_string()), ("limit", limit.to_string())]
}

/// The account's storefront; doubles as a credentials check.
pub async fn get_storefront(api: &ApiClient) -> Result<ResourceList<Storefront>, ApiError> {
    api.get_json("me/storefront", &[]).await
}

pub async fn get_library_songs(
    api: &ApiClient,
    offset: usize,
    limit: usize,
) -> Result<ResourceList<LibrarySong>, ApiError> {
    api.get_json("me/library/songs", &page_query(offset, limit))
        .await
}

pub async fn get_library_playlists(
    api: &ApiClient,
    offset: usize,
    limit: usize,
) -> Result<ResourceList<LibraryPlaylist>, ApiError> {
    api.get_json("me/library/playlists", &page_query(offset, limit))
        .await
}

pub async fn get_library_playlist_tracks(
    api: &ApiClient,
    playlist_id: &str,
    offset: usize,
    limit: usize,
) -> Result<ResourceList<LibrarySong>, ApiError> {
    api.get_json(
        &format!("me/library/playlists/{playlist_id}/tracks"),
        &page_query(offset, limit),
    )
    .await
}

pub async fn get_library_albums(
    api: &ApiClient,
    offset: usize,
    limit: usize,
) -> Result<ResourceList<LibraryAlbum>, ApiError> {
    api.get_json("me/library/albums", &page_query(offset, limit))
        .await
}

/// Catalog songs carrying the given ISRC
pub async fn get_songs_by_isrc(
    api: &ApiClient,
    storefront: &str,
    isrc: &str,
) -> Result<ResourceList<ResourceId>, ApiError> {
    api.get_json(
        &format!("catalog/{storefront}/songs"),
        &[("filter[isrc]", isrc.to_string())],
    )
    .await
}

/// Catalog albums carrying the given UPC
pub async fn get_albums_by_upc(
    api: &ApiClient,
    storefront: &str,
    upc: &str,
) -> Result<ResourceList<ResourceId>, ApiError> {
    api.get_json(
        &format!("catalog/{storefront}/albums"),
        &[("filter[upc]", upc.to_string())],
    )
    .await
}

/// Free-text catalog search. `types` is `songs` or `albums`.
pub async fn search_catalog(
    api: &ApiClient,
    storefront: &str,
    term: &str,
    types: &str,
    limit: usize,
) -> Result<SearchResponse, ApiError> {
    api.get_json(
        &format!("catalog/{storefront}/search"),
        &[
            ("term", term.to_string()),
            ("types", types.to_string()),
            ("limit", limit.to_string()),
        ],
    )
    .await
}

/// Add catalog resources to the library. `kind` is `songs` or `albums`.
pub async fn add_to_library(api: &ApiClient, kind: &str, ids: &[String]) -> Result<(), ApiError> {
    let key = format!("ids[{kind}]");
    api.execute::<()>(Method::POST, "me/library", &[(key.as_str(), ids.join(","))], None)
        .await
}

pub async fn create_library_playlist(
    api: &ApiClient,
    name: &str,
    description: &str,
) -> Result<ResourceList<ResourceId>, ApiError> {
    let request = CreatePlaylistRequest {
        attributes: NewPlaylistAttributes { name, description },
    };
    api.post_json("me/library/playlists", &request).await
}

pub async fn add_tracks_to_playlist(
    api: &ApiClient,
    playlist_id: &str,
    song_ids: &[String],
) -> Result<(), ApiError> {
    let request = AddTracksRequest {
        data: song_ids
            .iter()
            .map(|id| TrackReference { id, kind: "songs" })
            .collect(),
    };
    api.execute(
        Method::POST,
        &format!("me/library/playlists/{playlist_id}/tracks"),
        &[],
        Some(&request),
    )
    .await
}
