use reqwest::Method;

use crate::http::{ApiClient, ApiError};
use crate::spotify_rs::types::{
    AddItemsRequest, CreatePlaylistRequest, CreatedPlaylist, Paging, PlaylistItem, SavedAlbum,
    SavedTrack, SearchResponse, SpotifyPlaylist, SpotifyUser,
};

pub const API_BASE_URL: &str = "https://api.spotify.com/v1/";

fn page_query(offset: usize, limit: usize) -> [(&'static str, String); 2] {
    [("offset", offset.to_string()), ("limit", limit.to_string())]
}

/// Get the current user's profile
pub async fn get_current_user(api: &ApiClient) -> Result<SpotifyUser, ApiError> {
    api.get_json("me", &[]).await
}

/// One page of the user's liked songs
pub async fn get_saved_tracks(
    api: &ApiClient,
    offset: usize,
    limit: usize,
) -> Result<Paging<SavedTrack>, ApiError> {
    api.get_json("me/tracks", &page_query(offset, limit)).await
}

/// One page of playlists the user owns or follows
pub async fn get_user_playlists(
    api: &ApiClient,
    offset: usize,
    limit: usize,
) -> Result<Paging<SpotifyPlaylist>, ApiError> {
    api.get_json("me/playlists", &page_query(offset, limit)).await
}

pub async fn get_playlist_items(
    api: &ApiClient,
    playlist_id: &str,
    offset: usize,
    limit: usize,
) -> Result<Paging<PlaylistItem>, ApiError> {
    api.get_json(
        &format!("playlists/{playlist_id}/tracks"),
        &page_query(offset, limit),
    )
    .await
}

pub async fn get_saved_albums(
    api: &ApiClient,
    offset: usize,
    limit: usize,
) -> Result<Paging<SavedAlbum>, ApiError> {
    api.get_json("me/albums", &page_query(offset, limit)).await
}

/// Search the catalog. `kind` is `track` or `album`.
pub async fn search(
    api: &ApiClient,
    query: &str,
    kind: &str,
    limit: usize,
) -> Result<SearchResponse, ApiError> {
    api.get_json(
        "search",
        &[
            ("q", query.to_string()),
            ("type", kind.to_string()),
            ("limit", limit.to_string()),
        ],
    )
    .await
}

/// Add tracks to the user's liked songs
pub async fn save_tracks(api: &ApiClient, ids: &[String]) -> Result<(), ApiError> {
    api.execute::<()>(Method::PUT, "me/tracks", &[("ids", ids.join(","))], None)
        .await
}

pub async fn save_albums(api: &ApiClient, ids: &[String]) -> Result<(), ApiError> {
    api.execute::<()>(Method::PUT, "me/albums", &[("ids", ids.join(","))], None)
        .await
}

pub async fn create_playlist(
    api: &ApiClient,
    user_id: &str,
    name: &str,
    description: &str,
) -> Result<CreatedPlaylist, ApiError> {
    let request = CreatePlaylistRequest {
        name,
        description,
        public: false,
    };
    api.post_json(&format!("users/{user_id}/playlists"), &request)
        .await
}

/// Append track URIs to a playlist. Spotify accepts at most 100 per call.
pub async fn add_playlist_items(
    api: &ApiClient,
    playlist_id: &str,
    uris: &[String],
) -> Result<(), ApiError> {
    api.execute(
        Method::POST,
        &format!("playlists/{playlist_id}/tracks"),
        &[],
        Some(&AddItemsRequest { uris }),
    )
    .await
}
