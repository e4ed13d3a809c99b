use color_eyre::eyre::Result;

use crate::models::{Album, Playlist, Track};
use crate::services::transfer::failures::WriteOutcome;

/// Progress callback handed to the write operations: `(done, total)`.
pub type Progress<'a> = dyn Fn(usize, usize) + Send + Sync + 'a;

/// The capability one side of a transfer exposes to the orchestrator.
///
/// Reads return fully materialized collections. Writes match each item against
/// this provider's catalog and apply it independently; an `Err` from a write
/// operation means the whole operation could not run (for example the playlist
/// could not be created), never that a single item failed.
#[async_trait::async_trait]
pub trait Provider: Send + Sync {
    fn name(&self) -> &str;

    /// Check the provider is reachable and authenticated. Returns the account display name.
    async fn verify(&self) -> Result<String>;

    async fn get_liked_songs(&self) -> Result<Vec<Track>>;

    async fn get_playlists(&self) -> Result<Vec<Playlist>>;

    async fn get_saved_albums(&self) -> Result<Vec<Album>>;

    async fn add_liked_songs(
        &self,
        tracks: &[Track],
        progress: &Progress<'_>,
    ) -> Result<WriteOutcome<Track>>;

    async fn create_playlist(
        &self,
        name: &str,
        description: Option<&str>,
        tracks: &[Track],
        progress: &Progress<'_>,
    ) -> Result<WriteOutcome<Track>>;

    async fn save_albums(&self, albums: &[Album], progress: &Progress<'_>)
    -> Result<WriteOutcome<Album>>;
}
