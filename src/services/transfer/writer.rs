use color_eyre::eyre::{Result, WrapErr};
use tracing::instrument;

use crate::models::{Album, Playlist, Track};
use crate::ports::catalog::Catalog;
use crate::ports::provider::{Progress, Provider};

use super::collector::Collector;
use super::failures::{FailureCollector, MissReason, WriteOutcome};
use super::matcher::Matcher;

/// Adapter turning a low-level [`Catalog`] into a transfer [`Provider`].
///
/// Reads drain the catalog's pages; writes resolve each item through the
/// matcher and apply it one by one, so a single miss never stops the rest.
pub struct CatalogProvider<C: Catalog> {
    catalog: C,
}

impl<C: Catalog> CatalogProvider<C> {
    pub fn new(catalog: C) -> Self {
        Self { catalog }
    }

    #[cfg(test)]
    pub fn catalog(&self) -> &C {
        &self.catalog
    }

    /// Resolve every track, ticking `progress` once per track.
    /// Returns matched `(track, id)` pairs in source order plus the misses.
    async fn match_tracks(
        &self,
        tracks: &[Track],
        progress: &Progress<'_>,
    ) -> (Vec<(Track, String)>, FailureCollector<Track>) {
        let matcher = Matcher::new(&self.catalog);
        let mut matched = Vec::with_capacity(tracks.len());
        let mut failures = FailureCollector::new();

        for (i, track) in tracks.iter().enumerate() {
            match matcher.resolve_track(track).await {
                Ok(Some(id)) => matched.push((track.clone(), id)),
                Ok(None) => failures.record(track.clone(), MissReason::NoMatch),
                Err(e) => {
                    failures.record(track.clone(), MissReason::LookupFailed(format!("{e:#}")))
                }
            }
            progress(i + 1, tracks.len());
        }

        (matched, failures)
    }
}

#[async_trait::async_trait]
impl<C: Catalog> Provider for CatalogProvider<C> {
    fn name(&self) -> &str {
        self.catalog.name()
    }

    async fn verify(&self) -> Result<String> {
        self.catalog
            .verify()
            .await
            .wrap_err_with(|| format!("Could not connect to {}", self.catalog.name()))
    }

    #[instrument(skip_all, fields(provider = self.catalog.name()))]
    async fn get_liked_songs(&self) -> Result<Vec<Track>> {
        Collector::new(&self.catalog).liked_songs().await
    }

    #[instrument(skip_all, fields(provider = self.catalog.name()))]
    async fn get_playlists(&self) -> Result<Vec<Playlist>> {
        Collector::new(&self.catalog).playlists().await
    }

    #[instrument(skip_all, fields(provider = self.catalog.name()))]
    async fn get_saved_albums(&self) -> Result<Vec<Album>> {
        Collector::new(&self.catalog).saved_albums().await
    }

    #[instrument(skip_all, fields(provider = self.catalog.name(), tracks = tracks.len()))]
    async fn add_liked_songs(
        &self,
        tracks: &[Track],
        progress: &Progress<'_>,
    ) -> Result<WriteOutcome<Track>> {
        let matcher = Matcher::new(&self.catalog);
        let mut added = 0;
        let mut failures = FailureCollector::new();

        for (i, track) in tracks.iter().enumerate() {
            match matcher.resolve_track(track).await {
                Ok(Some(id)) => match self.catalog.like_track(&id).await {
                    Ok(()) => added += 1,
                    Err(e) => {
                        failures.record(track.clone(), MissReason::WriteFailed(format!("{e:#}")))
                    }
                },
                Ok(None) => failures.record(track.clone(), MissReason::NoMatch),
                Err(e) => {
                    failures.record(track.clone(), MissReason::LookupFailed(format!("{e:#}")))
                }
            }
            progress(i + 1, tracks.len());
        }

        tracing::info!(
            "{}: liked {}/{} tracks",
            self.catalog.name(),
            added,
            tracks.len()
        );
        Ok(WriteOutcome {
            added,
            failed: failures.into_vec(),
        })
    }

    #[instrument(
        skip_all,
        fields(provider = self.catalog.name(), playlist = name, tracks = tracks.len())
    )]
    async fn create_playlist(
        &self,
        name: &str,
        description: Option<&str>,
        tracks: &[Track],
        progress: &Progress<'_>,
    ) -> Result<WriteOutcome<Track>> {
        let playlist_id = self
            .catalog
            .create_playlist(name, description)
            .await
            .wrap_err_with(|| format!("Failed to create playlist '{name}'"))?;
        tracing::debug!("{}: created playlist '{}' ({})", self.catalog.name(), name, playlist_id);

        let (matched, mut failures) = self.match_tracks(tracks, progress).await;

        let batch_limit = self.catalog.playlist_batch_limit().max(1);
        let mut added = 0;
        for batch in matched.chunks(batch_limit) {
            let ids: Vec<String> = batch.iter().map(|(_, id)| id.clone()).collect();
            match self.catalog.add_to_playlist(&playlist_id, &ids).await {
                Ok(()) => added += batch.len(),
                Err(e) => {
                    tracing::warn!(
                        "{}: failed adding {} tracks to '{}': {:#}",
                        self.catalog.name(),
                        batch.len(),
                        name,
                        e
                    );
                    let reason = MissReason::WriteFailed(format!("{e:#}"));
                    for (track, _) in batch {
                        failures.record(track.clone(), reason.clone());
                    }
                }
            }
        }

        tracing::info!(
            "{}: playlist '{}' got {}/{} tracks",
            self.catalog.name(),
            name,
            added,
            tracks.len()
        );
        Ok(WriteOutcome {
            added,
            failed: failures.into_vec(),
        })
    }

    #[instrument(skip_all, fields(provider = self.catalog.name(), albums = albums.len()))]
    async fn save_albums(
        &self,
        albums: &[Album],
        progress: &Progress<'_>,
    ) -> Result<WriteOutcome<Album>> {
        let matcher = Matcher::new(&self.catalog);
        let mut added = 0;
        let mut failures = FailureCollector::new();

        for (i, album) in albums.iter().enumerate() {
            match matcher.resolve_album(album).await {
                Ok(Some(id)) => match self.catalog.save_album(&id).await {
                    Ok(()) => added += 1,
                    Err(e) => {
                        failures.record(album.clone(), MissReason::WriteFailed(format!("{e:#}")))
                    }
                },
                Ok(None) => failures.record(album.clone(), MissReason::NoMatch),
                Err(e) => {
                    failures.record(album.clone(), MissReason::LookupFailed(format!("{e:#}")))
                }
            }
            progress(i + 1, albums.len());
        }

        tracing::info!(
            "{}: saved {}/{} albums",
            self.catalog.name(),
            added,
            albums.len()
        );
        Ok(WriteOutcome {
            added,
            failed: failures.into_vec(),
        })
    }
}
