use std::future::Future;

use color_eyre::eyre::{Result, WrapErr, bail};

use crate::models::{Album, Playlist, PlaylistRef, Track};
use crate::ports::catalog::{Catalog, Page, PageKind};

/// Drains paginated library collections from a catalog.
///
/// Pagination stop rule
/// - Keep requesting while the previous page came back full (`fetched == page_size`).
/// - Stop on the first short page.
/// - A collection whose size is an exact multiple of the page size costs one extra,
///   empty request.
pub struct Collector<'a, C: Catalog + ?Sized> {
    catalog: &'a C,
}

impl<'a, C: Catalog + ?Sized> Collector<'a, C> {
    pub fn new(catalog: &'a C) -> Self {
        Self { catalog }
    }

    pub async fn liked_songs(&self) -> Result<Vec<Track>> {
        let catalog = self.catalog;
        let tracks = drain(
            catalog.page_size(PageKind::LikedSongs),
            move |offset, limit| catalog.liked_songs_page(offset, limit),
        )
        .await
        .wrap_err_with(|| format!("Failed to read liked songs from {}", catalog.name()))?;

        tracing::info!("{}: found {} liked songs", catalog.name(), tracks.len());
        Ok(tracks)
    }

    pub async fn saved_albums(&self) -> Result<Vec<Album>> {
        let catalog = self.catalog;
        let albums = drain(
            catalog.page_size(PageKind::SavedAlbums),
            move |offset, limit| catalog.saved_albums_page(offset, limit),
        )
        .await
        .wrap_err_with(|| format!("Failed to read saved albums from {}", catalog.name()))?;

        tracing::info!("{}: found {} saved albums", catalog.name(), albums.len());
        Ok(albums)
    }

    /// All playlists, each with its full track list resolved before it is returned.
    pub async fn playlists(&self) -> Result<Vec<Playlist>> {
        let catalog = self.catalog;
        let refs = drain(
            catalog.page_size(PageKind::Playlists),
            move |offset, limit| catalog.playlists_page(offset, limit),
        )
        .await
        .wrap_err_with(|| format!("Failed to read playlists from {}", catalog.name()))?;

        let mut playlists = Vec::with_capacity(refs.len());
        for playlist in refs {
            let tracks = self.playlist_tracks(&playlist).await?;
            tracing::debug!(
                "{}: playlist '{}' has {} tracks",
                catalog.name(),
                playlist.name,
                tracks.len()
            );
            playlists.push(Playlist {
                name: playlist.name,
                description: playlist.description,
                tracks,
            });
        }

        tracing::info!("{}: found {} playlists", catalog.name(), playlists.len());
        Ok(playlists)
    }

    async fn playlist_tracks(&self, playlist: &PlaylistRef) -> Result<Vec<Track>> {
        let catalog = self.catalog;
        let playlist_id = playlist.id.as_str();
        drain(
            catalog.page_size(PageKind::PlaylistTracks),
            move |offset, limit| catalog.playlist_tracks_page(playlist_id, offset, limit),
        )
        .await
        .wrap_err_with(|| format!("Failed to read tracks of playlist '{}'", playlist.name))
    }
}

/// Request pages of `page_size` until a short page comes back.
async fn drain<T, F, Fut>(page_size: usize, mut fetch_page: F) -> Result<Vec<T>>
where
    F: FnMut(usize, usize) -> Fut,
    Fut: Future<Output = Result<Page<T>>>,
{
    if page_size == 0 {
        bail!("Page size must be greater than zero");
    }

    let mut offset = 0;
    let mut out = Vec::new();

    loop {
        let page = fetch_page(offset, page_size).await?;
        let fetched = page.fetched;
        out.extend(page.items);

        if fetched < page_size {
            break;
        }
        offset += fetched;
    }

    Ok(out)
}
