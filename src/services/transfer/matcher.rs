use color_eyre::eyre::{Result, WrapErr};

use crate::models::{Album, Track};
use crate::ports::catalog::Catalog;

/// Resolves source items to destination catalog ids.
///
/// Code first, text second, first candidate wins. Each path costs at most one
/// lookup call. An empty result is "unmatched", not an error; lookup errors are
/// returned so the caller can record the item as failed.
pub struct Matcher<'a, C: Catalog + ?Sized> {
    catalog: &'a C,
}

impl<'a, C: Catalog + ?Sized> Matcher<'a, C> {
    pub fn new(catalog: &'a C) -> Self {
        Self { catalog }
    }

    pub async fn resolve_track(&self, track: &Track) -> Result<Option<String>> {
        if let Some(isrc) = non_empty(track.isrc.as_deref()) {
            let hits = self
                .catalog
                .search_track_by_code(isrc)
                .await
                .wrap_err_with(|| format!("ISRC lookup failed for '{}'", track.name))?;
            if let Some(id) = hits.into_iter().next() {
                tracing::debug!("Matched '{}' by ISRC {} -> {}", track.name, isrc, id);
                return Ok(Some(id));
            }
        }

        let hits = self
            .catalog
            .search_track_by_text(track)
            .await
            .wrap_err_with(|| format!("Search failed for '{}'", track.name))?;
        let id = hits.into_iter().next();
        match &id {
            Some(id) => tracing::debug!("Matched '{}' by search -> {}", track.name, id),
            None => tracing::debug!("No match for '{}' by {}", track.name, track.artist),
        }
        Ok(id)
    }

    pub async fn resolve_album(&self, album: &Album) -> Result<Option<String>> {
        if let Some(upc) = non_empty(album.upc.as_deref()) {
            let hits = self
                .catalog
                .search_album_by_code(upc)
                .await
                .wrap_err_with(|| format!("UPC lookup failed for '{}'", album.name))?;
            if let Some(id) = hits.into_iter().next() {
                tracing::debug!("Matched album '{}' by UPC {} -> {}", album.name, upc, id);
                return Ok(Some(id));
            }
        }

        let hits = self
            .catalog
            .search_album_by_text(album)
            .await
            .wrap_err_with(|| format!("Search failed for album '{}'", album.name))?;
        Ok(hits.into_iter().next())
    }
}

fn non_empty(code: Option<&str>) -> Option<&str> {
    code.map(str::trim).filter(|c| !c.is_empty())
}
