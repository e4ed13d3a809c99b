use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard};

use color_eyre::eyre::{Result, bail};

use crate::models::{Album, PlaylistRef, Track};
use crate::ports::catalog::{Catalog, Page, PageKind};

/// Everything a `FakeCatalog` holds or has been asked to do.
#[derive(Debug, Default)]
pub struct FakeState {
    pub liked: Vec<Track>,
    pub albums: Vec<Album>,
    pub playlists: Vec<(PlaylistRef, Vec<Track>)>,

    pub track_codes: HashMap<String, String>,
    pub track_names: HashMap<String, String>,
    pub album_codes: HashMap<String, String>,
    pub album_names: HashMap<String, String>,

    pub liked_ids: Vec<String>,
    pub saved_album_ids: Vec<String>,
    pub created_playlists: Vec<(String, Option<String>)>,
    pub playlist_adds: Vec<(String, Vec<String>)>,
    /// Every catalog call, by method name, in call order.
    pub calls: Vec<String>,

    pub fail_verify: bool,
    pub fail_reads: HashSet<&'static str>,
    pub fail_create_playlist: HashSet<String>,
    /// Zero-based indexes of `add_to_playlist` calls that should fail.
    pub fail_add_calls: HashSet<usize>,
    pub fail_lookups: HashSet<String>,
    add_call_count: usize,
}

/// In-memory catalog for exercising the transfer engine end to end.
pub struct FakeCatalog {
    name: &'static str,
    page_size: usize,
    batch_limit: usize,
    state: Mutex<FakeState>,
}

fn key(name: &str) -> String {
    name.trim().to_lowercase()
}

fn page_of<T: Clone>(items: &[T], offset: usize, limit: usize) -> Page<T> {
    let items: Vec<T> = items.iter().skip(offset).take(limit).cloned().collect();
    Page::unfiltered(items)
}

impl FakeCatalog {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            page_size: 2,
            batch_limit: 100,
            state: Mutex::new(FakeState::default()),
        }
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size;
        self
    }

    pub fn with_batch_limit(mut self, batch_limit: usize) -> Self {
        self.batch_limit = batch_limit;
        self
    }

    pub fn with_liked(self, tracks: Vec<Track>) -> Self {
        self.state().liked = tracks;
        self
    }

    pub fn with_albums(self, albums: Vec<Album>) -> Self {
        self.state().albums = albums;
        self
    }

    pub fn with_playlist(self, name: &str, tracks: Vec<Track>) -> Self {
        {
            let mut state = self.state();
            let id = format!("src-pl-{}", state.playlists.len());
            state.playlists.push((
                PlaylistRef {
                    id,
                    name: name.to_string(),
                    description: None,
                },
                tracks,
            ));
        }
        self
    }

    /// Make `track` findable by name and, when it carries one, by ISRC.
    pub fn knows_track(self, track: &Track, id: &str) -> Self {
        {
            let mut state = self.state();
            if let Some(isrc) = &track.isrc {
                state.track_codes.insert(isrc.clone(), id.to_string());
            }
            state.track_names.insert(key(&track.name), id.to_string());
        }
        self
    }

    /// Make `track` findable by ISRC only.
    pub fn knows_track_code(self, isrc: &str, id: &str) -> Self {
        self.state()
            .track_codes
            .insert(isrc.to_string(), id.to_string());
        self
    }

    pub fn knows_album(self, album: &Album, id: &str) -> Self {
        {
            let mut state = self.state();
            if let Some(upc) = &album.upc {
                state.album_codes.insert(upc.clone(), id.to_string());
            }
            state.album_names.insert(key(&album.name), id.to_string());
        }
        self
    }

    pub fn failing_verify(self) -> Self {
        self.state().fail_verify = true;
        self
    }

    /// Make the named page method fail, e.g. `"liked_songs_page"`.
    pub fn failing_read(self, method: &'static str) -> Self {
        self.state().fail_reads.insert(method);
        self
    }

    pub fn failing_create_playlist(self, name: &str) -> Self {
        self.state().fail_create_playlist.insert(name.to_string());
        self
    }

    pub fn failing_add_call(self, index: usize) -> Self {
        self.state().fail_add_calls.insert(index);
        self
    }

    pub fn failing_lookup(self, track_name: &str) -> Self {
        self.state().fail_lookups.insert(key(track_name));
        self
    }

    pub fn state(&self) -> MutexGuard<'_, FakeState> {
        self.state.lock().unwrap()
    }

    fn record_call(&self, method: &str) -> MutexGuard<'_, FakeState> {
        let mut state = self.state();
        state.calls.push(method.to_string());
        state
    }

    fn check_read(state: &FakeState, method: &'static str) -> Result<()> {
        if state.fail_reads.contains(method) {
            bail!("{method} unavailable");
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl Catalog for FakeCatalog {
    fn name(&self) -> &'static str {
        self.name
    }

    async fn verify(&self) -> Result<String> {
        let state = self.record_call("verify");
        if state.fail_verify {
            bail!("401 Unauthorized");
        }
        Ok(format!("{} user", self.name))
    }

    fn page_size(&self, _kind: PageKind) -> usize {
        self.page_size
    }

    fn playlist_batch_limit(&self) -> usize {
        self.batch_limit
    }

    async fn liked_songs_page(&self, offset: usize, limit: usize) -> Result<Page<Track>> {
        let state = self.record_call("liked_songs_page");
        Self::check_read(&state, "liked_songs_page")?;
        Ok(page_of(&state.liked, offset, limit))
    }

    async fn playlists_page(&self, offset: usize, limit: usize) -> Result<Page<PlaylistRef>> {
        let state = self.record_call("playlists_page");
        Self::check_read(&state, "playlists_page")?;
        let refs: Vec<PlaylistRef> = state.playlists.iter().map(|(r, _)| r.clone()).collect();
        Ok(page_of(&refs, offset, limit))
    }

    async fn playlist_tracks_page(
        &self,
        playlist_id: &str,
        offset: usize,
        limit: usize,
    ) -> Result<Page<Track>> {
        let state = self.record_call("playlist_tracks_page");
        Self::check_read(&state, "playlist_tracks_page")?;
        match state.playlists.iter().find(|(r, _)| r.id == playlist_id) {
            Some((_, tracks)) => Ok(page_of(tracks, offset, limit)),
            None => bail!("404 playlist {playlist_id} not found"),
        }
    }

    async fn saved_albums_page(&self, offset: usize, limit: usize) -> Result<Page<Album>> {
        let state = self.record_call("saved_albums_page");
        Self::check_read(&state, "saved_albums_page")?;
        Ok(page_of(&state.albums, offset, limit))
    }

    async fn search_track_by_code(&self, isrc: &str) -> Result<Vec<String>> {
        let state = self.record_call("search_track_by_code");
        Ok(state.track_codes.get(isrc).cloned().into_iter().collect())
    }

    async fn search_track_by_text(&self, track: &Track) -> Result<Vec<String>> {
        let state = self.record_call("search_track_by_text");
        if state.fail_lookups.contains(&key(&track.name)) {
            bail!("search timed out");
        }
        Ok(state
            .track_names
            .get(&key(&track.name))
            .cloned()
            .into_iter()
            .collect())
    }

    async fn search_album_by_code(&self, upc: &str) -> Result<Vec<String>> {
        let state = self.record_call("search_album_by_code");
        Ok(state.album_codes.get(upc).cloned().into_iter().collect())
    }

    async fn search_album_by_text(&self, album: &Album) -> Result<Vec<String>> {
        let state = self.record_call("search_album_by_text");
        Ok(state
            .album_names
            .get(&key(&album.name))
            .cloned()
            .into_iter()
            .collect())
    }

    async fn like_track(&self, track_id: &str) -> Result<()> {
        let mut state = self.record_call("like_track");
        state.liked_ids.push(track_id.to_string());
        Ok(())
    }

    async fn save_album(&self, album_id: &str) -> Result<()> {
        let mut state = self.record_call("save_album");
        state.saved_album_ids.push(album_id.to_string());
        Ok(())
    }

    async fn create_playlist<'a>(
        &self,
        name: &str,
        description: Option<&'a str>,
    ) -> Result<String> {
        let mut state = self.record_call("create_playlist");
        if state.fail_create_playlist.contains(name) {
            bail!("403 Forbidden");
        }
        state
            .created_playlists
            .push((name.to_string(), description.map(str::to_string)));
        Ok(format!("dest-pl-{}", state.created_playlists.len() - 1))
    }

    async fn add_to_playlist(&self, playlist_id: &str, track_ids: &[String]) -> Result<()> {
        let mut state = self.record_call("add_to_playlist");
        let index = state.add_call_count;
        state.add_call_count += 1;
        if state.fail_add_calls.contains(&index) {
            bail!("500 Internal Server Error");
        }
        state
            .playlist_adds
            .push((playlist_id.to_string(), track_ids.to_vec()));
        Ok(())
    }
}
