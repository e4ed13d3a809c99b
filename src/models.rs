use std::fmt;

/// A track as read from a source library.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Track {
    pub name: String,
    pub artist: String,
    pub album: Option<String>,
    /// ISRC, when the source exposes one.
    pub isrc: Option<String>,
    pub duration_ms: Option<u64>,
}

#[cfg(test)]
impl Track {
    pub fn new(name: impl Into<String>, artist: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            artist: artist.into(),
            album: None,
            isrc: None,
            duration_ms: None,
        }
    }

    pub fn with_isrc(mut self, isrc: impl Into<String>) -> Self {
        self.isrc = Some(isrc.into());
        self
    }
}

/// A saved album as read from a source library.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Album {
    pub name: String,
    pub artist: String,
    /// UPC, when the source exposes one.
    pub upc: Option<String>,
}

#[cfg(test)]
impl Album {
    pub fn new(name: impl Into<String>, artist: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            artist: artist.into(),
            upc: None,
        }
    }

    pub fn with_upc(mut self, upc: impl Into<String>) -> Self {
        self.upc = Some(upc.into());
        self
    }
}

/// A user playlist with its tracks fully resolved, in source order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Playlist {
    pub name: String,
    pub description: Option<String>,
    pub tracks: Vec<Track>,
}

/// A playlist header as listed by a provider, before its tracks are fetched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaylistRef {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
}

/// Anything that can be shown to the user as "name by artist".
pub trait Describe {
    fn title(&self) -> &str;
    fn artist(&self) -> Option<&str>;
}

impl Describe for Track {
    fn title(&self) -> &str {
        &self.name
    }

    fn artist(&self) -> Option<&str> {
        Some(&self.artist)
    }
}

impl Describe for Album {
    fn title(&self) -> &str {
        &self.name
    }

    fn artist(&self) -> Option<&str> {
        Some(&self.artist)
    }
}

impl Describe for Playlist {
    fn title(&self) -> &str {
        &self.name
    }

    fn artist(&self) -> Option<&str> {
        None
    }
}

impl fmt::Display for Track {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} by {}", self.name, self.artist)
    }
}

impl fmt::Display for Album {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} by {}", self.name, self.artist)
    }
}
