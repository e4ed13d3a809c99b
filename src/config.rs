use std::path::{Path, PathBuf};
use std::time::Duration;

use color_eyre::eyre::{OptionExt, Result, WrapErr, bail};
use serde::{Deserialize, Serialize};

use crate::http::HttpSettings;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub spotify: SpotifyConfig,
    pub apple_music: AppleMusicConfig,
    pub http: HttpConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpotifyConfig {
    /// OAuth access token with library and playlist scopes
    pub access_token: Option<String>,
    pub api_base_url: String,
}

impl Default for SpotifyConfig {
    fn default() -> Self {
        Self {
            access_token: None,
            api_base_url: crate::spotify_rs::client::API_BASE_URL.to_string(),
        }
    }
}

const DEFAULT_STOREFRONT: &str = "us";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppleMusicConfig {
    /// MusicKit developer token (JWT)
    pub developer_token: Option<String>,
    /// Music-User-Token for the signed-in account
    pub user_token: Option<String>,
    /// Catalog storefront used for lookups, e.g. "us"
    pub storefront: String,
    pub api_base_url: String,
}

impl Default for AppleMusicConfig {
    fn default() -> Self {
        Self {
            developer_token: None,
            user_token: None,
            storefront: DEFAULT_STOREFRONT.to_string(),
            api_base_url: crate::apple_music_rs::client::API_BASE_URL.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub timeout_secs: u64,
    pub max_retries: usize,
    pub requests_per_second: u32,
}

impl Default for HttpConfig {
    fn default() -> Self {
        let defaults = HttpSettings::default();
        Self {
            timeout_secs: defaults.timeout.as_secs(),
            max_retries: defaults.max_retries,
            requests_per_second: defaults.requests_per_second,
        }
    }
}

impl HttpConfig {
    pub fn settings(&self) -> HttpSettings {
        HttpSettings {
            timeout: Duration::from_secs(self.timeout_secs),
            max_retries: self.max_retries,
            requests_per_second: self.requests_per_second,
        }
    }
}

impl Config {
    /// Load config from a TOML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .wrap_err_with(|| format!("Failed to read config file: {}", path.display()))?;
        toml::from_str(&contents)
            .wrap_err_with(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Default config location, e.g. `~/.config/music-sync/config.toml`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|path| path.join("music-sync").join("config.toml"))
    }

    /// Load the config, then fill unset credentials from the environment.
    ///
    /// An explicit `path` must exist. A missing file at the default location
    /// just means defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config = match path {
            Some(path) => Self::from_file(path)?,
            None => match Self::default_path() {
                Some(path) if path.exists() => Self::from_file(&path)?,
                _ => {
                    tracing::debug!("No config file found, using defaults");
                    Self::default()
                }
            },
        };
        Ok(config.with_env(|key| std::env::var(key).ok()))
    }

    fn with_env(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        fill(&mut self.spotify.access_token, lookup("SPOTIFY_ACCESS_TOKEN"));
        fill(
            &mut self.apple_music.developer_token,
            lookup("APPLE_MUSIC_DEVELOPER_TOKEN"),
        );
        fill(&mut self.apple_music.user_token, lookup("APPLE_MUSIC_USER_TOKEN"));
        // Only an untouched default counts as unset.
        if self.apple_music.storefront == DEFAULT_STOREFRONT {
            if let Some(storefront) = lookup("APPLE_MUSIC_STOREFRONT").filter(|s| !s.is_empty()) {
                self.apple_music.storefront = storefront;
            }
        }
        self
    }

    /// Write a default config to `path`, refusing to overwrite an existing one.
    pub fn write_default(path: &Path) -> Result<()> {
        if path.exists() {
            bail!("Config file already exists: {}", path.display());
        }
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .wrap_err_with(|| format!("Failed to create {}", parent.display()))?;
        }
        let contents =
            toml::to_string_pretty(&Self::default()).wrap_err("Failed to serialize config")?;
        std::fs::write(path, contents)
            .wrap_err_with(|| format!("Failed to write config file: {}", path.display()))
    }

    pub fn spotify_token(&self) -> Result<&str> {
        self.spotify.access_token.as_deref().ok_or_eyre(
            "Spotify access token missing: set [spotify].access_token or SPOTIFY_ACCESS_TOKEN",
        )
    }

    pub fn apple_music_tokens(&self) -> Result<(&str, &str)> {
        let developer = self.apple_music.developer_token.as_deref().ok_or_eyre(
            "Apple Music developer token missing: set it in config or APPLE_MUSIC_DEVELOPER_TOKEN",
        )?;
        let user = self.apple_music.user_token.as_deref().ok_or_eyre(
            "Apple Music user token missing: set it in config or APPLE_MUSIC_USER_TOKEN",
        )?;
        Ok((developer, user))
    }
}

/// File values win over the environment; blank values count as unset.
fn fill(slot: &mut Option<String>, env: Option<String>) {
    if slot.as_deref().is_none_or(str::is_empty) {
        *slot = env.filter(|v| !v.is_empty());
    }
}
