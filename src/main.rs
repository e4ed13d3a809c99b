mod apple_music_rs;
mod config;
mod http;
mod logging;
mod models;
mod ports;
mod services;
mod spotify_rs;
#[cfg(test)]
mod test_utils;

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use color_eyre::{
    Result,
    eyre::{Context, OptionExt, bail},
};
use tokio::sync::mpsc::{self, UnboundedReceiver};

use crate::{
    config::Config,
    logging::init_tracing,
    ports::provider::Provider,
    services::{
        apple_music::AppleMusicCatalog,
        spotify::SpotifyCatalog,
        transfer::{CatalogProvider, EventSink, TaskSelection, Transfer, TransferEvent},
    },
};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// The config file to use
    #[arg(short, long, env = "MUSIC_SYNC_CONFIG", global = true)]
    config: Option<PathBuf>,

    /// Log filter, e.g. "warn" or "music_sync=debug" (default: warn)
    #[arg(long, default_value = "warn", global = true, env = "LOG_LEVEL")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum Direction {
    SpotifyToApple,
    AppleToSpotify,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Transfer liked songs, playlists and saved albums between services
    Transfer {
        /// Transfer direction
        #[arg(value_enum)]
        direction: Direction,

        /// Transfer liked/saved songs
        #[arg(long)]
        liked_songs: bool,

        /// Transfer playlists
        #[arg(long)]
        playlists: bool,

        /// Transfer saved albums
        #[arg(long)]
        albums: bool,

        /// Transfer everything (liked songs, playlists, albums)
        #[arg(long)]
        all: bool,

        /// Show what would be transferred without making changes
        #[arg(long)]
        dry_run: bool,
    },
    #[command(subcommand)]
    Config(ConfigCommands),
}

#[derive(Subcommand, Debug)]
enum ConfigCommands {
    /// Create a default config file, if it doesn't exist
    CreateDefault,
    /// Print the path to the config file
    Path,
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    let args = Args::parse();
    init_tracing(&args.log_level)?;

    tracing::debug!("music-sync starting");

    match args.command {
        Commands::Transfer {
            direction,
            liked_songs,
            playlists,
            albums,
            all,
            dry_run,
        } => {
            let selection = if all {
                TaskSelection::all()
            } else {
                TaskSelection {
                    liked_songs,
                    playlists,
                    albums,
                }
            };
            if selection.is_empty() {
                bail!("Specify at least one of: --liked-songs, --playlists, --albums, --all");
            }

            let config = Config::load(args.config.as_deref())
                .wrap_err("Failed to load music-sync config")?;
            transfer(&config, direction, selection, dry_run).await?;
        }
        Commands::Config(config_commands) => {
            let path = match args.config {
                Some(path) => path,
                None => Config::default_path().ok_or_eyre("No default config path found")?,
            };
            match config_commands {
                ConfigCommands::CreateDefault => {
                    Config::write_default(&path)?;
                    println!("Created {}", path.display());
                }
                ConfigCommands::Path => println!("{}", path.display()),
            }
        }
    }

    Ok(())
}

async fn transfer(
    config: &Config,
    direction: Direction,
    selection: TaskSelection,
    dry_run: bool,
) -> Result<()> {
    let http = config.http.settings();
    let spotify = CatalogProvider::new(SpotifyCatalog::new(
        config.spotify_token()?,
        &config.spotify,
        &http,
    )?);
    let (developer_token, user_token) = config.apple_music_tokens()?;
    let apple_music = CatalogProvider::new(AppleMusicCatalog::new(
        developer_token,
        user_token,
        &config.apple_music,
        &http,
    )?);

    let (source, destination): (&dyn Provider, &dyn Provider) = match direction {
        Direction::SpotifyToApple => (&spotify, &apple_music),
        Direction::AppleToSpotify => (&apple_music, &spotify),
    };

    println!(
        "Initializing {} -> {} transfer...",
        source.name(),
        destination.name()
    );

    let (tx, rx) = mpsc::unbounded_channel();
    let renderer = tokio::spawn(render_events(rx));

    // The transfer owns the only sender; once it is dropped the renderer drains and exits.
    let outcome = Transfer::new(source, destination)
        .with_events(EventSink::new(tx))
        .dry_run(dry_run)
        .run(selection)
        .await;
    renderer.await.wrap_err("Event renderer stopped unexpectedly")?;

    let run = outcome?;
    println!("\n{run}");

    let failed = run.failed_tasks().count();
    if failed > 0 {
        bail!("{failed} task(s) failed");
    }
    Ok(())
}

async fn render_events(mut rx: UnboundedReceiver<TransferEvent>) {
    let mut last_percent = None;
    while let Some(event) = rx.recv().await {
        match event {
            TransferEvent::Log(message) => {
                if last_percent.take().is_some() {
                    eprintln!();
                }
                println!("{message}");
            }
            TransferEvent::Progress(fraction) => {
                let percent = (fraction * 100.0).floor() as u32;
                if last_percent != Some(percent) {
                    eprint!("\rProgress: {percent:>3}%");
                    last_percent = Some(percent);
                }
            }
            TransferEvent::State { task, state } => {
                tracing::debug!(?task, %state, "State");
            }
            TransferEvent::TaskFinished(result) => {
                tracing::debug!("Finished: {}", result.summary_line());
            }
        }
    }
    if last_percent.is_some() {
        eprintln!();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transfer_args_parse() {
        let args = Args::try_parse_from([
            "music-sync",
            "transfer",
            "apple-to-spotify",
            "--playlists",
            "--dry-run",
        ])
        .unwrap();

        match args.command {
            Commands::Transfer {
                direction,
                playlists,
                liked_songs,
                dry_run,
                ..
            } => {
                assert_eq!(direction, Direction::AppleToSpotify);
                assert!(playlists);
                assert!(!liked_songs);
                assert!(dry_run);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_unknown_direction_is_rejected() {
        assert!(Args::try_parse_from(["music-sync", "transfer", "spotify-to-tidal"]).is_err());
    }
}
