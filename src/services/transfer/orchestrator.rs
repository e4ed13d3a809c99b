use std::time::Instant;

use color_eyre::eyre::Report;
use tracing::instrument;

use crate::models::{Describe, Playlist};
use crate::ports::provider::Provider;

use super::events::{EventSink, RunState, TransferEvent};
use super::failures::{FailedItem, MissReason, WriteOutcome};
use super::progress::{ProgressTracker, nested_fraction};
use super::report::{PlaylistResult, TaskResult, TaskStatus, TransferRun};
use super::{TaskKind, TaskSelection};

/// Errors that stop a run before any task result exists.
#[derive(Debug, thiserror::Error)]
pub enum TransferError {
    #[error("No transfer task selected")]
    NothingSelected,

    #[error("Could not connect to {provider}: {message}")]
    Setup { provider: String, message: String },
}

/// One transfer run from `source` to `destination`.
///
/// Tasks run one at a time in [`TaskKind::ORDER`]. Per-item problems end up in
/// the task's failed list, a task-level problem marks only that task as failed,
/// and only a provider that cannot be verified up front aborts the run.
pub struct Transfer<'a> {
    source: &'a dyn Provider,
    destination: &'a dyn Provider,
    events: EventSink,
    dry_run: bool,
}

impl<'a> Transfer<'a> {
    pub fn new(source: &'a dyn Provider, destination: &'a dyn Provider) -> Self {
        Self {
            source,
            destination,
            events: EventSink::disabled(),
            dry_run: false,
        }
    }

    pub fn with_events(mut self, events: EventSink) -> Self {
        self.events = events;
        self
    }

    /// Read the source and report what would happen, without writing anything.
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    #[instrument(
        skip_all,
        fields(
            source = self.source.name(),
            destination = self.destination.name(),
            dry_run = self.dry_run
        )
    )]
    pub async fn run(&self, selection: TaskSelection) -> Result<TransferRun, TransferError> {
        let tasks = selection.tasks();
        if tasks.is_empty() {
            return Err(TransferError::NothingSelected);
        }

        let started = Instant::now();
        let mut run = TransferRun::new(self.source.name(), self.destination.name());

        for provider in [self.source, self.destination] {
            match provider.verify().await {
                Ok(account) => self
                    .events
                    .log(format!("Connected to {} as {}", provider.name(), account)),
                Err(e) => {
                    tracing::error!("Setup failed for {}: {:#}", provider.name(), e);
                    self.events.state(None, RunState::Failed);
                    return Err(TransferError::Setup {
                        provider: provider.name().to_string(),
                        message: format!("{e:#}"),
                    });
                }
            }
        }

        if self.dry_run {
            self.events.log("Dry run: no changes will be made.");
        }

        let tracker = ProgressTracker::new(tasks.len(), self.events.clone());
        for (index, kind) in tasks.into_iter().enumerate() {
            self.events.log(format!(
                "Transferring {} ({} -> {})...",
                kind.label(),
                self.source.name(),
                self.destination.name()
            ));

            let result = match kind {
                TaskKind::LikedSongs => self.liked_songs(index, &tracker).await,
                TaskKind::Playlists => self.playlists(index, &tracker).await,
                TaskKind::Albums => self.albums(index, &tracker).await,
            };

            if let TaskStatus::Failed(reason) = &result.status {
                self.events.state(Some(kind), RunState::Failed);
                self.events
                    .log(format!("Task '{}' failed: {}", kind.label(), reason));
            }
            tracker.task_finished(index);
            self.events.send(TransferEvent::TaskFinished(result.clone()));
            run.tasks.push(result);
        }

        self.events.state(None, RunState::Aggregating);
        run.fraction = tracker.finish();
        run.state = RunState::Done;
        run.elapsed = started.elapsed();
        self.events.state(None, RunState::Done);

        Ok(run)
    }

    async fn liked_songs(&self, index: usize, tracker: &ProgressTracker) -> TaskResult {
        let kind = TaskKind::LikedSongs;
        self.events.state(Some(kind), RunState::ReadingSource);
        let tracks = match self.source.get_liked_songs().await {
            Ok(tracks) => tracks,
            Err(e) => return self.read_failed(kind, e),
        };
        if let Some(result) = self.short_circuit(kind, tracks.len()) {
            return result;
        }

        self.events.state(Some(kind), RunState::MatchingAndWriting);
        let progress = |done: usize, total: usize| {
            tracker.report_items(index, done, total);
        };
        let outcome = self.destination.add_liked_songs(&tracks, &progress).await;
        self.fold_outcome(kind, &tracks, outcome)
    }

    async fn albums(&self, index: usize, tracker: &ProgressTracker) -> TaskResult {
        let kind = TaskKind::Albums;
        self.events.state(Some(kind), RunState::ReadingSource);
        let albums = match self.source.get_saved_albums().await {
            Ok(albums) => albums,
            Err(e) => return self.read_failed(kind, e),
        };
        if let Some(result) = self.short_circuit(kind, albums.len()) {
            return result;
        }

        self.events.state(Some(kind), RunState::MatchingAndWriting);
        let progress = |done: usize, total: usize| {
            tracker.report_items(index, done, total);
        };
        let outcome = self.destination.save_albums(&albums, &progress).await;
        self.fold_outcome(kind, &albums, outcome)
    }

    async fn playlists(&self, index: usize, tracker: &ProgressTracker) -> TaskResult {
        let kind = TaskKind::Playlists;
        self.events.state(Some(kind), RunState::ReadingSource);
        let playlists = match self.source.get_playlists().await {
            Ok(playlists) => playlists,
            Err(e) => return self.read_failed(kind, e),
        };

        if self.dry_run && !playlists.is_empty() {
            let planned = playlists.iter().map(|p| PlaylistResult {
                name: p.name.clone(),
                total: p.tracks.len(),
                added: 0,
                failed: Vec::new(),
            });
            let result =
                TaskResult::planned(kind, playlists.len()).with_playlists(planned.collect());
            self.events.log(result.summary_line());
            return result;
        }
        if let Some(result) = self.short_circuit(kind, playlists.len()) {
            return result;
        }

        self.events.state(Some(kind), RunState::MatchingAndWriting);
        let count = playlists.len();
        let mut created = Vec::with_capacity(count);
        let mut failed = Vec::new();
        let mut aborted: Option<String> = None;

        for (position, playlist) in playlists.iter().enumerate() {
            if let Some(reason) = &aborted {
                failed.push(FailedItem::new(
                    playlist,
                    MissReason::TaskAborted(reason.clone()),
                ));
                continue;
            }

            match self.playlist(index, position, count, playlist, tracker).await {
                Ok(result) => created.push(result),
                Err(e) => {
                    let reason = format!("{e:#}");
                    failed.push(FailedItem::new(
                        playlist,
                        MissReason::WriteFailed(reason.clone()),
                    ));
                    aborted = Some(reason);
                }
            }
        }

        let added = created.len();
        let result = match aborted {
            Some(reason) => TaskResult::aborted(kind, count, added, failed, reason),
            None => TaskResult::completed(kind, count, added, failed),
        };
        result.with_playlists(created)
    }

    async fn playlist(
        &self,
        task_index: usize,
        position: usize,
        count: usize,
        playlist: &Playlist,
        tracker: &ProgressTracker,
    ) -> color_eyre::Result<PlaylistResult> {
        self.events.log(format!(
            "Creating playlist: {} ({} tracks)",
            playlist.name,
            playlist.tracks.len()
        ));
        let progress = |done: usize, total: usize| {
            tracker.report(task_index, nested_fraction(position, count, done, total));
        };
        let outcome = self
            .destination
            .create_playlist(
                &playlist.name,
                playlist.description.as_deref(),
                &playlist.tracks,
                &progress,
            )
            .await?;
        tracker.report(task_index, nested_fraction(position, count, 1, 1));

        self.events.log(format!(
            "Added {}/{} tracks to {}",
            outcome.added,
            playlist.tracks.len(),
            playlist.name
        ));
        Ok(PlaylistResult {
            name: playlist.name.clone(),
            total: playlist.tracks.len(),
            added: outcome.added,
            failed: outcome.failed.iter().map(FailedItem::from_unmatched).collect(),
        })
    }

    /// Empty collections and dry runs never reach the destination.
    fn short_circuit(&self, kind: TaskKind, total: usize) -> Option<TaskResult> {
        if total == 0 {
            self.events.log(format!("No {} found.", kind.label()));
            return Some(TaskResult::completed(kind, 0, 0, Vec::new()));
        }
        if self.dry_run {
            let result = TaskResult::planned(kind, total);
            self.events.log(result.summary_line());
            return Some(result);
        }
        None
    }

    fn read_failed(&self, kind: TaskKind, error: Report) -> TaskResult {
        tracing::error!("Reading {} from {} failed: {:#}", kind.label(), self.source.name(), error);
        TaskResult::aborted(kind, 0, 0, Vec::new(), format!("{error:#}"))
    }

    /// Fold a write outcome into a task result. A write that could not run at
    /// all leaves every item failed as aborted, so nothing goes uncounted.
    fn fold_outcome<T: Describe>(
        &self,
        kind: TaskKind,
        items: &[T],
        outcome: color_eyre::Result<WriteOutcome<T>>,
    ) -> TaskResult {
        match outcome {
            Ok(outcome) => {
                debug_assert_eq!(outcome.attempted(), items.len(), "{kind} outcome lost items");
                let failed = outcome.failed.iter().map(FailedItem::from_unmatched).collect();
                let result = TaskResult::completed(kind, items.len(), outcome.added, failed);
                self.events.log(result.summary_line());
                result
            }
            Err(e) => {
                let reason = format!("{e:#}");
                let failed = items
                    .iter()
                    .map(|item| FailedItem::new(item, MissReason::TaskAborted(reason.clone())))
                    .collect();
                TaskResult::aborted(kind, items.len(), 0, failed, reason)
            }
        }
    }
}
