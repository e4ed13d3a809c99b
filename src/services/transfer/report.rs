use std::fmt;
use std::time::Duration;

use super::TaskKind;
use super::events::RunState;
use super::failures::{FailedItem, MissReason};

const UNMATCHED_TIP: &str = "These may be missing from the destination catalog, or their \
                             metadata differs too much to match.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskStatus {
    Completed,
    /// The task stopped early; the message names what failed.
    Failed(String),
    /// Dry run: the source was read, nothing was written.
    Planned,
}

/// Per-playlist breakdown inside the playlists task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaylistResult {
    pub name: String,
    pub total: usize,
    pub added: usize,
    pub failed: Vec<FailedItem>,
}

/// Outcome of one task within a run.
///
/// For the playlists task the unit is a playlist: `total` playlists were read,
/// `added` were created, and `failed` lists playlists that were never created.
/// Track-level misses live in `playlists`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskResult {
    pub kind: TaskKind,
    pub total: usize,
    pub added: usize,
    pub failed: Vec<FailedItem>,
    pub playlists: Vec<PlaylistResult>,
    pub status: TaskStatus,
}

impl TaskResult {
    pub fn completed(kind: TaskKind, total: usize, added: usize, failed: Vec<FailedItem>) -> Self {
        Self {
            kind,
            total,
            added,
            failed,
            playlists: Vec::new(),
            status: TaskStatus::Completed,
        }
    }

    pub fn planned(kind: TaskKind, total: usize) -> Self {
        Self {
            kind,
            total,
            added: 0,
            failed: Vec::new(),
            playlists: Vec::new(),
            status: TaskStatus::Planned,
        }
    }

    pub fn aborted(
        kind: TaskKind,
        total: usize,
        added: usize,
        failed: Vec<FailedItem>,
        reason: String,
    ) -> Self {
        Self {
            kind,
            total,
            added,
            failed,
            playlists: Vec::new(),
            status: TaskStatus::Failed(reason),
        }
    }

    pub fn with_playlists(mut self, playlists: Vec<PlaylistResult>) -> Self {
        self.playlists = playlists;
        self
    }

    pub fn is_failed(&self) -> bool {
        matches!(self.status, TaskStatus::Failed(_))
    }

    /// Track misses across every playlist, in playlist order.
    pub fn unmatched_playlist_tracks(&self) -> impl Iterator<Item = &FailedItem> {
        self.playlists.iter().flat_map(|p| p.failed.iter())
    }

    pub fn summary_line(&self) -> String {
        let label = self.kind.label();
        match &self.status {
            TaskStatus::Completed => format!("{}/{} {} transferred", self.added, self.total, label),
            TaskStatus::Failed(reason) => format!(
                "{}/{} {} transferred, task failed: {}",
                self.added, self.total, label, reason
            ),
            TaskStatus::Planned if self.kind == TaskKind::Playlists => {
                let tracks: usize = self.playlists.iter().map(|p| p.total).sum();
                format!("Would transfer {} {} ({} total tracks)", self.total, label, tracks)
            }
            TaskStatus::Planned => format!("Would transfer {} {}", self.total, label),
        }
    }
}

fn write_unmatched<'a>(
    f: &mut fmt::Formatter<'_>,
    verb: &str,
    label: &str,
    items: impl Iterator<Item = &'a FailedItem>,
) -> fmt::Result {
    let items: Vec<_> = items.collect();
    if items.is_empty() {
        return Ok(());
    }
    writeln!(f)?;
    writeln!(f, "  Could not {} {} {}:", verb, items.len(), label)?;
    for item in &items {
        writeln!(f, "    - {item}")?;
    }
    if items.iter().any(|i| i.reason == MissReason::NoMatch) {
        writeln!(f)?;
        writeln!(f, "  Tip: {UNMATCHED_TIP}")?;
    }
    Ok(())
}

impl fmt::Display for TaskResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "  {}", self.summary_line())?;
        if self.status == TaskStatus::Planned {
            return Ok(());
        }

        match self.kind {
            TaskKind::Playlists => {
                for playlist in &self.playlists {
                    writeln!(
                        f,
                        "    {}: {}/{} tracks added",
                        playlist.name, playlist.added, playlist.total
                    )?;
                }
                write_unmatched(f, "create", "playlists", self.failed.iter())?;
                write_unmatched(f, "match", "playlist tracks", self.unmatched_playlist_tracks())
            }
            _ => write_unmatched(f, "match", self.kind.label(), self.failed.iter()),
        }
    }
}

/// The whole operation, handed back to the caller once all selected tasks ran.
#[derive(Debug, Clone)]
pub struct TransferRun {
    pub source: String,
    pub destination: String,
    pub tasks: Vec<TaskResult>,
    pub fraction: f64,
    pub state: RunState,
    pub elapsed: Duration,
}

impl TransferRun {
    pub fn new(source: &str, destination: &str) -> Self {
        Self {
            source: source.to_string(),
            destination: destination.to_string(),
            tasks: Vec::new(),
            fraction: 0.0,
            state: RunState::Idle,
            elapsed: Duration::ZERO,
        }
    }

    #[cfg(test)]
    pub fn task(&self, kind: TaskKind) -> Option<&TaskResult> {
        self.tasks.iter().find(|t| t.kind == kind)
    }

    pub fn failed_tasks(&self) -> impl Iterator<Item = &TaskResult> {
        self.tasks.iter().filter(|t| t.is_failed())
    }
}

impl fmt::Display for TransferRun {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let elapsed = Duration::from_millis(self.elapsed.as_millis() as u64);
        writeln!(
            f,
            "{} -> {} finished in {}",
            self.source,
            self.destination,
            humantime::format_duration(elapsed)
        )?;
        for task in &self.tasks {
            writeln!(f)?;
            write!(f, "{task}")?;
        }
        Ok(())
    }
}
