pub mod collector;
pub mod events;
pub mod failures;
pub mod matcher;
pub mod orchestrator;
pub mod progress;
pub mod report;
pub mod writer;

use std::fmt;

pub use events::{EventSink, TransferEvent};
pub use orchestrator::Transfer;
pub use writer::CatalogProvider;

/// One transferable collection kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskKind {
    LikedSongs,
    Playlists,
    Albums,
}

impl TaskKind {
    /// Fixed execution order of a run.
    pub const ORDER: [TaskKind; 3] = [TaskKind::LikedSongs, TaskKind::Playlists, TaskKind::Albums];

    pub fn label(&self) -> &'static str {
        match self {
            TaskKind::LikedSongs => "liked songs",
            TaskKind::Playlists => "playlists",
            TaskKind::Albums => "saved albums",
        }
    }
}

impl fmt::Display for TaskKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Which tasks a run should execute.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TaskSelection {
    pub liked_songs: bool,
    pub playlists: bool,
    pub albums: bool,
}

impl TaskSelection {
    pub fn all() -> Self {
        Self {
            liked_songs: true,
            playlists: true,
            albums: true,
        }
    }

    pub fn contains(&self, kind: TaskKind) -> bool {
        match kind {
            TaskKind::LikedSongs => self.liked_songs,
            TaskKind::Playlists => self.playlists,
            TaskKind::Albums => self.albums,
        }
    }

    /// Selected tasks in execution order.
    pub fn tasks(&self) -> Vec<TaskKind> {
        TaskKind::ORDER
            .into_iter()
            .filter(|kind| self.contains(*kind))
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tasks_follow_fixed_order() {
        let selection = TaskSelection {
            liked_songs: false,
            playlists: true,
            albums: true,
        };
        assert_eq!(selection.tasks(), vec![TaskKind::Playlists, TaskKind::Albums]);
        assert_eq!(TaskSelection::all().tasks(), TaskKind::ORDER.to_vec());
        assert!(TaskSelection::default().is_empty());
    }
}
