use std::fmt;

use tokio::sync::mpsc::UnboundedSender;

use super::TaskKind;
use super::report::TaskResult;

/// Lifecycle of a run, optionally scoped to the task being worked on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Idle,
    ReadingSource,
    MatchingAndWriting,
    Aggregating,
    Done,
    Failed,
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RunState::Idle => "idle",
            RunState::ReadingSource => "reading source",
            RunState::MatchingAndWriting => "matching and writing",
            RunState::Aggregating => "aggregating",
            RunState::Done => "done",
            RunState::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// Everything a run tells its caller while it works.
#[derive(Debug, Clone)]
pub enum TransferEvent {
    State {
        task: Option<TaskKind>,
        state: RunState,
    },
    Log(String),
    /// Overall fraction in `[0, 1]`, non-decreasing within a run.
    Progress(f64),
    TaskFinished(TaskResult),
}

/// Non-blocking outlet for transfer events.
///
/// Sending never waits on the receiver; a dropped receiver just discards events.
#[derive(Debug, Clone, Default)]
pub struct EventSink {
    tx: Option<UnboundedSender<TransferEvent>>,
}

impl EventSink {
    pub fn new(tx: UnboundedSender<TransferEvent>) -> Self {
        Self { tx: Some(tx) }
    }

    pub fn disabled() -> Self {
        Self { tx: None }
    }

    pub fn send(&self, event: TransferEvent) {
        if let Some(tx) = &self.tx {
            let _ = tx.send(event);
        }
    }

    pub fn log(&self, message: impl Into<String>) {
        let message = message.into();
        tracing::info!("{}", message);
        self.send(TransferEvent::Log(message));
    }

    pub fn state(&self, task: Option<TaskKind>, state: RunState) {
        tracing::debug!(?task, %state, "Transfer state changed");
        self.send(TransferEvent::State { task, state });
    }
}
