use std::fmt;

use crate::models::Describe;

/// Why an item did not make it to the destination.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MissReason {
    /// The destination catalog returned no candidate.
    NoMatch,
    /// A lookup call failed for this item.
    LookupFailed(String),
    /// The item matched but writing it to the destination failed.
    WriteFailed(String),
    /// The task stopped before this item was attempted.
    TaskAborted(String),
}

impl fmt::Display for MissReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MissReason::NoMatch => write!(f, "no match in destination catalog"),
            MissReason::LookupFailed(e) => write!(f, "lookup failed: {e}"),
            MissReason::WriteFailed(e) => write!(f, "write failed: {e}"),
            MissReason::TaskAborted(e) => write!(f, "task aborted: {e}"),
        }
    }
}

/// A source item that could not be transferred.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Unmatched<T> {
    pub item: T,
    pub reason: MissReason,
}

/// Result of one provider write operation: how many items landed, and which did not.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteOutcome<T> {
    pub added: usize,
    pub failed: Vec<Unmatched<T>>,
}

impl<T> WriteOutcome<T> {
    #[cfg(test)]
    pub fn failed_items(&self) -> impl Iterator<Item = &T> {
        self.failed.iter().map(|u| &u.item)
    }

    /// Number of items the operation was handed.
    pub fn attempted(&self) -> usize {
        self.added + self.failed.len()
    }
}

/// Accumulates misses for one operation, in the order they happen.
///
/// No deduplication: the same source item listed twice fails twice.
#[derive(Debug)]
pub struct FailureCollector<T> {
    items: Vec<Unmatched<T>>,
}

impl<T: Describe> FailureCollector<T> {
    pub fn new() -> Self {
        Self { items: Vec::new() }
    }

    pub fn record(&mut self, item: T, reason: MissReason) {
        tracing::debug!(
            "Could not transfer '{}' ({}): {}",
            item.title(),
            item.artist().unwrap_or("unknown artist"),
            reason
        );
        self.items.push(Unmatched { item, reason });
    }

    pub fn into_vec(self) -> Vec<Unmatched<T>> {
        self.items
    }
}

impl<T: Describe> Default for FailureCollector<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Display record of a failed item, detached from its concrete type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailedItem {
    pub name: String,
    pub artist: Option<String>,
    pub reason: MissReason,
}

impl FailedItem {
    pub fn new<T: Describe>(item: &T, reason: MissReason) -> Self {
        Self {
            name: item.title().to_string(),
            artist: item.artist().filter(|a| !a.is_empty()).map(str::to_string),
            reason,
        }
    }

    pub fn from_unmatched<T: Describe>(unmatched: &Unmatched<T>) -> Self {
        Self::new(&unmatched.item, unmatched.reason.clone())
    }
}

impl fmt::Display for FailedItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.artist {
            Some(artist) => write!(f, "{} by {}", self.name, artist),
            None => write!(f, "{}", self.name),
        }
    }
}
