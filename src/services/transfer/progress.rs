use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use super::events::{EventSink, TransferEvent};

/// Highest fraction reported before the run is actually finished.
///
/// 1.0 is reserved for `ProgressTracker::finish`.
pub const BELOW_COMPLETE: f64 = 1.0 - f64::EPSILON;

/// `done / total`, where an empty unit of work counts as complete.
pub fn ratio(done: usize, total: usize) -> f64 {
    if total == 0 {
        return 1.0;
    }
    (done.min(total) as f64) / (total as f64)
}

/// Overall run fraction for `task_index` of `total_tasks` with `intra_done / intra_total`
/// of that task complete.
pub fn weighted_progress(
    task_index: usize,
    total_tasks: usize,
    intra_done: usize,
    intra_total: usize,
) -> f64 {
    combine(task_index, total_tasks, ratio(intra_done, intra_total))
}

/// Fraction within a task made of `outer_count` sub-collections (playlists),
/// where sub-collection `outer_index` has `inner_done / inner_total` items done.
pub fn nested_fraction(
    outer_index: usize,
    outer_count: usize,
    inner_done: usize,
    inner_total: usize,
) -> f64 {
    if outer_count == 0 {
        return 1.0;
    }
    let outer = outer_count as f64;
    clamp_unit(outer_index as f64 / outer + ratio(inner_done, inner_total) / outer)
}

/// Weight an intra-task fraction into the overall run fraction.
pub fn combine(task_index: usize, total_tasks: usize, intra: f64) -> f64 {
    if total_tasks == 0 {
        return 0.0;
    }
    let tasks = total_tasks as f64;
    clamp_unit(task_index as f64 / tasks + clamp_unit(intra) / tasks)
}

fn clamp_unit(value: f64) -> f64 {
    if value.is_finite() {
        value.clamp(0.0, 1.0)
    } else {
        0.0
    }
}

/// Monotonic progress for one run.
///
/// Safe to share between concurrent reporters: the highest value seen wins and
/// nothing lower is ever emitted. Non-negative `f64` bit patterns order the same
/// way as the values, so `fetch_max` on the bits is a float max.
pub struct ProgressTracker {
    total_tasks: usize,
    last: AtomicU64,
    finished: AtomicBool,
    events: EventSink,
}

impl ProgressTracker {
    pub fn new(total_tasks: usize, events: EventSink) -> Self {
        Self {
            total_tasks,
            last: AtomicU64::new(0.0_f64.to_bits()),
            finished: AtomicBool::new(false),
            events,
        }
    }

    /// Report `intra` (0..=1) progress within task `task_index`. Returns the value emitted.
    pub fn report(&self, task_index: usize, intra: f64) -> f64 {
        let value = combine(task_index, self.total_tasks, intra).min(BELOW_COMPLETE);
        self.advance(value)
    }

    /// Report `done` of `total` items within task `task_index`.
    pub fn report_items(&self, task_index: usize, done: usize, total: usize) -> f64 {
        let value =
            weighted_progress(task_index, self.total_tasks, done, total).min(BELOW_COMPLETE);
        self.advance(value)
    }

    /// Mark task `task_index` as done, whatever happened inside it.
    pub fn task_finished(&self, task_index: usize) -> f64 {
        self.report(task_index, 1.0)
    }

    /// Emit the final 1.0. Only the first call emits.
    pub fn finish(&self) -> f64 {
        if !self.finished.swap(true, Ordering::SeqCst) {
            self.last.store(1.0_f64.to_bits(), Ordering::SeqCst);
            self.events.send(TransferEvent::Progress(1.0));
        }
        1.0
    }

    #[cfg(test)]
    pub fn current(&self) -> f64 {
        f64::from_bits(self.last.load(Ordering::SeqCst))
    }

    fn advance(&self, value: f64) -> f64 {
        if self.finished.load(Ordering::SeqCst) {
            return 1.0;
        }
        let bits = value.to_bits();
        let previous = self.last.fetch_max(bits, Ordering::SeqCst);
        let reported = f64::from_bits(previous.max(bits));
        self.events.send(TransferEvent::Progress(reported));
        reported
    }
}
