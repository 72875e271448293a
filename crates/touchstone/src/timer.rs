//! Scheduled recognizer tasks.
//!
//! Press and tap need callbacks that fire after a delay. Instead of real
//! timers the manager keeps a queue of tasks keyed by recognizer and fires
//! them against the timestamps of incoming input (or an explicit
//! [`Manager::advance`](crate::Manager::advance)), which keeps every run
//! reproducible.

use crate::recognizer::RecognizerId;

/// Handle to a scheduled task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(u64);

/// What happens to the recognizer when its task fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerAction {
    /// Move to Recognized and try to emit.
    Recognize,
    /// Move to Failed without emitting.
    Fail,
}

/// A task bound to one recognizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerTask {
    /// Owning recognizer
    pub recognizer: RecognizerId,
    /// Effect on fire
    pub action: TimerAction,
}

#[derive(Debug, Clone)]
struct Entry {
    due_ms: u64,
    id: TimerId,
    task: TimerTask,
}

/// Queue of pending tasks.
#[derive(Debug, Default)]
pub struct Timers {
    next_id: u64,
    pending: Vec<Entry>,
}

impl Timers {
    /// Create an empty queue.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedule `task` at `due_ms`.
    pub fn schedule(&mut self, due_ms: u64, task: TimerTask) -> TimerId {
        self.next_id += 1;
        let id = TimerId(self.next_id);
        self.pending.push(Entry { due_ms, id, task });
        id
    }

    /// Cancel a task. Unknown or already fired ids are ignored.
    pub fn cancel(&mut self, id: TimerId) {
        self.pending.retain(|e| e.id != id);
    }

    /// Cancel every task of a recognizer.
    pub fn cancel_for(&mut self, recognizer: RecognizerId) {
        self.pending.retain(|e| e.task.recognizer != recognizer);
    }

    /// Remove and return the earliest task due at or before `now_ms`.
    ///
    /// Tasks due at the same time come out in scheduling order.
    pub fn pop_due(&mut self, now_ms: u64) -> Option<(u64, TimerTask)> {
        let index = self
            .pending
            .iter()
            .enumerate()
            .filter(|(_, e)| e.due_ms <= now_ms)
            .min_by_key(|(_, e)| (e.due_ms, e.id))
            .map(|(i, _)| i)?;
        let entry = self.pending.remove(index);
        Some((entry.due_ms, entry.task))
    }

    /// Due time of the next task.
    #[must_use]
    pub fn next_due(&self) -> Option<u64> {
        self.pending.iter().map(|e| e.due_ms).min()
    }

    /// Whether `id` is still pending.
    #[must_use]
    pub fn is_pending(&self, id: TimerId) -> bool {
        self.pending.iter().any(|e| e.id == id)
    }

    /// Number of pending tasks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    /// Whether nothing is pending.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Drop every pending task.
    pub fn clear(&mut self) {
        self.pending.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn task(id: u32, action: TimerAction) -> TimerTask {
        TimerTask {
            recognizer: RecognizerId(id),
            action,
        }
    }

    #[test]
    fn test_pop_due_respects_time() {
        let mut timers = Timers::new();
        timers.schedule(100, task(1, TimerAction::Fail));
        assert_eq!(timers.pop_due(99), None);
        assert_eq!(timers.pop_due(100), Some((100, task(1, TimerAction::Fail))));
        assert!(timers.is_empty());
    }

    #[test]
    fn test_pop_due_earliest_first() {
        let mut timers = Timers::new();
        timers.schedule(300, task(1, TimerAction::Recognize));
        timers.schedule(200, task(2, TimerAction::Fail));
        assert_eq!(timers.next_due(), Some(200));
        assert_eq!(timers.pop_due(1000).map(|(d, _)| d), Some(200));
        assert_eq!(timers.pop_due(1000).map(|(d, _)| d), Some(300));
    }

    #[test]
    fn test_ties_fire_in_schedule_order() {
        let mut timers = Timers::new();
        timers.schedule(50, task(7, TimerAction::Fail));
        timers.schedule(50, task(3, TimerAction::Fail));
        assert_eq!(timers.pop_due(50).map(|(_, t)| t.recognizer), Some(RecognizerId(7)));
        assert_eq!(timers.pop_due(50).map(|(_, t)| t.recognizer), Some(RecognizerId(3)));
    }

    #[test]
    fn test_cancel() {
        let mut timers = Timers::new();
        let a = timers.schedule(10, task(1, TimerAction::Fail));
        let b = timers.schedule(20, task(1, TimerAction::Fail));
        timers.cancel(a);
        assert!(!timers.is_pending(a));
        assert!(timers.is_pending(b));
        timers.cancel(a);
        assert_eq!(timers.len(), 1);
    }

    #[test]
    fn test_cancel_for_recognizer() {
        let mut timers = Timers::new();
        timers.schedule(10, task(1, TimerAction::Fail));
        timers.schedule(10, task(2, TimerAction::Fail));
        timers.schedule(20, task(1, TimerAction::Recognize));
        timers.cancel_for(RecognizerId(1));
        assert_eq!(timers.len(), 1);
        timers.clear();
        assert!(timers.is_empty());
    }
}
