//! Cancellable delayed steps keyed to an encounter
//!
//! Time is logical: callers pass `now` as the elapsed time since whatever
//! epoch they use. A task only ever fires for an encounter that is still
//! registered, so cancelling an encounter drops everything it had pending.

use std::collections::HashSet;
use std::time::Duration;

/// Identifies one encounter inside a scheduler
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EncounterKey(u64);

/// Handle to one scheduled task
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaskId(u64);

#[derive(Debug)]
struct Scheduled<T> {
    id: TaskId,
    key: EncounterKey,
    due: Duration,
    task: T,
}

/// Queue of delayed tasks for any number of encounters
#[derive(Debug)]
pub struct Scheduler<T> {
    next_key: u64,
    next_task: u64,
    live: HashSet<EncounterKey>,
    queue: Vec<Scheduled<T>>,
}

impl<T> Default for Scheduler<T> {
    fn default() -> Self {
        Self {
            next_key: 1,
            next_task: 1,
            live: HashSet::new(),
            queue: Vec::new(),
        }
    }
}

impl<T> Scheduler<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new encounter. Keys are never reused.
    pub fn register(&mut self) -> EncounterKey {
        let key = EncounterKey(self.next_key);
        self.next_key += 1;
        self.live.insert(key);
        key
    }

    pub fn is_live(&self, key: EncounterKey) -> bool {
        self.live.contains(&key)
    }

    /// Schedule `task` to fire `delay` after `now`.
    ///
    /// Returns `None` (and drops the task) when the encounter is not live.
    pub fn schedule(&mut self, key: EncounterKey, now: Duration, delay: Duration, task: T) -> Option<TaskId> {
        if !self.is_live(key) {
            tracing::debug!(?key, "refusing to schedule for a cancelled encounter");
            return None;
        }
        let id = TaskId(self.next_task);
        self.next_task += 1;
        self.queue.push(Scheduled {
            id,
            key,
            due: now.saturating_add(delay),
            task,
        });
        Some(id)
    }

    /// Cancel a single task. Returns whether it was still pending.
    pub fn cancel(&mut self, id: TaskId) -> bool {
        let before = self.queue.len();
        self.queue.retain(|s| s.id != id);
        self.queue.len() != before
    }

    /// Retire an encounter and drop all its pending tasks.
    /// Returns how many tasks were dropped.
    pub fn cancel_encounter(&mut self, key: EncounterKey) -> usize {
        self.live.remove(&key);
        let before = self.queue.len();
        self.queue.retain(|s| s.key != key);
        let dropped = before - self.queue.len();
        if dropped > 0 {
            tracing::debug!(?key, dropped, "cancelled pending encounter tasks");
        }
        dropped
    }

    pub fn pending(&self, key: EncounterKey) -> usize {
        self.queue.iter().filter(|s| s.key == key).count()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Earliest due time among pending tasks
    pub fn next_due(&self) -> Option<Duration> {
        self.queue.iter().map(|s| s.due).min()
    }

    /// Remove and return every task due at or before `now`, earliest first.
    /// Tasks due at the same time come out in scheduling order.
    pub fn drain_due(&mut self, now: Duration) -> Vec<(EncounterKey, T)> {
        let (mut due, rest): (Vec<_>, Vec<_>) =
            self.queue.drain(..).partition(|s| s.due <= now);
        self.queue = rest;

        due.sort_by_key(|s| (s.due, s.id));
        due.into_iter()
            .filter(|s| self.live.contains(&s.key))
            .map(|s| (s.key, s.task))
            .collect()
    }
}
