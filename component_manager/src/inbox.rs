//! Manager inbox and dispatch filters.
//!
//! Messages are kept in arrival order together with the instant they become
//! due. Dispatch always takes the earliest-arrived message that is due and
//! not blocked by a filter, so messages between two endpoints are delivered
//! in the order they were sent.

use core_types::{Duration, Instant};
use ipc::{Message, MessageSelection};
use platform_api::MessagingError;
use std::collections::VecDeque;
use std::fmt;
use thiserror::Error;

/// Inbox error types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum InboxError {
    #[error("inbox is full")]
    Full,
}

impl From<InboxError> for MessagingError {
    fn from(_: InboxError) -> Self {
        MessagingError::OutOfMemory
    }
}

/// When a manager next has work to do
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NextWakeup {
    /// A message becomes dispatchable after this long (zero: right away)
    After(Duration),
    /// Nothing dispatchable is pending
    Infinite,
}

impl NextWakeup {
    /// Checks if a message is ready right now
    pub fn is_immediate(&self) -> bool {
        matches!(self, NextWakeup::After(delay) if delay.is_zero())
    }

    /// Delay in milliseconds, rounded up; `None` for `Infinite`
    pub fn as_millis(&self) -> Option<u64> {
        match self {
            NextWakeup::After(delay) => Some(delay.as_nanos().div_ceil(1_000_000)),
            NextWakeup::Infinite => None,
        }
    }
}

/// Identifies an installed dispatch filter
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FilterId(u64);

impl fmt::Display for FilterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Filter({})", self.0)
    }
}

/// Installed dispatch filters
///
/// A message selected by any filter stays in the inbox until every filter
/// selecting it is removed.
#[derive(Default)]
pub struct FilterSet {
    filters: Vec<(FilterId, Box<dyn MessageSelection>)>,
    next_id: u64,
}

impl FilterSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, selection: Box<dyn MessageSelection>) -> FilterId {
        let id = FilterId(self.next_id);
        self.next_id += 1;
        self.filters.push((id, selection));
        id
    }

    pub fn remove(&mut self, id: FilterId) -> bool {
        let before = self.filters.len();
        self.filters.retain(|(filter, _)| *filter != id);
        self.filters.len() != before
    }

    pub fn contains(&self, id: FilterId) -> bool {
        self.filters.iter().any(|(filter, _)| *filter == id)
    }

    pub fn len(&self) -> usize {
        self.filters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    /// Checks if some filter holds `message` back
    pub fn blocks(&self, message: &Message) -> bool {
        self.filters
            .iter()
            .any(|(_, selection)| selection.is_member(message))
    }
}

#[derive(Debug, Clone)]
struct InboxEntry {
    due: Instant,
    message: Message,
}

/// Arrival-ordered message inbox with optional capacity.
#[derive(Debug, Clone, Default)]
pub struct Inbox {
    capacity: Option<usize>,
    entries: VecDeque<InboxEntry>,
}

impl Inbox {
    /// Creates an inbox; `None` means unbounded.
    pub fn with_capacity(capacity: Option<usize>) -> Self {
        Self {
            capacity,
            entries: VecDeque::new(),
        }
    }

    pub fn capacity(&self) -> Option<usize> {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Queues a message that arrived at `now`; it is due after its delay.
    pub fn push(&mut self, message: Message, now: Instant) -> Result<(), InboxError> {
        if self
            .capacity
            .map_or(false, |capacity| self.entries.len() >= capacity)
        {
            return Err(InboxError::Full);
        }
        let due = now + message.delay;
        self.entries.push_back(InboxEntry { due, message });
        Ok(())
    }

    /// Removes the earliest-arrived message that is due and not filtered.
    pub fn take_ready(&mut self, now: Instant, filters: &FilterSet) -> Option<Message> {
        let position = self
            .entries
            .iter()
            .position(|entry| entry.due <= now && !filters.blocks(&entry.message))?;
        self.entries.remove(position).map(|entry| entry.message)
    }

    /// Computes when the next unfiltered message becomes due.
    pub fn next_wakeup(&self, now: Instant, filters: &FilterSet) -> NextWakeup {
        self.entries
            .iter()
            .filter(|entry| !filters.blocks(&entry.message))
            .map(|entry| entry.due)
            .min()
            .map_or(NextWakeup::Infinite, |due| {
                NextWakeup::After(due.duration_since(now))
            })
    }

    /// Number of queued messages currently held back by filters.
    pub fn blocked_count(&self, filters: &FilterSet) -> usize {
        self.entries
            .iter()
            .filter(|entry| filters.blocks(&entry.message))
            .count()
    }

    /// Discards every queued message, returning how many there were.
    pub fn clear(&mut self) -> usize {
        let count = self.entries.len();
        self.entries.clear();
        count
    }
}
