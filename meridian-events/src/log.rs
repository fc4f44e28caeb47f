//! Bounded activity log.

use meridian_core::{AgentId, EventKind, NormalizedEvent};
use std::collections::VecDeque;

/// Entries kept by default in the activity stream.
pub const DEFAULT_EVENT_LOG_CAPACITY: usize = 50;

/// Fixed-capacity FIFO buffer. The oldest item is evicted first.
#[derive(Debug, Clone, PartialEq)]
pub struct RingBuffer<T> {
    capacity: usize,
    items: VecDeque<T>,
}

impl<T> RingBuffer<T> {
    /// Create a buffer holding at most `capacity` items (minimum 1).
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            items: VecDeque::with_capacity(capacity),
        }
    }

    pub fn push(&mut self, item: T) {
        while self.items.len() >= self.capacity {
            self.items.pop_front();
        }
        self.items.push_back(item);
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Oldest first.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &T> + ExactSizeIterator {
        self.items.iter()
    }

    /// The `n` most recent items, newest first.
    pub fn latest(&self, n: usize) -> impl Iterator<Item = &T> {
        self.items.iter().rev().take(n)
    }
}

/// Display row for one normalized event.
#[derive(Debug, Clone, PartialEq)]
pub struct LogEntry {
    pub timestamp: String,
    pub kind: EventKind,
    pub agent_id: Option<AgentId>,
    pub summary: String,
}

impl From<&NormalizedEvent> for LogEntry {
    fn from(event: &NormalizedEvent) -> Self {
        Self {
            timestamp: event.timestamp.clone(),
            kind: event.kind(),
            agent_id: event.agent_id().map(str::to_string),
            summary: event.summary(),
        }
    }
}

/// Arrival-ordered activity stream. Never consulted by the graph fold.
pub type EventLog = RingBuffer<LogEntry>;

impl RingBuffer<LogEntry> {
    pub fn append(&mut self, event: &NormalizedEvent) {
        self.push(LogEntry::from(event));
    }
}

impl Default for RingBuffer<LogEntry> {
    fn default() -> Self {
        Self::new(DEFAULT_EVENT_LOG_CAPACITY)
    }
}
