//! History entries and the bounded activity feed.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::id::DeviceId;
use crate::time::Timestamp;

/// How many entries the dashboards keep.
pub const RECENT_LIMIT: usize = 10;

/// Append-only record of something that happened to a device.
///
/// Persisted in the store as a `log` pseudo-device; `id` is `None` until the
/// store assigns one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub id: Option<DeviceId>,
    pub device_name: String,
    pub event: String,
    pub value: String,
    pub recorded_at: Timestamp,
}

impl HistoryEntry {
    #[must_use]
    pub fn new(
        device_name: impl Into<String>,
        event: impl Into<String>,
        value: impl Into<String>,
        recorded_at: Timestamp,
    ) -> Self {
        Self {
            id: None,
            device_name: device_name.into(),
            event: event.into(),
            value: value.into(),
            recorded_at,
        }
    }
}

/// Return the `limit` most recent entries, newest first.
///
/// Ties keep the store's order, so later rows win.
#[must_use]
pub fn most_recent(entries: &[HistoryEntry], limit: usize) -> Vec<HistoryEntry> {
    let mut sorted: Vec<HistoryEntry> = entries.iter().rev().cloned().collect();
    sorted.sort_by(|a, b| b.recorded_at.cmp(&a.recorded_at));
    sorted.truncate(limit);
    sorted
}

/// Local change feed, newest first, bounded.
#[derive(Debug, Clone)]
pub struct ActivityFeed {
    entries: VecDeque<HistoryEntry>,
    capacity: usize,
}

impl Default for ActivityFeed {
    fn default() -> Self {
        Self::with_capacity(RECENT_LIMIT)
    }
}

impl ActivityFeed {
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Push an entry at the front, dropping the oldest past capacity.
    pub fn push(&mut self, entry: HistoryEntry) {
        self.entries.push_front(entry);
        self.entries.truncate(self.capacity);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub fn to_vec(&self) -> Vec<HistoryEntry> {
        self.entries.iter().cloned().collect()
    }
}
