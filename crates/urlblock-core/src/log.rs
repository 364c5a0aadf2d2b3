//! Bounded, newest-first storage for blocked-URL events

use std::collections::VecDeque;
use std::num::NonZeroUsize;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::error::{LogError, LogResult};
use crate::event::{BlockedEvent, Submission};

/// Default number of retained events
pub const DEFAULT_CAPACITY: NonZeroUsize = match NonZeroUsize::new(10) {
    Some(n) => n,
    None => unreachable!(),
};

/// Point-in-time copy of the whole log, newest first
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogSnapshot {
    pub requests: Vec<BlockedEvent>,
    pub total_requests: usize,
}

/// Point-in-time copy of the newest entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LatestSnapshot {
    pub latest: Option<BlockedEvent>,
    pub total_requests: usize,
}

/// In-memory event log holding at most `capacity` events.
///
/// Index 0 is the most recent insert. A single lock guards the sequence, so
/// submit-with-eviction and clear are atomic with respect to every read.
#[derive(Debug)]
pub struct EventLog {
    events: RwLock<VecDeque<BlockedEvent>>,
    capacity: NonZeroUsize,
}

impl EventLog {
    /// Create an empty log with the given capacity
    pub fn new(capacity: NonZeroUsize) -> Self {
        Self {
            events: RwLock::new(VecDeque::with_capacity(capacity.get())),
            capacity,
        }
    }

    /// Maximum number of retained events
    pub fn capacity(&self) -> usize {
        self.capacity.get()
    }

    fn read(&self) -> LogResult<RwLockReadGuard<'_, VecDeque<BlockedEvent>>> {
        self.events
            .read()
            .map_err(|_| LogError::Storage("failed to acquire read lock".to_string()))
    }

    fn write(&self) -> LogResult<RwLockWriteGuard<'_, VecDeque<BlockedEvent>>> {
        self.events
            .write()
            .map_err(|_| LogError::Storage("failed to acquire write lock".to_string()))
    }

    /// Validate a submission and store it.
    ///
    /// Returns the number of stored events afterwards. A rejected submission
    /// leaves the log untouched.
    pub fn submit(&self, submission: Submission) -> LogResult<usize> {
        let event = submission.into_event()?;
        self.insert(event)
    }

    /// Store a validated event at the front, evicting the oldest entries
    /// past capacity
    fn insert(&self, event: BlockedEvent) -> LogResult<usize> {
        let mut events = self.write()?;
        let url = event.url().to_string();
        events.push_front(event);

        while events.len() > self.capacity.get() {
            if let Some(evicted) = events.pop_back() {
                trace!(url = %evicted.url(), "evicted oldest blocked URL");
            }
        }

        debug!(%url, total_requests = events.len(), "recorded blocked URL");
        Ok(events.len())
    }

    /// Copy of every stored event, newest first
    pub fn list_all(&self) -> LogResult<LogSnapshot> {
        let events = self.read()?;
        Ok(LogSnapshot {
            requests: events.iter().cloned().collect(),
            total_requests: events.len(),
        })
    }

    /// Copy of the newest event, or `None` when the log is empty
    pub fn latest(&self) -> LogResult<LatestSnapshot> {
        let events = self.read()?;
        Ok(LatestSnapshot {
            latest: events.front().cloned(),
            total_requests: events.len(),
        })
    }

    /// Empty the log, returning how many events were discarded
    pub fn clear(&self) -> LogResult<usize> {
        let mut events = self.write()?;
        let cleared = events.len();
        events.clear();
        Ok(cleared)
    }

    /// Number of stored events
    pub fn len(&self) -> LogResult<usize> {
        Ok(self.read()?.len())
    }

    /// Whether the log holds no events
    pub fn is_empty(&self) -> LogResult<bool> {
        Ok(self.read()?.is_empty())
    }
}

impl Default for EventLog {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}
