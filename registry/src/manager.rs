use std::collections::{HashMap, HashSet};

use corelib::{User, UserId, UserStatus};
use parking_lot::Mutex;
use tokio::sync::broadcast;
use tracing::{debug, info};

use crate::errors::RegistryError;
use crate::events::RegistryEvent;

const DEFAULT_EVENT_CAPACITY: usize = 1024;

/// Ordered, observable in-memory set of synthetic users.
///
/// Guarantees:
/// - Insertion order is the display and snapshot order.
/// - Ids are unique.
/// - Every mutation touches a single entry (or replaces the whole set) and is
///   published to subscribers after the lock is released.
///
/// The lock is a `parking_lot::Mutex` and is never held across an `.await`.
pub struct UserRegistry {
    inner: Mutex<Inner>,
    events: broadcast::Sender<RegistryEvent>,
}

#[derive(Default)]
struct Inner {
    order: Vec<UserId>,
    users: HashMap<UserId, User>,
}

/// Number of users per status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatusCounts {
    pub ready: usize,
    pub testing: usize,
    pub success: usize,
    pub failed: usize,
}

impl StatusCounts {
    pub fn total(&self) -> usize {
        self.ready + self.testing + self.success + self.failed
    }

    pub fn get(&self, status: UserStatus) -> usize {
        match status {
            UserStatus::Ready => self.ready,
            UserStatus::Testing => self.testing,
            UserStatus::Success => self.success,
            UserStatus::Failed => self.failed,
        }
    }

    fn bump(&mut self, status: UserStatus) {
        match status {
            UserStatus::Ready => self.ready += 1,
            UserStatus::Testing => self.testing += 1,
            UserStatus::Success => self.success += 1,
            UserStatus::Failed => self.failed += 1,
        }
    }
}

impl UserRegistry {
    pub fn new() -> Self {
        Self::with_event_capacity(DEFAULT_EVENT_CAPACITY)
    }

    /// Subscribers lagging more than `capacity` events behind miss the
    /// oldest ones (see `broadcast::error::RecvError::Lagged`).
    pub fn with_event_capacity(capacity: usize) -> Self {
        let (events, _) = broadcast::channel(capacity.max(1));
        Self {
            inner: Mutex::new(Inner::default()),
            events,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<RegistryEvent> {
        self.events.subscribe()
    }

    /// Swaps the whole collection. Every user comes in as `ready`.
    ///
    /// Rejects the batch (registry untouched) if two users share an id.
    pub fn replace_all(&self, users: Vec<User>) -> Result<usize, RegistryError> {
        {
            let mut seen = HashSet::with_capacity(users.len());
            for u in &users {
                if !seen.insert(u.id.as_str()) {
                    return Err(RegistryError::DuplicateId(u.id.clone()));
                }
            }
        }

        let count = users.len();
        {
            let mut inner = self.inner.lock();
            inner.order = users.iter().map(|u| u.id.clone()).collect();
            inner.users = users
                .into_iter()
                .map(|mut u| {
                    u.status = UserStatus::Ready;
                    (u.id.clone(), u)
                })
                .collect();
        }

        info!(count, "user registry replaced");
        self.publish(RegistryEvent::Replaced { count });
        Ok(count)
    }

    /// Drops every user. Clearing an empty registry does nothing.
    pub fn clear(&self) -> usize {
        let removed = {
            let mut inner = self.inner.lock();
            let n = inner.order.len();
            inner.order.clear();
            inner.users.clear();
            n
        };

        if removed > 0 {
            info!(removed, "user registry cleared");
            self.publish(RegistryEvent::Cleared);
        }
        removed
    }

    /// Moves one user to `status` and returns the previous one.
    pub fn set_status(&self, id: &str, status: UserStatus) -> Result<UserStatus, RegistryError> {
        let previous = {
            let mut inner = self.inner.lock();
            let user = inner
                .users
                .get_mut(id)
                .ok_or_else(|| RegistryError::UnknownUser(id.to_string()))?;
            std::mem::replace(&mut user.status, status)
        };

        if previous != status {
            debug!(user_id = %id, from = %previous, to = %status, "user status changed");
            self.publish(RegistryEvent::StatusChanged {
                id: id.to_string(),
                status,
            });
        }
        Ok(previous)
    }

    /// Puts every user back to `ready`. Returns how many actually moved.
    pub fn reset_all(&self) -> usize {
        let changed = {
            let mut inner = self.inner.lock();
            let mut n = 0;
            for u in inner.users.values_mut() {
                if u.status != UserStatus::Ready {
                    u.status = UserStatus::Ready;
                    n += 1;
                }
            }
            n
        };

        if changed > 0 {
            info!(changed, "user statuses reset to ready");
            self.publish(RegistryEvent::StatusesReset);
        }
        changed
    }

    /// Ordered copy of the current users.
    pub fn snapshot(&self) -> Vec<User> {
        let inner = self.inner.lock();
        inner
            .order
            .iter()
            .filter_map(|id| inner.users.get(id).cloned())
            .collect()
    }

    pub fn get(&self, id: &str) -> Option<User> {
        self.inner.lock().users.get(id).cloned()
    }

    pub fn status_of(&self, id: &str) -> Option<UserStatus> {
        self.inner.lock().users.get(id).map(|u| u.status)
    }

    pub fn status_counts(&self) -> StatusCounts {
        let inner = self.inner.lock();
        let mut counts = StatusCounts::default();
        for u in inner.users.values() {
            counts.bump(u.status);
        }
        counts
    }

    pub fn len(&self) -> usize {
        self.inner.lock().order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().order.is_empty()
    }

    fn publish(&self, event: RegistryEvent) {
        // no subscribers is fine
        let _ = self.events.send(event);
    }
}

impl Default for UserRegistry {
    fn default() -> Self {
        Self::new()
    }
}
