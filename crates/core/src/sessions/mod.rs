//! Per-user conversation sessions, the store that holds them, and the lock
//! map that serializes turns for one user.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, RwLock};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::plan::Hour;
use crate::domain::preferences::PreferenceRecord;
use crate::domain::user::UserId;
use crate::flows::ConversationState;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub user_id: UserId,
    pub state: ConversationState,
    pub record: PreferenceRecord,
    /// Start hour held until the end hour arrives and the window is committed.
    pub pending_window_start: Option<Hour>,
    pub created_at: DateTime<Utc>,
    pub last_active_at: DateTime<Utc>,
}

impl Session {
    pub fn new(user_id: UserId, now: DateTime<Utc>) -> Self {
        Self {
            user_id,
            state: ConversationState::Initial,
            record: PreferenceRecord::default(),
            pending_window_start: None,
            created_at: now,
            last_active_at: now,
        }
    }

    pub fn touch(&mut self, now: DateTime<Utc>) {
        self.last_active_at = now;
    }

    pub fn is_idle_since(&self, cutoff: DateTime<Utc>) -> bool {
        self.last_active_at < cutoff
    }
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum SessionStoreError {
    #[error("session store unavailable: {0}")]
    Unavailable(String),
}

/// Keyed session storage. Implementations must be safe to share across
/// request handlers; per-user ordering is enforced by [`SessionLocks`].
pub trait SessionStore: Send + Sync {
    fn load(&self, user_id: &UserId) -> Result<Option<Session>, SessionStoreError>;
    fn save(&self, session: Session) -> Result<(), SessionStoreError>;
    fn remove(&self, user_id: &UserId) -> Result<Option<Session>, SessionStoreError>;
    /// Removes every session whose last activity precedes `cutoff`.
    fn remove_idle_since(&self, cutoff: DateTime<Utc>) -> Result<usize, SessionStoreError>;
    fn len(&self) -> Result<usize, SessionStoreError>;

    fn is_empty(&self) -> Result<bool, SessionStoreError> {
        Ok(self.len()? == 0)
    }
}

#[derive(Default)]
pub struct InMemorySessionStore {
    sessions: RwLock<HashMap<UserId, Session>>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStore for InMemorySessionStore {
    fn load(&self, user_id: &UserId) -> Result<Option<Session>, SessionStoreError> {
        let sessions = match self.sessions.read() {
            Ok(sessions) => sessions,
            Err(poisoned) => poisoned.into_inner(),
        };
        Ok(sessions.get(user_id).cloned())
    }

    fn save(&self, session: Session) -> Result<(), SessionStoreError> {
        let mut sessions = match self.sessions.write() {
            Ok(sessions) => sessions,
            Err(poisoned) => poisoned.into_inner(),
        };
        sessions.insert(session.user_id.clone(), session);
        Ok(())
    }

    fn remove(&self, user_id: &UserId) -> Result<Option<Session>, SessionStoreError> {
        let mut sessions = match self.sessions.write() {
            Ok(sessions) => sessions,
            Err(poisoned) => poisoned.into_inner(),
        };
        Ok(sessions.remove(user_id))
    }

    fn remove_idle_since(&self, cutoff: DateTime<Utc>) -> Result<usize, SessionStoreError> {
        let mut sessions = match self.sessions.write() {
            Ok(sessions) => sessions,
            Err(poisoned) => poisoned.into_inner(),
        };
        let before = sessions.len();
        sessions.retain(|_, session| !session.is_idle_since(cutoff));
        Ok(before - sessions.len())
    }

    fn len(&self) -> Result<usize, SessionStoreError> {
        let sessions = match self.sessions.read() {
            Ok(sessions) => sessions,
            Err(poisoned) => poisoned.into_inner(),
        };
        Ok(sessions.len())
    }
}

/// One mutex per user id. Holding the guard for a turn keeps load, mutate and
/// save for that user in arrival order; other users take other locks.
#[derive(Default)]
pub struct SessionLocks {
    locks: Mutex<HashMap<UserId, Arc<Mutex<()>>>>,
}

impl SessionLocks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn handle(&self, user_id: &UserId) -> Arc<Mutex<()>> {
        let mut locks = match self.locks.lock() {
            Ok(locks) => locks,
            Err(poisoned) => poisoned.into_inner(),
        };
        Arc::clone(locks.entry(user_id.clone()).or_default())
    }

    /// Drops lock entries nobody is holding.
    pub fn prune(&self) -> usize {
        let mut locks = match self.locks.lock() {
            Ok(locks) => locks,
            Err(poisoned) => poisoned.into_inner(),
        };
        let before = locks.len();
        locks.retain(|_, lock| Arc::strong_count(lock) > 1);
        before - locks.len()
    }

    pub fn len(&self) -> usize {
        match self.locks.lock() {
            Ok(locks) => locks.len(),
            Err(poisoned) => poisoned.into_inner().len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

pub fn acquire(lock: &Mutex<()>) -> MutexGuard<'_, ()> {
    match lock.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}
