use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub user_id: i64,
    pub username: String,
    pub created_at: DateTime<Utc>,
}

/// Process-wide session table. Cloning shares the same table.
///
/// Expiry is checked on read: an expired session is removed the first time
/// it is looked up, and `purge_expired` sweeps the rest.
#[derive(Debug, Clone)]
pub struct SessionStore {
    sessions: Arc<Mutex<HashMap<String, Session>>>,
    ttl: Duration,
}

impl SessionStore {
    pub fn new(ttl: Duration) -> Self {
        Self { sessions: Arc::new(Mutex::new(HashMap::new())), ttl }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Creates a session and returns its id.
    pub fn create(&self, user_id: i64, username: &str) -> String {
        self.create_at(user_id, username, Utc::now())
    }

    pub fn create_at(&self, user_id: i64, username: &str, now: DateTime<Utc>) -> String {
        let id = Uuid::new_v4().to_string();
        self.lock().insert(
            id.clone(),
            Session { user_id, username: username.to_string(), created_at: now },
        );
        id
    }

    pub fn get(&self, id: &str) -> Option<Session> {
        self.get_at(id, Utc::now())
    }

    pub fn get_at(&self, id: &str, now: DateTime<Utc>) -> Option<Session> {
        let mut sessions = self.lock();
        let expired = match sessions.get(id) {
            None => return None,
            Some(session) => self.is_expired(session, now),
        };
        if expired {
            sessions.remove(id);
            return None;
        }
        sessions.get(id).cloned()
    }

    /// Removes the session; returns whether it existed.
    pub fn delete(&self, id: &str) -> bool {
        self.lock().remove(id).is_some()
    }

    /// Drops every expired session and returns how many were removed.
    pub fn purge_expired(&self, now: DateTime<Utc>) -> usize {
        let mut sessions = self.lock();
        let before = sessions.len();
        sessions.retain(|_, session| !self.is_expired(session, now));
        before - sessions.len()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    fn is_expired(&self, session: &Session, now: DateTime<Utc>) -> bool {
        now - session.created_at > self.ttl
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, Session>> {
        self.sessions.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
