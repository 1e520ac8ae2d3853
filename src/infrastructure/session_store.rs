use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use crate::domain::ports::SessionStore;
use crate::domain::session::Session;

/// Sessions kept in process memory; they do not survive a restart.
#[derive(Default)]
pub struct InMemorySessionStore {
    sessions: Mutex<HashMap<i64, Session>>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn sessions(&self) -> MutexGuard<'_, HashMap<i64, Session>> {
        self.sessions
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl SessionStore for InMemorySessionStore {
    fn get(&self, user_id: i64) -> Option<Session> {
        self.sessions().get(&user_id).cloned()
    }

    fn put(&self, user_id: i64, session: Session) {
        self.sessions().insert(user_id, session);
    }

    fn remove(&self, user_id: i64) {
        self.sessions().remove(&user_id);
    }
}
