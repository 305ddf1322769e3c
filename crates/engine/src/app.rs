//! Application composition.
//!
//! The orchestration layer owns exactly one store and one bus per process
//! and hands them to request handlers - nothing is reached through ambient
//! global state.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::Mutex;

use boardwalk_domain::SessionId;

use crate::bus::EventBus;
use crate::infrastructure::SqliteSessionRepo;
use crate::store::SessionStore;

/// Per-session mutual exclusion for sweeps.
///
/// Two sweeps for the same session must never interleave (the session state
/// is not designed for concurrent writers); sweeps for different sessions
/// run freely in parallel. Request handlers hold the session's lock across
/// publish -> process_all_phases -> read + broadcast.
#[derive(Default)]
pub struct SessionLocks {
    locks: DashMap<SessionId, Arc<Mutex<()>>>,
}

impl SessionLocks {
    pub fn new() -> Self {
        Self {
            locks: DashMap::new(),
        }
    }

    /// Handle to the mutex serializing sweeps for one session.
    pub fn for_session(&self, session_id: &SessionId) -> Arc<Mutex<()>> {
        self.locks
            .entry(session_id.clone())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }
}

/// Everything a request handler needs, explicitly constructed in `main`.
pub struct App {
    pub store: Arc<SessionStore>,
    pub bus: Arc<EventBus>,
    pub sessions: Arc<SqliteSessionRepo>,
    pub locks: SessionLocks,
}

impl App {
    pub fn new(
        store: Arc<SessionStore>,
        bus: Arc<EventBus>,
        sessions: Arc<SqliteSessionRepo>,
    ) -> Self {
        Self {
            store,
            bus,
            sessions,
            locks: SessionLocks::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_session_shares_one_lock() {
        let locks = SessionLocks::new();
        let s1 = SessionId::from_trusted("s1");
        let s2 = SessionId::from_trusted("s2");

        let a = locks.for_session(&s1);
        let b = locks.for_session(&s1);
        let c = locks.for_session(&s2);

        assert!(Arc::ptr_eq(&a, &b));
        assert!(!Arc::ptr_eq(&a, &c));
    }
}
