//! Per-session lock table
//!
//! Maps a session identifier to a mutual-exclusion handle so at most one
//! step or finalize runs per session at a time. This is an explicit
//! service object constructed once and owned by the step controller,
//! never module-level state.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::{Mutex as SessionMutex, OwnedMutexGuard};

/// Guard proving exclusive access to one session for one request
pub type SessionGuard = OwnedMutexGuard<()>;

pub struct SessionRegistry {
    locks: Mutex<HashMap<String, Arc<SessionMutex<()>>>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self {
            locks: Mutex::new(HashMap::new()),
        }
    }

    /// Acquire the session's lock without blocking. Returns None when
    /// another step or finalize currently holds it (fail-fast policy).
    pub fn acquire(&self, session_id: &str) -> Option<SessionGuard> {
        let lock = {
            let mut locks = self.locks.lock().expect("lock table poisoned");
            locks
                .entry(session_id.to_string())
                .or_insert_with(|| Arc::new(SessionMutex::new(())))
                .clone()
        };
        lock.try_lock_owned().ok()
    }

    /// Drop the lock entry for a deleted session
    pub fn remove(&self, session_id: &str) {
        let mut locks = self.locks.lock().expect("lock table poisoned");
        locks.remove(session_id);
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.locks.lock().expect("lock table poisoned").len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_acquire_is_exclusive_per_session() {
        let registry = SessionRegistry::new();

        let guard = registry.acquire("sess-1");
        assert!(guard.is_some());

        // Same session is busy, other sessions are not
        assert!(registry.acquire("sess-1").is_none());
        assert!(registry.acquire("sess-2").is_some());
    }

    #[test]
    fn test_release_on_drop() {
        let registry = SessionRegistry::new();

        let guard = registry.acquire("sess-1").unwrap();
        drop(guard);

        assert!(registry.acquire("sess-1").is_some());
    }

    #[test]
    fn test_remove_clears_entry() {
        let registry = SessionRegistry::new();
        drop(registry.acquire("sess-1").unwrap());
        assert_eq!(registry.len(), 1);

        registry.remove("sess-1");
        assert_eq!(registry.len(), 0);
    }
}
