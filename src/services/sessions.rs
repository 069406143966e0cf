use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

use crate::models::CallSession;

pub type SharedSession = Arc<tokio::sync::Mutex<CallSession>>;

struct Entry {
    session: SharedSession,
    last_activity: Instant,
}

/// Live call sessions keyed by call SID.
///
/// The map lock is only held for lookups and inserts. Each session has its
/// own async lock, held by the request handling that call's current turn.
pub struct SessionStore {
    sessions: Mutex<HashMap<String, Entry>>,
    idle_timeout: Duration,
}

impl SessionStore {
    pub fn new(idle_timeout: Duration) -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
            idle_timeout,
        }
    }

    pub fn get_or_create(&self, call_sid: &str) -> SharedSession {
        let mut sessions = self.lock();
        let entry = sessions.entry(call_sid.to_string()).or_insert_with(|| {
            tracing::info!(call_sid, "creating call session");
            Entry {
                session: Arc::new(tokio::sync::Mutex::new(CallSession::new(call_sid))),
                last_activity: Instant::now(),
            }
        });
        entry.last_activity = Instant::now();
        Arc::clone(&entry.session)
    }

    pub fn get(&self, call_sid: &str) -> Option<SharedSession> {
        self.lock().get(call_sid).map(|e| Arc::clone(&e.session))
    }

    pub fn remove(&self, call_sid: &str) -> bool {
        let removed = self.lock().remove(call_sid).is_some();
        if removed {
            tracing::info!(call_sid, "call session removed");
        }
        removed
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drops sessions with no activity for longer than the idle timeout,
    /// measured against `now`. Returns how many were removed.
    pub fn evict_idle(&self, now: Instant) -> usize {
        let mut sessions = self.lock();
        let before = sessions.len();
        sessions.retain(|call_sid, entry| {
            let keep = now.saturating_duration_since(entry.last_activity) <= self.idle_timeout;
            if !keep {
                tracing::info!(call_sid = %call_sid, "evicting idle call session");
            }
            keep
        });
        before - sessions.len()
    }

    pub fn evict_expired(&self) -> usize {
        self.evict_idle(Instant::now())
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, Entry>> {
        // A panic while holding the map lock cannot leave an entry half-written.
        self.sessions
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
