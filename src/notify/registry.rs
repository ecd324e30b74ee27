//! Registry of live notification sessions.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::sync::RwLock;
use tracing::debug;

use super::Event;

/// Handle to one connected session.
struct SessionHandle {
    id: u64,
    sender: UnboundedSender<Event>,
}

/// Tracks which users have live sessions and fans events out to them.
///
/// A user may hold several sessions at once (multiple tabs or devices);
/// every one of them receives each event. Delivery is fire and forget:
/// a send to a closed session is dropped and the handle pruned.
pub struct SessionRegistry {
    sessions: RwLock<HashMap<i64, Vec<SessionHandle>>>,
    next_id: AtomicU64,
}

impl SessionRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            next_id: AtomicU64::new(1),
        }
    }

    /// Register a new session for a user.
    ///
    /// Returns the session ID and the receiving end of its event channel.
    pub async fn register(&self, user_id: i64) -> (u64, UnboundedReceiver<Event>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);

        let mut sessions = self.sessions.write().await;
        sessions
            .entry(user_id)
            .or_default()
            .push(SessionHandle { id, sender: tx });

        debug!(user_id, session_id = id, "session registered");
        (id, rx)
    }

    /// Remove a session, leaving the user's other sessions intact.
    pub async fn unregister(&self, user_id: i64, session_id: u64) {
        let mut sessions = self.sessions.write().await;
        if let Some(handles) = sessions.get_mut(&user_id) {
            handles.retain(|h| h.id != session_id);
            if handles.is_empty() {
                sessions.remove(&user_id);
            }
        }
        debug!(user_id, session_id, "session unregistered");
    }

    /// Send an event to all of a user's sessions.
    ///
    /// Users without sessions are skipped silently. Closed sessions are
    /// pruned as a side effect.
    pub async fn send(&self, user_id: i64, event: Event) {
        let mut sessions = self.sessions.write().await;
        if let Some(handles) = sessions.get_mut(&user_id) {
            handles.retain(|h| h.sender.send(event.clone()).is_ok());
            if handles.is_empty() {
                sessions.remove(&user_id);
            }
        }
    }

    /// Send an event to each of the given users.
    pub async fn send_to_all(&self, user_ids: &[i64], event: Event) {
        for &user_id in user_ids {
            self.send(user_id, event.clone()).await;
        }
    }

    /// Number of live sessions for a user.
    pub async fn session_count(&self, user_id: i64) -> usize {
        let sessions = self.sessions.read().await;
        sessions.get(&user_id).map_or(0, |h| h.len())
    }
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::new()
    }
}
