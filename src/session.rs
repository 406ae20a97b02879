//! Server-side dashboard sessions
//!
//! The cookie path of gate 1. A login binds a user id to a random session id;
//! later requests presenting that id are authenticated without a signature
//! check, so trust rests entirely on this store's own integrity.

use std::collections::HashMap;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

struct Session {
    user_id: String,
    expires_at: Instant,
}

/// In-memory session store with a fixed lifetime per session
pub struct SessionStore {
    ttl: Duration,
    sessions: RwLock<HashMap<String, Session>>,
}

impl SessionStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            sessions: RwLock::new(HashMap::new()),
        }
    }

    /// Bind a user id to a fresh session id
    pub async fn open(&self, user_id: &str) -> String {
        let session_id = uuid::Uuid::new_v4().to_string();
        let session = Session {
            user_id: user_id.to_string(),
            expires_at: Instant::now() + self.ttl,
        };
        self.sessions
            .write()
            .await
            .insert(session_id.clone(), session);
        session_id
    }

    /// Look up the user bound to a session id; expired sessions are dropped
    pub async fn user_for(&self, session_id: &str) -> Option<String> {
        {
            let sessions = self.sessions.read().await;
            match sessions.get(session_id) {
                Some(session) if session.expires_at > Instant::now() => {
                    return Some(session.user_id.clone());
                }
                Some(_) => {}
                None => return None,
            }
        }

        // Stale entry; evict under the write lock
        self.sessions.write().await.remove(session_id);
        None
    }

    /// Drop a session (logout)
    pub async fn revoke(&self, session_id: &str) {
        self.sessions.write().await.remove(session_id);
    }

    /// Drop every expired session
    pub async fn purge_expired(&self) {
        let now = Instant::now();
        self.sessions
            .write()
            .await
            .retain(|_, session| session.expires_at > now);
    }

    pub async fn session_count(&self) -> usize {
        self.sessions.read().await.len()
    }
}
