use std::collections::HashMap;
use std::time::{Duration, Instant};

use tokio::sync::RwLock;
use uuid::Uuid;

/// The name of the cookie carrying the session ID.
pub const SESSION_COOKIE: &str = "tracker_session";

/// The longest session lifetime accepted. Browsers cap cookie lifetimes
/// at 400 days anyway.
pub const MAX_SESSION_TTL: Duration = Duration::from_secs(400 * 24 * 60 * 60);

#[derive(Clone, Debug)]
struct Session {
    username: String,
    expires_at: Instant,
}

/// Logged-in sessions, kept in memory for a fixed lifetime.
#[derive(Debug)]
pub struct Sessions {
    ttl: Duration,
    sessions: RwLock<HashMap<Uuid, Session>>,
}

impl Sessions {
    /// Lifetimes above `MAX_SESSION_TTL` are shortened to it.
    pub fn new(ttl: Duration) -> Self {
        Sessions {
            ttl: ttl.min(MAX_SESSION_TTL),
            sessions: RwLock::new(HashMap::new()),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Starts a new session for `username`, discarding expired ones.
    pub async fn create(&self, username: impl Into<String>) -> Uuid {
        let now = Instant::now();
        let id = Uuid::new_v4();

        // an expiry the clock can't represent ends the session at once
        let expires_at = now.checked_add(self.ttl).unwrap_or(now);

        let mut sessions = self.sessions.write().await;
        sessions.retain(|_, s| s.expires_at > now);
        sessions.insert(
            id,
            Session {
                username: username.into(),
                expires_at,
            },
        );

        id
    }

    /// Returns the username for a live session.
    pub async fn resolve(&self, id: &Uuid) -> Option<String> {
        let now = Instant::now();

        {
            let sessions = self.sessions.read().await;

            match sessions.get(id) {
                Some(s) if s.expires_at > now => return Some(s.username.clone()),
                Some(_) => {}
                None => return None,
            }
        }

        self.sessions.write().await.remove(id);

        None
    }

    pub async fn revoke(&self, id: &Uuid) -> bool {
        self.sessions.write().await.remove(id).is_some()
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Formats the `Set-Cookie` value for a new session.
    pub fn cookie_for(&self, id: &Uuid) -> String {
        format!(
            "{}={}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
            SESSION_COOKIE,
            id,
            self.ttl.as_secs()
        )
    }

    /// Formats a `Set-Cookie` value that makes the browser forget the
    /// session.
    pub fn expired_cookie() -> String {
        format!("{}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0", SESSION_COOKIE)
    }
}
