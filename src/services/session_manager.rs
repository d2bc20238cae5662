use crate::models::errors::AppError;
use crate::models::user::Identity;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, SystemTime};
use tokio::sync::RwLock;
use uuid::Uuid;

/// Name of the cookie carrying the session id
pub const SESSION_COOKIE: &str = "session_id";

/// Session data stored for each signed-in user
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionData {
    pub session_id: String,
    pub identity: Identity,
    pub created_at: SystemTime,
    pub last_accessed: SystemTime,
}

impl SessionData {
    /// Creates a new session for an identity
    pub fn new(identity: Identity) -> Self {
        let now = SystemTime::now();
        Self {
            session_id: Uuid::new_v4().to_string(),
            identity,
            created_at: now,
            last_accessed: now,
        }
    }

    /// Updates the last accessed time
    pub fn touch(&mut self) {
        self.last_accessed = SystemTime::now();
    }

    /// Checks if the session has expired
    pub fn is_expired(&self, expiry_duration: Duration) -> bool {
        if let Ok(elapsed) = self.last_accessed.elapsed() {
            elapsed > expiry_duration
        } else {
            true
        }
    }
}

/// Session manager for handling user sessions
#[derive(Clone)]
pub struct SessionManager {
    sessions: Arc<RwLock<HashMap<String, SessionData>>>,
    expiry_duration: Duration,
}

impl SessionManager {
    /// Creates a new SessionManager with default expiry (7 days)
    pub fn new() -> Self {
        Self::with_expiry(Duration::from_secs(60 * 60 * 24 * 7))
    }

    /// Creates a new SessionManager with custom expiry duration
    pub fn with_expiry(expiry_duration: Duration) -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
            expiry_duration,
        }
    }

    pub fn expiry_duration(&self) -> Duration {
        self.expiry_duration
    }

    /// Creates a new session and returns the session ID
    pub async fn create_session(&self, identity: Identity) -> String {
        let session = SessionData::new(identity);
        let session_id = session.session_id.clone();

        let mut sessions = self.sessions.write().await;
        sessions.insert(session_id.clone(), session);

        tracing::debug!("Created new session: {}", session_id);
        session_id
    }

    /// Resolves a session ID to its identity, refreshing its idle timer.
    /// Expired sessions are removed and resolve to `None`.
    pub async fn resolve(&self, session_id: &str) -> Option<Identity> {
        let mut sessions = self.sessions.write().await;

        let expired = match sessions.get_mut(session_id) {
            Some(session) if !session.is_expired(self.expiry_duration) => {
                session.touch();
                return Some(session.identity.clone());
            }
            Some(_) => true,
            None => false,
        };

        if expired {
            sessions.remove(session_id);
            tracing::debug!("Session expired: {}", session_id);
        }

        None
    }

    /// Gets a session by ID
    pub async fn get_session(&self, session_id: &str) -> Option<SessionData> {
        let sessions = self.sessions.read().await;
        sessions.get(session_id).cloned()
    }

    /// Replaces the identity of every session belonging to a user, so that
    /// profile changes show up without signing in again
    pub async fn refresh_identity(&self, identity: &Identity) -> usize {
        let mut sessions = self.sessions.write().await;
        let mut refreshed = 0;

        for session in sessions
            .values_mut()
            .filter(|s| s.identity.user_id == identity.user_id)
        {
            session.identity = identity.clone();
            refreshed += 1;
        }

        refreshed
    }

    /// Destroys a session
    pub async fn destroy_session(&self, session_id: &str) -> Result<(), AppError> {
        let mut sessions = self.sessions.write().await;

        if sessions.remove(session_id).is_some() {
            tracing::debug!("Destroyed session: {}", session_id);
            Ok(())
        } else {
            Err(AppError::session_error(format!(
                "Session not found: {}",
                session_id
            )))
        }
    }

    /// Destroys every session of a user except `keep`
    pub async fn destroy_user_sessions(&self, user_id: Uuid, keep: Option<&str>) -> usize {
        let mut sessions = self.sessions.write().await;
        let initial_count = sessions.len();

        sessions.retain(|id, session| {
            session.identity.user_id != user_id || Some(id.as_str()) == keep
        });

        initial_count - sessions.len()
    }

    /// Cleans up expired sessions
    pub async fn cleanup_expired_sessions(&self) -> usize {
        let mut sessions = self.sessions.write().await;
        let initial_count = sessions.len();

        sessions.retain(|_, session| !session.is_expired(self.expiry_duration));

        let removed_count = initial_count - sessions.len();

        if removed_count > 0 {
            tracing::info!("Cleaned up {} expired sessions", removed_count);
        }

        removed_count
    }

    /// Gets the number of active sessions
    pub async fn session_count(&self) -> usize {
        let sessions = self.sessions.read().await;
        sessions.len()
    }

    /// Validates if a session exists and is not expired
    pub async fn validate_session(&self, session_id: &str) -> bool {
        let sessions = self.sessions.read().await;

        if let Some(session) = sessions.get(session_id) {
            !session.is_expired(self.expiry_duration)
        } else {
            false
        }
    }
}

impl Default for SessionManager {
    fn default() -> Self {
        Self::new()
    }
}
