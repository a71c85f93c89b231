use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::api::{ApiError, DiaryBackend};
use crate::config::Config;
use crate::error::{AuthError, SessionExpired};

use super::{Credentials, Session, SessionHandle};

/// Owns the sessions created through it, keyed by opaque handle.
///
/// Each manager has its own registry; there is no process-wide session store.
pub struct SessionManager {
    backend: Arc<dyn DiaryBackend>,
    request_timeout: Duration,
    default_ttl: Option<chrono::Duration>,
    sessions: RwLock<HashMap<SessionHandle, Session>>,
}

impl SessionManager {
    pub fn new(backend: Arc<dyn DiaryBackend>, config: &Config) -> Self {
        Self {
            backend,
            request_timeout: config.request_timeout(),
            default_ttl: config.session_ttl(),
            sessions: RwLock::new(HashMap::new()),
        }
    }

    /// Authenticate and register a new session.
    ///
    /// Takes the credentials by value; they are dropped when this returns,
    /// whatever the outcome. Never retried.
    pub async fn login(&self, credentials: Credentials) -> Result<Session, AuthError> {
        if !credentials.is_complete() {
            return Err(AuthError::InvalidCredentials);
        }

        let attempt = tokio::time::timeout(self.request_timeout, self.backend.login(&credentials)).await;
        drop(credentials);

        let grant = match attempt {
            Err(_) => {
                warn!(timeout_secs = self.request_timeout.as_secs(), "Login timed out");
                return Err(AuthError::RemoteUnavailable(format!(
                    "login timed out after {}s",
                    self.request_timeout.as_secs()
                )));
            }
            Ok(Err(err)) => return Err(classify_login_error(err)),
            Ok(Ok(grant)) => grant,
        };

        if grant.token.expose().trim().is_empty() {
            return Err(AuthError::ProtocolError("login returned an empty session".to_string()));
        }

        let created_at = Utc::now();
        let expires_at = match grant.expires_in.or(self.default_ttl) {
            Some(ttl) => Some(created_at.checked_add_signed(ttl).ok_or_else(|| {
                warn!("Session lifetime out of range");
                AuthError::ProtocolError("session lifetime out of range".to_string())
            })?),
            None => None,
        };
        let session = Session::new(SessionHandle::generate(), grant.token, created_at, expires_at);

        let mut sessions = self.sessions.write().await;
        sessions.retain(|_, s| s.is_valid());
        sessions.insert(session.handle().clone(), session.clone());

        info!(
            handle = %session.handle(),
            active = sessions.len(),
            expires_in_minutes = ?session.minutes_until_expiry(),
            "Session established"
        );
        Ok(session)
    }

    /// Fail with `SessionExpired` when the session is past its known expiry or
    /// has been rejected by the remote. Never logs in again.
    pub fn ensure_valid(&self, session: &Session) -> Result<Session, SessionExpired> {
        if session.is_valid() {
            Ok(session.clone())
        } else {
            Err(SessionExpired)
        }
    }

    /// Look up a session by handle. Unknown, expired and invalidated sessions
    /// all read as expired; the latter two are evicted.
    pub async fn resolve(&self, handle: &str) -> Result<Session, SessionExpired> {
        let key = SessionHandle::from(handle);
        let found = self.sessions.read().await.get(&key).cloned();

        let Some(session) = found else {
            debug!("Unknown session handle");
            return Err(SessionExpired);
        };

        match self.ensure_valid(&session) {
            Ok(session) => Ok(session),
            Err(expired) => {
                self.sessions.write().await.remove(&key);
                info!(handle = %key, "Session expired, evicted");
                Err(expired)
            }
        }
    }

    /// Drop a session. Returns whether it was registered.
    pub async fn logout(&self, handle: &str) -> bool {
        let key = SessionHandle::from(handle);
        match self.sessions.write().await.remove(&key) {
            Some(session) => {
                session.invalidate();
                info!(handle = %key, "Logged out");
                true
            }
            None => false,
        }
    }

    pub async fn active_sessions(&self) -> usize {
        self.sessions.read().await.values().filter(|s| s.is_valid()).count()
    }
}

fn classify_login_error(err: ApiError) -> AuthError {
    if err.is_unauthenticated() {
        AuthError::InvalidCredentials
    } else if err.is_transient() {
        warn!(error = %err.summary(), "Login failed: remote unavailable");
        AuthError::RemoteUnavailable(err.summary())
    } else {
        warn!(error = %err.summary(), "Login failed: unexpected response");
        AuthError::ProtocolError(err.summary())
    }
}
