use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use rand::Rng;

/// Opaque identifier handed to bridge callers in place of the live session.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionHandle(String);

impl SessionHandle {
    /// 128 random bits, hex encoded.
    pub fn generate() -> Self {
        let bits: u128 = rand::thread_rng().gen();
        Self(format!("{:032x}", bits))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for SessionHandle {
    fn from(s: &str) -> Self {
        Self(s.trim().to_string())
    }
}

impl fmt::Display for SessionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Remote session token. Only backends see the raw value.
#[derive(Clone, PartialEq, Eq)]
pub struct SessionToken(String);

impl SessionToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SessionToken(***)")
    }
}

struct SessionInner {
    handle: SessionHandle,
    token: SessionToken,
    created_at: DateTime<Utc>,
    expires_at: Option<DateTime<Utc>>,
    invalidated: AtomicBool,
}

/// An authenticated session. Clone is cheap and every clone shares the same
/// invalidation flag, which only ever moves from valid to invalid.
#[derive(Clone)]
pub struct Session {
    inner: Arc<SessionInner>,
}

impl Session {
    pub(crate) fn new(
        handle: SessionHandle,
        token: SessionToken,
        created_at: DateTime<Utc>,
        expires_at: Option<DateTime<Utc>>,
    ) -> Self {
        Self {
            inner: Arc::new(SessionInner {
                handle,
                token,
                created_at,
                expires_at,
                invalidated: AtomicBool::new(false),
            }),
        }
    }

    pub fn handle(&self) -> &SessionHandle {
        &self.inner.handle
    }

    pub fn token(&self) -> &SessionToken {
        &self.inner.token
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.inner.created_at
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.inner.expires_at
    }

    pub fn is_expired(&self) -> bool {
        self.inner
            .expires_at
            .map(|expiry| Utc::now() >= expiry)
            .unwrap_or(false)
    }

    pub fn is_invalidated(&self) -> bool {
        self.inner.invalidated.load(Ordering::Acquire)
    }

    /// Exists, not invalidated, and not past a known expiry.
    pub fn is_valid(&self) -> bool {
        !self.is_invalidated() && !self.is_expired()
    }

    /// Mark the session unusable. Safe to call from concurrent requests.
    pub fn invalidate(&self) {
        self.inner.invalidated.store(true, Ordering::Release);
    }

    pub fn time_until_expiry(&self) -> Option<Duration> {
        self.inner.expires_at.map(|expiry| expiry - Utc::now())
    }

    /// Minutes remaining until expiry (for display)
    pub fn minutes_until_expiry(&self) -> Option<i64> {
        self.time_until_expiry().map(|d| d.num_minutes().max(0))
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("handle", &self.inner.handle)
            .field("created_at", &self.inner.created_at)
            .field("expires_at", &self.inner.expires_at)
            .field("invalidated", &self.is_invalidated())
            .finish_non_exhaustive()
    }
}
