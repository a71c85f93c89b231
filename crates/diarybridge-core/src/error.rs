//! Classified failures surfaced to bridge callers.
//!
//! Every error maps to one `ErrorKind`; the UI decides between retry and
//! re-login prompts from the kind alone.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::RangeError;

/// Error kinds as they appear in bridge envelopes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    InvalidCredentials,
    SessionExpired,
    InvalidRange,
    RemoteUnavailable,
    ProtocolError,
    BridgeUnavailable,
}

impl ErrorKind {
    /// Human-readable message shown by the UI. Never carries remote detail.
    pub fn message(self) -> &'static str {
        match self {
            ErrorKind::InvalidCredentials => "Login failed: the ID or password was rejected",
            ErrorKind::SessionExpired => "Session expired - please log in again",
            ErrorKind::InvalidRange => "Invalid date range: dates must be YYYY-MM-DD and start on or before the end",
            ErrorKind::RemoteUnavailable => "The diary service is unreachable right now - try again shortly",
            ErrorKind::ProtocolError => "The diary service returned an unexpected response",
            ErrorKind::BridgeUnavailable => "The bridge could not process the request",
        }
    }

    pub fn is_retryable(self) -> bool {
        matches!(self, ErrorKind::RemoteUnavailable)
    }
}

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("credentials rejected")]
    InvalidCredentials,

    #[error("remote unavailable: {0}")]
    RemoteUnavailable(String),

    #[error("protocol error: {0}")]
    ProtocolError(String),
}

impl AuthError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            AuthError::InvalidCredentials => ErrorKind::InvalidCredentials,
            AuthError::RemoteUnavailable(_) => ErrorKind::RemoteUnavailable,
            AuthError::ProtocolError(_) => ErrorKind::ProtocolError,
        }
    }
}

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("session expired")]
pub struct SessionExpired;

#[derive(Error, Debug)]
pub enum RetrievalError {
    #[error("invalid range: {0}")]
    InvalidRange(#[from] RangeError),

    #[error("session expired")]
    SessionExpired,

    #[error("remote unavailable: {0}")]
    RemoteUnavailable(String),

    #[error("protocol error: {0}")]
    ProtocolError(String),
}

impl From<SessionExpired> for RetrievalError {
    fn from(_: SessionExpired) -> Self {
        RetrievalError::SessionExpired
    }
}

impl RetrievalError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            RetrievalError::InvalidRange(_) => ErrorKind::InvalidRange,
            RetrievalError::SessionExpired => ErrorKind::SessionExpired,
            RetrievalError::RemoteUnavailable(_) => ErrorKind::RemoteUnavailable,
            RetrievalError::ProtocolError(_) => ErrorKind::ProtocolError,
        }
    }
}
