//! diarybridge core: an authenticated, session-scoped client for a remote
//! shop-management platform's diary records.
//!
//! - `api`: the `DiaryBackend` seam and its HTTP implementation
//! - `auth`: credentials, sessions, and the `SessionManager`
//! - `retrieval`: date-bounded counts and paged listings
//! - `bridge`: the three-operation envelope contract used by the dashboard

pub mod api;
pub mod auth;
pub mod bridge;
pub mod config;
pub mod error;
pub mod models;
pub mod retrieval;

#[cfg(test)]
pub(crate) mod testing;

pub use bridge::{Bridge, Envelope, Status};
pub use config::Config;
pub use error::{AuthError, ErrorKind, RetrievalError, SessionExpired};
