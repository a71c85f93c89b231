//! Authentication and session lifecycle.
//!
//! This module provides:
//! - `Credentials`: identifier and secret for a single login attempt
//! - `Session`: remote token with optional expiry and an invalidation flag
//! - `SessionManager`: login, validity checks, and the handle registry
//!
//! Sessions live only in memory and are never renewed; a rejected or expired
//! session means the caller has to log in again.

pub mod credentials;
pub mod manager;
pub mod session;

pub use credentials::Credentials;
pub use manager::SessionManager;
pub use session::{Session, SessionHandle, SessionToken};
