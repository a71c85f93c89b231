//! Remote diary platform access.
//!
//! `DiaryBackend` is the seam between the session/retrieval layers and the
//! remote platform. `ApiClient` implements it over HTTP: form login that
//! returns a session token, then bearer-authenticated JSON endpoints for
//! diary counts and paged diary lists.

pub mod backend;
pub mod client;
pub mod error;

pub use backend::{DiaryBackend, LoginGrant, Page, PageRequest};
pub use client::ApiClient;
pub use error::ApiError;
