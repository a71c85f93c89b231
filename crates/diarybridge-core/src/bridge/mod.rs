//! The dashboard-facing contract.
//!
//! `Bridge` exposes `login`, `count` and `list`, each answering with an
//! `Envelope` (`{"status": "ok", "data": ...}` or
//! `{"status": "error", "message": ..., "kind": ...}`).

pub mod envelope;
pub mod facade;

pub use envelope::{Envelope, Status};
pub use facade::Bridge;
