//! Data models for diary retrieval.
//!
//! - `DateRange`: inclusive calendar-date interval scoping every query
//! - `DiaryEntry`: one diary record as returned by the remote platform
//! - `CountResult`, `ListResult`: per-call results, never cached
//! - `DiarySummary`: per-author and per-hour aggregation of a list

pub mod diary;
pub mod summary;

pub use diary::{CountResult, DateRange, DiaryEntry, ListResult, RangeError};
pub use summary::DiarySummary;
