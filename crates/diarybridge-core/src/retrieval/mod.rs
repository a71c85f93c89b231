//! Record retrieval: date-bounded diary counts and paged listings.

pub mod engine;
pub mod retry;

pub use engine::RetrievalEngine;
pub use retry::RetryPolicy;
