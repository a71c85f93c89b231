use async_trait::async_trait;
use chrono::Duration;

use crate::auth::{Credentials, SessionToken};
use crate::models::{DateRange, DiaryEntry};

use super::ApiError;

/// What a successful remote login yields.
#[derive(Debug, Clone)]
pub struct LoginGrant {
    pub token: SessionToken,
    /// Lifetime granted by the remote, when it states one.
    pub expires_in: Option<Duration>,
}

/// One page of a diary listing. `page` is 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub range: DateRange,
    pub page: u32,
    pub per_page: u32,
}

#[derive(Debug, Clone, Default)]
pub struct Page {
    pub entries: Vec<DiaryEntry>,
    /// Explicit continuation flag. `None` when the remote does not send one.
    pub has_more: Option<bool>,
}

/// The remote diary platform. `ApiClient` talks HTTP; tests substitute a
/// scripted backend.
#[async_trait]
pub trait DiaryBackend: Send + Sync {
    async fn login(&self, credentials: &Credentials) -> Result<LoginGrant, ApiError>;

    async fn fetch_count(&self, token: &SessionToken, range: &DateRange) -> Result<u64, ApiError>;

    async fn fetch_page(&self, token: &SessionToken, request: &PageRequest) -> Result<Page, ApiError>;
}
