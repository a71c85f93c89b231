//! Date-bounded count and list queries against the diary platform.
//!
//! `list` walks pages until the remote signals exhaustion, deduplicating by
//! entry id in first-seen order. Only transient failures are retried, and
//! only per request; a rejected session or a malformed page aborts the whole
//! operation and discards what was accumulated.

use std::collections::HashSet;
use std::future::Future;
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::api::{ApiError, DiaryBackend, PageRequest};
use crate::auth::Session;
use crate::config::Config;
use crate::error::{RetrievalError, SessionExpired};
use crate::models::{CountResult, DateRange, ListResult};

use super::RetryPolicy;

pub struct RetrievalEngine {
    backend: Arc<dyn DiaryBackend>,
    policy: RetryPolicy,
    page_size: u32,
    max_pages: u32,
}

impl RetrievalEngine {
    pub fn new(backend: Arc<dyn DiaryBackend>, config: &Config) -> Self {
        Self {
            backend,
            policy: RetryPolicy::from_config(config),
            page_size: config.page_size.max(1),
            max_pages: config.max_pages.max(1),
        }
    }

    /// Count entries in `range`.
    pub async fn count(&self, session: &Session, range: DateRange) -> Result<CountResult, RetrievalError> {
        check_session(session)?;

        let total = self
            .request(session, "count", || {
                self.backend.fetch_count(session.token(), &range)
            })
            .await?;

        debug!(from = %range.from(), to = %range.to(), total, "Diary count fetched");
        Ok(CountResult { range, total })
    }

    /// List entries in `range`, deduplicated by id in page-arrival order.
    pub async fn list(&self, session: &Session, range: DateRange) -> Result<ListResult, RetrievalError> {
        let mut entries = Vec::new();
        let mut seen: HashSet<String> = HashSet::new();
        let mut page = 1u32;

        loop {
            // Between pages: the place a cancellation check would go.
            check_session(session)?;

            if page > self.max_pages {
                return Err(RetrievalError::ProtocolError(format!(
                    "remote did not signal the last page within {} pages",
                    self.max_pages
                )));
            }

            let request = PageRequest {
                range,
                page,
                per_page: self.page_size,
            };
            let fetched = self
                .request(session, "page", || {
                    self.backend.fetch_page(session.token(), &request)
                })
                .await?;

            let received = fetched.entries.len();
            let mut duplicates = 0usize;
            let mut out_of_range = 0usize;
            for entry in fetched.entries {
                if !range.contains(entry.date) {
                    out_of_range += 1;
                } else if seen.insert(entry.id.clone()) {
                    entries.push(entry);
                } else {
                    duplicates += 1;
                }
            }
            if duplicates > 0 {
                debug!(page, duplicates, "Dropped entries already seen on earlier pages");
            }
            if out_of_range > 0 {
                warn!(page, out_of_range, "Remote returned entries outside the requested range");
            }

            // Short page means last page only when the remote sends no flag;
            // a variable remote page size would make this stop early.
            let more = match fetched.has_more {
                Some(flag) => flag,
                None => received >= self.page_size as usize,
            };
            if !more {
                break;
            }
            page += 1;
        }

        info!(
            from = %range.from(),
            to = %range.to(),
            days = range.days(),
            pages = page,
            entries = entries.len(),
            "Diary list fetched"
        );
        Ok(ListResult { range, entries })
    }

    /// Run one remote request under the timeout, retrying transient failures
    /// with backoff. An unauthenticated answer invalidates `session`.
    async fn request<T, F, Fut>(
        &self,
        session: &Session,
        what: &'static str,
        mut call: F,
    ) -> Result<T, RetrievalError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, ApiError>>,
    {
        let mut retries = 0u32;

        loop {
            let outcome = match tokio::time::timeout(self.policy.request_timeout, call()).await {
                Ok(result) => result,
                Err(_) => Err(ApiError::Timeout(self.policy.request_timeout.as_secs())),
            };

            let err = match outcome {
                Ok(value) => return Ok(value),
                Err(err) => err,
            };

            if err.is_unauthenticated() {
                session.invalidate();
                warn!(handle = %session.handle(), what, "Remote rejected the session");
                return Err(RetrievalError::SessionExpired);
            }

            if !err.is_transient() {
                warn!(what, error = %err.summary(), "Unexpected remote response");
                return Err(RetrievalError::ProtocolError(err.summary()));
            }

            if retries >= self.policy.max_retries {
                warn!(what, attempts = retries + 1, error = %err.summary(), "Giving up after retries");
                return Err(RetrievalError::RemoteUnavailable(err.summary()));
            }

            retries += 1;
            let delay = self.policy.backoff(retries);
            warn!(
                what,
                retry = retries,
                backoff_ms = delay.as_millis() as u64,
                error = %err.summary(),
                "Transient failure, backing off"
            );
            tokio::time::sleep(delay).await;

            // A concurrent call may have seen the session rejected meanwhile.
            check_session(session)?;
        }
    }
}

fn check_session(session: &Session) -> Result<(), SessionExpired> {
    if session.is_valid() {
        Ok(())
    } else {
        Err(SessionExpired)
    }
}
