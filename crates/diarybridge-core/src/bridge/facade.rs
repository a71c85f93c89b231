use std::sync::Arc;

use anyhow::Result;
use tracing::{debug, info};

use crate::api::{ApiClient, DiaryBackend};
use crate::auth::{Credentials, Session, SessionManager};
use crate::config::Config;
use crate::error::ErrorKind;
use crate::models::{DateRange, DiarySummary};
use crate::retrieval::RetrievalEngine;

use super::envelope::{CountData, Envelope, ListData, LoginData};

/// The three operations the dashboard calls: `login`, `count`, `list`.
///
/// Only validates input, delegates, and maps outcomes to envelopes. Callers
/// receive an opaque session id; the remote token stays inside.
pub struct Bridge {
    sessions: SessionManager,
    engine: RetrievalEngine,
}

impl Bridge {
    pub fn new(backend: Arc<dyn DiaryBackend>, config: &Config) -> Self {
        Self {
            sessions: SessionManager::new(backend.clone(), config),
            engine: RetrievalEngine::new(backend, config),
        }
    }

    /// Bridge over the HTTP client.
    pub fn connect(config: &Config) -> Result<Self> {
        let client = ApiClient::new(config)?;
        Ok(Self::new(Arc::new(client), config))
    }

    pub fn sessions(&self) -> &SessionManager {
        &self.sessions
    }

    pub async fn login(&self, identifier: &str, secret: &str) -> Envelope {
        match self.sessions.login(Credentials::new(identifier, secret)).await {
            Ok(session) => Envelope::ok(&LoginData {
                session_id: session.handle().as_str(),
            }),
            Err(err) => {
                info!(kind = ?err.kind(), retryable = err.kind().is_retryable(), "Login failed");
                Envelope::error(err.kind())
            }
        }
    }

    pub async fn count(&self, session_id: &str, from: &str, to: &str) -> Envelope {
        let (session, range) = match self.prepare(session_id, from, to).await {
            Ok(ready) => ready,
            Err(kind) => return Envelope::error(kind),
        };

        match self.engine.count(&session, range).await {
            Ok(result) => Envelope::ok(&CountData { total: result.total }),
            Err(err) => {
                info!(kind = ?err.kind(), retryable = err.kind().is_retryable(), error = %err, "Count failed");
                Envelope::error(err.kind())
            }
        }
    }

    pub async fn list(&self, session_id: &str, from: &str, to: &str) -> Envelope {
        let (session, range) = match self.prepare(session_id, from, to).await {
            Ok(ready) => ready,
            Err(kind) => return Envelope::error(kind),
        };

        match self.engine.list(&session, range).await {
            Ok(result) => {
                let summary = DiarySummary::from_entries(&result.entries);
                Envelope::ok(&ListData {
                    entries: &result.entries,
                    peak_hour: summary.peak_hour(),
                    summary,
                })
            }
            Err(err) => {
                info!(kind = ?err.kind(), retryable = err.kind().is_retryable(), error = %err, "List failed");
                Envelope::error(err.kind())
            }
        }
    }

    /// Range first so a bad range never costs a session lookup.
    async fn prepare(
        &self,
        session_id: &str,
        from: &str,
        to: &str,
    ) -> Result<(Session, DateRange), ErrorKind> {
        let range = DateRange::parse(from, to).map_err(|e| {
            debug!(error = %e, "Rejected range");
            ErrorKind::InvalidRange
        })?;
        if session_id.trim().is_empty() {
            return Err(ErrorKind::SessionExpired);
        }
        let session = self
            .sessions
            .resolve(session_id)
            .await
            .map_err(|_| ErrorKind::SessionExpired)?;
        Ok((session, range))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bridge::Status;
    use crate::testing::{
        june_records, test_config, Fault, LogCapture, MockBackend, ACCOUNT, ECHOED_BODY, PASSWORD,
        REMOTE_TOKEN,
    };

    fn bridge(backend: &Arc<MockBackend>) -> Bridge {
        Bridge::new(backend.clone(), &test_config())
    }

    async fn login(bridge: &Bridge) -> String {
        let env = bridge.login(ACCOUNT, PASSWORD).await;
        assert!(env.is_ok(), "login failed: {:?}", env);
        env.data.unwrap()["session_id"].as_str().unwrap().to_string()
    }

    #[tokio::test]
    async fn test_login_count_list_scenario() {
        let backend = Arc::new(MockBackend::new().with_records(june_records(42), 20, false));
        let bridge = bridge(&backend);

        let sid = login(&bridge).await;
        assert_ne!(sid, REMOTE_TOKEN);

        let count = bridge.count(&sid, "2025-06-01", "2025-06-30").await;
        assert_eq!(count.data.as_ref().unwrap()["total"], 42);

        let list = bridge.list(&sid, "2025-06-01", "2025-06-30").await;
        let data = list.data.unwrap();
        let entries = data["entries"].as_array().unwrap();
        assert_eq!(entries.len(), 42);
        assert_eq!(entries[0]["id"], "d-1");
        assert_eq!(entries[41]["id"], "d-42");
        assert_eq!(data["summary"]["total"], 42);
        assert_eq!(data["summary"]["by_author"]["Mika"], 42);
        assert!(data["peak_hour"].is_null());
        assert_eq!(backend.page_calls(), 3);
    }

    #[tokio::test]
    async fn test_inverted_range_fails_without_network() {
        let backend = Arc::new(MockBackend::new().with_records(june_records(3), 20, true));
        let bridge = bridge(&backend);
        let sid = login(&bridge).await;

        for env in [
            bridge.count(&sid, "2025-07-05", "2025-07-01").await,
            bridge.list(&sid, "2025-07-05", "2025-07-01").await,
            bridge.count(&sid, "yesterday", "2025-07-01").await,
        ] {
            assert_eq!(env.status, Status::Error);
            assert_eq!(env.kind, Some(ErrorKind::InvalidRange));
        }
        assert_eq!(backend.count_calls(), 0);
        assert_eq!(backend.page_calls(), 0);
    }

    #[tokio::test]
    async fn test_bad_credentials_and_missing_fields() {
        let backend = Arc::new(MockBackend::new());
        let bridge = bridge(&backend);

        let env = bridge.login(ACCOUNT, "not-the-password").await;
        assert_eq!(env.kind, Some(ErrorKind::InvalidCredentials));
        assert!(env.data.is_none());
        let text = serde_json::to_string(&env).unwrap();
        assert!(!text.contains("not-the-password"));

        assert_eq!(bridge.login("", "").await.kind, Some(ErrorKind::InvalidCredentials));
        assert_eq!(
            bridge.count("", "2025-06-01", "2025-06-02").await.kind,
            Some(ErrorKind::SessionExpired)
        );
        assert_eq!(
            bridge.list("deadbeef", "2025-06-01", "2025-06-02").await.kind,
            Some(ErrorKind::SessionExpired)
        );
        // A bad range is reported even without a session.
        assert_eq!(
            bridge.count("", "2025-06-02", "2025-06-01").await.kind,
            Some(ErrorKind::InvalidRange)
        );
    }

    #[tokio::test]
    async fn test_expiry_mid_list_requires_new_login() {
        let backend = Arc::new(
            MockBackend::new()
                .with_records(june_records(42), 20, true)
                .fail_page(3, vec![Fault::Unauthorized]),
        );
        let bridge = bridge(&backend);
        let sid = login(&bridge).await;

        let list = bridge.list(&sid, "2025-06-01", "2025-06-30").await;
        assert_eq!(list.kind, Some(ErrorKind::SessionExpired));
        assert!(list.data.is_none());

        let count = bridge.count(&sid, "2025-06-01", "2025-06-30").await;
        assert_eq!(count.kind, Some(ErrorKind::SessionExpired));
        assert_eq!(backend.count_calls(), 0);
        assert_eq!(backend.login_calls(), 1);

        let fresh = login(&bridge).await;
        let retry = bridge.list(&fresh, "2025-06-01", "2025-06-30").await;
        assert_eq!(retry.data.unwrap()["entries"].as_array().unwrap().len(), 42);
    }

    #[tokio::test]
    async fn test_unavailable_remote_maps_to_retryable_kind() {
        let backend = Arc::new(
            MockBackend::new()
                .with_records(june_records(3), 20, true)
                .fail_count(vec![Fault::Unavailable; 10]),
        );
        let bridge = bridge(&backend);
        let sid = login(&bridge).await;

        let env = bridge.count(&sid, "2025-06-01", "2025-06-30").await;
        let kind = env.kind.unwrap();
        assert_eq!(kind, ErrorKind::RemoteUnavailable);
        assert!(kind.is_retryable());
        assert!(!env.message.unwrap().contains("503"));
    }

    #[tokio::test]
    async fn test_overlapping_calls_on_one_session() {
        let backend = Arc::new(MockBackend::new().with_records(june_records(42), 20, true));
        let bridge = bridge(&backend);
        let sid = login(&bridge).await;

        let (count, list) = futures::join!(
            bridge.count(&sid, "2025-06-01", "2025-06-30"),
            bridge.list(&sid, "2025-06-01", "2025-06-30"),
        );
        let total = count.data.unwrap()["total"].as_u64().unwrap();
        let listed = list.data.unwrap()["entries"].as_array().unwrap().len() as u64;
        assert_eq!(total, listed);
    }

    #[tokio::test]
    async fn test_logged_out_session_is_rejected() {
        let backend = Arc::new(MockBackend::new().with_records(june_records(3), 20, true));
        let bridge = bridge(&backend);
        let sid = login(&bridge).await;

        assert!(bridge.sessions().logout(&sid).await);
        let env = bridge.list(&sid, "2025-06-01", "2025-06-30").await;
        assert_eq!(env.kind, Some(ErrorKind::SessionExpired));
        assert_eq!(backend.page_calls(), 0);
    }

    #[tokio::test]
    async fn test_remote_bodies_stay_out_of_logs() {
        let logs = LogCapture::default();
        let _guard = logs.install();

        let backend = Arc::new(
            MockBackend::new()
                .with_records(june_records(3), 20, true)
                .fail_login(vec![Fault::UnexpectedStatus, Fault::Unavailable])
                .fail_count(vec![Fault::Unavailable, Fault::UnexpectedStatus])
                .fail_page(1, vec![Fault::Malformed]),
        );
        let bridge = bridge(&backend);

        assert_eq!(bridge.login(ACCOUNT, PASSWORD).await.kind, Some(ErrorKind::ProtocolError));
        assert_eq!(bridge.login(ACCOUNT, PASSWORD).await.kind, Some(ErrorKind::RemoteUnavailable));
        let sid = login(&bridge).await;
        assert_eq!(
            bridge.count(&sid, "2025-06-01", "2025-06-30").await.kind,
            Some(ErrorKind::ProtocolError)
        );
        assert_eq!(
            bridge.list(&sid, "2025-06-01", "2025-06-30").await.kind,
            Some(ErrorKind::ProtocolError)
        );

        let text = logs.contents();
        assert!(text.contains("Transient failure, backing off"), "{}", text);
        assert!(text.contains("Unexpected remote response"), "{}", text);
        assert!(text.contains("unexpected status (418)"), "{}", text);
        assert!(!text.contains(ECHOED_BODY), "{}", text);
        assert!(!text.contains("password="), "{}", text);
        assert!(!text.contains(REMOTE_TOKEN), "{}", text);
    }
}
