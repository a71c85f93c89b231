//! Scripted `DiaryBackend` and fixtures shared by unit tests.

use std::collections::{HashMap, VecDeque};
use std::io;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use reqwest::StatusCode;
use serde_json::{json, Map, Value};

use crate::api::{ApiError, DiaryBackend, LoginGrant, Page, PageRequest};
use crate::auth::{Credentials, Session, SessionHandle, SessionToken};
use crate::config::Config;
use crate::models::{DateRange, DiaryEntry};

pub const ACCOUNT: &str = "store1";
pub const PASSWORD: &str = "pw";
pub const REMOTE_TOKEN: &str = "remote-token-7f3a";

/// Error page body that echoes the submitted login form.
pub const ECHOED_BODY: &str = "REMOTE-BODY account=store1 password=pw";

/// Failure injected in place of one remote answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fault {
    Unavailable,
    Unauthorized,
    Malformed,
    /// A status outside the contract, e.g. 418.
    UnexpectedStatus,
    /// Never answers within any sane timeout.
    Hang,
}

impl Fault {
    async fn into_error(self) -> ApiError {
        match self {
            Fault::Unavailable => ApiError::from_status(StatusCode::SERVICE_UNAVAILABLE, ECHOED_BODY),
            Fault::Unauthorized => ApiError::Unauthorized,
            Fault::Malformed => ApiError::InvalidResponse(format!("Failed to parse diary page: {}", ECHOED_BODY)),
            Fault::UnexpectedStatus => ApiError::from_status(StatusCode::IM_A_TEAPOT, ECHOED_BODY),
            Fault::Hang => {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                ApiError::Timeout(3600)
            }
        }
    }
}

pub struct MockBackend {
    records: Vec<DiaryEntry>,
    pages: Vec<Page>,
    login_faults: Mutex<VecDeque<Fault>>,
    count_faults: Mutex<VecDeque<Fault>>,
    page_faults: Mutex<HashMap<u32, VecDeque<Fault>>>,
    page_attempts: Mutex<HashMap<u32, usize>>,
    login_calls: AtomicUsize,
    count_calls: AtomicUsize,
    page_calls: AtomicUsize,
    grant_ttl: Option<chrono::Duration>,
}

impl MockBackend {
    pub fn new() -> Self {
        Self {
            records: Vec::new(),
            pages: Vec::new(),
            login_faults: Mutex::new(VecDeque::new()),
            count_faults: Mutex::new(VecDeque::new()),
            page_faults: Mutex::new(HashMap::new()),
            page_attempts: Mutex::new(HashMap::new()),
            login_calls: AtomicUsize::new(0),
            count_calls: AtomicUsize::new(0),
            page_calls: AtomicUsize::new(0),
            grant_ttl: None,
        }
    }

    /// Serve `records` in pages of `per_page`; with `flag` each page carries
    /// an explicit `has_more`, otherwise the flag is omitted.
    pub fn with_records(mut self, records: Vec<DiaryEntry>, per_page: usize, flag: bool) -> Self {
        let chunks: Vec<_> = records.chunks(per_page).map(|c| c.to_vec()).collect();
        let last = chunks.len().saturating_sub(1);
        self.pages = chunks
            .into_iter()
            .enumerate()
            .map(|(i, entries)| Page {
                entries,
                has_more: flag.then_some(i < last),
            })
            .collect();
        self.records = records;
        self
    }

    /// Serve hand-built pages; the count reports the unique ids across them.
    pub fn with_pages(mut self, pages: Vec<Page>) -> Self {
        let mut seen = std::collections::HashSet::new();
        self.records = pages
            .iter()
            .flat_map(|p| p.entries.iter())
            .filter(|e| seen.insert(e.id.clone()))
            .cloned()
            .collect();
        self.pages = pages;
        self
    }

    pub fn with_grant_ttl(mut self, ttl: chrono::Duration) -> Self {
        self.grant_ttl = Some(ttl);
        self
    }

    pub fn fail_login(self, faults: Vec<Fault>) -> Self {
        self.login_faults.lock().unwrap().extend(faults);
        self
    }

    pub fn fail_count(self, faults: Vec<Fault>) -> Self {
        self.count_faults.lock().unwrap().extend(faults);
        self
    }

    pub fn fail_page(self, page: u32, faults: Vec<Fault>) -> Self {
        self.page_faults
            .lock()
            .unwrap()
            .entry(page)
            .or_default()
            .extend(faults);
        self
    }

    pub fn login_calls(&self) -> usize {
        self.login_calls.load(Ordering::SeqCst)
    }

    pub fn count_calls(&self) -> usize {
        self.count_calls.load(Ordering::SeqCst)
    }

    pub fn page_calls(&self) -> usize {
        self.page_calls.load(Ordering::SeqCst)
    }

    pub fn attempts_for_page(&self, page: u32) -> usize {
        self.page_attempts.lock().unwrap().get(&page).copied().unwrap_or(0)
    }

    fn check_token(token: &SessionToken) -> Result<(), ApiError> {
        if token.expose() == REMOTE_TOKEN {
            Ok(())
        } else {
            Err(ApiError::Unauthorized)
        }
    }
}

#[async_trait]
impl DiaryBackend for MockBackend {
    async fn login(&self, credentials: &Credentials) -> Result<LoginGrant, ApiError> {
        self.login_calls.fetch_add(1, Ordering::SeqCst);
        let fault = self.login_faults.lock().unwrap().pop_front();
        if let Some(fault) = fault {
            return Err(fault.into_error().await);
        }
        if credentials.identifier() == ACCOUNT && credentials.secret() == PASSWORD {
            Ok(LoginGrant {
                token: SessionToken::new(REMOTE_TOKEN),
                expires_in: self.grant_ttl,
            })
        } else {
            Err(ApiError::Unauthorized)
        }
    }

    async fn fetch_count(&self, token: &SessionToken, range: &DateRange) -> Result<u64, ApiError> {
        self.count_calls.fetch_add(1, Ordering::SeqCst);
        let fault = self.count_faults.lock().unwrap().pop_front();
        if let Some(fault) = fault {
            return Err(fault.into_error().await);
        }
        Self::check_token(token)?;
        Ok(self.records.iter().filter(|e| range.contains(e.date)).count() as u64)
    }

    async fn fetch_page(&self, token: &SessionToken, request: &PageRequest) -> Result<Page, ApiError> {
        self.page_calls.fetch_add(1, Ordering::SeqCst);
        *self
            .page_attempts
            .lock()
            .unwrap()
            .entry(request.page)
            .or_default() += 1;
        let fault = self
            .page_faults
            .lock()
            .unwrap()
            .get_mut(&request.page)
            .and_then(VecDeque::pop_front);
        if let Some(fault) = fault {
            return Err(fault.into_error().await);
        }
        Self::check_token(token)?;
        Ok(self
            .pages
            .get(request.page as usize - 1)
            .cloned()
            .unwrap_or_default())
    }
}

pub fn record(id: &str, date: &str) -> DiaryEntry {
    let mut payload = Map::new();
    payload.insert("author".to_string(), Value::String("Mika".to_string()));
    payload.insert("title".to_string(), json!(format!("diary {}", id)));
    DiaryEntry {
        id: id.to_string(),
        date: NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(),
        payload,
    }
}

/// `n` entries with ids `d-1..=d-n`, spread over June 2025.
pub fn june_records(n: usize) -> Vec<DiaryEntry> {
    (1..=n)
        .map(|i| record(&format!("d-{}", i), &format!("2025-06-{:02}", (i - 1) % 30 + 1)))
        .collect()
}

pub fn test_config() -> Config {
    Config {
        base_url: "http://remote.test".to_string(),
        request_timeout_secs: 5,
        page_size: 20,
        max_retries: 3,
        initial_backoff_ms: 1,
        max_backoff_ms: 5,
        ..Config::default()
    }
}

pub fn test_session() -> Session {
    Session::new(
        SessionHandle::generate(),
        SessionToken::new(REMOTE_TOKEN),
        Utc::now(),
        Some(Utc::now() + chrono::Duration::minutes(30)),
    )
}

pub fn expired_session() -> Session {
    Session::new(
        SessionHandle::generate(),
        SessionToken::new(REMOTE_TOKEN),
        Utc::now() - chrono::Duration::minutes(40),
        Some(Utc::now() - chrono::Duration::minutes(10)),
    )
}

/// Formatted log output of the current thread while the guard from
/// `install` is alive.
#[derive(Clone, Default)]
pub struct LogCapture(Arc<Mutex<Vec<u8>>>);

impl LogCapture {
    pub fn install(&self) -> tracing::subscriber::DefaultGuard {
        let sink = self.0.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_ansi(false)
            .with_writer(move || LogWriter(sink.clone()))
            .finish();
        tracing::subscriber::set_default(subscriber)
    }

    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

struct LogWriter(Arc<Mutex<Vec<u8>>>);

impl io::Write for LogWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
