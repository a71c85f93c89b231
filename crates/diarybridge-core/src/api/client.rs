//! HTTP client for the diary platform.
//!
//! Provides `ApiClient`, the `DiaryBackend` used in production. Response
//! parsing lives in free functions so the wire format can be tested without
//! a server.

use anyhow::Result;
use async_trait::async_trait;
use chrono::{Duration, NaiveDate};
use reqwest::{header, Client};
use serde::{de::DeserializeOwned, Deserialize};
use serde_json::{Map, Value};
use tracing::debug;

use crate::auth::{Credentials, SessionToken};
use crate::config::Config;
use crate::models::{diary::DATE_FORMAT, DateRange, DiaryEntry};

use super::{ApiError, DiaryBackend, LoginGrant, Page, PageRequest};

const USER_AGENT: &str = concat!("diarybridge/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Deserialize)]
struct LoginResponse {
    ok: Option<bool>,
    session_id: Option<String>,
    expires_in: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct CountResponse {
    total: u64,
}

#[derive(Debug, Deserialize)]
struct PageResponse {
    entries: Vec<WireEntry>,
    has_more: Option<bool>,
}

#[derive(Debug, Deserialize)]
struct WireEntry {
    id: WireId,
    date: NaiveDate,
    #[serde(flatten)]
    payload: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum WireId {
    Text(String),
    Number(i64),
}

/// API client for the diary platform.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    shop_dir: Option<String>,
}

impl ApiClient {
    pub fn new(config: &Config) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.request_timeout())
            .user_agent(USER_AGENT)
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            shop_dir: config.shop_dir.clone(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    fn range_query(&self, range: &DateRange) -> Vec<(&'static str, String)> {
        let mut query = vec![
            ("from", range.from().format(DATE_FORMAT).to_string()),
            ("to", range.to().format(DATE_FORMAT).to_string()),
        ];
        if let Some(ref shop) = self.shop_dir {
            query.push(("shopdir", shop.clone()));
        }
        query
    }

    /// Check if response is successful, returning an error with body if not.
    async fn check_response(response: reqwest::Response) -> Result<reqwest::Response, ApiError> {
        if response.status().is_success() {
            Ok(response)
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            Err(ApiError::from_status(status, &body))
        }
    }

    async fn get_text(
        &self,
        token: &SessionToken,
        path: &str,
        query: &[(&'static str, String)],
    ) -> Result<String, ApiError> {
        let response = self
            .client
            .get(self.url(path))
            .header(header::ACCEPT, "application/json")
            .bearer_auth(token.expose())
            .query(query)
            .send()
            .await?;

        let response = Self::check_response(response).await?;
        Ok(response.text().await?)
    }
}

#[async_trait]
impl DiaryBackend for ApiClient {
    async fn login(&self, credentials: &Credentials) -> Result<LoginGrant, ApiError> {
        let response = self
            .client
            .post(self.url("login"))
            .header(header::ACCEPT, "application/json")
            .form(&[
                ("account", credentials.identifier()),
                ("password", credentials.secret()),
            ])
            .send()
            .await?;

        let response = Self::check_response(response).await?;
        let text = response.text().await?;
        parse_login(&text)
    }

    async fn fetch_count(&self, token: &SessionToken, range: &DateRange) -> Result<u64, ApiError> {
        let query = self.range_query(range);
        let text = self.get_text(token, "diaries/count", &query).await?;
        parse_count(&text)
    }

    async fn fetch_page(&self, token: &SessionToken, request: &PageRequest) -> Result<Page, ApiError> {
        let mut query = self.range_query(&request.range);
        query.push(("page", request.page.to_string()));
        query.push(("per_page", request.per_page.to_string()));

        let text = self.get_text(token, "diaries", &query).await?;
        let page = parse_page(&text)?;
        debug!(
            page = request.page,
            entries = page.entries.len(),
            has_more = ?page.has_more,
            "Diary page received"
        );
        Ok(page)
    }
}

fn parse_json<T: DeserializeOwned>(text: &str, what: &str) -> Result<T, ApiError> {
    serde_json::from_str(text)
        .map_err(|e| ApiError::InvalidResponse(format!("Failed to parse {}: {}", what, e)))
}

fn parse_login(text: &str) -> Result<LoginGrant, ApiError> {
    let login: LoginResponse = parse_json(text, "login response")?;
    if login.ok == Some(false) {
        return Err(ApiError::Unauthorized);
    }

    let token = login
        .session_id
        .filter(|id| !id.trim().is_empty())
        .ok_or_else(|| ApiError::InvalidResponse("login response has no session_id".to_string()))?;

    let expires_in = login
        .expires_in
        .filter(|secs| *secs > 0)
        .map(|secs| {
            Duration::try_seconds(secs)
                .ok_or_else(|| ApiError::InvalidResponse(format!("expires_in out of range: {}", secs)))
        })
        .transpose()?;

    Ok(LoginGrant {
        token: SessionToken::new(token),
        expires_in,
    })
}

fn parse_count(text: &str) -> Result<u64, ApiError> {
    let count: CountResponse = parse_json(text, "count response")?;
    Ok(count.total)
}

fn parse_page(text: &str) -> Result<Page, ApiError> {
    let page: PageResponse = parse_json(text, "diary page")?;

    let entries = page
        .entries
        .into_iter()
        .map(|wire| {
            let id = match wire.id {
                WireId::Text(id) => id,
                WireId::Number(n) => n.to_string(),
            };
            if id.trim().is_empty() {
                return Err(ApiError::InvalidResponse("diary entry with empty id".to_string()));
            }
            Ok(DiaryEntry {
                id,
                date: wire.date,
                payload: wire.payload,
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Page {
        entries,
        has_more: page.has_more,
    })
}
