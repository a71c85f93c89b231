use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

use crate::error::ErrorKind;
use crate::models::{DiaryEntry, DiarySummary};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Ok,
    Error,
}

/// Uniform response for every bridge call: `status` plus either `data` or
/// `message` and `kind`. Absent fields are omitted from the JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    pub status: Status,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<ErrorKind>,
}

impl Envelope {
    pub fn ok<T: Serialize>(data: &T) -> Self {
        match serde_json::to_value(data) {
            Ok(data) => Self {
                status: Status::Ok,
                data: Some(data),
                message: None,
                kind: None,
            },
            Err(e) => {
                warn!(error = %e, "Failed to serialize bridge payload");
                Self::error(ErrorKind::BridgeUnavailable)
            }
        }
    }

    pub fn error(kind: ErrorKind) -> Self {
        Self {
            status: Status::Error,
            data: None,
            message: Some(kind.message().to_string()),
            kind: Some(kind),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.status == Status::Ok
    }
}

#[derive(Debug, Serialize)]
pub struct LoginData<'a> {
    pub session_id: &'a str,
}

#[derive(Debug, Serialize)]
pub struct CountData {
    pub total: u64,
}

#[derive(Debug, Serialize)]
pub struct ListData<'a> {
    pub entries: &'a [DiaryEntry],
    pub summary: DiarySummary,
    /// Busiest posting hour, when any entry carries one.
    pub peak_hour: Option<u32>,
}
