//! Line-delimited JSON requests from the dashboard and their replies.

use diarybridge_core::{Bridge, Envelope, ErrorKind};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// One request line. Field names follow the dashboard's calls.
#[derive(Debug, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Request {
    Login {
        #[serde(default)]
        identifier: String,
        #[serde(default)]
        secret: String,
    },
    Count {
        #[serde(default)]
        session_id: String,
        #[serde(default)]
        from: String,
        #[serde(default)]
        to: String,
    },
    List {
        #[serde(default)]
        session_id: String,
        #[serde(default)]
        from: String,
        #[serde(default)]
        to: String,
    },
}

impl Request {
    fn op(&self) -> &'static str {
        match self {
            Request::Login { .. } => "login",
            Request::Count { .. } => "count",
            Request::List { .. } => "list",
        }
    }
}

/// Correlation id, read separately so a malformed request can still be answered.
#[derive(Debug, Deserialize)]
struct RequestId {
    request_id: Option<serde_json::Value>,
}

#[derive(Debug, Serialize)]
pub struct Reply {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<serde_json::Value>,
    #[serde(flatten)]
    pub envelope: Envelope,
}

/// Decode one line, run it through the bridge, and build the reply.
pub async fn handle_line(bridge: &Bridge, line: &str) -> Reply {
    let request_id = serde_json::from_str::<RequestId>(line)
        .ok()
        .and_then(|r| r.request_id);

    let request: Request = match serde_json::from_str(line) {
        Ok(request) => request,
        Err(e) => {
            // The serde message can quote field values, secrets included.
            warn!(category = ?e.classify(), line = e.line(), column = e.column(), "Undecodable request line");
            return Reply {
                request_id,
                envelope: Envelope::error(ErrorKind::BridgeUnavailable),
            };
        }
    };

    let op = request.op();
    let envelope = match request {
        Request::Login { identifier, secret } => bridge.login(&identifier, &secret).await,
        Request::Count { session_id, from, to } => bridge.count(&session_id, &from, &to).await,
        Request::List { session_id, from, to } => bridge.list(&session_id, &from, &to).await,
    };
    tracing::debug!(op, ok = envelope.is_ok(), "Request handled");

    Reply {
        request_id,
        envelope,
    }
}
