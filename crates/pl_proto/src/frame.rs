//! Realtime relay frames (WebSocket wire format).

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

/// File metadata carried next to the envelope so the receiving UI can
/// label the transfer without decrypting first. The authoritative copy
/// lives inside the signed payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileInfo {
    #[serde(rename = "fileName")]
    pub file_name: String,
    #[serde(rename = "fileType")]
    pub file_type: String,
}

/// Frame delivered by the relay: `text` is one serialized [`crate::Envelope`]
/// addressed to us.
#[derive(Debug, Clone, Deserialize)]
pub struct InboundFrame {
    pub from: String,
    pub text: String,
    #[serde(default)]
    pub timestamp: Option<String>,
    #[serde(default)]
    pub file_info: Option<FileInfo>,
}

impl InboundFrame {
    /// Relay timestamps arrive as naive UTC ISO strings; fall back to the
    /// local clock when absent or unparsable.
    pub fn timestamp_utc(&self) -> DateTime<Utc> {
        self.timestamp
            .as_deref()
            .and_then(parse_server_timestamp)
            .unwrap_or_else(Utc::now)
    }
}

/// Frame sent to the relay for realtime delivery.
#[derive(Debug, Clone, Serialize)]
pub struct OutboundFrame {
    pub to: String,
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_info: Option<FileInfo>,
}

/// Parse a server timestamp: RFC 3339 if it carries an offset, otherwise
/// a naive ISO string taken as UTC.
pub fn parse_server_timestamp(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    s.parse::<NaiveDateTime>().ok().map(|naive| naive.and_utc())
}
