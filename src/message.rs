use chrono::DateTime;
use chrono_tz::Tz;

use crate::body_decoder::{self, BodyPart};

/// One header of a Gmail message, as returned by the API.
#[derive(Debug, Clone)]
pub struct MessageHeader {
    pub name: String,
    pub value: String,
}

/// A message returned by a mailbox search, fetched in full but not yet
/// evaluated for dedup. Lives for one poll iteration.
#[derive(Debug, Clone)]
pub struct CandidateMessage {
    pub id: String,
    pub thread_id: String,
    pub snippet: String,
    pub headers: Vec<MessageHeader>,
    pub body: BodyPart,
}

impl CandidateMessage {
    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|h| h.name.eq_ignore_ascii_case(name))
            .map(|h| h.value.as_str())
    }
}

/// The fields actually rendered into a notification, derived from a
/// CandidateMessage for the duration of one delivery attempt.
#[derive(Debug, Clone)]
pub struct NormalizedMessage {
    pub subject: String,
    pub sender: String,
    pub date: String,
    pub body: String,
    pub thread_id: String,
}

impl NormalizedMessage {
    pub fn from_candidate(msg: &CandidateMessage, tz: Tz) -> Self {
        let subject = msg.header("Subject").unwrap_or("No Subject").to_string();
        let sender = msg.header("From").unwrap_or("Unknown Sender").to_string();

        let date_raw = msg.header("Date").unwrap_or("");
        // RFC 2822 date, converted to the configured timezone; fall back to
        // the raw header string when parsing fails
        let date = match DateTime::parse_from_rfc2822(date_raw) {
            Ok(dt) => dt.with_timezone(&tz).format("%Y-%m-%d %H:%M:%S %Z").to_string(),
            Err(_) => date_raw.to_string(),
        };

        let body = body_decoder::decode_body(&msg.body, &msg.snippet);

        NormalizedMessage {
            subject,
            sender,
            date,
            body,
            thread_id: msg.thread_id.clone(),
        }
    }
}
