use anyhow::Result;
use log::debug;
use regex::Regex;
use sha2::{Digest, Sha256};

/// Derives a stable dedup key from decoded message content.
///
/// The CRM may resend logically-identical cancellation notices under fresh
/// Gmail message ids; the business record id embedded in the body is the
/// stable identity. When no record id is found, the key falls back to a
/// hash of subject+date.
pub struct IdentityExtractor {
    record_id_patterns: Vec<Regex>,
}

impl IdentityExtractor {
    pub fn new() -> Result<Self> {
        // Order matters: later patterns are more permissive and could
        // false-positive on unrelated numbers. First match wins.
        let record_id_patterns = vec![
            Regex::new(r"Record ID:\s*(\d+)")?,
            Regex::new(r"Record\s+ID:\s*(\d+)")?,
            Regex::new(r"ID:\s*(\d+)")?,
            Regex::new(r"#(\d+)")?,
        ];

        Ok(IdentityExtractor { record_id_patterns })
    }

    /// Extract the business record id from a message body, if present.
    pub fn extract_record_id(&self, body: &str) -> Option<String> {
        for pattern in &self.record_id_patterns {
            if let Some(captures) = pattern.captures(body) {
                if let Some(id_match) = captures.get(1) {
                    return Some(id_match.as_str().to_string());
                }
            }
        }
        None
    }

    /// Compute the dedup key for a message: `record_<id>` when the body
    /// carries a record id, otherwise a hash of subject and formatted date.
    pub fn dedup_key(&self, subject: &str, date: &str, body: &str) -> String {
        if let Some(record_id) = self.extract_record_id(body) {
            debug!("Content key from record id: record_{}", record_id);
            return format!("record_{}", record_id);
        }

        let mut hasher = Sha256::new();
        hasher.update(subject.as_bytes());
        hasher.update(date.as_bytes());
        let digest = hasher.finalize();

        let key = hex::encode(digest);
        debug!("No record id found, content key from subject+date hash: {}", key);
        key
    }
}
