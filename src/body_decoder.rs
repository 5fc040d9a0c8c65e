use std::sync::OnceLock;

use regex::Regex;

/// One node of a Gmail message body tree.
///
/// The Gmail `full` format returns a MIME tree: leaves carry a media type
/// and decoded content bytes, composite nodes carry an ordered list of
/// children (`multipart/alternative`, `multipart/mixed`, ...).
#[derive(Debug, Clone)]
pub enum BodyPart {
    Leaf {
        media_type: String,
        data: Vec<u8>,
    },
    Composite {
        children: Vec<BodyPart>,
    },
}

fn html_tag_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| Regex::new(r"<[^>]+>").expect("valid HTML tag regex"))
}

/// Strip markup tags to approximate plain text.
pub fn strip_html(html: &str) -> String {
    html_tag_regex().replace_all(html, "").to_string()
}

fn leaf_text(media_type: &str, data: &[u8], wanted: &str) -> Option<String> {
    if media_type != wanted || data.is_empty() {
        return None;
    }
    // Invalid UTF-8 counts as empty; the search continues elsewhere
    match std::str::from_utf8(data) {
        Ok(s) if !s.is_empty() => Some(s.to_string()),
        _ => None,
    }
}

/// Extract the best textual content from a body tree.
///
/// Per level, first match wins: the first text/plain leaf, failing that the
/// first text/html leaf (tags stripped), failing that the first nested
/// composite that yields anything. Returns None when the whole tree holds
/// no decodable text.
pub fn extract_text(part: &BodyPart) -> Option<String> {
    match part {
        BodyPart::Leaf { media_type, data } => {
            if let Some(text) = leaf_text(media_type, data, "text/plain") {
                return Some(text);
            }
            if let Some(html) = leaf_text(media_type, data, "text/html") {
                let text = strip_html(&html);
                if !text.is_empty() {
                    return Some(text);
                }
            }
            None
        }
        BodyPart::Composite { children } => {
            for child in children {
                if let BodyPart::Leaf { media_type, data } = child {
                    if let Some(text) = leaf_text(media_type, data, "text/plain") {
                        return Some(text);
                    }
                }
            }
            for child in children {
                if let BodyPart::Leaf { media_type, data } = child {
                    if let Some(html) = leaf_text(media_type, data, "text/html") {
                        let text = strip_html(&html);
                        if !text.is_empty() {
                            return Some(text);
                        }
                    }
                }
            }
            for child in children {
                if let BodyPart::Composite { .. } = child {
                    if let Some(text) = extract_text(child) {
                        return Some(text);
                    }
                }
            }
            None
        }
    }
}

/// Decode a body tree to plain text, falling back to the provider snippet
/// when the tree holds no text. Never fails; full text always wins over the
/// snippet when any exists.
pub fn decode_body(part: &BodyPart, snippet: &str) -> String {
    extract_text(part).unwrap_or_else(|| snippet.to_string())
}
