use mailwatch::body_decoder::BodyPart;
use mailwatch::message::{CandidateMessage, MessageHeader, NormalizedMessage};

fn candidate_with_headers(headers: Vec<(&str, &str)>) -> CandidateMessage {
    CandidateMessage {
        id: "A".to_string(),
        thread_id: "thread_A".to_string(),
        snippet: "snippet text".to_string(),
        headers: headers
            .into_iter()
            .map(|(name, value)| MessageHeader {
                name: name.to_string(),
                value: value.to_string(),
            })
            .collect(),
        body: BodyPart::Leaf {
            media_type: "text/plain".to_string(),
            data: b"body text".to_vec(),
        },
    }
}

#[test]
fn test_headers_are_looked_up_case_insensitively() {
    let msg = candidate_with_headers(vec![
        ("subject", "Cancellation"),
        ("FROM", "noreply@forthcrm.com"),
    ]);

    let normalized = NormalizedMessage::from_candidate(&msg, chrono_tz::UTC);
    assert_eq!(normalized.subject, "Cancellation");
    assert_eq!(normalized.sender, "noreply@forthcrm.com");
}

#[test]
fn test_missing_headers_get_defaults() {
    let msg = candidate_with_headers(vec![]);

    let normalized = NormalizedMessage::from_candidate(&msg, chrono_tz::UTC);
    assert_eq!(normalized.subject, "No Subject");
    assert_eq!(normalized.sender, "Unknown Sender");
}

#[test]
fn test_date_converted_to_configured_timezone() {
    let msg = candidate_with_headers(vec![
        ("Date", "Wed, 17 Sep 2025 10:00:00 +0000"),
    ]);

    let normalized = NormalizedMessage::from_candidate(&msg, chrono_tz::Asia::Manila);
    // Manila is UTC+8; %Z renders the tz abbreviation (Philippine Standard Time)
    assert_eq!(normalized.date, "2025-09-17 18:00:00 PST");
}

#[test]
fn test_unparseable_date_falls_back_to_raw_header() {
    let msg = candidate_with_headers(vec![("Date", "not a date at all")]);

    let normalized = NormalizedMessage::from_candidate(&msg, chrono_tz::UTC);
    assert_eq!(normalized.date, "not a date at all");
}

#[test]
fn test_body_decoded_from_tree() {
    let msg = candidate_with_headers(vec![("Subject", "s")]);

    let normalized = NormalizedMessage::from_candidate(&msg, chrono_tz::UTC);
    assert_eq!(normalized.body, "body text");
    assert_eq!(normalized.thread_id, "thread_A");
}
