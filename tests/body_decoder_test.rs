use mailwatch::body_decoder::{decode_body, extract_text, strip_html, BodyPart};

fn plain(text: &str) -> BodyPart {
    BodyPart::Leaf {
        media_type: "text/plain".to_string(),
        data: text.as_bytes().to_vec(),
    }
}

fn html(markup: &str) -> BodyPart {
    BodyPart::Leaf {
        media_type: "text/html".to_string(),
        data: markup.as_bytes().to_vec(),
    }
}

#[test]
fn test_plain_text_round_trip() {
    let part = plain("A client has been cancelled.\nRecord ID: 1137007417");

    let text = extract_text(&part).expect("plain text part should decode");
    assert_eq!(text, "A client has been cancelled.\nRecord ID: 1137007417");
}

#[test]
fn test_html_part_strips_tags() {
    let part = html("<p>Hi <b>Bob</b></p>");

    let text = extract_text(&part).expect("html part should decode");
    assert!(text.contains("Hi Bob"));
    assert!(!text.contains('<'));
    assert!(!text.contains('>'));
}

#[test]
fn test_plain_preferred_over_html_at_same_level() {
    // multipart/alternative: html listed first, plain still wins
    let tree = BodyPart::Composite {
        children: vec![html("<p>html version</p>"), plain("plain version")],
    };

    assert_eq!(extract_text(&tree).as_deref(), Some("plain version"));
}

#[test]
fn test_recurses_into_nested_composites() {
    // multipart/mixed wrapping a multipart/alternative
    let tree = BodyPart::Composite {
        children: vec![
            BodyPart::Leaf {
                media_type: "application/pdf".to_string(),
                data: vec![0x25, 0x50, 0x44, 0x46],
            },
            BodyPart::Composite {
                children: vec![plain("nested body")],
            },
        ],
    };

    assert_eq!(extract_text(&tree).as_deref(), Some("nested body"));
}

#[test]
fn test_invalid_utf8_leaf_treated_as_empty() {
    let tree = BodyPart::Composite {
        children: vec![
            BodyPart::Leaf {
                media_type: "text/plain".to_string(),
                data: vec![0xff, 0xfe, 0xfd],
            },
            plain("valid sibling"),
        ],
    };

    // Bad bytes must not abort the search
    assert_eq!(extract_text(&tree).as_deref(), Some("valid sibling"));
}

#[test]
fn test_snippet_fallback_when_no_text_anywhere() {
    let tree = BodyPart::Composite {
        children: vec![BodyPart::Leaf {
            media_type: "image/png".to_string(),
            data: vec![0x89, 0x50],
        }],
    };

    assert_eq!(extract_text(&tree), None);
    assert_eq!(decode_body(&tree, "the snippet"), "the snippet");
}

#[test]
fn test_real_text_wins_over_snippet() {
    let part = plain("full body text");

    assert_eq!(decode_body(&part, "the snippet"), "full body text");
}

#[test]
fn test_strip_html_removes_all_tags() {
    assert_eq!(strip_html("<div><p><b>bold</b></p></div>"), "bold");
    assert_eq!(strip_html("no markup at all"), "no markup at all");
    assert_eq!(strip_html(""), "");
}
