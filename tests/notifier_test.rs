use serde_json::json;

use mailwatch::config::SlackConfig;
use mailwatch::message::NormalizedMessage;
use mailwatch::slack_notifier::SlackNotifier;

fn test_notifier() -> SlackNotifier {
    SlackNotifier::new(&SlackConfig {
        webhook_url: "https://hooks.slack.com/services/TEST".to_string(),
        channel: "#forth-alerts".to_string(),
        username: "Gmail Monitor".to_string(),
    })
    .expect("Failed to build notifier")
}

fn sample_message() -> NormalizedMessage {
    NormalizedMessage {
        subject: "Cancellation Notice".to_string(),
        sender: "noreply@forthcrm.com".to_string(),
        date: "2025-09-17 10:00:00 UTC".to_string(),
        body: "A client has been cancelled. Record ID: 1137007417".to_string(),
        thread_id: "19a7f3b2c4d5e6f7".to_string(),
    }
}

#[test]
fn test_payload_matches_webhook_schema() {
    let notifier = test_notifier();
    let query = "from:noreply@forthcrm.com subject:Cancellation newer_than:7d";

    let payload = notifier.build_payload(&sample_message(), query);

    let expected = json!({
        "text": "📧 New Email: Cancellation Notice",
        "channel": "#forth-alerts",
        "username": "Gmail Monitor",
        "blocks": [
            {
                "type": "header",
                "text": {
                    "type": "plain_text",
                    "text": "📧 Cancellation Notice"
                }
            },
            {
                "type": "section",
                "fields": [
                    {
                        "type": "mrkdwn",
                        "text": "*From:*\nnoreply@forthcrm.com"
                    },
                    {
                        "type": "mrkdwn",
                        "text": "*Date:*\n2025-09-17 10:00:00 UTC"
                    }
                ]
            },
            {
                "type": "section",
                "text": {
                    "type": "mrkdwn",
                    "text": "*Query:* `from:noreply@forthcrm.com subject:Cancellation newer_than:7d`"
                }
            },
            {
                "type": "section",
                "text": {
                    "type": "mrkdwn",
                    "text": "*Preview:*\n```A client has been cancelled. Record ID: 1137007417```"
                }
            },
            {
                "type": "actions",
                "elements": [
                    {
                        "type": "button",
                        "text": {
                            "type": "plain_text",
                            "text": "Open in Gmail"
                        },
                        "url": "https://mail.google.com/mail/u/0/#inbox/19a7f3b2c4d5e6f7",
                        "action_id": "open_gmail"
                    }
                ]
            }
        ]
    });

    assert_eq!(payload, expected);
}

#[test]
fn test_empty_body_omits_preview_block() {
    let notifier = test_notifier();
    let mut message = sample_message();
    message.body = String::new();

    let payload = notifier.build_payload(&message, "query");

    let blocks = payload["blocks"].as_array().expect("blocks array");
    assert_eq!(blocks.len(), 4);
    // The last block is still the Gmail button
    assert_eq!(blocks[3]["type"], "actions");
    for block in blocks {
        let text = block["text"]["text"].as_str().unwrap_or("");
        assert!(!text.starts_with("*Preview:*"));
    }
}

#[test]
fn test_long_body_preview_is_capped() {
    let notifier = test_notifier();
    let mut message = sample_message();
    message.body = "x".repeat(10_000);

    let payload = notifier.build_payload(&message, "query");

    let preview = payload["blocks"][3]["text"]["text"]
        .as_str()
        .expect("preview text");
    let inner = preview
        .strip_prefix("*Preview:*\n```")
        .and_then(|s| s.strip_suffix("```"))
        .expect("fenced preview");
    assert_eq!(inner.chars().count(), 2900);
}
