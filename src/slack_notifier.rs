use std::time::Duration;

use anyhow::{Result, Context};
use google_gmail1::hyper_rustls::{self, HttpsConnector};
use hyper::{Body, Client, Method, Request};
use hyper::client::HttpConnector;
use hyper::header::CONTENT_TYPE;
use log::{info, error};
use serde_json::{json, Value};

use crate::config::SlackConfig;
use crate::message::NormalizedMessage;
use crate::poller::NotificationSink;

const WEBHOOK_TIMEOUT: Duration = Duration::from_secs(10);

/// Slack section text is limited to 3000 characters; keep headroom for the
/// code fence and the Preview label.
const PREVIEW_MAX_CHARS: usize = 2900;

pub struct SlackNotifier {
    client: Client<HttpsConnector<HttpConnector>>,
    webhook_url: String,
    channel: String,
    username: String,
}

impl SlackNotifier {
    pub fn new(config: &SlackConfig) -> Result<Self> {
        info!("Initializing Slack notifier for channel {}", config.channel);

        let connector = hyper_rustls::HttpsConnectorBuilder::new()
            .with_native_roots()?
            .https_or_http()
            .enable_http1()
            .build();

        let client = Client::builder().build(connector);

        Ok(SlackNotifier {
            client,
            webhook_url: config.webhook_url.clone(),
            channel: config.channel.clone(),
            username: config.username.clone(),
        })
    }

    /// Render a message into the webhook payload schema.
    pub fn build_payload(&self, message: &NormalizedMessage, query: &str) -> Value {
        let gmail_link = format!(
            "https://mail.google.com/mail/u/0/#inbox/{}",
            message.thread_id
        );

        let mut blocks = vec![
            json!({
                "type": "header",
                "text": {
                    "type": "plain_text",
                    "text": format!("📧 {}", message.subject)
                }
            }),
            json!({
                "type": "section",
                "fields": [
                    {
                        "type": "mrkdwn",
                        "text": format!("*From:*\n{}", message.sender)
                    },
                    {
                        "type": "mrkdwn",
                        "text": format!("*Date:*\n{}", message.date)
                    }
                ]
            }),
            json!({
                "type": "section",
                "text": {
                    "type": "mrkdwn",
                    "text": format!("*Query:* `{}`", query)
                }
            }),
        ];

        if !message.body.is_empty() {
            blocks.push(json!({
                "type": "section",
                "text": {
                    "type": "mrkdwn",
                    "text": format!("*Preview:*\n```{}```", truncate_preview(&message.body))
                }
            }));
        }

        blocks.push(json!({
            "type": "actions",
            "elements": [
                {
                    "type": "button",
                    "text": {
                        "type": "plain_text",
                        "text": "Open in Gmail"
                    },
                    "url": gmail_link,
                    "action_id": "open_gmail"
                }
            ]
        }));

        json!({
            "text": format!("📧 New Email: {}", message.subject),
            "channel": self.channel,
            "username": self.username,
            "blocks": blocks
        })
    }

    /// Post a notification to the webhook. Returns true only on HTTP 200.
    /// No retry here: a failed message stays out of the ledger and comes
    /// back as a candidate on the next poll cycle.
    pub async fn notify(&self, message: &NormalizedMessage, query: &str) -> bool {
        let payload = self.build_payload(message, query);

        match self.post_payload(&payload).await {
            Ok((200, _)) => {
                info!("Message posted to Slack successfully");
                true
            }
            Ok((status, body)) => {
                error!("Slack API error: {} - {}", status, body);
                false
            }
            Err(e) => {
                error!("Error posting to Slack: {}", e);
                false
            }
        }
    }

    async fn post_payload(&self, payload: &Value) -> Result<(u16, String)> {
        let request = Request::builder()
            .method(Method::POST)
            .uri(&self.webhook_url)
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from(payload.to_string()))
            .context("Unable to build webhook request")?;

        let response = tokio::time::timeout(WEBHOOK_TIMEOUT, self.client.request(request))
            .await
            .context("Timeout posting to Slack webhook")?
            .context("Error sending webhook request")?;

        let status = response.status().as_u16();
        let body_bytes = hyper::body::to_bytes(response.into_body())
            .await
            .context("Unable to read webhook response body")?;
        let body = String::from_utf8_lossy(&body_bytes).to_string();

        Ok((status, body))
    }
}

/// Cap the body preview for display, cutting on a char boundary.
fn truncate_preview(body: &str) -> String {
    if body.chars().count() <= PREVIEW_MAX_CHARS {
        return body.to_string();
    }
    body.chars().take(PREVIEW_MAX_CHARS).collect()
}

impl NotificationSink for SlackNotifier {
    fn deliver<'a>(
        &'a self,
        message: &'a NormalizedMessage,
        query: &'a str,
    ) -> std::pin::Pin<Box<dyn std::future::Future<Output = bool> + Send + 'a>> {
        Box::pin(async move { self.notify(message, query).await })
    }
}
