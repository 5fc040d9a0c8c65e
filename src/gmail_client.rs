use std::time::Duration;

use anyhow::{Result, Context};
use google_gmail1::{Gmail, hyper, hyper_rustls, oauth2};
use log::{info, debug};

use crate::body_decoder::BodyPart;
use crate::config::GmailConfig;
use crate::message::{CandidateMessage, MessageHeader};
use crate::poller::Mailbox;

const API_TIMEOUT: Duration = Duration::from_secs(30);

pub struct GmailClient {
    hub: Gmail<hyper_rustls::HttpsConnector<hyper::client::HttpConnector>>,
}

impl GmailClient {
    pub async fn new(config: &GmailConfig) -> Result<Self> {
        info!("Connecting to Gmail API via OAuth2");

        let connector = hyper_rustls::HttpsConnectorBuilder::new()
            .with_native_roots()?
            .https_or_http()
            .enable_http1()
            .build();

        let client = hyper::Client::builder().build(connector);

        // Deployment path: authorized-user credentials from environment
        // variables. Local path: installed flow with an on-disk token cache.
        let env_trio = (
            std::env::var("GOOGLE_CLIENT_ID"),
            std::env::var("GOOGLE_CLIENT_SECRET"),
            std::env::var("GOOGLE_REFRESH_TOKEN"),
        );

        let hub = match env_trio {
            (Ok(client_id), Ok(client_secret), Ok(refresh_token)) => {
                info!("Loading OAuth credentials from environment variables");

                let secret = oauth2::authorized_user::AuthorizedUserSecret {
                    client_id,
                    client_secret,
                    refresh_token,
                    key_type: "authorized_user".to_string(),
                };

                let auth = oauth2::AuthorizedUserAuthenticator::builder(secret)
                    .build()
                    .await
                    .context("Unable to create OAuth2 authenticator from environment")?;

                Gmail::new(client, auth)
            }
            _ => {
                info!("Loading OAuth credentials from file: {}", config.credentials_path);

                let secret = oauth2::read_application_secret(&config.credentials_path)
                    .await
                    .context("Unable to read OAuth2 client credentials file")?;

                let auth = oauth2::InstalledFlowAuthenticator::builder(
                    secret,
                    oauth2::InstalledFlowReturnMethod::HTTPRedirect,
                )
                .persist_tokens_to_disk(&config.token_cache_path)
                .build()
                .await
                .context("Unable to create OAuth2 authenticator")?;

                Gmail::new(client, auth)
            }
        };

        info!("✅ Gmail API connection established successfully");

        Ok(GmailClient { hub })
    }

    pub async fn search_messages(&self, query: &str, max_results: u32) -> Result<Vec<String>> {
        debug!("Search criteria: {}", query);

        let call = self.hub
            .users()
            .messages_list("me")
            .q(query)
            .max_results(max_results)
            .add_scope(google_gmail1::api::Scope::Readonly)
            .doit();

        let result = tokio::time::timeout(API_TIMEOUT, call)
            .await
            .context("Timeout searching for emails")?
            .context("Error searching for emails")?;

        let message_ids: Vec<String> = result.1
            .messages
            .unwrap_or_default()
            .into_iter()
            .filter_map(|msg| msg.id)
            .collect();

        info!("Found {} message(s) matching query", message_ids.len());

        Ok(message_ids)
    }

    pub async fn fetch_message(&self, message_id: &str) -> Result<CandidateMessage> {
        debug!("Fetching full message for ID: {}", message_id);

        let call = self.hub
            .users()
            .messages_get("me", message_id)
            .format("full")
            .add_scope(google_gmail1::api::Scope::Readonly)
            .doit();

        let result = tokio::time::timeout(API_TIMEOUT, call)
            .await
            .context("Timeout retrieving email")?
            .context("Unable to retrieve email")?;

        let message = result.1;

        let payload = message.payload
            .context("No payload in email")?;

        let headers = payload.headers
            .as_deref()
            .unwrap_or_default()
            .iter()
            .filter_map(|h| match (&h.name, &h.value) {
                (Some(name), Some(value)) => Some(MessageHeader {
                    name: name.clone(),
                    value: value.clone(),
                }),
                _ => None,
            })
            .collect();

        let body = Self::build_body_tree(&payload);

        Ok(CandidateMessage {
            id: message.id.unwrap_or_else(|| message_id.to_string()),
            thread_id: message.thread_id.unwrap_or_default(),
            snippet: message.snippet.unwrap_or_default(),
            headers,
            body,
        })
    }

    /// Convert a Gmail API payload part into our body tree. The API layer
    /// delivers the base64url `data` fields already decoded to bytes.
    fn build_body_tree(part: &google_gmail1::api::MessagePart) -> BodyPart {
        if let Some(parts) = &part.parts {
            let children = parts.iter().map(Self::build_body_tree).collect();
            return BodyPart::Composite { children };
        }

        let media_type = part.mime_type.clone().unwrap_or_default();
        let data = part.body
            .as_ref()
            .and_then(|b| b.data.clone())
            .unwrap_or_default();

        if data.is_empty() {
            debug!("No inline body data for part with media type '{}'", media_type);
        }

        BodyPart::Leaf { media_type, data }
    }
}

impl Mailbox for GmailClient {
    fn search_messages<'a>(
        &'a self,
        query: &'a str,
        max_results: u32,
    ) -> std::pin::Pin<Box<dyn std::future::Future<Output = Result<Vec<String>>> + Send + 'a>> {
        Box::pin(async move { GmailClient::search_messages(self, query, max_results).await })
    }

    fn fetch_message<'a>(
        &'a self,
        message_id: &'a str,
    ) -> std::pin::Pin<Box<dyn std::future::Future<Output = Result<CandidateMessage>> + Send + 'a>> {
        Box::pin(async move { GmailClient::fetch_message(self, message_id).await })
    }
}
