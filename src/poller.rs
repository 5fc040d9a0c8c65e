use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use anyhow::{Result, Context};
use log::{info, debug, warn, error};
use tokio::sync::watch;

use crate::config::Config;
use crate::identity_extractor::IdentityExtractor;
use crate::ledger::Ledger;
use crate::message::{CandidateMessage, NormalizedMessage};

/// Mailbox side of the pipeline: search for candidate ids, fetch one in full.
pub trait Mailbox: Send + Sync {
    fn search_messages<'a>(
        &'a self,
        query: &'a str,
        max_results: u32,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<String>>> + Send + 'a>>;

    fn fetch_message<'a>(
        &'a self,
        message_id: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<CandidateMessage>> + Send + 'a>>;
}

/// Delivery side of the pipeline. Returns a plain success flag; transport
/// errors are the sink's own business to log.
pub trait NotificationSink: Send + Sync {
    fn deliver<'a>(
        &'a self,
        message: &'a NormalizedMessage,
        query: &'a str,
    ) -> Pin<Box<dyn Future<Output = bool> + Send + 'a>>;
}

/// The two-layer dedup verdict for one candidate. Raw id is checked before
/// the fetch, content key after; a message is skipped when either is seen.
#[derive(Debug, Clone, Copy, Default)]
pub struct DedupDecision {
    pub raw_id_seen: bool,
    pub content_key_seen: bool,
}

impl DedupDecision {
    pub fn is_duplicate(&self) -> bool {
        self.raw_id_seen || self.content_key_seen
    }
}

/// Tallies for one poll cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleStats {
    pub candidates: usize,
    pub delivered: usize,
    pub duplicates: usize,
    pub failures: usize,
}

/// Drives one mailbox: query → dedup → deliver → commit, strictly
/// sequentially. The only writer of the ledger.
pub struct Poller<M: Mailbox, S: NotificationSink> {
    config: Config,
    ledger: Ledger,
    mailbox: M,
    sink: S,
    extractor: IdentityExtractor,
}

impl<M: Mailbox, S: NotificationSink> Poller<M, S> {
    pub fn new(config: Config, ledger: Ledger, mailbox: M, sink: S) -> Result<Self> {
        let extractor = IdentityExtractor::new()?;

        Ok(Poller {
            config,
            ledger,
            mailbox,
            sink,
            extractor,
        })
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    /// One full pass over the bounded result set. Per-message failures are
    /// logged and skipped; only the search call itself can fail the cycle.
    pub async fn poll_cycle(&self) -> Result<CycleStats> {
        info!("Polling Gmail with query: {}", self.config.gmail_query);

        let message_ids = self.mailbox
            .search_messages(&self.config.gmail_query, self.config.max_results)
            .await
            .context("Error searching for messages")?;

        let mut stats = CycleStats {
            candidates: message_ids.len(),
            ..CycleStats::default()
        };

        for message_id in &message_ids {
            let mut decision = DedupDecision {
                raw_id_seen: self.ledger.contains(message_id).await,
                content_key_seen: false,
            };

            if decision.is_duplicate() {
                debug!("Message {} already processed, skipping", message_id);
                stats.duplicates += 1;
                continue;
            }

            // Fetch failure skips this message only, never the whole cycle
            let candidate = match self.mailbox.fetch_message(message_id).await {
                Ok(msg) => msg,
                Err(e) => {
                    error!("Error fetching message {}: {}", message_id, e);
                    stats.failures += 1;
                    continue;
                }
            };

            let normalized = NormalizedMessage::from_candidate(&candidate, self.config.timezone);

            let content_key = self.extractor.dedup_key(
                &normalized.subject,
                &normalized.date,
                &normalized.body,
            );

            decision.content_key_seen = self.ledger.contains(&content_key).await;

            if decision.is_duplicate() {
                info!(
                    "Message {} matches already-notified content key {}, skipping",
                    message_id, content_key
                );
                stats.duplicates += 1;
                continue;
            }

            if self.sink.deliver(&normalized, &self.config.gmail_query).await {
                // Commit both keys only after a confirmed delivery
                self.ledger.add(message_id).await;
                self.ledger.add(&content_key).await;
                stats.delivered += 1;
                info!("Posted new message to Slack: {}", normalized.subject);
            } else {
                // Nothing committed: the message stays a candidate and is
                // retried on a later cycle
                error!("Failed to post message to Slack: {}", normalized.subject);
                stats.failures += 1;
            }
        }

        info!(
            "Polling complete. {} candidate(s), {} delivered, {} duplicate(s), {} failure(s)",
            stats.candidates, stats.delivered, stats.duplicates, stats.failures
        );

        Ok(stats)
    }

    /// The long-lived serial loop: cycle, sleep, repeat. A failed cycle is
    /// logged and the loop waits for the next interval. Shutdown is observed
    /// only between cycles, never mid-cycle.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        info!(
            "🔄 Starting Gmail polling every {} seconds",
            self.config.poll_interval_seconds
        );

        loop {
            if let Err(e) = self.poll_cycle().await {
                error!("Error during Gmail polling: {}", e);
            }

            tokio::select! {
                _ = tokio::time::sleep(Duration::from_secs(self.config.poll_interval_seconds)) => {}
                _ = shutdown.changed() => {}
            }

            if *shutdown.borrow() {
                info!("Polling stopped");
                return;
            }
        }
    }

    /// Analyze one cycle without delivering anything or touching the ledger.
    pub async fn poll_cycle_dry_run(&self) -> Result<()> {
        println!("\n{}", "=".repeat(80));
        println!("🧪 MODE DRY-RUN - MAILBOX ANALYSIS");
        println!("{}", "=".repeat(80));
        println!("🔍 Query: {}", self.config.gmail_query);

        let message_ids = self.mailbox
            .search_messages(&self.config.gmail_query, self.config.max_results)
            .await
            .context("Error searching for messages")?;

        if message_ids.is_empty() {
            println!("❌ No messages found matching the query");
            return Ok(());
        }

        println!("✅ Found {} message(s) matching the query\n", message_ids.len());

        for (index, message_id) in message_ids.iter().enumerate() {
            println!("📧 Message {}/{} (ID: {})", index + 1, message_ids.len(), message_id);
            println!("{}", "-".repeat(60));

            if self.ledger.contains(message_id).await {
                println!("⏭️  Already in ledger by raw id, would be skipped\n");
                continue;
            }

            let candidate = match self.mailbox.fetch_message(message_id).await {
                Ok(msg) => msg,
                Err(e) => {
                    println!("❌ Error fetching message: {}\n", e);
                    continue;
                }
            };

            let normalized = NormalizedMessage::from_candidate(&candidate, self.config.timezone);

            println!("📋 Subject: {}", normalized.subject);
            println!("👤 From: {}", normalized.sender);
            println!("📅 Date: {}", normalized.date);

            let content_key = self.extractor.dedup_key(
                &normalized.subject,
                &normalized.date,
                &normalized.body,
            );
            println!("🔑 Content key: {}", content_key);

            if self.ledger.contains(&content_key).await {
                println!("⏭️  Content key already in ledger, would be skipped");
            } else {
                println!("📤 Would be posted to Slack");
            }

            let preview: String = normalized.body.chars().take(300).collect();
            if preview.is_empty() {
                warn!("No body text extracted for message {}", message_id);
                println!("📄 Body: (empty)");
            } else {
                println!("📄 Body preview: {}", preview);
            }
            println!();
        }

        println!("{}", "=".repeat(80));
        println!("🏁 Analysis complete: {} message(s), nothing delivered, ledger untouched", message_ids.len());
        println!("{}", "=".repeat(80));

        Ok(())
    }
}
