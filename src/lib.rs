// Library exports for mailwatch crate
// This allows tests and other crates to use the modules

pub mod body_decoder;
pub mod config;
pub mod gmail_client;
pub mod health;
pub mod identity_extractor;
pub mod ledger;
pub mod message;
pub mod poller;
pub mod slack_notifier;
