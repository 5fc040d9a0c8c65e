use std::str::FromStr;

use anyhow::Result;
use chrono_tz::Tz;
use log::warn;

/// Run mode of the process (mirrors the MODE environment variable).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Polling loop only.
    Worker,
    /// Health endpoint only.
    Server,
    /// Health endpoint in a background task + polling loop.
    Combined,
}

impl Mode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Worker => "worker",
            Mode::Server => "server",
            Mode::Combined => "combined",
        }
    }
}

impl FromStr for Mode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "worker" => Ok(Mode::Worker),
            "server" => Ok(Mode::Server),
            "combined" => Ok(Mode::Combined),
            other => anyhow::bail!("Unknown mode: {} (expected worker, server or combined)", other),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub gmail_query: String,
    pub gmail: GmailConfig,
    pub slack: SlackConfig,
    pub poll_interval_seconds: u64,
    pub timezone: Tz,
    pub max_results: u32,
    pub ledger_db_path: String,
    pub mode: Mode,
    pub port: u16,
}

#[derive(Debug, Clone)]
pub struct GmailConfig {
    pub credentials_path: String,
    pub token_cache_path: String,
}

#[derive(Debug, Clone)]
pub struct SlackConfig {
    pub webhook_url: String,
    pub channel: String,
    pub username: String,
}

impl Config {
    pub fn new() -> Result<Self> {
        // Vérifier que les variables essentielles sont définies
        Self::check_required_env_vars()?;

        let timezone_name = std::env::var("TIMEZONE").unwrap_or_else(|_| "UTC".to_string());
        let timezone = match Tz::from_str(&timezone_name) {
            Ok(tz) => tz,
            Err(_) => {
                warn!("Unknown timezone: {}, using UTC", timezone_name);
                chrono_tz::UTC
            }
        };

        // Configuration chargée depuis les variables d'environnement
        Ok(Config {
            gmail_query: std::env::var("GMAIL_QUERY").unwrap_or_else(|_| {
                "from:noreply@forthcrm.com (subject:\"Cancellation\" OR subject:\"Cancel\" OR subject:\"cancelled\") newer_than:7d".to_string()
            }),
            gmail: GmailConfig {
                credentials_path: std::env::var("GMAIL_CREDENTIALS_PATH")
                    .unwrap_or_else(|_| "credentials.json".to_string()),
                token_cache_path: std::env::var("GMAIL_TOKEN_CACHE_PATH")
                    .unwrap_or_else(|_| "token.json".to_string()),
            },
            slack: SlackConfig {
                webhook_url: std::env::var("SLACK_WEBHOOK_URL")
                    .map_err(|_| anyhow::anyhow!("SLACK_WEBHOOK_URL doit être défini"))?,
                channel: std::env::var("SLACK_CHANNEL")
                    .unwrap_or_else(|_| "#forth-alerts".to_string()),
                username: std::env::var("SLACK_USERNAME")
                    .unwrap_or_else(|_| "Gmail Monitor".to_string()),
            },
            poll_interval_seconds: std::env::var("POLL_INTERVAL_SECONDS")
                .unwrap_or_else(|_| "60".to_string())
                .parse()
                .unwrap_or(60),
            timezone,
            max_results: std::env::var("MAX_RESULTS")
                .unwrap_or_else(|_| "10".to_string())
                .parse()
                .unwrap_or(10),
            ledger_db_path: std::env::var("LEDGER_DB_PATH")
                .unwrap_or_else(|_| "./state.db".to_string()),
            mode: std::env::var("MODE")
                .unwrap_or_else(|_| "combined".to_string())
                .parse()
                .unwrap_or(Mode::Combined),
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "10000".to_string())
                .parse()
                .unwrap_or(10000),
        })
    }

    fn check_required_env_vars() -> Result<()> {
        let required_vars = [
            "SLACK_WEBHOOK_URL",
        ];

        let mut missing_vars = Vec::new();

        for var in &required_vars {
            if std::env::var(var).is_err() {
                missing_vars.push(*var);
            }
        }

        if !missing_vars.is_empty() {
            anyhow::bail!(
                "Variables d'environnement manquantes: {}\n\
                 \n\
                 💡 Solutions :\n\
                 1. Créer un fichier .env avec vos credentials :\n\
                    cp .env.example .env\n\
                    # Puis éditer .env avec vos valeurs\n\
                 \n\
                 2. Ou définir les variables manuellement :\n\
                    export SLACK_WEBHOOK_URL=https://hooks.slack.com/services/...\n\
                    export GMAIL_CREDENTIALS_PATH=/path/to/credentials.json\n\
                    cargo run -- --check-config",
                missing_vars.join(", ")
            );
        }

        Ok(())
    }
}
