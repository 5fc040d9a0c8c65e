use anyhow::{Result, Context};
use clap::Parser;
use log::{info, error};
use tokio::sync::watch;

use mailwatch::config::{Config, Mode};
use mailwatch::gmail_client::GmailClient;
use mailwatch::health;
use mailwatch::ledger::Ledger;
use mailwatch::poller::Poller;
use mailwatch::slack_notifier::SlackNotifier;

#[derive(Parser)]
#[command(name = "mailwatch")]
#[command(about = "Gmail to Slack notification relay for Forth CRM cancellations")]
#[command(version = "0.1.0")]
struct Args {
    /// Run exactly one poll cycle, then exit
    #[arg(long)]
    once: bool,

    /// Mode dry-run : analyse les emails sans livraison ni écriture du ledger
    #[arg(short, long)]
    dry_run: bool,

    /// Vérifier la configuration sans se connecter
    #[arg(long)]
    check_config: bool,

    /// Clear the processed-message ledger and exit
    #[arg(long)]
    reset_ledger: bool,

    /// Override the MODE environment variable (worker, server or combined)
    #[arg(short, long)]
    mode: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Charger le fichier .env s'il existe
    dotenv::dotenv().ok();

    let args = Args::parse();

    env_logger::init();

    if args.dry_run {
        info!("🧪 Démarrage en mode DRY-RUN du relais Gmail → Slack");
    } else {
        info!("🚀 Démarrage du relais Gmail → Slack");
    }

    // Charger la configuration
    let mut config = Config::new()?;

    if let Some(mode) = &args.mode {
        config.mode = mode.parse::<Mode>()?;
    }

    // Si demandé, vérifier seulement la configuration
    if args.check_config {
        println!("✅ Configuration valide !");
        println!("🔍 Query: {}", config.gmail_query);
        println!("📢 Slack channel: {} (username: {})", config.slack.channel, config.slack.username);
        println!("⏱️  Poll interval: {}s (max {} results per cycle)", config.poll_interval_seconds, config.max_results);
        println!("🌍 Timezone: {}", config.timezone);
        println!("💾 Ledger: {}", config.ledger_db_path);
        println!("⚙️  Mode: {} (port {})", config.mode.as_str(), config.port);
        println!("🔑 Credentials: {}", config.gmail.credentials_path);
        return Ok(());
    }

    let ledger = Ledger::new(&config.ledger_db_path).await
        .context("Unable to initialize ledger database")?;

    if args.reset_ledger {
        let before = ledger.count().await?;
        let removed = ledger.reset().await?;
        let after = ledger.count().await?;
        println!("🗑️  Ledger reset: {} key(s) before, {} removed, {} remaining", before, removed, after);
        println!("⚠️  Previously-seen messages will be notified again on the next cycle");
        return Ok(());
    }

    let gmail = GmailClient::new(&config.gmail).await
        .context("Unable to connect to Gmail API")?;

    let slack = SlackNotifier::new(&config.slack)
        .context("Unable to initialize Slack notifier")?;

    let poller = Poller::new(config.clone(), ledger, gmail, slack)?;

    if args.dry_run {
        poller.poll_cycle_dry_run().await?;
        info!("✅ Analyse dry-run terminée avec succès");
        return Ok(());
    }

    if args.once {
        let stats = poller.poll_cycle().await?;
        info!(
            "✅ Cycle terminé: {} candidat(s), {} livré(s), {} doublon(s), {} échec(s)",
            stats.candidates, stats.delivered, stats.duplicates, stats.failures
        );
        return Ok(());
    }

    // Ctrl-C feeds a watch channel; the loop only looks at it between cycles
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Ctrl-C received, stopping after the current cycle");
            let _ = shutdown_tx.send(true);
        }
    });

    match config.mode {
        Mode::Worker => {
            info!("Starting in worker mode");
            poller.run(shutdown_rx).await;
        }
        Mode::Server => {
            info!("Starting in server mode");
            health::run_health_server(config).await?;
        }
        Mode::Combined => {
            info!("Starting in combined mode");
            let health_config = config.clone();
            tokio::spawn(async move {
                if let Err(e) = health::run_health_server(health_config).await {
                    error!("Health server stopped: {}", e);
                }
            });
            poller.run(shutdown_rx).await;
        }
    }

    Ok(())
}
