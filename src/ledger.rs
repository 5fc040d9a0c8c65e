use anyhow::{Result, Context};
use log::{info, debug, warn};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool};
use sqlx::Row;

/// Durable set of keys for messages already delivered to Slack.
///
/// Two kinds of keys share the same table: raw Gmail message ids and
/// content-derived keys (`record_<id>` or a subject+date hash). A key is
/// only written after a successful delivery, and never removed except
/// through `reset()`.
pub struct Ledger {
    pool: SqlitePool,
}

impl Ledger {
    pub async fn new(db_path: &str) -> Result<Self> {
        info!("Opening ledger database: {}", db_path);

        let options = SqliteConnectOptions::new()
            .filename(db_path)
            .create_if_missing(true);

        let pool = SqlitePool::connect_with(options)
            .await
            .context("Impossible d'ouvrir la base de données du ledger")?;

        let ledger = Ledger { pool };
        ledger.create_table_if_not_exists().await?;

        info!("Ledger database initialized successfully");
        Ok(ledger)
    }

    async fn create_table_if_not_exists(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS processed (
                id TEXT PRIMARY KEY,
                ts TIMESTAMP DEFAULT CURRENT_TIMESTAMP
            )
            "#
        )
        .execute(&self.pool)
        .await
        .context("Unable to create processed table")?;

        Ok(())
    }

    /// Check whether a key has already been processed.
    ///
    /// Fail-open: a storage error is logged and reported as "not present",
    /// so a transient fault degrades to a possible duplicate notification
    /// instead of silently blocking delivery forever.
    pub async fn contains(&self, key: &str) -> bool {
        let result = sqlx::query("SELECT id FROM processed WHERE id = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await;

        match result {
            Ok(row) => row.is_some(),
            Err(e) => {
                warn!("Error checking ledger for key {}: {}", key, e);
                false
            }
        }
    }

    /// Mark a key as processed. Idempotent; adding an existing key is a no-op.
    ///
    /// Storage errors are logged and swallowed: a persistence failure after a
    /// successful delivery must not crash the poll loop. The cost is a
    /// possible duplicate notification on a later cycle.
    pub async fn add(&self, key: &str) {
        let result = sqlx::query("INSERT OR IGNORE INTO processed (id) VALUES (?)")
            .bind(key)
            .execute(&self.pool)
            .await;

        match result {
            Ok(_) => debug!("Ledger key committed: {}", key),
            Err(e) => warn!("Error marking key {} as processed: {}", key, e),
        }
    }

    /// Administrative reset: delete every key, returning the count removed.
    pub async fn reset(&self) -> Result<u64> {
        let result = sqlx::query("DELETE FROM processed")
            .execute(&self.pool)
            .await
            .context("Unable to clear processed table")?;

        Ok(result.rows_affected())
    }

    /// Number of keys currently in the ledger.
    pub async fn count(&self) -> Result<i64> {
        let row = sqlx::query("SELECT COUNT(*) AS n FROM processed")
            .fetch_one(&self.pool)
            .await
            .context("Unable to count processed keys")?;

        Ok(row.get::<i64, _>("n"))
    }
}
