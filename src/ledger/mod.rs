use chrono::{DateTime, Duration, Utc};
use error_stack::ResultExt;
use sha2::{Digest, Sha256};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use thiserror::Error;

/// Which custody source produced a ledger row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum SourceKind {
    Exchange,
    Wallet,
}

#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("failed to open ledger database")]
    Connect,
    #[error("failed to initialize ledger schema")]
    Init,
    #[error("failed to append balance record")]
    Append,
    #[error("ledger query failed")]
    Query,
}

/// One appended row. Identifying material is stored hashed; rows are never
/// updated or deleted.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct BalanceRecord {
    pub account_type: String,
    pub account_note: String,
    pub account_identifier: String,
    pub timestamp: DateTime<Utc>,
    pub total_usdt: f64,
    pub asset_details: Option<String>,
}

/// Per-account aggregate view used by the `summary` subcommand.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct AccountSummary {
    pub account_type: String,
    pub account_note: String,
    pub record_count: i64,
    pub first_record: DateTime<Utc>,
    pub last_record: DateTime<Utc>,
    pub avg_usdt: f64,
    pub min_usdt: f64,
    pub max_usdt: f64,
}

pub struct Ledger {
    pool: SqlitePool,
}

impl Ledger {
    /// Opens (creating if missing) the history database and ensures the
    /// schema exists. Initialization is idempotent.
    pub async fn open(path: &str) -> error_stack::Result<Self, LedgerError> {
        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await
            .change_context(LedgerError::Connect)
            .attach_printable_lazy(|| format!("database path: {path}"))?;

        Self::init_schema(&pool).await?;
        Ok(Self { pool })
    }

    #[cfg(test)]
    pub async fn open_in_memory() -> error_stack::Result<Self, LedgerError> {
        // A shared pool against :memory: would hand each connection its own
        // database; a single connection keeps the schema visible.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .change_context(LedgerError::Connect)?;
        Self::init_schema(&pool).await?;
        Ok(Self { pool })
    }

    async fn init_schema(pool: &SqlitePool) -> error_stack::Result<(), LedgerError> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS balance_history (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                account_type TEXT NOT NULL,
                account_note TEXT NOT NULL,
                account_identifier TEXT NOT NULL,
                timestamp DATETIME NOT NULL,
                total_usdt REAL NOT NULL,
                asset_details TEXT,
                created_at DATETIME DEFAULT CURRENT_TIMESTAMP
            )",
        )
        .execute(pool)
        .await
        .change_context(LedgerError::Init)?;
        Ok(())
    }

    /// Appends one row, timestamped at the write moment. The raw identifier
    /// (API key or address) never reaches storage.
    pub async fn append(
        &self,
        source: SourceKind,
        note: &str,
        identifier: &str,
        total_usdt: f64,
        asset_details: &str,
    ) -> error_stack::Result<(), LedgerError> {
        sqlx::query(
            "INSERT INTO balance_history
             (account_type, account_note, account_identifier, timestamp, total_usdt, asset_details)
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(source.to_string())
        .bind(note)
        .bind(hash_identifier(identifier))
        .bind(Utc::now())
        .bind(total_usdt)
        .bind(asset_details)
        .execute(&self.pool)
        .await
        .change_context(LedgerError::Append)?;
        Ok(())
    }

    /// Rows within the trailing window, oldest first, optionally filtered by
    /// account note.
    pub async fn history(
        &self,
        account_note: Option<&str>,
        days: i64,
    ) -> error_stack::Result<Vec<BalanceRecord>, LedgerError> {
        let cutoff = Utc::now() - Duration::days(days);

        let records = match account_note {
            Some(note) => {
                sqlx::query_as::<_, BalanceRecord>(
                    "SELECT account_type, account_note, account_identifier,
                            timestamp, total_usdt, asset_details
                     FROM balance_history
                     WHERE timestamp >= ? AND account_note = ?
                     ORDER BY timestamp ASC",
                )
                .bind(cutoff)
                .bind(note)
                .fetch_all(&self.pool)
                .await
            }
            None => {
                sqlx::query_as::<_, BalanceRecord>(
                    "SELECT account_type, account_note, account_identifier,
                            timestamp, total_usdt, asset_details
                     FROM balance_history
                     WHERE timestamp >= ?
                     ORDER BY timestamp ASC",
                )
                .bind(cutoff)
                .fetch_all(&self.pool)
                .await
            }
        };

        records.change_context(LedgerError::Query)
    }

    /// Group-by summary across all recorded accounts, most recently updated
    /// first.
    pub async fn summaries(&self) -> error_stack::Result<Vec<AccountSummary>, LedgerError> {
        sqlx::query_as::<_, AccountSummary>(
            "SELECT account_type, account_note,
                    COUNT(*) as record_count,
                    MIN(timestamp) as first_record,
                    MAX(timestamp) as last_record,
                    AVG(total_usdt) as avg_usdt,
                    MIN(total_usdt) as min_usdt,
                    MAX(total_usdt) as max_usdt
             FROM balance_history
             GROUP BY account_type, account_note
             ORDER BY last_record DESC",
        )
        .fetch_all(&self.pool)
        .await
        .change_context(LedgerError::Query)
    }
}

/// First 16 hex chars of SHA-256 over the raw identifier. One-way; used only
/// to correlate rows belonging to the same account.
pub fn hash_identifier(raw: &str) -> String {
    let digest = Sha256::digest(raw.as_bytes());
    hex::encode(digest)[..16].to_string()
}
