//! Database access layer with connection pooling and migrations
//!
//! This module is organized by domain:
//! - `categories` - User category store (names, kinds, keyword lists)
//! - `merchants` - Learned merchant→category associations
//! - `patterns` - Learned per-category amount profiles
//! - `cliq` - Learned CliQ counterparty profiles
//! - `history` - Append-only categorization history and amount statistics
//! - `ledger` - Finalized income/expense entries and message dedup
//! - `pending` - Transactions parked for a user decision

use chrono::{DateTime, Utc};
use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use tracing::info;

use crate::error::{Error, Result};

mod categories;
mod cliq;
mod history;
mod ledger;
mod merchants;
mod patterns;
mod pending;

pub use merchants::MerchantSuggestion;

pub type DbPool = Pool<SqliteConnectionManager>;
pub type DbConn = PooledConnection<SqliteConnectionManager>;

/// Environment variable for database encryption key
pub const DB_KEY_ENV: &str = "MASRUF_DB_KEY";

/// Derive an encryption key from a passphrase using Argon2
///
/// Uses a fixed application salt so the same passphrase always produces the
/// same key, regardless of database path. This allows moving/renaming/
/// restoring the database freely.
fn derive_key(passphrase: &str) -> Result<String> {
    use argon2::{password_hash::SaltString, Argon2, PasswordHasher};

    // Fixed application salt - changing this would invalidate all existing
    // encrypted databases
    const APP_SALT: &[u8; 16] = b"masruf-salt-v1.0";

    let salt = SaltString::encode_b64(APP_SALT)
        .map_err(|e| Error::Encryption(format!("Failed to create salt: {}", e)))?;

    let argon2 = Argon2::default();
    let hash = argon2
        .hash_password(passphrase.as_bytes(), &salt)
        .map_err(|e| Error::Encryption(format!("Failed to derive key: {}", e)))?;

    let hash_str = hash
        .hash
        .ok_or_else(|| Error::Encryption("No hash output".to_string()))?;
    Ok(hex::encode(hash_str.as_bytes()))
}

/// Parse a SQLite datetime string into a DateTime<Utc>
pub(crate) fn parse_datetime(s: &str) -> DateTime<Utc> {
    // SQLite stores as "YYYY-MM-DD HH:MM:SS" format
    chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
        .map(|dt| dt.and_utc())
        .unwrap_or_else(|_| Utc::now())
}

/// Format a DateTime<Utc> the way SQLite's CURRENT_TIMESTAMP does
pub(crate) fn format_datetime(dt: DateTime<Utc>) -> String {
    dt.format("%Y-%m-%d %H:%M:%S").to_string()
}

/// Database wrapper with connection pooling
#[derive(Clone)]
pub struct Database {
    pool: DbPool,
    /// Path to the database file
    db_path: String,
}

impl Database {
    /// Create a new database connection pool with encryption
    ///
    /// Requires `MASRUF_DB_KEY` environment variable to be set. The database
    /// will be encrypted using SQLCipher with a key derived from the
    /// passphrase via Argon2.
    ///
    /// Returns an error if `MASRUF_DB_KEY` is not set. Use
    /// `new_unencrypted()` for development/testing without encryption.
    pub fn new(path: &str) -> Result<Self> {
        let encryption_key = std::env::var(DB_KEY_ENV).ok();
        match encryption_key {
            Some(key) => Self::new_with_key(path, Some(&key)),
            None => Err(Error::Encryption(format!(
                "Database encryption required. Set {} environment variable with your passphrase, \
                or use --no-encrypt for unencrypted databases (not recommended for production).",
                DB_KEY_ENV
            ))),
        }
    }

    /// Create a new unencrypted database connection pool
    ///
    /// WARNING: This creates an unencrypted database. Only use for
    /// development or testing. For production, use `new()` with
    /// `MASRUF_DB_KEY` set.
    pub fn new_unencrypted(path: &str) -> Result<Self> {
        Self::new_with_key(path, None)
    }

    /// Create a new database with an explicit encryption key
    pub fn new_with_key(path: &str, passphrase: Option<&str>) -> Result<Self> {
        let manager = SqliteConnectionManager::file(path);

        let pool = if let Some(pass) = passphrase {
            let key = derive_key(pass)?;
            let key_pragma = format!("PRAGMA key = 'x\"{}\"';", key);

            // Use with_init to set the key on every new connection
            let manager = manager.with_init(move |conn| {
                conn.execute_batch(&key_pragma)?;
                Ok(())
            });

            Pool::builder().max_size(10).build(manager)?
        } else {
            Pool::builder().max_size(10).build(manager)?
        };

        let db = Self {
            pool,
            db_path: path.to_string(),
        };
        db.run_migrations()?;

        Ok(db)
    }

    /// Get the path to the database file
    pub fn path(&self) -> &str {
        &self.db_path
    }

    /// Create an in-memory database (for testing)
    ///
    /// Note: Uses a temporary file rather than `:memory:` because SQLCipher
    /// has issues with in-memory databases in the connection pool.
    pub fn in_memory() -> Result<Self> {
        use std::sync::atomic::{AtomicU64, Ordering};
        static COUNTER: AtomicU64 = AtomicU64::new(0);

        let id = COUNTER.fetch_add(1, Ordering::SeqCst);
        let path = format!(
            "{}/masruf_test_{}_{}.db",
            std::env::temp_dir().display(),
            std::process::id(),
            id
        );

        // Remove any existing file
        let _ = std::fs::remove_file(&path);

        Self::new_unencrypted(&path)
    }

    /// Check if the database is encrypted
    pub fn is_encrypted(&self) -> Result<bool> {
        let conn = self.conn()?;
        // SQLCipher sets cipher_version if encryption is active
        let result: rusqlite::Result<String> =
            conn.query_row("PRAGMA cipher_version;", [], |row| row.get(0));
        Ok(result.is_ok() && std::env::var(DB_KEY_ENV).is_ok())
    }

    /// Get a connection from the pool
    pub fn conn(&self) -> Result<DbConn> {
        Ok(self.pool.get()?)
    }

    /// Row counts for the status command: (categories, merchant patterns,
    /// amount patterns, cliq patterns, history rows, ledger entries,
    /// open pending decisions)
    pub fn table_counts(&self, user_id: i64) -> Result<TableCounts> {
        let conn = self.conn()?;

        let count = |sql: &str| -> Result<i64> {
            Ok(conn.query_row(sql, rusqlite::params![user_id], |row| row.get(0))?)
        };

        Ok(TableCounts {
            categories: count("SELECT COUNT(*) FROM categories WHERE user_id = ?")?,
            merchant_learning: count("SELECT COUNT(*) FROM merchant_learning WHERE user_id = ?")?,
            category_patterns: count("SELECT COUNT(*) FROM category_patterns WHERE user_id = ?")?,
            cliq_patterns: count("SELECT COUNT(*) FROM cliq_patterns WHERE user_id = ?")?,
            history: count("SELECT COUNT(*) FROM categorization_history WHERE user_id = ?")?,
            ledger: count("SELECT COUNT(*) FROM ledger_entries WHERE user_id = ?")?,
            auto_categorized: conn.query_row(
                "SELECT COUNT(*) FROM ledger_entries WHERE user_id = ? AND auto_categorized = 1",
                rusqlite::params![user_id],
                |row| row.get(0),
            )?,
            open_pending: conn.query_row(
                "SELECT COUNT(*) FROM pending_decisions WHERE user_id = ? AND status = 'awaiting'",
                rusqlite::params![user_id],
                |row| row.get(0),
            )?,
        })
    }

    /// Run database migrations
    fn run_migrations(&self) -> Result<()> {
        let conn = self.conn()?;

        conn.execute_batch(
            r#"
            -- Enable foreign keys
            PRAGMA foreign_keys = ON;

            -- WAL mode: better concurrency, readers don't block writers
            PRAGMA journal_mode = WAL;

            -- Cache size: ~8MB (2000 pages * 4KB default page size)
            PRAGMA cache_size = 2000;

            -- Synchronous NORMAL: good balance of safety and performance
            PRAGMA synchronous = NORMAL;

            -- Store temp tables in memory
            PRAGMA temp_store = MEMORY;

            -- User categories with their keyword lists
            CREATE TABLE IF NOT EXISTS categories (
                id INTEGER PRIMARY KEY,
                user_id INTEGER NOT NULL,
                name TEXT NOT NULL,
                kind TEXT NOT NULL,                         -- income, expense
                keywords TEXT,                              -- pipe-separated match keywords
                created_at DATETIME DEFAULT CURRENT_TIMESTAMP,
                UNIQUE(user_id, name, kind)
            );

            CREATE INDEX IF NOT EXISTS idx_categories_user ON categories(user_id);

            -- Learned merchant→category associations
            CREATE TABLE IF NOT EXISTS merchant_learning (
                id INTEGER PRIMARY KEY,
                user_id INTEGER NOT NULL,
                merchant TEXT NOT NULL,                     -- normalized merchant key
                category_id INTEGER NOT NULL REFERENCES categories(id) ON DELETE CASCADE,
                message_type TEXT NOT NULL,                 -- cliq_incoming, bank_debit, ...
                confidence REAL NOT NULL,                   -- always in [0, 1]
                average_amount REAL NOT NULL,
                use_count INTEGER NOT NULL DEFAULT 1,
                last_used DATETIME DEFAULT CURRENT_TIMESTAMP,
                created_at DATETIME DEFAULT CURRENT_TIMESTAMP,
                UNIQUE(user_id, merchant, category_id, message_type)
            );

            CREATE INDEX IF NOT EXISTS idx_merchant_learning_lookup
                ON merchant_learning(user_id, merchant, message_type);

            -- Learned per-category amount profiles
            CREATE TABLE IF NOT EXISTS category_patterns (
                id INTEGER PRIMARY KEY,
                user_id INTEGER NOT NULL,
                category_id INTEGER NOT NULL REFERENCES categories(id) ON DELETE CASCADE,
                message_type TEXT NOT NULL,
                amount_ranges TEXT NOT NULL DEFAULT '[]',   -- JSON list of AmountRange
                transaction_count INTEGER NOT NULL DEFAULT 0,
                last_updated DATETIME DEFAULT CURRENT_TIMESTAMP,
                UNIQUE(user_id, category_id, message_type)
            );

            CREATE INDEX IF NOT EXISTS idx_category_patterns_lookup
                ON category_patterns(user_id, message_type);

            -- Learned CliQ counterparty profiles
            CREATE TABLE IF NOT EXISTS cliq_patterns (
                id INTEGER PRIMARY KEY,
                user_id INTEGER NOT NULL,
                sender TEXT NOT NULL,                       -- normalized sender key
                transaction_type TEXT NOT NULL,             -- income, expense, unknown
                category_id INTEGER NOT NULL REFERENCES categories(id) ON DELETE CASCADE,
                average_amount REAL NOT NULL,
                amount_variance REAL NOT NULL DEFAULT 0,
                confidence REAL NOT NULL,
                use_count INTEGER NOT NULL DEFAULT 1,
                is_recurring BOOLEAN NOT NULL DEFAULT 0,    -- flips at use_count >= 3
                is_business_like BOOLEAN NOT NULL DEFAULT 0,
                last_seen DATETIME DEFAULT CURRENT_TIMESTAMP,
                UNIQUE(user_id, sender, transaction_type)
            );

            CREATE INDEX IF NOT EXISTS idx_cliq_patterns_lookup
                ON cliq_patterns(user_id, sender, transaction_type);

            -- Append-only categorization history
            CREATE TABLE IF NOT EXISTS categorization_history (
                id INTEGER PRIMARY KEY,
                user_id INTEGER NOT NULL,
                merchant TEXT,                              -- normalized, NULL when none extracted
                amount REAL NOT NULL,
                category_id INTEGER NOT NULL REFERENCES categories(id) ON DELETE CASCADE,
                message_type TEXT NOT NULL,
                confidence REAL NOT NULL,                   -- 1.0 accepted, 0.0 correction
                was_correct BOOLEAN NOT NULL,
                created_at DATETIME DEFAULT CURRENT_TIMESTAMP
            );

            CREATE INDEX IF NOT EXISTS idx_history_user ON categorization_history(user_id);
            CREATE INDEX IF NOT EXISTS idx_history_category
                ON categorization_history(user_id, category_id);

            -- Finalized income/expense entries
            CREATE TABLE IF NOT EXISTS ledger_entries (
                id INTEGER PRIMARY KEY,
                user_id INTEGER NOT NULL,
                kind TEXT NOT NULL,                         -- income, expense
                amount REAL NOT NULL,
                merchant TEXT,                              -- display form
                category_id INTEGER NOT NULL REFERENCES categories(id),
                message TEXT NOT NULL,                      -- original SMS text
                occurred_at DATETIME NOT NULL,
                source TEXT,                                -- CliQ, SMS
                auto_categorized BOOLEAN NOT NULL DEFAULT 0,
                message_hash TEXT NOT NULL,                 -- SHA-256 of the raw text
                created_at DATETIME DEFAULT CURRENT_TIMESTAMP,
                UNIQUE(user_id, message_hash)
            );

            CREATE INDEX IF NOT EXISTS idx_ledger_user ON ledger_entries(user_id, occurred_at);
            CREATE INDEX IF NOT EXISTS idx_ledger_category ON ledger_entries(category_id);

            -- Transactions parked until the user picks a category
            CREATE TABLE IF NOT EXISTS pending_decisions (
                id INTEGER PRIMARY KEY,
                user_id INTEGER NOT NULL,
                snapshot TEXT NOT NULL,                     -- JSON ParsedTransactionSnapshot
                suggestions TEXT NOT NULL DEFAULT '[]',     -- JSON list of CategorySuggestion
                prefill_category_id INTEGER REFERENCES categories(id),
                message_hash TEXT NOT NULL,
                status TEXT NOT NULL DEFAULT 'awaiting',    -- awaiting, decided
                created_at DATETIME DEFAULT CURRENT_TIMESTAMP,
                decided_at DATETIME,
                UNIQUE(user_id, message_hash)
            );

            CREATE INDEX IF NOT EXISTS idx_pending_user ON pending_decisions(user_id, status);
            "#,
        )?;

        info!("Database schema initialized");
        Ok(())
    }
}

/// Per-user row counts for the status command
#[derive(Debug, Clone, serde::Serialize)]
pub struct TableCounts {
    pub categories: i64,
    pub merchant_learning: i64,
    pub category_patterns: i64,
    pub cliq_patterns: i64,
    pub history: i64,
    pub ledger: i64,
    pub auto_categorized: i64,
    pub open_pending: i64,
}
