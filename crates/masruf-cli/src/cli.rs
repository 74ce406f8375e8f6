//! CLI argument definitions using clap
//!
//! This module contains all the clap structs and enums for parsing CLI
//! arguments. The actual command implementations are in the `commands`
//! module.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Masruf - SMS expense tracking with self-learning categorization
#[derive(Parser)]
#[command(name = "masruf")]
#[command(about = "Parse bank SMS messages and learn your spending categories", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Database path
    #[arg(long, default_value = "masruf.db", global = true)]
    pub db: PathBuf,

    /// User id to operate as
    #[arg(short, long, default_value_t = 1, global = true)]
    pub user: i64,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable database encryption (not recommended for production)
    ///
    /// By default, the database is encrypted using SQLCipher.
    /// Set MASRUF_DB_KEY environment variable with your passphrase.
    /// Use --no-encrypt only for development or testing.
    #[arg(long, global = true)]
    pub no_encrypt: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize the database and seed the default categories
    Init,

    /// Ingest one SMS message end to end
    Ingest {
        /// Raw message text
        message: String,

        /// Message timestamp (ISO-8601); defaults to now
        #[arg(short, long)]
        timestamp: Option<String>,

        /// Print the outcome as JSON
        #[arg(long)]
        json: bool,
    },

    /// Parse a message and show the extraction, without writing anything
    Parse {
        /// Raw message text
        message: String,

        /// Message timestamp (ISO-8601); defaults to now
        #[arg(short, long)]
        timestamp: Option<String>,

        /// Print the parsed transaction as JSON
        #[arg(long)]
        json: bool,
    },

    /// List open categorization prompts
    Pending,

    /// Resolve a pending prompt with a category (id or name)
    Resolve {
        /// Pending decision id (from `masruf pending`)
        pending_id: i64,

        /// Category id or name
        category: String,
    },

    /// Manage categories and their keyword lists
    Categories {
        #[command(subcommand)]
        action: Option<CategoriesAction>,
    },

    /// Inspect learned patterns
    Patterns {
        #[command(subcommand)]
        action: Option<PatternsAction>,
    },

    /// List ledger entries
    Ledger {
        /// Maximum entries to show
        #[arg(short, long, default_value = "20")]
        limit: i64,
    },

    /// Show database status and learning statistics
    Status,
}

#[derive(Subcommand)]
pub enum CategoriesAction {
    /// List categories (default)
    List,

    /// Add a category
    Add {
        /// Category name
        name: String,

        /// income or expense
        #[arg(short, long, default_value = "expense")]
        kind: String,

        /// Pipe-separated match keywords, e.g. "carrefour|كارفور"
        #[arg(long)]
        keywords: Option<String>,
    },

    /// Replace a category's keyword list
    Keywords {
        /// Category id or name
        category: String,

        /// Pipe-separated match keywords; empty string clears the list
        keywords: String,
    },
}

#[derive(Subcommand)]
pub enum PatternsAction {
    /// Learned merchant→category associations (default)
    Merchants,

    /// Learned CliQ counterparty profiles
    Cliq,

    /// Learned per-category amount ranges
    Amounts,

    /// Recent categorization history
    History {
        /// Maximum rows to show
        #[arg(short, long, default_value = "20")]
        limit: i64,
    },
}
