//! Masruf CLI - SMS expense tracking with self-learning categorization
//!
//! Usage:
//!   masruf init                     Initialize database, seed categories
//!   masruf ingest "SMS TEXT"        Ingest a message end to end
//!   masruf pending                  List open categorization prompts
//!   masruf resolve 3 Groceries      Answer a prompt
//!   masruf status                   Database and learning statistics

mod cli;
mod commands;

#[cfg(test)]
mod tests;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cli::*;

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging
    // Priority: RUST_LOG env var > --verbose flag > default (info)
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).compact())
        .init();

    match cli.command {
        Commands::Init => commands::cmd_init(&cli.db, cli.user, cli.no_encrypt),
        Commands::Ingest {
            message,
            timestamp,
            json,
        } => {
            let db = commands::open_db(&cli.db, cli.no_encrypt)?;
            commands::cmd_ingest(&db, cli.user, &message, timestamp.as_deref(), json)
        }
        Commands::Parse {
            message,
            timestamp,
            json,
        } => commands::cmd_parse(&message, timestamp.as_deref(), json),
        Commands::Pending => {
            let db = commands::open_db(&cli.db, cli.no_encrypt)?;
            commands::cmd_pending(&db, cli.user)
        }
        Commands::Resolve {
            pending_id,
            category,
        } => {
            let db = commands::open_db(&cli.db, cli.no_encrypt)?;
            commands::cmd_resolve(&db, cli.user, pending_id, &category)
        }
        Commands::Categories { action } => {
            let db = commands::open_db(&cli.db, cli.no_encrypt)?;
            match action {
                None | Some(CategoriesAction::List) => commands::cmd_categories_list(&db, cli.user),
                Some(CategoriesAction::Add {
                    name,
                    kind,
                    keywords,
                }) => commands::cmd_categories_add(&db, cli.user, &name, &kind, keywords.as_deref()),
                Some(CategoriesAction::Keywords { category, keywords }) => {
                    commands::cmd_categories_keywords(&db, cli.user, &category, &keywords)
                }
            }
        }
        Commands::Patterns { action } => {
            let db = commands::open_db(&cli.db, cli.no_encrypt)?;
            match action {
                None | Some(PatternsAction::Merchants) => {
                    commands::cmd_patterns_merchants(&db, cli.user)
                }
                Some(PatternsAction::Cliq) => commands::cmd_patterns_cliq(&db, cli.user),
                Some(PatternsAction::Amounts) => commands::cmd_patterns_amounts(&db, cli.user),
                Some(PatternsAction::History { limit }) => {
                    commands::cmd_patterns_history(&db, cli.user, limit)
                }
            }
        }
        Commands::Ledger { limit } => {
            let db = commands::open_db(&cli.db, cli.no_encrypt)?;
            commands::cmd_ledger(&db, cli.user, limit)
        }
        Commands::Status => {
            let db = commands::open_db(&cli.db, cli.no_encrypt)?;
            commands::cmd_status(&db, cli.user)
        }
    }
}
