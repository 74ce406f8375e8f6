//! CLI command implementations
//!
//! Commands are organized by domain:
//! - `core` - init/status and shared utilities (open_db)
//! - `ingest` - Message ingestion, dry-run parsing, prompt resolution
//! - `categories` - Category management commands
//! - `patterns` - Learned-pattern inspection commands
//! - `ledger` - Ledger listing

pub mod categories;
pub mod core;
pub mod ingest;
pub mod ledger;
pub mod patterns;

// Re-export command functions for main.rs
pub use categories::*;
pub use core::*;
pub use ingest::*;
pub use ledger::*;
pub use patterns::*;

/// Truncate a string to a maximum length, adding "..." if truncated
pub fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let cut: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", cut)
    }
}
