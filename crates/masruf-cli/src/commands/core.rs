//! Core commands (init, status) and shared utilities

use std::path::Path;

use anyhow::Result;
use masruf_core::db::Database;
use tracing::debug;

/// Open the database, honoring the encryption settings
pub fn open_db(path: &Path, no_encrypt: bool) -> Result<Database> {
    let path_str = path
        .to_str()
        .ok_or_else(|| anyhow::anyhow!("Invalid database path"))?;
    debug!("opening database at {}", path_str);

    let db = if no_encrypt {
        Database::new_unencrypted(path_str)?
    } else {
        Database::new(path_str)?
    };
    Ok(db)
}

pub fn cmd_init(path: &Path, user_id: i64, no_encrypt: bool) -> Result<()> {
    let db = open_db(path, no_encrypt)?;
    let seeded = db.seed_default_categories(user_id)?;

    println!("✅ Database initialized at {}", db.path());
    if seeded > 0 {
        println!("   Seeded {} default categories for user {}", seeded, user_id);
    } else {
        println!("   Categories already present for user {}", user_id);
    }
    if no_encrypt {
        println!("   ⚠️  Encryption disabled (--no-encrypt)");
    }
    Ok(())
}

pub fn cmd_status(db: &Database, user_id: i64) -> Result<()> {
    let counts = db.table_counts(user_id)?;
    let encrypted = db.is_encrypted().unwrap_or(false);

    println!();
    println!("📊 Masruf status (user {})", user_id);
    println!("   ─────────────────────────────────────────────");
    println!("   Database:          {}", db.path());
    println!(
        "   Encryption:        {}",
        if encrypted { "enabled" } else { "disabled" }
    );
    println!("   Categories:        {}", counts.categories);
    println!("   Merchant patterns: {}", counts.merchant_learning);
    println!("   Amount patterns:   {}", counts.category_patterns);
    println!("   CliQ patterns:     {}", counts.cliq_patterns);
    println!("   History rows:      {}", counts.history);
    println!(
        "   Ledger entries:    {} ({} auto-categorized)",
        counts.ledger, counts.auto_categorized
    );
    println!("   Open prompts:      {}", counts.open_pending);

    if counts.ledger > 0 {
        let auto_share = counts.auto_categorized as f64 / counts.ledger as f64 * 100.0;
        println!("   Auto-filed share:  {:.0}%", auto_share);
    }

    Ok(())
}
