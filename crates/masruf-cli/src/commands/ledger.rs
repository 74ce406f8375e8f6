//! Ledger listing command

use anyhow::Result;
use masruf_core::db::Database;

use super::truncate;

pub fn cmd_ledger(db: &Database, user_id: i64, limit: i64) -> Result<()> {
    let entries = db.list_ledger_entries(user_id, limit)?;

    if entries.is_empty() {
        println!("No ledger entries yet. Ingest messages with 'masruf ingest'.");
        return Ok(());
    }

    println!();
    println!("📒 Ledger");
    println!("   ─────────────────────────────────────────────────────────────");
    for e in &entries {
        let sign = match e.kind {
            masruf_core::models::CategoryKind::Income => "+",
            masruf_core::models::CategoryKind::Expense => "-",
        };
        println!(
            "   {} {}{:.3} JOD · {} · category {}{}{}",
            e.occurred_at.format("%Y-%m-%d"),
            sign,
            e.amount,
            e.merchant.as_deref().unwrap_or("(no merchant)"),
            e.category_id,
            if e.auto_categorized { " · auto" } else { "" },
            e.source
                .map(|s| format!(" · {}", s))
                .unwrap_or_default()
        );
        println!("      {}", truncate(&e.message, 64));
    }

    Ok(())
}
