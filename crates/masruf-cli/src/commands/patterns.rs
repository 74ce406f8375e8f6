//! Learned-pattern inspection commands

use anyhow::Result;
use masruf_core::db::Database;

pub fn cmd_patterns_merchants(db: &Database, user_id: i64) -> Result<()> {
    let rows = db.list_merchant_learning(user_id)?;

    if rows.is_empty() {
        println!("No learned merchants yet. Decisions teach the engine over time.");
        return Ok(());
    }

    println!();
    println!("🧠 Learned merchants");
    println!("   ─────────────────────────────────────────────────────────────");
    for row in &rows {
        println!(
            "   {} → category {} · {} · {:.0}% · {} use(s) · avg {:.3} JOD",
            row.merchant,
            row.category_id,
            row.message_type,
            row.confidence * 100.0,
            row.use_count,
            row.average_amount
        );
    }

    Ok(())
}

pub fn cmd_patterns_cliq(db: &Database, user_id: i64) -> Result<()> {
    let rows = db.list_cliq_patterns(user_id)?;

    if rows.is_empty() {
        println!("No CliQ counterparty profiles yet.");
        return Ok(());
    }

    println!();
    println!("🔁 CliQ counterparties");
    println!("   ─────────────────────────────────────────────────────────────");
    for row in &rows {
        let mut flags = Vec::new();
        if row.is_recurring {
            flags.push("recurring");
        }
        if row.is_business_like {
            flags.push("business");
        }
        let flags = if flags.is_empty() {
            String::new()
        } else {
            format!(" [{}]", flags.join(", "))
        };

        println!(
            "   {} ({}) → category {} · {:.0}% · {} transfer(s) · avg {:.3} JOD{}",
            row.sender,
            row.transaction_type,
            row.category_id,
            row.confidence * 100.0,
            row.use_count,
            row.average_amount,
            flags
        );
    }

    Ok(())
}

pub fn cmd_patterns_amounts(db: &Database, user_id: i64) -> Result<()> {
    let patterns = db.list_all_category_patterns(user_id)?;

    if patterns.is_empty() {
        println!("No amount profiles yet.");
        return Ok(());
    }

    println!();
    println!("📐 Amount profiles");
    println!("   ─────────────────────────────────────────────────────────────");
    for p in &patterns {
        println!(
            "   category {} · {} · {} transaction(s)",
            p.category_id, p.message_type, p.transaction_count
        );
        for r in &p.ranges {
            println!(
                "      {:.3}–{:.3} JOD (frequency {:.1})",
                r.min, r.max, r.frequency
            );
        }
    }

    Ok(())
}

pub fn cmd_patterns_history(db: &Database, user_id: i64, limit: i64) -> Result<()> {
    let rows = db.list_history(user_id, limit)?;

    if rows.is_empty() {
        println!("No categorization history yet.");
        return Ok(());
    }

    println!();
    println!("🗒️  Recent decisions");
    println!("   ─────────────────────────────────────────────────────────────");
    for row in &rows {
        println!(
            "   {} · {:.3} JOD · {} · category {} · {}",
            row.created_at.format("%Y-%m-%d %H:%M"),
            row.amount,
            row.merchant.as_deref().unwrap_or("(no merchant)"),
            row.category_id,
            if row.was_correct { "accepted" } else { "corrected" }
        );
    }

    Ok(())
}
