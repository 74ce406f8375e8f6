//! Message ingestion, dry-run parsing and prompt resolution commands

use anyhow::Result;
use masruf_core::db::Database;
use masruf_core::intake::{IntakeOutcome, MessageIntake};
use masruf_core::parse::MessageParser;

use super::truncate;

pub fn cmd_ingest(
    db: &Database,
    user_id: i64,
    message: &str,
    timestamp: Option<&str>,
    json: bool,
) -> Result<()> {
    let intake = MessageIntake::new(db)?;
    let outcome = intake.ingest(user_id, message, timestamp)?;

    if json {
        let value = match &outcome {
            IntakeOutcome::Rejected => serde_json::json!({ "outcome": "rejected" }),
            IntakeOutcome::Duplicate => serde_json::json!({ "outcome": "duplicate" }),
            IntakeOutcome::AutoCategorized {
                ledger_id,
                category_id,
                category_name,
                confidence,
            } => serde_json::json!({
                "outcome": "auto_categorized",
                "ledger_id": ledger_id,
                "category_id": category_id,
                "category_name": category_name,
                "confidence": confidence,
            }),
            IntakeOutcome::AwaitingDecision {
                pending_id,
                prefill,
                suggestions,
            } => serde_json::json!({
                "outcome": "awaiting_decision",
                "pending_id": pending_id,
                "prefill": prefill,
                "suggestions": suggestions,
            }),
        };
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }

    match outcome {
        IntakeOutcome::Rejected => {
            println!("⏭️  Not a transaction message, nothing stored");
        }
        IntakeOutcome::Duplicate => {
            println!("⏭️  Already seen this message, nothing stored");
        }
        IntakeOutcome::AutoCategorized {
            ledger_id,
            category_name,
            confidence,
            ..
        } => {
            println!(
                "✅ Filed under '{}' ({:.0}% confident), ledger entry {}",
                category_name,
                confidence * 100.0,
                ledger_id
            );
        }
        IntakeOutcome::AwaitingDecision {
            pending_id,
            prefill,
            suggestions,
        } => {
            println!("❓ Needs a category. Prompt id: {}", pending_id);
            if let Some(prefill) = prefill {
                println!(
                    "   Best guess: {} ({:.0}%)",
                    prefill.category_name,
                    prefill.confidence * 100.0
                );
            }
            for s in suggestions.iter().take(5) {
                println!(
                    "   • {} ({:.0}%) - {}",
                    s.category_name,
                    s.confidence * 100.0,
                    truncate(&s.reason, 60)
                );
            }
            println!("   Answer with: masruf resolve {} <category>", pending_id);
        }
    }

    Ok(())
}

pub fn cmd_parse(message: &str, timestamp: Option<&str>, json: bool) -> Result<()> {
    let parser = MessageParser::new()?;

    match parser.parse(message, timestamp)? {
        None => {
            if json {
                println!("null");
            } else {
                println!("⏭️  Not a transaction message");
            }
        }
        Some(tx) => {
            if json {
                println!("{}", serde_json::to_string_pretty(&tx)?);
            } else {
                println!();
                println!("💬 Parsed transaction");
                println!("   ─────────────────────────────────────────────");
                println!("   Type:      {}", tx.transaction_type);
                println!(
                    "   Source:    {}",
                    tx.source.map(|s| s.as_str()).unwrap_or("-")
                );
                println!("   Amount:    {:.3} JOD", tx.amount);
                println!("   Merchant:  {}", tx.merchant.as_deref().unwrap_or("-"));
                println!("   Hint:      {}", tx.category_hint);
                println!("   Timestamp: {}", tx.timestamp.to_rfc3339());
            }
        }
    }

    Ok(())
}

pub fn cmd_pending(db: &Database, user_id: i64) -> Result<()> {
    let pending = db.list_open_pending(user_id)?;

    if pending.is_empty() {
        println!("No open prompts. Ingest messages with 'masruf ingest'.");
        return Ok(());
    }

    println!();
    println!("❓ Open categorization prompts");
    println!("   ─────────────────────────────────────────────────────────────");
    for p in &pending {
        let tx = &p.snapshot.transaction;
        println!(
            "   [{}] {:.3} JOD {} {} - {}",
            p.id,
            tx.amount,
            tx.transaction_type,
            tx.merchant.as_deref().unwrap_or("(no merchant)"),
            truncate(&tx.original_message, 48)
        );
        if let Some(best) = p.suggestions.first() {
            println!(
                "        suggested: {} ({:.0}%)",
                best.category_name,
                best.confidence * 100.0
            );
        }
    }

    Ok(())
}

pub fn cmd_resolve(db: &Database, user_id: i64, pending_id: i64, category: &str) -> Result<()> {
    let category_id = resolve_category_arg(db, user_id, category)?;
    let intake = MessageIntake::new(db)?;
    let resolved = intake.resolve(user_id, pending_id, category_id)?;

    println!(
        "✅ Recorded under category {} (ledger entry {}){}",
        category_id,
        resolved.ledger_id,
        if resolved.was_correction {
            " - noted as a correction"
        } else {
            ""
        }
    );
    Ok(())
}

/// Accept a category by numeric id or by name
pub(crate) fn resolve_category_arg(db: &Database, user_id: i64, arg: &str) -> Result<i64> {
    if let Ok(id) = arg.parse::<i64>() {
        if db.get_category(user_id, id)?.is_some() {
            return Ok(id);
        }
        anyhow::bail!("Category {} not found", id);
    }

    let category = db
        .get_category_by_name(user_id, arg)?
        .ok_or_else(|| anyhow::anyhow!("Category '{}' not found", arg))?;
    Ok(category.id)
}
