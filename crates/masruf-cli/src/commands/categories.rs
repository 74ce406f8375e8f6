//! Category management commands

use anyhow::Result;
use masruf_core::db::Database;
use masruf_core::models::CategoryKind;

use super::ingest::resolve_category_arg;

pub fn cmd_categories_list(db: &Database, user_id: i64) -> Result<()> {
    let categories = db.list_categories(user_id)?;

    if categories.is_empty() {
        println!("No categories found. Run 'masruf init' to seed the defaults.");
        return Ok(());
    }

    println!();
    println!("🏷️  Categories");
    println!("   ─────────────────────────────────────────────────────────────");
    for cat in &categories {
        let keywords = cat
            .keywords
            .as_deref()
            .filter(|k| !k.is_empty())
            .map(|k| format!(" ({})", k))
            .unwrap_or_default();
        println!("   [{}] {} · {}{}", cat.id, cat.name, cat.kind, keywords);
    }

    Ok(())
}

pub fn cmd_categories_add(
    db: &Database,
    user_id: i64,
    name: &str,
    kind: &str,
    keywords: Option<&str>,
) -> Result<()> {
    let kind: CategoryKind = kind
        .parse()
        .map_err(|e: String| anyhow::anyhow!(e))?;

    let id = db.create_category(user_id, name, kind, keywords)?;
    println!("✅ Created category '{}' (id: {})", name, id);
    Ok(())
}

pub fn cmd_categories_keywords(
    db: &Database,
    user_id: i64,
    category: &str,
    keywords: &str,
) -> Result<()> {
    let category_id = resolve_category_arg(db, user_id, category)?;
    let keywords = if keywords.is_empty() {
        None
    } else {
        Some(keywords)
    };

    db.set_category_keywords(user_id, category_id, keywords)?;
    match keywords {
        Some(k) => println!("✅ Keywords for category {} set to '{}'", category_id, k),
        None => println!("✅ Cleared keywords for category {}", category_id),
    }
    Ok(())
}
