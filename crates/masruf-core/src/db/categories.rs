//! User category store operations

use rusqlite::params;

use super::{parse_datetime, Database};
use crate::error::{Error, Result};
use crate::models::{Category, CategoryKind};

/// Default category set seeded for a new user: (name, kind, starter keywords)
const DEFAULT_CATEGORIES: &[(&str, CategoryKind, &str)] = &[
    ("Groceries", CategoryKind::Expense, "carrefour|كارفور|سامح|supermarket|سوبرماركت|grocery"),
    ("Dining", CategoryKind::Expense, "talabat|طلبات|مطعم|restaurant|cafe|مقهى"),
    ("Transport", CategoryKind::Expense, "careem|كريم|uber|taxi|تاكسي|بنزين"),
    ("Utilities", CategoryKind::Expense, "orange|zain|زين|umniah|امنية|كهرباء|مياه|electricity"),
    ("Healthcare", CategoryKind::Expense, "صيدلية|pharmacy|مستشفى|hospital|عيادة|clinic"),
    ("Shopping", CategoryKind::Expense, "amazon|امازون|mall|مول"),
    ("Entertainment", CategoryKind::Expense, "netflix|cinema|سينما"),
    ("Education", CategoryKind::Expense, "مدرسة|school|جامعة|university"),
    ("Rent", CategoryKind::Expense, "ايجار|إيجار|rent"),
    ("Other", CategoryKind::Expense, ""),
    ("Salary", CategoryKind::Income, "راتب|salary|payroll"),
    ("Transfers", CategoryKind::Income, "حوالة|transfer|cliq|كليك"),
];

fn row_to_category(row: &rusqlite::Row<'_>) -> rusqlite::Result<Category> {
    let kind_str: String = row.get(3)?;
    let created_at_str: String = row.get(5)?;

    Ok(Category {
        id: row.get(0)?,
        user_id: row.get(1)?,
        name: row.get(2)?,
        kind: kind_str.parse().unwrap_or(CategoryKind::Expense),
        keywords: row.get(4)?,
        created_at: parse_datetime(&created_at_str),
    })
}

const CATEGORY_COLUMNS: &str = "id, user_id, name, kind, keywords, created_at";

impl Database {
    /// Create a category; fails if (user, name, kind) already exists
    pub fn create_category(
        &self,
        user_id: i64,
        name: &str,
        kind: CategoryKind,
        keywords: Option<&str>,
    ) -> Result<i64> {
        let name = name.trim();
        if name.is_empty() {
            return Err(Error::InvalidData("Category name cannot be empty".to_string()));
        }

        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO categories (user_id, name, kind, keywords) VALUES (?, ?, ?, ?)",
            params![user_id, name, kind.as_str(), keywords],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// Seed the default bilingual category set; idempotent
    pub fn seed_default_categories(&self, user_id: i64) -> Result<usize> {
        let conn = self.conn()?;
        let mut created = 0;

        for (name, kind, keywords) in DEFAULT_CATEGORIES {
            let keywords = if keywords.is_empty() {
                None
            } else {
                Some(*keywords)
            };
            created += conn.execute(
                "INSERT OR IGNORE INTO categories (user_id, name, kind, keywords) VALUES (?, ?, ?, ?)",
                params![user_id, name, kind.as_str(), keywords],
            )?;
        }

        Ok(created)
    }

    pub fn get_category(&self, user_id: i64, category_id: i64) -> Result<Option<Category>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM categories WHERE user_id = ? AND id = ?",
            CATEGORY_COLUMNS
        ))?;

        let mut rows = stmt.query_map(params![user_id, category_id], row_to_category)?;
        rows.next().transpose().map_err(Error::from)
    }

    /// Look up a category by name, case-insensitive, any kind
    pub fn get_category_by_name(&self, user_id: i64, name: &str) -> Result<Option<Category>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM categories WHERE user_id = ? AND name = ? COLLATE NOCASE
             ORDER BY kind LIMIT 1",
            CATEGORY_COLUMNS
        ))?;

        let mut rows = stmt.query_map(params![user_id, name], row_to_category)?;
        rows.next().transpose().map_err(Error::from)
    }

    pub fn list_categories(&self, user_id: i64) -> Result<Vec<Category>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM categories WHERE user_id = ? ORDER BY kind, name",
            CATEGORY_COLUMNS
        ))?;

        let categories = stmt
            .query_map(params![user_id], row_to_category)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(categories)
    }

    /// Replace a category's keyword list
    pub fn set_category_keywords(
        &self,
        user_id: i64,
        category_id: i64,
        keywords: Option<&str>,
    ) -> Result<()> {
        let conn = self.conn()?;
        let updated = conn.execute(
            "UPDATE categories SET keywords = ? WHERE user_id = ? AND id = ?",
            params![keywords, user_id, category_id],
        )?;

        if updated == 0 {
            return Err(Error::NotFound(format!("Category {}", category_id)));
        }
        Ok(())
    }
}
