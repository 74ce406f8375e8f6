//! Finalized income/expense ledger operations and message dedup

use rusqlite::params;

use super::{format_datetime, parse_datetime, Database};
use crate::error::Result;
use crate::models::{CategoryKind, LedgerEntry, MessageSource, ParsedTransaction};

impl Database {
    /// Has this exact message text already produced a ledger entry or a
    /// pending decision for this user?
    pub fn message_seen(&self, user_id: i64, message_hash: &str) -> Result<bool> {
        let conn = self.conn()?;
        let count: i64 = conn.query_row(
            r#"
            SELECT
                (SELECT COUNT(*) FROM ledger_entries WHERE user_id = ?1 AND message_hash = ?2)
              + (SELECT COUNT(*) FROM pending_decisions WHERE user_id = ?1 AND message_hash = ?2)
            "#,
            params![user_id, message_hash],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    /// Write the finalized ledger entry for a categorized transaction
    pub fn insert_ledger_entry(
        &self,
        user_id: i64,
        transaction: &ParsedTransaction,
        kind: CategoryKind,
        category_id: i64,
        auto_categorized: bool,
        message_hash: &str,
    ) -> Result<i64> {
        let conn = self.conn()?;
        conn.execute(
            r#"
            INSERT INTO ledger_entries
                (user_id, kind, amount, merchant, category_id, message, occurred_at,
                 source, auto_categorized, message_hash)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
            params![
                user_id,
                kind.as_str(),
                transaction.amount,
                transaction.merchant,
                category_id,
                transaction.original_message,
                format_datetime(transaction.timestamp),
                transaction.source.map(|s| s.as_str()),
                auto_categorized,
                message_hash
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    pub fn list_ledger_entries(&self, user_id: i64, limit: i64) -> Result<Vec<LedgerEntry>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT id, user_id, kind, amount, merchant, category_id, message,
                   occurred_at, source, auto_categorized, created_at
            FROM ledger_entries
            WHERE user_id = ?
            ORDER BY occurred_at DESC, id DESC
            LIMIT ?
            "#,
        )?;

        let rows = stmt
            .query_map(params![user_id, limit], |row| {
                let kind_str: String = row.get(2)?;
                let occurred_at_str: String = row.get(7)?;
                let source_str: Option<String> = row.get(8)?;
                let created_at_str: String = row.get(10)?;

                Ok(LedgerEntry {
                    id: row.get(0)?,
                    user_id: row.get(1)?,
                    kind: kind_str.parse().unwrap_or(CategoryKind::Expense),
                    amount: row.get(3)?,
                    merchant: row.get(4)?,
                    category_id: row.get(5)?,
                    message: row.get(6)?,
                    occurred_at: parse_datetime(&occurred_at_str),
                    source: source_str.and_then(|s| s.parse::<MessageSource>().ok()),
                    auto_categorized: row.get(9)?,
                    created_at: parse_datetime(&created_at_str),
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }
}
