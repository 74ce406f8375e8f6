//! Append-only categorization history operations

use rusqlite::params;

use super::{parse_datetime, Database};
use crate::error::Result;
use crate::models::{CategoryAmountStats, HistoryEntry, MessageType};

impl Database {
    /// Append one decision to the history log; rows are never mutated
    pub fn append_history(
        &self,
        user_id: i64,
        merchant: Option<&str>,
        amount: f64,
        category_id: i64,
        message_type: MessageType,
        confidence: f64,
        was_correct: bool,
    ) -> Result<i64> {
        let conn = self.conn()?;
        conn.execute(
            r#"
            INSERT INTO categorization_history
                (user_id, merchant, amount, category_id, message_type, confidence, was_correct)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
            params![
                user_id,
                merchant,
                amount,
                category_id,
                message_type.as_str(),
                confidence.clamp(0.0, 1.0),
                was_correct
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    pub fn list_history(&self, user_id: i64, limit: i64) -> Result<Vec<HistoryEntry>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT id, user_id, merchant, amount, category_id, message_type,
                   confidence, was_correct, created_at
            FROM categorization_history
            WHERE user_id = ?
            ORDER BY created_at DESC, id DESC
            LIMIT ?
            "#,
        )?;

        let rows = stmt
            .query_map(params![user_id, limit], |row| {
                let message_type_str: String = row.get(5)?;
                let created_at_str: String = row.get(8)?;

                Ok(HistoryEntry {
                    id: row.get(0)?,
                    user_id: row.get(1)?,
                    merchant: row.get(2)?,
                    amount: row.get(3)?,
                    category_id: row.get(4)?,
                    message_type: message_type_str.parse().unwrap_or(MessageType::BankUnknown),
                    confidence: row.get(6)?,
                    was_correct: row.get(7)?,
                    created_at: parse_datetime(&created_at_str),
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// Mean/stddev of decided amounts per category over the full history,
    /// for categories with at least 3 data points. Feeds the amount
    /// z-score signal generator.
    pub fn category_amount_stats(&self, user_id: i64) -> Result<Vec<CategoryAmountStats>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT h.category_id, c.name, COUNT(*), AVG(h.amount), AVG(h.amount * h.amount)
            FROM categorization_history h
            INNER JOIN categories c ON h.category_id = c.id
            WHERE h.user_id = ?
            GROUP BY h.category_id
            HAVING COUNT(*) >= 3
            "#,
        )?;

        let rows = stmt
            .query_map(params![user_id], |row| {
                let count: i64 = row.get(2)?;
                let mean: f64 = row.get(3)?;
                let mean_sq: f64 = row.get(4)?;

                Ok(CategoryAmountStats {
                    category_id: row.get(0)?,
                    category_name: row.get(1)?,
                    sample_count: count,
                    mean,
                    // Population variance from the two running sums
                    stddev: (mean_sq - mean * mean).max(0.0).sqrt(),
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }
}
