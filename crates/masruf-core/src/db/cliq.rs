//! Learned CliQ counterparty profile operations

use rusqlite::{params, OptionalExtension, TransactionBehavior};

use super::{parse_datetime, Database};
use crate::error::Result;
use crate::models::{CliqPattern, TransactionType};

fn row_to_pattern(row: &rusqlite::Row<'_>) -> rusqlite::Result<CliqPattern> {
    let transaction_type_str: String = row.get(3)?;
    let last_seen_str: String = row.get(11)?;

    Ok(CliqPattern {
        id: row.get(0)?,
        user_id: row.get(1)?,
        sender: row.get(2)?,
        transaction_type: transaction_type_str
            .parse()
            .unwrap_or(TransactionType::Unknown),
        category_id: row.get(4)?,
        average_amount: row.get(5)?,
        amount_variance: row.get(6)?,
        confidence: row.get(7)?,
        use_count: row.get(8)?,
        is_recurring: row.get(9)?,
        is_business_like: row.get(10)?,
        last_seen: parse_datetime(&last_seen_str),
    })
}

const PATTERN_COLUMNS: &str = "id, user_id, sender, transaction_type, category_id, \
     average_amount, amount_variance, confidence, use_count, is_recurring, \
     is_business_like, last_seen";

impl Database {
    /// Profile for one (user, normalized sender, direction), with the
    /// category name; consumed by the CliQ signal generator
    pub fn get_cliq_pattern(
        &self,
        user_id: i64,
        sender: &str,
        transaction_type: TransactionType,
    ) -> Result<Option<(CliqPattern, String)>> {
        let conn = self.conn()?;
        conn.query_row(
            r#"
            SELECT cp.id, cp.user_id, cp.sender, cp.transaction_type, cp.category_id,
                   cp.average_amount, cp.amount_variance, cp.confidence, cp.use_count,
                   cp.is_recurring, cp.is_business_like, cp.last_seen, c.name
            FROM cliq_patterns cp
            INNER JOIN categories c ON cp.category_id = c.id
            WHERE cp.user_id = ? AND cp.sender = ? AND cp.transaction_type = ?
            "#,
            params![user_id, sender, transaction_type.as_str()],
            |row| {
                let pattern = row_to_pattern(row)?;
                let name: String = row.get(12)?;
                Ok((pattern, name))
            },
        )
        .optional()
        .map_err(Into::into)
    }

    /// Fold a decided CliQ transaction into the sender's profile.
    ///
    /// Recomputes the running average and a simple variance estimate, grows
    /// confidence by 1.05x up to the 0.9 cap, and flips `is_recurring` once
    /// the pair has been seen 3 times. The latest decided category wins.
    pub fn record_cliq_decision(
        &self,
        user_id: i64,
        sender: &str,
        transaction_type: TransactionType,
        category_id: i64,
        amount: f64,
        is_business_like: bool,
    ) -> Result<()> {
        let mut conn = self.conn()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let existing: Option<(i64, f64, f64, f64, i64)> = tx
            .query_row(
                r#"
                SELECT id, average_amount, amount_variance, confidence, use_count
                FROM cliq_patterns
                WHERE user_id = ? AND sender = ? AND transaction_type = ?
                "#,
                params![user_id, sender, transaction_type.as_str()],
                |row| {
                    Ok((
                        row.get(0)?,
                        row.get(1)?,
                        row.get(2)?,
                        row.get(3)?,
                        row.get(4)?,
                    ))
                },
            )
            .optional()?;

        match existing {
            Some((id, average, variance, confidence, use_count)) => {
                let n = use_count as f64;
                let new_average = (average * n + amount) / (n + 1.0);
                let new_variance =
                    (variance * n + (amount - new_average).powi(2)) / (n + 1.0);
                let new_confidence = (confidence * 1.05).min(0.9);
                let new_use_count = use_count + 1;

                tx.execute(
                    r#"
                    UPDATE cliq_patterns
                    SET category_id = ?, average_amount = ?, amount_variance = ?,
                        confidence = ?, use_count = ?, is_recurring = ?,
                        is_business_like = ?, last_seen = CURRENT_TIMESTAMP
                    WHERE id = ?
                    "#,
                    params![
                        category_id,
                        new_average,
                        new_variance,
                        new_confidence,
                        new_use_count,
                        new_use_count >= 3,
                        is_business_like,
                        id
                    ],
                )?;
            }
            None => {
                tx.execute(
                    r#"
                    INSERT INTO cliq_patterns
                        (user_id, sender, transaction_type, category_id, average_amount,
                         amount_variance, confidence, use_count, is_recurring, is_business_like)
                    VALUES (?, ?, ?, ?, ?, 0, 0.7, 1, 0, ?)
                    "#,
                    params![
                        user_id,
                        sender,
                        transaction_type.as_str(),
                        category_id,
                        amount,
                        is_business_like
                    ],
                )?;
            }
        }

        tx.commit()?;
        Ok(())
    }

    /// All CliQ profiles for a user, most recently seen first
    pub fn list_cliq_patterns(&self, user_id: i64) -> Result<Vec<CliqPattern>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM cliq_patterns WHERE user_id = ? ORDER BY last_seen DESC",
            PATTERN_COLUMNS
        ))?;

        let rows = stmt
            .query_map(params![user_id], row_to_pattern)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }
}
