//! Learned merchant→category association operations

use rusqlite::params;

use super::{parse_datetime, Database};
use crate::error::Result;
use crate::models::{MerchantLearning, MessageType};

/// A merchant-learning row joined with its category name, as consumed by
/// the exact-merchant signal generator
#[derive(Debug, Clone)]
pub struct MerchantSuggestion {
    pub category_id: i64,
    pub category_name: String,
    pub confidence: f64,
    pub average_amount: f64,
    pub use_count: i64,
}

impl Database {
    /// Rows for one (user, normalized merchant, message type) lookup. May
    /// return several rows when the merchant historically split across
    /// categories.
    pub fn merchant_suggestions(
        &self,
        user_id: i64,
        merchant: &str,
        message_type: MessageType,
    ) -> Result<Vec<MerchantSuggestion>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT ml.category_id, c.name, ml.confidence, ml.average_amount, ml.use_count
            FROM merchant_learning ml
            INNER JOIN categories c ON ml.category_id = c.id
            WHERE ml.user_id = ? AND ml.merchant = ? AND ml.message_type = ?
            ORDER BY ml.confidence DESC
            "#,
        )?;

        let rows = stmt
            .query_map(params![user_id, merchant, message_type.as_str()], |row| {
                Ok(MerchantSuggestion {
                    category_id: row.get(0)?,
                    category_name: row.get(1)?,
                    confidence: row.get(2)?,
                    average_amount: row.get(3)?,
                    use_count: row.get(4)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// Record a user decision for a merchant/category pair.
    ///
    /// First decision seeds the row at confidence 0.7; every later one
    /// recomputes the running average amount, bumps the use count and grows
    /// confidence by 1.1x up to the 0.95 cap. A single conflict-update
    /// statement so concurrent decisions cannot lose counts.
    pub fn upsert_merchant_learning(
        &self,
        user_id: i64,
        merchant: &str,
        category_id: i64,
        message_type: MessageType,
        amount: f64,
    ) -> Result<()> {
        let conn = self.conn()?;
        conn.execute(
            r#"
            INSERT INTO merchant_learning
                (user_id, merchant, category_id, message_type, confidence, average_amount, use_count)
            VALUES (?, ?, ?, ?, 0.7, ?, 1)
            ON CONFLICT(user_id, merchant, category_id, message_type) DO UPDATE SET
                average_amount = (average_amount * use_count + excluded.average_amount)
                                 / (use_count + 1),
                use_count = use_count + 1,
                confidence = min(confidence * 1.1, 0.95),
                last_used = CURRENT_TIMESTAMP
            "#,
            params![
                user_id,
                merchant,
                category_id,
                message_type.as_str(),
                amount
            ],
        )?;
        Ok(())
    }

    /// All learned merchant rows for a user, most recently used first
    pub fn list_merchant_learning(&self, user_id: i64) -> Result<Vec<MerchantLearning>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT id, user_id, merchant, category_id, message_type, confidence,
                   average_amount, use_count, last_used
            FROM merchant_learning
            WHERE user_id = ?
            ORDER BY last_used DESC
            "#,
        )?;

        let rows = stmt
            .query_map(params![user_id], |row| {
                let message_type_str: String = row.get(4)?;
                let last_used_str: String = row.get(8)?;

                Ok(MerchantLearning {
                    id: row.get(0)?,
                    user_id: row.get(1)?,
                    merchant: row.get(2)?,
                    category_id: row.get(3)?,
                    message_type: message_type_str.parse().unwrap_or(MessageType::BankUnknown),
                    confidence: row.get(5)?,
                    average_amount: row.get(6)?,
                    use_count: row.get(7)?,
                    last_used: parse_datetime(&last_used_str),
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }
}
