//! Learned per-category amount profile operations

use rusqlite::{params, OptionalExtension, TransactionBehavior};

use super::{parse_datetime, Database};
use crate::error::Result;
use crate::models::{AmountRange, CategoryPattern, MessageType};

fn parse_ranges(json: &str) -> Vec<AmountRange> {
    serde_json::from_str(json).unwrap_or_default()
}

impl Database {
    /// Amount profiles for every category of one message type, joined with
    /// the category name; consumed by the amount-range signal generator
    pub fn list_category_patterns(
        &self,
        user_id: i64,
        message_type: MessageType,
    ) -> Result<Vec<(CategoryPattern, String)>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT cp.id, cp.user_id, cp.category_id, cp.message_type, cp.amount_ranges,
                   cp.transaction_count, cp.last_updated, c.name
            FROM category_patterns cp
            INNER JOIN categories c ON cp.category_id = c.id
            WHERE cp.user_id = ? AND cp.message_type = ?
            "#,
        )?;

        let rows = stmt
            .query_map(params![user_id, message_type.as_str()], |row| {
                let message_type_str: String = row.get(3)?;
                let ranges_json: String = row.get(4)?;
                let last_updated_str: String = row.get(6)?;
                let name: String = row.get(7)?;

                Ok((
                    CategoryPattern {
                        id: row.get(0)?,
                        user_id: row.get(1)?,
                        category_id: row.get(2)?,
                        message_type: message_type_str
                            .parse()
                            .unwrap_or(MessageType::BankUnknown),
                        ranges: parse_ranges(&ranges_json),
                        transaction_count: row.get(5)?,
                        last_updated: parse_datetime(&last_updated_str),
                    },
                    name,
                ))
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// All amount profiles for a user (pattern inspection)
    pub fn list_all_category_patterns(&self, user_id: i64) -> Result<Vec<CategoryPattern>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT id, user_id, category_id, message_type, amount_ranges,
                   transaction_count, last_updated
            FROM category_patterns
            WHERE user_id = ?
            ORDER BY category_id, message_type
            "#,
        )?;

        let rows = stmt
            .query_map(params![user_id], |row| {
                let message_type_str: String = row.get(3)?;
                let ranges_json: String = row.get(4)?;
                let last_updated_str: String = row.get(6)?;

                Ok(CategoryPattern {
                    id: row.get(0)?,
                    user_id: row.get(1)?,
                    category_id: row.get(2)?,
                    message_type: message_type_str.parse().unwrap_or(MessageType::BankUnknown),
                    ranges: parse_ranges(&ranges_json),
                    transaction_count: row.get(5)?,
                    last_updated: parse_datetime(&last_updated_str),
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// Fold a decided amount into the category's profile.
    ///
    /// If the amount falls inside an existing range widened by ±20%, that
    /// range grows to include it and its frequency climbs by 0.1 (capped at
    /// 1.0); otherwise a new range is appended around the amount with ±10%
    /// bounds and frequency 0.5. Runs in an immediate transaction so
    /// concurrent read-modify-write cycles serialize.
    pub fn record_category_amount(
        &self,
        user_id: i64,
        category_id: i64,
        message_type: MessageType,
        amount: f64,
    ) -> Result<()> {
        let mut conn = self.conn()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let existing: Option<(i64, String)> = tx
            .query_row(
                r#"
                SELECT id, amount_ranges FROM category_patterns
                WHERE user_id = ? AND category_id = ? AND message_type = ?
                "#,
                params![user_id, category_id, message_type.as_str()],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;

        match existing {
            Some((id, ranges_json)) => {
                let mut ranges = parse_ranges(&ranges_json);
                let matched = ranges.iter_mut().find(|r| {
                    amount >= r.min * 0.8 && amount <= r.max * 1.2
                });

                match matched {
                    Some(range) => {
                        range.min = range.min.min(amount);
                        range.max = range.max.max(amount);
                        range.frequency = (range.frequency + 0.1).min(1.0);
                    }
                    None => ranges.push(AmountRange {
                        min: amount * 0.9,
                        max: amount * 1.1,
                        frequency: 0.5,
                    }),
                }

                tx.execute(
                    r#"
                    UPDATE category_patterns
                    SET amount_ranges = ?, transaction_count = transaction_count + 1,
                        last_updated = CURRENT_TIMESTAMP
                    WHERE id = ?
                    "#,
                    params![serde_json::to_string(&ranges)?, id],
                )?;
            }
            None => {
                let ranges = vec![AmountRange {
                    min: amount * 0.9,
                    max: amount * 1.1,
                    frequency: 0.5,
                }];
                tx.execute(
                    r#"
                    INSERT INTO category_patterns
                        (user_id, category_id, message_type, amount_ranges, transaction_count)
                    VALUES (?, ?, ?, ?, 1)
                    "#,
                    params![
                        user_id,
                        category_id,
                        message_type.as_str(),
                        serde_json::to_string(&ranges)?
                    ],
                )?;
            }
        }

        tx.commit()?;
        Ok(())
    }
}
