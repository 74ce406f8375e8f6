//! Pending categorization decision operations

use rusqlite::params;

use super::{parse_datetime, Database};
use crate::error::{Error, Result};
use crate::models::{
    CategorySuggestion, ParsedTransactionSnapshot, PendingDecision, PendingStatus,
};

fn row_to_pending(row: &rusqlite::Row<'_>) -> rusqlite::Result<PendingDecision> {
    let snapshot_json: String = row.get(2)?;
    let suggestions_json: String = row.get(3)?;
    let status_str: String = row.get(5)?;
    let created_at_str: String = row.get(6)?;
    let decided_at_str: Option<String> = row.get(7)?;

    Ok(PendingDecision {
        id: row.get(0)?,
        user_id: row.get(1)?,
        snapshot: serde_json::from_str(&snapshot_json).map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(2, rusqlite::types::Type::Text, Box::new(e))
        })?,
        suggestions: serde_json::from_str(&suggestions_json).unwrap_or_default(),
        prefill_category_id: row.get(4)?,
        status: status_str.parse().unwrap_or(PendingStatus::Awaiting),
        created_at: parse_datetime(&created_at_str),
        decided_at: decided_at_str.map(|s| parse_datetime(&s)),
    })
}

const PENDING_COLUMNS: &str = "id, user_id, snapshot, suggestions, prefill_category_id, \
     status, created_at, decided_at";

impl Database {
    /// Park a transaction until the user picks a category
    pub fn create_pending_decision(
        &self,
        user_id: i64,
        snapshot: &ParsedTransactionSnapshot,
        suggestions: &[CategorySuggestion],
        prefill_category_id: Option<i64>,
    ) -> Result<i64> {
        let conn = self.conn()?;
        conn.execute(
            r#"
            INSERT INTO pending_decisions
                (user_id, snapshot, suggestions, prefill_category_id, message_hash)
            VALUES (?, ?, ?, ?, ?)
            "#,
            params![
                user_id,
                serde_json::to_string(snapshot)?,
                serde_json::to_string(suggestions)?,
                prefill_category_id,
                snapshot.message_hash
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    pub fn get_pending_decision(
        &self,
        user_id: i64,
        pending_id: i64,
    ) -> Result<Option<PendingDecision>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM pending_decisions WHERE user_id = ? AND id = ?",
            PENDING_COLUMNS
        ))?;

        let mut rows = stmt.query_map(params![user_id, pending_id], row_to_pending)?;
        rows.next().transpose().map_err(Error::from)
    }

    /// Open prompts, oldest first
    pub fn list_open_pending(&self, user_id: i64) -> Result<Vec<PendingDecision>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM pending_decisions
             WHERE user_id = ? AND status = 'awaiting'
             ORDER BY created_at ASC, id ASC",
            PENDING_COLUMNS
        ))?;

        let rows = stmt
            .query_map(params![user_id], row_to_pending)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// Flip a pending decision to decided. Conditional on it still being
    /// open, so a second resolve of the same prompt fails instead of
    /// double-writing the ledger.
    pub fn mark_pending_decided(&self, user_id: i64, pending_id: i64) -> Result<()> {
        let conn = self.conn()?;
        let updated = conn.execute(
            r#"
            UPDATE pending_decisions
            SET status = 'decided', decided_at = CURRENT_TIMESTAMP
            WHERE user_id = ? AND id = ? AND status = 'awaiting'
            "#,
            params![user_id, pending_id],
        )?;

        if updated == 0 {
            return Err(Error::NotFound(format!(
                "Open pending decision {}",
                pending_id
            )));
        }
        Ok(())
    }
}
