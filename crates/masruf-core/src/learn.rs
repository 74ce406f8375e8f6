//! Learning feedback loop: folds every user decision back into the
//! pattern stores that the signal generators read
//!
//! Learning is best-effort by contract: the ledger entry for a decision is
//! already committed by the time this runs, so a failed or slow pattern
//! write is logged and swallowed, never propagated.

use tracing::{debug, warn};

use crate::db::Database;
use crate::error::Result;
use crate::models::{MessageSource, ParsedTransaction};
use crate::parse::{is_business_like, normalize_merchant};

pub struct Learner<'a> {
    db: &'a Database,
}

impl<'a> Learner<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// Record the user's (or the auto-categorizer's) final category choice.
    ///
    /// Appends a history row, then upserts the merchant, amount-profile and
    /// CliQ pattern records. Failures are logged, not returned.
    pub fn learn_from_decision(
        &self,
        user_id: i64,
        transaction: &ParsedTransaction,
        category_id: i64,
        was_correction: bool,
    ) {
        if let Err(e) = self.try_learn(user_id, transaction, category_id, was_correction) {
            warn!(
                "learning update failed for user {} category {}: {}",
                user_id, category_id, e
            );
        }
    }

    fn try_learn(
        &self,
        user_id: i64,
        transaction: &ParsedTransaction,
        category_id: i64,
        was_correction: bool,
    ) -> Result<()> {
        let message_type = transaction.message_type();
        let merchant = transaction
            .merchant
            .as_deref()
            .map(normalize_merchant)
            .filter(|m| !m.is_empty());

        // Corrections are logged at zero confidence so the distribution
        // signal discounts nothing but the amount itself
        let confidence = if was_correction { 0.0 } else { 1.0 };
        self.db.append_history(
            user_id,
            merchant.as_deref(),
            transaction.amount,
            category_id,
            message_type,
            confidence,
            !was_correction,
        )?;

        if let Some(merchant) = &merchant {
            self.db.upsert_merchant_learning(
                user_id,
                merchant,
                category_id,
                message_type,
                transaction.amount,
            )?;
        }

        self.db
            .record_category_amount(user_id, category_id, message_type, transaction.amount)?;

        if transaction.source == Some(MessageSource::Cliq) {
            if let Some(sender) = &merchant {
                self.db.record_cliq_decision(
                    user_id,
                    sender,
                    transaction.transaction_type,
                    category_id,
                    transaction.amount,
                    transaction
                        .merchant
                        .as_deref()
                        .map(is_business_like)
                        .unwrap_or(false),
                )?;
            }
        }

        debug!(
            "learned decision: user={} category={} merchant={:?} type={}",
            user_id, category_id, merchant, message_type
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CategoryKind, TransactionType};
    use chrono::Utc;

    fn setup() -> (Database, i64) {
        let db = Database::in_memory().unwrap();
        let category_id = db
            .create_category(1, "Groceries", CategoryKind::Expense, None)
            .unwrap();
        (db, category_id)
    }

    fn expense(merchant: &str, amount: f64) -> ParsedTransaction {
        ParsedTransaction {
            original_message: format!("purchase from {} amount {} JOD", merchant, amount),
            timestamp: Utc::now(),
            amount,
            merchant: Some(merchant.to_string()),
            category_hint: "General".to_string(),
            transaction_type: TransactionType::Expense,
            source: Some(crate::models::MessageSource::Sms),
        }
    }

    fn cliq_income(sender: &str, amount: f64) -> ParsedTransaction {
        ParsedTransaction {
            original_message: format!("حوالة كليك واردة من {} بقيمة {}", sender, amount),
            timestamp: Utc::now(),
            amount,
            merchant: Some(sender.to_string()),
            category_hint: "Transfers".to_string(),
            transaction_type: TransactionType::Income,
            source: Some(crate::models::MessageSource::Cliq),
        }
    }

    #[test]
    fn test_history_row_confidence_encodes_correction() {
        let (db, category_id) = setup();
        let learner = Learner::new(&db);

        learner.learn_from_decision(1, &expense("Carrefour", 50.0), category_id, false);
        learner.learn_from_decision(1, &expense("Carrefour", 55.0), category_id, true);

        let history = db.list_history(1, 10).unwrap();
        assert_eq!(history.len(), 2);
        // Most recent first
        assert_eq!(history[0].confidence, 0.0);
        assert!(!history[0].was_correct);
        assert_eq!(history[1].confidence, 1.0);
        assert!(history[1].was_correct);
        // Merchant keys are stored normalized
        assert_eq!(history[0].merchant.as_deref(), Some("carrefour"));
    }

    #[test]
    fn test_merchant_confidence_grows_to_cap() {
        let (db, category_id) = setup();
        let learner = Learner::new(&db);

        // Seeded at 0.7, then 1.1x per decision: 0.77, 0.847, 0.9317, 0.95
        let expected = [0.7, 0.77, 0.847, 0.9317, 0.95];
        for (i, want) in expected.iter().enumerate() {
            learner.learn_from_decision(1, &expense("Carrefour", 50.0), category_id, false);
            let rows = db.list_merchant_learning(1).unwrap();
            assert_eq!(rows.len(), 1);
            assert_eq!(rows[0].use_count, i as i64 + 1);
            assert!(
                (rows[0].confidence - want).abs() < 1e-6,
                "after {} decisions: {}",
                i + 1,
                rows[0].confidence
            );
        }
    }

    #[test]
    fn test_merchant_average_amount_is_running_mean() {
        let (db, category_id) = setup();
        let learner = Learner::new(&db);

        learner.learn_from_decision(1, &expense("Carrefour", 10.0), category_id, false);
        learner.learn_from_decision(1, &expense("Carrefour", 20.0), category_id, false);
        learner.learn_from_decision(1, &expense("Carrefour", 30.0), category_id, false);

        let rows = db.list_merchant_learning(1).unwrap();
        assert!((rows[0].average_amount - 20.0).abs() < 1e-9);
    }

    #[test]
    fn test_amount_profile_widens_or_appends() {
        let (db, category_id) = setup();
        let learner = Learner::new(&db);

        // First amount opens a ±10% band around 100
        learner.learn_from_decision(1, &expense("Carrefour", 100.0), category_id, false);
        let patterns = db.list_all_category_patterns(1).unwrap();
        assert_eq!(patterns.len(), 1);
        assert_eq!(patterns[0].ranges.len(), 1);
        assert!((patterns[0].ranges[0].min - 90.0).abs() < 1e-9);
        assert!((patterns[0].ranges[0].max - 110.0).abs() < 1e-9);
        assert!((patterns[0].ranges[0].frequency - 0.5).abs() < 1e-9);

        // 115 is inside the band widened by 20% (72..132): the band grows
        // to include it and its frequency climbs
        learner.learn_from_decision(1, &expense("Carrefour", 115.0), category_id, false);
        let patterns = db.list_all_category_patterns(1).unwrap();
        assert_eq!(patterns[0].ranges.len(), 1);
        assert!((patterns[0].ranges[0].max - 115.0).abs() < 1e-9);
        assert!((patterns[0].ranges[0].frequency - 0.6).abs() < 1e-9);

        // 300 is nowhere near: a fresh band is appended
        learner.learn_from_decision(1, &expense("Carrefour", 300.0), category_id, false);
        let patterns = db.list_all_category_patterns(1).unwrap();
        assert_eq!(patterns[0].ranges.len(), 2);
        assert!((patterns[0].ranges[1].min - 270.0).abs() < 1e-9);
        assert!((patterns[0].ranges[1].max - 330.0).abs() < 1e-9);
        assert_eq!(patterns[0].transaction_count, 3);
    }

    #[test]
    fn test_cliq_pattern_recurring_after_three() {
        let (db, _) = setup();
        let transfers_id = db
            .create_category(1, "Transfers", CategoryKind::Income, None)
            .unwrap();
        let learner = Learner::new(&db);

        for i in 0..2 {
            learner.learn_from_decision(1, &cliq_income("Ahmad Ali", 100.0), transfers_id, false);
            let patterns = db.list_cliq_patterns(1).unwrap();
            assert_eq!(patterns[0].use_count, i + 1);
            assert!(!patterns[0].is_recurring);
        }

        learner.learn_from_decision(1, &cliq_income("Ahmad Ali", 100.0), transfers_id, false);
        let patterns = db.list_cliq_patterns(1).unwrap();
        assert_eq!(patterns[0].use_count, 3);
        assert!(patterns[0].is_recurring);
        assert_eq!(patterns[0].sender, "ahmad ali");
        assert!(!patterns[0].is_business_like);
    }

    #[test]
    fn test_cliq_pattern_not_written_for_plain_sms() {
        let (db, category_id) = setup();
        let learner = Learner::new(&db);

        learner.learn_from_decision(1, &expense("Carrefour", 50.0), category_id, false);
        assert!(db.list_cliq_patterns(1).unwrap().is_empty());
    }

    #[test]
    fn test_learning_failure_is_swallowed() {
        let (db, category_id) = setup();
        let learner = Learner::new(&db);

        // Break the history table out from under the learner; the call
        // must not panic or propagate
        db.conn()
            .unwrap()
            .execute("ALTER TABLE categorization_history RENAME TO history_gone", [])
            .unwrap();

        learner.learn_from_decision(1, &expense("Carrefour", 50.0), category_id, false);
    }
}
