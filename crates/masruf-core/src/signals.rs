//! Signal generators: independent heuristics that each turn one data
//! source into confidence-scored category candidates
//!
//! Every generator is read-only against the store and blind to the others;
//! the combiner in `categorize` merges their outputs. Confidences are
//! clamped to [0, 1] at every computation boundary, not just at the end.

use tracing::debug;

use crate::db::Database;
use crate::error::Result;
use crate::models::{
    CategorySuggestion, MessageSource, MessageType, ParsedTransaction, TransactionType,
};
use crate::parse::normalize_merchant;

/// Clamp a confidence into [0, 1]
pub(crate) fn clamp01(value: f64) -> f64 {
    value.clamp(0.0, 1.0)
}

/// Read-only view of one parsed transaction, pre-normalized for lookups
#[derive(Debug, Clone)]
pub struct MessageFeatures {
    /// Normalized merchant/sender key, when one was extracted
    pub merchant: Option<String>,
    pub amount: f64,
    pub message_type: MessageType,
    pub transaction_type: TransactionType,
    pub source: Option<MessageSource>,
    /// Full message text run through the same normalization as merchant
    /// keys, for keyword scans
    pub normalized_message: String,
}

impl MessageFeatures {
    pub fn from_transaction(transaction: &ParsedTransaction) -> Self {
        Self {
            merchant: transaction
                .merchant
                .as_deref()
                .map(normalize_merchant)
                .filter(|m| !m.is_empty()),
            amount: transaction.amount,
            message_type: transaction.message_type(),
            transaction_type: transaction.transaction_type,
            source: transaction.source,
            normalized_message: normalize_merchant(&transaction.original_message),
        }
    }
}

/// One independent categorization heuristic
pub trait Signal {
    fn name(&self) -> &'static str;

    /// Zero or more scored candidates; must not write to the store
    fn suggest(
        &self,
        db: &Database,
        user_id: i64,
        features: &MessageFeatures,
    ) -> Result<Vec<CategorySuggestion>>;
}

/// The default generator set, in a stable order
pub fn default_signals() -> Vec<Box<dyn Signal>> {
    vec![
        Box::new(MerchantHistorySignal),
        Box::new(CliqSenderSignal),
        Box::new(AmountRangeSignal),
        Box::new(CategoryKeywordSignal),
        Box::new(AmountDistributionSignal),
        Box::new(TimePatternSignal),
    ]
}

/// Exact merchant match against learned merchant→category rows.
///
/// May return several candidates when the same merchant historically split
/// across categories.
pub struct MerchantHistorySignal;

impl Signal for MerchantHistorySignal {
    fn name(&self) -> &'static str {
        "merchant_history"
    }

    fn suggest(
        &self,
        db: &Database,
        user_id: i64,
        features: &MessageFeatures,
    ) -> Result<Vec<CategorySuggestion>> {
        let merchant = match &features.merchant {
            Some(m) => m,
            None => return Ok(Vec::new()),
        };

        let rows = db.merchant_suggestions(user_id, merchant, features.message_type)?;
        Ok(rows
            .into_iter()
            .map(|row| CategorySuggestion {
                category_id: row.category_id,
                category_name: row.category_name,
                confidence: clamp01((row.confidence * 0.9).min(0.95)),
                reason: format!("Merchant seen {} time(s) in this category", row.use_count),
            })
            .collect())
    }
}

/// CliQ sender profile match, scaled by how close the amount is to the
/// sender's running average and boosted for recurring counterparties
pub struct CliqSenderSignal;

impl Signal for CliqSenderSignal {
    fn name(&self) -> &'static str {
        "cliq_sender"
    }

    fn suggest(
        &self,
        db: &Database,
        user_id: i64,
        features: &MessageFeatures,
    ) -> Result<Vec<CategorySuggestion>> {
        if features.source != Some(MessageSource::Cliq) {
            return Ok(Vec::new());
        }
        let sender = match &features.merchant {
            Some(m) => m,
            None => return Ok(Vec::new()),
        };

        let (pattern, category_name) =
            match db.get_cliq_pattern(user_id, sender, features.transaction_type)? {
                Some(found) => found,
                None => return Ok(Vec::new()),
            };

        let base = pattern.confidence * 0.85;
        let similarity = if pattern.average_amount > 0.0 {
            let deviation = (features.amount - pattern.average_amount).abs()
                / pattern.average_amount;
            0.7 + 0.3 * (1.0 - deviation).max(0.0)
        } else {
            0.7
        };

        let mut confidence = base * similarity;
        if pattern.is_recurring {
            confidence *= 1.1;
        }
        let confidence = clamp01(confidence.min(0.9));

        let reason = if pattern.is_recurring {
            format!("Recurring CliQ sender ({} transfers)", pattern.use_count)
        } else {
            "Known CliQ sender".to_string()
        };

        Ok(vec![CategorySuggestion {
            category_id: pattern.category_id,
            category_name,
            confidence,
            reason,
        }])
    }
}

/// Amount falls inside a learned per-category range
pub struct AmountRangeSignal;

impl Signal for AmountRangeSignal {
    fn name(&self) -> &'static str {
        "amount_range"
    }

    fn suggest(
        &self,
        db: &Database,
        user_id: i64,
        features: &MessageFeatures,
    ) -> Result<Vec<CategorySuggestion>> {
        let patterns = db.list_category_patterns(user_id, features.message_type)?;
        let mut suggestions = Vec::new();

        for (pattern, category_name) in patterns {
            // Best matching band wins for this category
            let best = pattern
                .ranges
                .iter()
                .filter(|r| r.contains(features.amount))
                .map(|r| r.frequency)
                .fold(None::<f64>, |acc, f| {
                    Some(acc.map_or(f, |best| best.max(f)))
                });

            if let Some(frequency) = best {
                let confidence = clamp01(frequency * 0.6);
                if confidence > 0.3 {
                    suggestions.push(CategorySuggestion {
                        category_id: pattern.category_id,
                        category_name,
                        confidence,
                        reason: "Amount fits the usual range for this category".to_string(),
                    });
                }
            }
        }

        Ok(suggestions)
    }
}

/// Category keyword lists matched against the normalized message text
pub struct CategoryKeywordSignal;

impl Signal for CategoryKeywordSignal {
    fn name(&self) -> &'static str {
        "category_keywords"
    }

    fn suggest(
        &self,
        db: &Database,
        user_id: i64,
        features: &MessageFeatures,
    ) -> Result<Vec<CategorySuggestion>> {
        let categories = db.list_categories(user_id)?;
        let mut suggestions = Vec::new();

        for category in categories {
            let keywords = category.keyword_list();
            if keywords.is_empty() {
                continue;
            }

            let matched = keywords
                .iter()
                .filter(|k| {
                    features
                        .normalized_message
                        .contains(&k.trim().to_lowercase())
                })
                .count();
            if matched == 0 {
                continue;
            }

            let confidence =
                clamp01((matched as f64 / keywords.len() as f64 * 0.5).min(0.7));
            suggestions.push(CategorySuggestion {
                category_id: category.id,
                category_name: category.name.clone(),
                confidence,
                reason: format!("Matched {} of {} keywords", matched, keywords.len()),
            });
        }

        Ok(suggestions)
    }
}

/// Amount z-score against each category's history distribution
pub struct AmountDistributionSignal;

impl Signal for AmountDistributionSignal {
    fn name(&self) -> &'static str {
        "amount_distribution"
    }

    fn suggest(
        &self,
        db: &Database,
        user_id: i64,
        features: &MessageFeatures,
    ) -> Result<Vec<CategorySuggestion>> {
        let stats = db.category_amount_stats(user_id)?;
        let mut suggestions = Vec::new();

        for stat in stats {
            let z_score = if stat.stddev > 0.0 {
                (features.amount - stat.mean).abs() / stat.stddev
            } else if (features.amount - stat.mean).abs() < f64::EPSILON {
                0.0
            } else {
                continue;
            };

            if z_score >= 1.5 {
                continue;
            }

            let confidence = clamp01(((1.5 - z_score) / 1.5 * 0.4).max(0.0));
            if confidence > 0.2 {
                suggestions.push(CategorySuggestion {
                    category_id: stat.category_id,
                    category_name: stat.category_name,
                    confidence,
                    reason: format!(
                        "Amount typical for this category ({} samples)",
                        stat.sample_count
                    ),
                });
            }
        }

        Ok(suggestions)
    }
}

/// Time-of-day/day-of-week matching. Intentional extension point: no time
/// statistics are collected yet, so this always yields nothing.
pub struct TimePatternSignal;

impl Signal for TimePatternSignal {
    fn name(&self) -> &'static str {
        "time_pattern"
    }

    fn suggest(
        &self,
        _db: &Database,
        _user_id: i64,
        _features: &MessageFeatures,
    ) -> Result<Vec<CategorySuggestion>> {
        debug!("time pattern signal has no data source yet");
        Ok(Vec::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CategoryKind;

    fn setup() -> (Database, i64) {
        let db = Database::in_memory().unwrap();
        let category_id = db
            .create_category(1, "Groceries", CategoryKind::Expense, Some("carrefour|grocery"))
            .unwrap();
        (db, category_id)
    }

    fn features(amount: f64) -> MessageFeatures {
        MessageFeatures {
            merchant: Some("carrefour".to_string()),
            amount,
            message_type: MessageType::BankDebit,
            transaction_type: TransactionType::Expense,
            source: Some(MessageSource::Sms),
            normalized_message: "purchase from carrefour amman".to_string(),
        }
    }

    #[test]
    fn test_merchant_history_signal() {
        let (db, category_id) = setup();

        // Two decisions: seed 0.7, then one 1.1x bump
        db.upsert_merchant_learning(1, "carrefour", category_id, MessageType::BankDebit, 40.0)
            .unwrap();
        db.upsert_merchant_learning(1, "carrefour", category_id, MessageType::BankDebit, 60.0)
            .unwrap();

        let out = MerchantHistorySignal
            .suggest(&db, 1, &features(50.0))
            .unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].category_id, category_id);
        // stored 0.7 * 1.1 = 0.77, scaled by 0.9
        assert!((out[0].confidence - 0.77 * 0.9).abs() < 1e-9);
    }

    #[test]
    fn test_merchant_history_signal_no_merchant() {
        let (db, _) = setup();
        let mut f = features(50.0);
        f.merchant = None;
        assert!(MerchantHistorySignal.suggest(&db, 1, &f).unwrap().is_empty());
    }

    #[test]
    fn test_cliq_sender_signal_recurring_boost() {
        let (db, category_id) = setup();

        for _ in 0..3 {
            db.record_cliq_decision(1, "ahmad ali", TransactionType::Income, category_id, 10.0, false)
                .unwrap();
        }

        let f = MessageFeatures {
            merchant: Some("ahmad ali".to_string()),
            amount: 10.0,
            message_type: MessageType::CliqIncoming,
            transaction_type: TransactionType::Income,
            source: Some(MessageSource::Cliq),
            normalized_message: "حوالة كليك واردة من ahmad ali".to_string(),
        };

        let out = CliqSenderSignal.suggest(&db, 1, &f).unwrap();
        assert_eq!(out.len(), 1);
        // stored 0.7 * 1.05^2, scaled by 0.85, amount identical so the
        // similarity factor is 1.0, then the 1.1x recurring boost
        let expected = 0.7 * 1.05 * 1.05 * 0.85 * 1.1;
        assert!((out[0].confidence - expected).abs() < 1e-9);
        assert!(out[0].reason.contains("Recurring"));
    }

    #[test]
    fn test_cliq_sender_signal_ignores_plain_sms() {
        let (db, category_id) = setup();
        db.record_cliq_decision(1, "ahmad ali", TransactionType::Income, category_id, 10.0, false)
            .unwrap();

        // Same features but a plain SMS source: generator stays silent
        let mut f = features(10.0);
        f.merchant = Some("ahmad ali".to_string());
        assert!(CliqSenderSignal.suggest(&db, 1, &f).unwrap().is_empty());
    }

    #[test]
    fn test_amount_range_signal_floor() {
        let (db, category_id) = setup();

        // A 40–60 range at frequency 0.5 scores a 50 JOD transaction at
        // exactly 0.5 * 0.6 = 0.30, which does not clear the > 0.3 floor
        let conn = db.conn().unwrap();
        conn.execute(
            "INSERT INTO category_patterns (user_id, category_id, message_type, amount_ranges, transaction_count)
             VALUES (1, ?, 'bank_debit', '[{\"min\":40.0,\"max\":60.0,\"frequency\":0.5}]', 5)",
            rusqlite::params![category_id],
        )
        .unwrap();

        let out = AmountRangeSignal.suggest(&db, 1, &features(50.0)).unwrap();
        assert!(out.is_empty());

        // Bump the frequency and the same amount clears the floor
        conn.execute(
            "UPDATE category_patterns SET amount_ranges = '[{\"min\":40.0,\"max\":60.0,\"frequency\":0.8}]'",
            [],
        )
        .unwrap();
        let out = AmountRangeSignal.suggest(&db, 1, &features(50.0)).unwrap();
        assert_eq!(out.len(), 1);
        assert!((out[0].confidence - 0.48).abs() < 1e-9);

        // Outside the range: nothing
        let out = AmountRangeSignal.suggest(&db, 1, &features(90.0)).unwrap();
        assert!(out.is_empty());
    }

    #[test]
    fn test_keyword_signal() {
        let (db, category_id) = setup();

        let out = CategoryKeywordSignal
            .suggest(&db, 1, &features(20.0))
            .unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].category_id, category_id);
        // 1 of 2 keywords matched: 0.5 * 0.5 = 0.25
        assert!((out[0].confidence - 0.25).abs() < 1e-9);

        // No keyword hit: nothing returned
        let mut f = features(20.0);
        f.normalized_message = "some unrelated text".to_string();
        assert!(CategoryKeywordSignal.suggest(&db, 1, &f).unwrap().is_empty());
    }

    #[test]
    fn test_amount_distribution_signal() {
        let (db, category_id) = setup();

        for amount in [48.0, 50.0, 52.0] {
            db.append_history(
                1,
                Some("carrefour"),
                amount,
                category_id,
                MessageType::BankDebit,
                1.0,
                true,
            )
            .unwrap();
        }

        // mean 50, population stddev ~1.633; z(50) = 0 so confidence 0.4
        let out = AmountDistributionSignal
            .suggest(&db, 1, &features(50.0))
            .unwrap();
        assert_eq!(out.len(), 1);
        assert!((out[0].confidence - 0.4).abs() < 1e-9);

        // Far-off amount: z well past 1.5, no suggestion
        let out = AmountDistributionSignal
            .suggest(&db, 1, &features(500.0))
            .unwrap();
        assert!(out.is_empty());
    }

    #[test]
    fn test_amount_distribution_needs_three_samples() {
        let (db, category_id) = setup();
        for amount in [48.0, 52.0] {
            db.append_history(
                1,
                Some("carrefour"),
                amount,
                category_id,
                MessageType::BankDebit,
                1.0,
                true,
            )
            .unwrap();
        }

        let out = AmountDistributionSignal
            .suggest(&db, 1, &features(50.0))
            .unwrap();
        assert!(out.is_empty());
    }

    #[test]
    fn test_time_pattern_signal_is_noop() {
        let (db, _) = setup();
        assert!(TimePatternSignal
            .suggest(&db, 1, &features(50.0))
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_all_confidences_in_unit_interval() {
        let (db, category_id) = setup();
        db.upsert_merchant_learning(1, "carrefour", category_id, MessageType::BankDebit, 50.0)
            .unwrap();
        db.append_history(1, Some("carrefour"), 50.0, category_id, MessageType::BankDebit, 1.0, true)
            .unwrap();

        for signal in default_signals() {
            for out in signal.suggest(&db, 1, &features(50.0)).unwrap() {
                assert!(
                    (0.0..=1.0).contains(&out.confidence),
                    "{} produced confidence {}",
                    signal.name(),
                    out.confidence
                );
            }
        }
    }
}
