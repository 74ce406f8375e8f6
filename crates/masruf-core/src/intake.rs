//! Message intake flow: parse → score → decide → ledger write or prompt
//!
//! Per transaction the flow is Parsed → Scored → AutoCategorized or
//! AwaitingUserDecision; a user reply moves an awaiting transaction to
//! Learned. Rejected (from the parser) and Learned are terminal. Duplicate
//! deliveries of the same raw text are dropped before any store work.

use sha2::{Digest, Sha256};
use tracing::{debug, info};

use crate::categorize::CategorizationEngine;
use crate::db::Database;
use crate::error::{Error, Result};
use crate::learn::Learner;
use crate::models::{
    CategorySuggestion, Decision, ParsedTransactionSnapshot,
};
use crate::parse::MessageParser;

/// Dedup key for one delivered message
pub fn message_hash(text: &str) -> String {
    hex::encode(Sha256::digest(text.as_bytes()))
}

/// What happened to one ingested message
#[derive(Debug)]
pub enum IntakeOutcome {
    /// Promotional text or no recoverable amount; nothing stored
    Rejected,
    /// Same raw text already produced a ledger entry or an open prompt
    Duplicate,
    /// Confidence cleared the auto threshold; ledger written, learning ran
    AutoCategorized {
        ledger_id: i64,
        category_id: i64,
        category_name: String,
        confidence: f64,
    },
    /// Parked for the user; the prompt carries everything the UI needs
    AwaitingDecision {
        pending_id: i64,
        prefill: Option<CategorySuggestion>,
        suggestions: Vec<CategorySuggestion>,
    },
}

/// Result of resolving a pending decision
#[derive(Debug)]
pub struct ResolvedDecision {
    pub ledger_id: i64,
    pub category_id: i64,
    pub was_correction: bool,
}

/// The surrounding flow around the parser and engine
pub struct MessageIntake<'a> {
    db: &'a Database,
    parser: MessageParser,
    engine: CategorizationEngine<'a>,
}

impl<'a> MessageIntake<'a> {
    pub fn new(db: &'a Database) -> Result<Self> {
        Ok(Self {
            db,
            parser: MessageParser::new()?,
            engine: CategorizationEngine::new(db),
        })
    }

    pub fn with_parser(db: &'a Database, parser: MessageParser) -> Self {
        Self {
            db,
            parser,
            engine: CategorizationEngine::new(db),
        }
    }

    pub fn parser(&self) -> &MessageParser {
        &self.parser
    }

    /// Ingest one delivered message end to end
    pub fn ingest(
        &self,
        user_id: i64,
        text: &str,
        timestamp: Option<&str>,
    ) -> Result<IntakeOutcome> {
        let hash = message_hash(text);
        if self.db.message_seen(user_id, &hash)? {
            debug!("duplicate message delivery for user {}", user_id);
            return Ok(IntakeOutcome::Duplicate);
        }

        let transaction = match self.parser.parse(text, timestamp)? {
            Some(tx) => tx,
            None => return Ok(IntakeOutcome::Rejected),
        };

        let categorization = self.engine.categorize(user_id, &transaction)?;

        match self.engine.decide(&transaction, &categorization) {
            Decision::AutoCategorize {
                category_id,
                category_name,
                confidence,
            } => {
                let category = self
                    .db
                    .get_category(user_id, category_id)?
                    .ok_or_else(|| Error::NotFound(format!("Category {}", category_id)))?;

                let ledger_id = self.db.insert_ledger_entry(
                    user_id,
                    &transaction,
                    category.kind,
                    category_id,
                    true,
                    &hash,
                )?;
                info!(
                    "auto-categorized message as '{}' ({:.2}) for user {}",
                    category_name, confidence, user_id
                );

                // The ledger entry is committed; a failed learning write
                // must not unwind it
                Learner::new(self.db).learn_from_decision(user_id, &transaction, category_id, false);

                Ok(IntakeOutcome::AutoCategorized {
                    ledger_id,
                    category_id,
                    category_name,
                    confidence,
                })
            }
            Decision::Prompt {
                prefill,
                suggestions,
            } => {
                let snapshot = ParsedTransactionSnapshot::new(transaction, hash);
                let pending_id = self.db.create_pending_decision(
                    user_id,
                    &snapshot,
                    &suggestions,
                    prefill.as_ref().map(|p| p.category_id),
                )?;
                debug!(
                    "parked message as pending decision {} for user {}",
                    pending_id, user_id
                );

                Ok(IntakeOutcome::AwaitingDecision {
                    pending_id,
                    prefill,
                    suggestions,
                })
            }
        }
    }

    /// Finish an awaiting transaction with the user's category choice.
    ///
    /// A choice that differs from the prefilled best guess counts as a
    /// correction for the learning loop. Resolving an already-decided
    /// prompt fails without touching the ledger.
    pub fn resolve(
        &self,
        user_id: i64,
        pending_id: i64,
        category_id: i64,
    ) -> Result<ResolvedDecision> {
        let pending = self
            .db
            .get_pending_decision(user_id, pending_id)?
            .ok_or_else(|| Error::NotFound(format!("Pending decision {}", pending_id)))?;

        if pending.status != crate::models::PendingStatus::Awaiting {
            return Err(Error::NotFound(format!(
                "Open pending decision {}",
                pending_id
            )));
        }

        let category = self
            .db
            .get_category(user_id, category_id)?
            .ok_or_else(|| Error::NotFound(format!("Category {}", category_id)))?;

        let was_correction = pending
            .prefill_category_id
            .map(|prefill| prefill != category_id)
            .unwrap_or(false);

        // The unique message hash on the ledger backstops concurrent
        // resolves of the same prompt
        let transaction = pending.snapshot.transaction.clone();
        let ledger_id = self.db.insert_ledger_entry(
            user_id,
            &transaction,
            category.kind,
            category_id,
            false,
            &pending.snapshot.message_hash,
        )?;
        self.db.mark_pending_decided(user_id, pending_id)?;

        Learner::new(self.db).learn_from_decision(
            user_id,
            &transaction,
            category_id,
            was_correction,
        );

        Ok(ResolvedDecision {
            ledger_id,
            category_id,
            was_correction,
        })
    }
}
