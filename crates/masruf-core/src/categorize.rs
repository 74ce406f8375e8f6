//! Categorization engine: signal fan-out, suggestion combining and the
//! auto-vs-prompt decision policy
//!
//! The heuristic constants live in `EngineConfig` so they stay separate
//! from the extraction and aggregation logic. The merge formula (sum the
//! per-generator confidences, scale by 0.8, cap at 0.95) is not a
//! principled probability combination; it is the tuned behavior this
//! engine ships with and changing it changes every ranking downstream.

use std::cmp::Ordering;
use std::collections::HashMap;

use tracing::debug;

use crate::db::Database;
use crate::error::Result;
use crate::models::{
    Categorization, CategorySuggestion, Decision, MessageSource, ParsedTransaction,
};
use crate::signals::{clamp01, default_signals, MessageFeatures, Signal};

/// Tunable thresholds and merge constants for the engine
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Minimum combined confidence for silent auto-categorization
    pub auto_threshold: f64,
    /// Minimum confidence for a primary recommendation / prompt pre-fill
    pub prefill_threshold: f64,
    /// How many ranked suggestions to expose
    pub max_suggestions: usize,
    /// Multi-generator merge: sum of confidences is scaled by this
    pub merge_scale: f64,
    /// Absolute ceiling on a merged confidence
    pub merge_cap: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            auto_threshold: 0.8,
            prefill_threshold: 0.5,
            max_suggestions: 5,
            merge_scale: 0.8,
            merge_cap: 0.95,
        }
    }
}

/// Merge per-generator candidates into one ranked list.
///
/// Candidates for the same category from two or more generators merge by
/// summing confidences, scaling by `merge_scale` and capping at
/// `merge_cap`; their reasons concatenate with " + ". Output is sorted by
/// confidence descending and truncated to `max_suggestions`.
pub fn combine_suggestions(
    config: &EngineConfig,
    all: Vec<CategorySuggestion>,
) -> Vec<CategorySuggestion> {
    let mut grouped: HashMap<i64, Vec<CategorySuggestion>> = HashMap::new();
    for suggestion in all {
        grouped
            .entry(suggestion.category_id)
            .or_default()
            .push(suggestion);
    }

    let mut merged: Vec<CategorySuggestion> = grouped
        .into_values()
        .map(|mut group| {
            if group.len() == 1 {
                let mut only = group.pop().expect("non-empty group");
                only.confidence = clamp01(only.confidence);
                return only;
            }

            let sum: f64 = group.iter().map(|s| s.confidence).sum();
            let confidence = clamp01((sum * config.merge_scale).min(config.merge_cap));
            let reason = group
                .iter()
                .map(|s| s.reason.as_str())
                .collect::<Vec<_>>()
                .join(" + ");

            CategorySuggestion {
                category_id: group[0].category_id,
                category_name: group[0].category_name.clone(),
                confidence,
                reason,
            }
        })
        .collect();

    merged.sort_by(|a, b| {
        b.confidence
            .partial_cmp(&a.confidence)
            .unwrap_or(Ordering::Equal)
            .then(a.category_id.cmp(&b.category_id))
    });
    merged.truncate(config.max_suggestions);
    merged
}

/// The categorization service: runs every signal generator over a parsed
/// transaction and reduces their candidates to one recommendation.
///
/// Constructed with an injected database handle; callers own the
/// lifecycle, there is no process-wide instance.
pub struct CategorizationEngine<'a> {
    db: &'a Database,
    config: EngineConfig,
    signals: Vec<Box<dyn Signal>>,
}

impl<'a> CategorizationEngine<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self {
            db,
            config: EngineConfig::default(),
            signals: default_signals(),
        }
    }

    pub fn with_config(db: &'a Database, config: EngineConfig) -> Self {
        Self {
            db,
            config,
            signals: default_signals(),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Score one transaction against the user's learned patterns.
    ///
    /// Never fails on "no confident match": an empty or weak result comes
    /// back as confidence 0 with an explanatory reason.
    pub fn categorize(&self, user_id: i64, transaction: &ParsedTransaction) -> Result<Categorization> {
        let features = MessageFeatures::from_transaction(transaction);

        let mut all = Vec::new();
        for signal in &self.signals {
            let out = signal.suggest(self.db, user_id, &features)?;
            debug!(
                "signal {} produced {} suggestion(s)",
                signal.name(),
                out.len()
            );
            all.extend(out);
        }

        if all.is_empty() {
            return Ok(Categorization {
                category_id: None,
                category_name: None,
                confidence: 0.0,
                reason: "Insufficient data for categorization".to_string(),
                suggestions: Vec::new(),
            });
        }

        let suggestions = combine_suggestions(&self.config, all);
        let top = &suggestions[0];

        if top.confidence > self.config.prefill_threshold {
            Ok(Categorization {
                category_id: Some(top.category_id),
                category_name: Some(top.category_name.clone()),
                confidence: top.confidence,
                reason: top.reason.clone(),
                suggestions,
            })
        } else {
            Ok(Categorization {
                category_id: None,
                category_name: None,
                confidence: 0.0,
                reason: "No strong pattern found".to_string(),
                suggestions,
            })
        }
    }

    /// Turn a scored transaction into the intake action.
    ///
    /// CliQ transactions always go to the user, whatever the confidence: a
    /// sender name is not a vetted merchant identity.
    pub fn decide(&self, transaction: &ParsedTransaction, categorization: &Categorization) -> Decision {
        let prefill = categorization
            .suggestions
            .first()
            .filter(|s| s.confidence > self.config.prefill_threshold)
            .cloned();

        if transaction.source == Some(MessageSource::Cliq) {
            return Decision::Prompt {
                prefill,
                suggestions: categorization.suggestions.clone(),
            };
        }

        match (categorization.category_id, categorization.confidence) {
            (Some(category_id), confidence) if confidence > self.config.auto_threshold => {
                Decision::AutoCategorize {
                    category_id,
                    category_name: categorization
                        .category_name
                        .clone()
                        .unwrap_or_default(),
                    confidence,
                }
            }
            _ => Decision::Prompt {
                prefill,
                suggestions: categorization.suggestions.clone(),
            },
        }
    }
}
