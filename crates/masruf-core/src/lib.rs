//! Masruf Core Library
//!
//! Shared functionality for the masruf SMS expense tracker:
//! - Database access and migrations
//! - Bilingual (Arabic/English) bank-SMS parsing
//! - Signal generators and the confidence-weighted categorization engine
//! - Learning feedback loop over user decisions
//! - Message intake flow (dedup, auto-categorize, prompt, resolve)

pub mod categorize;
pub mod db;
pub mod error;
pub mod intake;
pub mod learn;
pub mod models;
pub mod parse;
pub mod signals;

pub use categorize::{combine_suggestions, CategorizationEngine, EngineConfig};
pub use db::{Database, MerchantSuggestion, TableCounts};
pub use error::{Error, Result};
pub use intake::{message_hash, IntakeOutcome, MessageIntake, ResolvedDecision};
pub use learn::Learner;
pub use parse::{is_business_like, normalize_merchant, MessageParser, DEFAULT_TIMEZONE};
pub use signals::{default_signals, MessageFeatures, Signal};
