//! Domain models for masruf

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Direction of money movement recovered from a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    Income,
    Expense,
    /// Direction could not be recovered; the message is still usable
    Unknown,
}

impl TransactionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Income => "income",
            Self::Expense => "expense",
            Self::Unknown => "unknown",
        }
    }
}

impl std::str::FromStr for TransactionType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "income" => Ok(Self::Income),
            "expense" => Ok(Self::Expense),
            "unknown" => Ok(Self::Unknown),
            _ => Err(format!("Unknown transaction type: {}", s)),
        }
    }
}

impl std::fmt::Display for TransactionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Which channel a message came through
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MessageSource {
    /// CliQ instant-transfer notification; always requires user confirmation
    #[serde(rename = "CliQ")]
    Cliq,
    /// Plain bank SMS
    #[serde(rename = "SMS")]
    Sms,
}

impl MessageSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Cliq => "CliQ",
            Self::Sms => "SMS",
        }
    }
}

impl std::str::FromStr for MessageSource {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "cliq" => Ok(Self::Cliq),
            "sms" => Ok(Self::Sms),
            _ => Err(format!("Unknown message source: {}", s)),
        }
    }
}

impl std::fmt::Display for MessageSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Coarse key combining source and direction, used to partition learned
/// patterns so that e.g. CliQ transfers never pollute card-debit statistics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageType {
    CliqIncoming,
    CliqOutgoing,
    CliqUnknown,
    BankCredit,
    BankDebit,
    BankUnknown,
}

impl MessageType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CliqIncoming => "cliq_incoming",
            Self::CliqOutgoing => "cliq_outgoing",
            Self::CliqUnknown => "cliq_unknown",
            Self::BankCredit => "bank_credit",
            Self::BankDebit => "bank_debit",
            Self::BankUnknown => "bank_unknown",
        }
    }

    /// Derive the pattern key from channel and direction
    pub fn from_parts(source: Option<MessageSource>, tx_type: TransactionType) -> Self {
        match (source, tx_type) {
            (Some(MessageSource::Cliq), TransactionType::Income) => Self::CliqIncoming,
            (Some(MessageSource::Cliq), TransactionType::Expense) => Self::CliqOutgoing,
            (Some(MessageSource::Cliq), TransactionType::Unknown) => Self::CliqUnknown,
            (_, TransactionType::Income) => Self::BankCredit,
            (_, TransactionType::Expense) => Self::BankDebit,
            (_, TransactionType::Unknown) => Self::BankUnknown,
        }
    }
}

impl std::str::FromStr for MessageType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "cliq_incoming" => Ok(Self::CliqIncoming),
            "cliq_outgoing" => Ok(Self::CliqOutgoing),
            "cliq_unknown" => Ok(Self::CliqUnknown),
            "bank_credit" => Ok(Self::BankCredit),
            "bank_debit" => Ok(Self::BankDebit),
            "bank_unknown" => Ok(Self::BankUnknown),
            _ => Err(format!("Unknown message type: {}", s)),
        }
    }
}

impl std::fmt::Display for MessageType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A transaction recovered from free-form message text.
///
/// Immutable once produced by the parser; consumed by the categorization
/// engine and the ledger writer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParsedTransaction {
    pub original_message: String,
    pub timestamp: DateTime<Utc>,
    /// Always > 0; messages without a recoverable amount are rejected
    pub amount: f64,
    /// Cleaned counterparty name, display form (not yet normalized)
    pub merchant: Option<String>,
    /// Static category hint from the keyword tables; a label, not a user
    /// category id
    pub category_hint: String,
    pub transaction_type: TransactionType,
    pub source: Option<MessageSource>,
}

impl ParsedTransaction {
    pub fn message_type(&self) -> MessageType {
        MessageType::from_parts(self.source, self.transaction_type)
    }
}

/// Versioned snapshot of a parsed transaction, stored with a pending
/// decision so a later user reply can finish the flow
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParsedTransactionSnapshot {
    /// Snapshot format version; bump when fields change
    pub version: u32,
    pub message_hash: String,
    #[serde(flatten)]
    pub transaction: ParsedTransaction,
}

impl ParsedTransactionSnapshot {
    pub const VERSION: u32 = 1;

    pub fn new(transaction: ParsedTransaction, message_hash: String) -> Self {
        Self {
            version: Self::VERSION,
            message_hash,
            transaction,
        }
    }
}

/// Income or expense; the kind of a user category and of a ledger entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CategoryKind {
    Income,
    Expense,
}

impl CategoryKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Income => "income",
            Self::Expense => "expense",
        }
    }
}

impl std::str::FromStr for CategoryKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "income" => Ok(Self::Income),
            "expense" => Ok(Self::Expense),
            _ => Err(format!("Unknown category kind: {}", s)),
        }
    }
}

impl std::fmt::Display for CategoryKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A user-defined spending/income category
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Category {
    pub id: i64,
    pub user_id: i64,
    pub name: String,
    pub kind: CategoryKind,
    /// Pipe-separated match keywords, e.g. "carrefour|كارفور|grocery"
    pub keywords: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Category {
    /// Keywords split out of the stored pipe-separated form
    pub fn keyword_list(&self) -> Vec<&str> {
        self.keywords
            .as_deref()
            .map(|k| k.split('|').filter(|s| !s.trim().is_empty()).collect())
            .unwrap_or_default()
    }
}

/// A confidence-scored category candidate produced by a signal generator
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategorySuggestion {
    pub category_id: i64,
    pub category_name: String,
    /// Always clamped to [0, 1]
    pub confidence: f64,
    pub reason: String,
}

/// Final output of the categorization engine for one transaction
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Categorization {
    /// Set only when the top suggestion clears the prefill threshold
    pub category_id: Option<i64>,
    pub category_name: Option<String>,
    pub confidence: f64,
    pub reason: String,
    /// Ranked, at most five entries
    pub suggestions: Vec<CategorySuggestion>,
}

/// What the intake flow should do with a scored transaction
#[derive(Debug, Clone)]
pub enum Decision {
    /// Write the ledger entry under this category without asking
    AutoCategorize {
        category_id: i64,
        category_name: String,
        confidence: f64,
    },
    /// Ask the user, optionally pre-filling the best guess
    Prompt {
        prefill: Option<CategorySuggestion>,
        suggestions: Vec<CategorySuggestion>,
    },
}

/// Learned merchant→category association for one user.
///
/// Created on the first decision for a merchant/category pair and updated
/// (never deleted) on every subsequent one.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MerchantLearning {
    pub id: i64,
    pub user_id: i64,
    /// Normalized merchant key
    pub merchant: String,
    pub category_id: i64,
    pub message_type: MessageType,
    pub confidence: f64,
    pub average_amount: f64,
    pub use_count: i64,
    pub last_used: DateTime<Utc>,
}

/// One amount band inside a category's learned spending profile
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AmountRange {
    pub min: f64,
    pub max: f64,
    /// How often amounts land in this band, in [0, 1]
    pub frequency: f64,
}

impl AmountRange {
    pub fn contains(&self, amount: f64) -> bool {
        amount >= self.min && amount <= self.max
    }
}

/// Learned amount profile for one (user, category, message type)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryPattern {
    pub id: i64,
    pub user_id: i64,
    pub category_id: i64,
    pub message_type: MessageType,
    pub ranges: Vec<AmountRange>,
    pub transaction_count: i64,
    pub last_updated: DateTime<Utc>,
}

/// Learned profile of one CliQ counterparty
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CliqPattern {
    pub id: i64,
    pub user_id: i64,
    /// Normalized sender key
    pub sender: String,
    pub transaction_type: TransactionType,
    pub category_id: i64,
    pub average_amount: f64,
    pub amount_variance: f64,
    pub confidence: f64,
    pub use_count: i64,
    /// True once the same sender/direction pair has been decided 3 times
    pub is_recurring: bool,
    pub is_business_like: bool,
    pub last_seen: DateTime<Utc>,
}

/// Append-only record of every categorization decision
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub id: i64,
    pub user_id: i64,
    pub merchant: Option<String>,
    pub amount: f64,
    pub category_id: i64,
    pub message_type: MessageType,
    /// 1.0 for accepted decisions, 0.0 for corrections
    pub confidence: f64,
    pub was_correct: bool,
    pub created_at: DateTime<Utc>,
}

/// Per-category amount statistics over the full history
#[derive(Debug, Clone)]
pub struct CategoryAmountStats {
    pub category_id: i64,
    pub category_name: String,
    pub sample_count: i64,
    pub mean: f64,
    pub stddev: f64,
}

/// A finalized income/expense record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub id: i64,
    pub user_id: i64,
    pub kind: CategoryKind,
    pub amount: f64,
    pub merchant: Option<String>,
    pub category_id: i64,
    pub message: String,
    pub occurred_at: DateTime<Utc>,
    pub source: Option<MessageSource>,
    /// True when written by the decision policy without a user prompt
    pub auto_categorized: bool,
    pub created_at: DateTime<Utc>,
}

/// Lifecycle of a pending categorization prompt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PendingStatus {
    Awaiting,
    Decided,
}

impl PendingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Awaiting => "awaiting",
            Self::Decided => "decided",
        }
    }
}

impl std::str::FromStr for PendingStatus {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "awaiting" => Ok(Self::Awaiting),
            "decided" => Ok(Self::Decided),
            _ => Err(format!("Unknown pending status: {}", s)),
        }
    }
}

/// A transaction parked until the user picks a category
#[derive(Debug, Clone)]
pub struct PendingDecision {
    pub id: i64,
    pub user_id: i64,
    pub snapshot: ParsedTransactionSnapshot,
    pub suggestions: Vec<CategorySuggestion>,
    pub prefill_category_id: Option<i64>,
    pub status: PendingStatus,
    pub created_at: DateTime<Utc>,
    pub decided_at: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_type_from_parts() {
        assert_eq!(
            MessageType::from_parts(Some(MessageSource::Cliq), TransactionType::Income),
            MessageType::CliqIncoming
        );
        assert_eq!(
            MessageType::from_parts(Some(MessageSource::Cliq), TransactionType::Expense),
            MessageType::CliqOutgoing
        );
        assert_eq!(
            MessageType::from_parts(Some(MessageSource::Sms), TransactionType::Income),
            MessageType::BankCredit
        );
        assert_eq!(
            MessageType::from_parts(None, TransactionType::Expense),
            MessageType::BankDebit
        );
        assert_eq!(
            MessageType::from_parts(Some(MessageSource::Sms), TransactionType::Unknown),
            MessageType::BankUnknown
        );
    }

    #[test]
    fn test_round_trip_enums() {
        for mt in [
            MessageType::CliqIncoming,
            MessageType::CliqOutgoing,
            MessageType::CliqUnknown,
            MessageType::BankCredit,
            MessageType::BankDebit,
            MessageType::BankUnknown,
        ] {
            assert_eq!(mt.as_str().parse::<MessageType>().unwrap(), mt);
        }
        assert_eq!("CliQ".parse::<MessageSource>().unwrap(), MessageSource::Cliq);
        assert_eq!("sms".parse::<MessageSource>().unwrap(), MessageSource::Sms);
    }

    #[test]
    fn test_keyword_list() {
        let cat = Category {
            id: 1,
            user_id: 1,
            name: "Groceries".to_string(),
            kind: CategoryKind::Expense,
            keywords: Some("carrefour|كارفور||grocery".to_string()),
            created_at: Utc::now(),
        };
        assert_eq!(cat.keyword_list(), vec!["carrefour", "كارفور", "grocery"]);

        let empty = Category {
            keywords: None,
            ..cat.clone()
        };
        assert!(empty.keyword_list().is_empty());
    }

    #[test]
    fn test_snapshot_round_trip() {
        let snap = ParsedTransactionSnapshot::new(
            ParsedTransaction {
                original_message: "test".to_string(),
                timestamp: Utc::now(),
                amount: 12.5,
                merchant: Some("Ahmad Ali".to_string()),
                category_hint: "Transfers".to_string(),
                transaction_type: TransactionType::Income,
                source: Some(MessageSource::Cliq),
            },
            "abc123".to_string(),
        );

        let json = serde_json::to_string(&snap).unwrap();
        let back: ParsedTransactionSnapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(back.version, ParsedTransactionSnapshot::VERSION);
        assert_eq!(back.message_hash, "abc123");
        assert_eq!(back.transaction.amount, 12.5);
        assert_eq!(back.transaction.source, Some(MessageSource::Cliq));
    }
}
