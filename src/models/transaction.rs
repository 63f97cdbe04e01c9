//! Ledger transaction types. Transaction rows are immutable once written
//! except for their status; every balance mutation in the system pairs with
//! exactly one row here per affected wallet.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Closed set of ledger entry kinds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(rename_all = "snake_case")]
pub enum TransactionType {
    Payment,
    Cashback,
    Topup,
    TransferOut,
    TransferIn,
    BillSplit,
    SplitSettlement,
    Refund,
}

impl TransactionType {
    /// Human-readable prefix for generated transaction ids.
    pub fn id_prefix(&self) -> &'static str {
        match self {
            TransactionType::Payment => "payment",
            TransactionType::Cashback => "cashback",
            TransactionType::Topup => "topup",
            TransactionType::TransferOut => "transfer-out",
            TransactionType::TransferIn => "transfer-in",
            TransactionType::BillSplit => "bill-split",
            TransactionType::SplitSettlement => "split-settlement",
            TransactionType::Refund => "refund",
        }
    }

    /// New ledger entry id, prefixed by operation kind so raw ids stay
    /// readable in logs and metadata back-references.
    pub fn new_id(&self) -> String {
        format!("{}-{}", self.id_prefix(), Uuid::new_v4())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum TransactionStatus {
    Pending,
    Ok,
    Failed,
    Cancelled,
}

/// Typed metadata bag. A closed set of known optional keys per transaction
/// type, stored as JSON: transfers link their paired record via
/// `related_transaction_id`, cashback entries carry `rule_id` plus the
/// originating payment id, settlements carry the `split_id`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransactionMetadata {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub related_transaction_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub counterparty_user_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rule_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub original_transaction_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub split_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub qr_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

#[derive(Clone, Debug, Serialize, sqlx::FromRow)]
pub struct Transaction {
    pub id: String,
    pub user_id: String,
    pub merchant_id: Option<String>,
    pub amount: f64,
    pub currency: String,
    #[serde(rename = "type")]
    #[sqlx(rename = "type")]
    pub tx_type: TransactionType,
    pub status: TransactionStatus,
    pub metadata: sqlx::types::Json<TransactionMetadata>,
    pub created_at: DateTime<Utc>,
}
