//! Money-Movement Engine: the four primitive money movements (transfer,
//! merchant payment, top-up, QR payment) plus the wallet accessor and
//! transaction recorder they are built on. Every operation is one sqlx
//! transaction combining the balance mutation(s) with the paired ledger
//! record(s); a failure anywhere rolls the whole bundle back.
//!
//! The bill-split engine settles obligations through [`apply_transfer`] as
//! well, so there is exactly one place in the codebase that moves money
//! between two wallets.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use sqlx::types::Json;
use sqlx::{Sqlite, SqliteConnection, Transaction as DbTransaction};

use crate::database::DatabasePool;
use crate::models::{Currency, Transaction, TransactionMetadata, TransactionStatus, TransactionType};
use crate::services::error::ServiceError;
use crate::utils::money::{is_valid_amount, round2};

#[derive(Clone, Debug, Serialize, sqlx::FromRow)]
pub struct Wallet {
    pub user_id: String,
    pub balance: f64,
    pub currency: Currency,
    pub updated_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Wallet accessor: the only code that touches wallets.balance.

async fn fetch_balance(conn: &mut SqliteConnection, user_id: &str) -> Result<f64, ServiceError> {
    sqlx::query_scalar::<_, f64>("SELECT balance FROM wallets WHERE user_id = ?")
        .bind(user_id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or(ServiceError::NotFound("Wallet"))
}

/// Debit a wallet, enforcing non-negativity at the point of debit.
/// Returns the new balance (pre-debit balance minus amount, rounded).
async fn debit_wallet(
    conn: &mut SqliteConnection,
    user_id: &str,
    amount: f64,
) -> Result<f64, ServiceError> {
    let balance = fetch_balance(conn, user_id).await?;
    if balance < amount {
        return Err(ServiceError::InsufficientFunds {
            balance,
            required: amount,
        });
    }
    let new_balance = round2(balance - amount);
    sqlx::query("UPDATE wallets SET balance = ?, updated_at = ? WHERE user_id = ?")
        .bind(new_balance)
        .bind(Utc::now())
        .bind(user_id)
        .execute(&mut *conn)
        .await?;
    Ok(new_balance)
}

async fn credit_wallet(
    conn: &mut SqliteConnection,
    user_id: &str,
    amount: f64,
) -> Result<f64, ServiceError> {
    let balance = fetch_balance(conn, user_id).await?;
    let new_balance = round2(balance + amount);
    sqlx::query("UPDATE wallets SET balance = ?, updated_at = ? WHERE user_id = ?")
        .bind(new_balance)
        .bind(Utc::now())
        .bind(user_id)
        .execute(&mut *conn)
        .await?;
    Ok(new_balance)
}

// ---------------------------------------------------------------------------
// Transaction recorder: append-only ledger entries, status always `ok`
// (no async settlement is modeled).

struct NewRecord<'a> {
    id: &'a str,
    user_id: &'a str,
    merchant_id: Option<&'a str>,
    amount: f64,
    tx_type: TransactionType,
    metadata: &'a TransactionMetadata,
}

async fn record_transaction(
    conn: &mut SqliteConnection,
    record: NewRecord<'_>,
) -> Result<(), ServiceError> {
    if !is_valid_amount(record.amount) {
        return Err(ServiceError::validation(
            "Transaction amount must be a positive number",
        ));
    }
    sqlx::query(
        r#"
        INSERT INTO transactions (id, user_id, merchant_id, amount, currency, type, status, metadata, created_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(record.id)
    .bind(record.user_id)
    .bind(record.merchant_id)
    .bind(record.amount)
    .bind(Currency::default())
    .bind(record.tx_type)
    .bind(TransactionStatus::Ok)
    .bind(Json(record.metadata))
    .bind(Utc::now())
    .execute(&mut *conn)
    .await?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Shared credit primitive: one wallet credit + its ledger record. Top-ups and
// cashback awards both go through here.

pub(crate) struct CreditSpec<'a> {
    pub user_id: &'a str,
    pub merchant_id: Option<&'a str>,
    pub amount: f64,
    pub tx_type: TransactionType,
    pub metadata: TransactionMetadata,
}

/// Apply one credit + record bundle inside the caller's DB transaction.
/// Returns the new transaction id and the post-credit balance.
pub(crate) async fn apply_credit(
    db_tx: &mut DbTransaction<'_, Sqlite>,
    spec: CreditSpec<'_>,
) -> Result<(String, f64), ServiceError> {
    if !is_valid_amount(spec.amount) {
        return Err(ServiceError::validation(
            "Credit amount must be a positive number",
        ));
    }
    let amount = round2(spec.amount);
    let new_balance = credit_wallet(&mut *db_tx, spec.user_id, amount).await?;
    let transaction_id = spec.tx_type.new_id();
    record_transaction(
        &mut *db_tx,
        NewRecord {
            id: &transaction_id,
            user_id: spec.user_id,
            merchant_id: spec.merchant_id,
            amount,
            tx_type: spec.tx_type,
            metadata: &spec.metadata,
        },
    )
    .await?;
    Ok((transaction_id, new_balance))
}

// ---------------------------------------------------------------------------
// Shared transfer primitive.

/// Parameters for one wallet-to-wallet movement. The transaction types are
/// caller-chosen so bill-split settlement can tag its outgoing side as
/// `bill_split` while reusing the same bundle.
pub(crate) struct TransferSpec<'a> {
    pub from_user: &'a str,
    pub to_user: &'a str,
    pub amount: f64,
    pub out_type: TransactionType,
    pub in_type: TransactionType,
    /// Extra metadata stamped on both records (e.g. split_id).
    pub metadata: TransactionMetadata,
}

#[derive(Clone, Debug, Serialize)]
pub struct TransferResult {
    pub out_transaction_id: String,
    pub in_transaction_id: String,
    pub amount: f64,
    pub sender_balance: f64,
    pub receiver_balance: f64,
}

/// Apply one debit + credit + paired-record bundle inside the caller's DB
/// transaction. No partial effect survives a rollback.
pub(crate) async fn apply_transfer(
    db_tx: &mut DbTransaction<'_, Sqlite>,
    spec: TransferSpec<'_>,
) -> Result<TransferResult, ServiceError> {
    if spec.from_user == spec.to_user {
        return Err(ServiceError::validation("Cannot transfer to yourself"));
    }
    if !is_valid_amount(spec.amount) {
        return Err(ServiceError::validation(
            "Transfer amount must be a positive number",
        ));
    }
    let amount = round2(spec.amount);

    let sender_balance = debit_wallet(&mut *db_tx, spec.from_user, amount).await?;
    let receiver_balance = credit_wallet(&mut *db_tx, spec.to_user, amount).await?;

    let out_id = spec.out_type.new_id();
    let in_id = spec.in_type.new_id();

    let mut out_meta = spec.metadata.clone();
    out_meta.related_transaction_id = Some(in_id.clone());
    out_meta.counterparty_user_id = Some(spec.to_user.to_string());
    record_transaction(
        &mut *db_tx,
        NewRecord {
            id: &out_id,
            user_id: spec.from_user,
            merchant_id: None,
            amount,
            tx_type: spec.out_type,
            metadata: &out_meta,
        },
    )
    .await?;

    let mut in_meta = spec.metadata;
    in_meta.related_transaction_id = Some(out_id.clone());
    in_meta.counterparty_user_id = Some(spec.from_user.to_string());
    record_transaction(
        &mut *db_tx,
        NewRecord {
            id: &in_id,
            user_id: spec.to_user,
            merchant_id: None,
            amount,
            tx_type: spec.in_type,
            metadata: &in_meta,
        },
    )
    .await?;

    Ok(TransferResult {
        out_transaction_id: out_id,
        in_transaction_id: in_id,
        amount,
        sender_balance,
        receiver_balance,
    })
}

// ---------------------------------------------------------------------------
// Public operations.

/// Peer-to-peer transfer: debit sender, credit receiver, two paired records.
pub async fn transfer(
    pool: &DatabasePool,
    from_user: &str,
    to_user: &str,
    amount: f64,
) -> Result<TransferResult, ServiceError> {
    let mut db_tx = pool.begin().await?;
    let result = apply_transfer(
        &mut db_tx,
        TransferSpec {
            from_user,
            to_user,
            amount,
            out_type: TransactionType::TransferOut,
            in_type: TransactionType::TransferIn,
            metadata: TransactionMetadata::default(),
        },
    )
    .await?;
    db_tx.commit().await?;
    tracing::debug!(from = %from_user, to = %to_user, amount = result.amount, "transfer completed");
    Ok(result)
}

#[derive(Clone, Debug, Serialize)]
pub struct PaymentResult {
    pub transaction_id: String,
    pub merchant_id: String,
    pub amount: f64,
    /// Pre-debit balance minus amount; a point-in-time estimate, not re-read.
    pub new_balance: f64,
}

/// Merchant payment: debit + one `payment` record tagged with the merchant.
/// Cashback is NOT applied here; callers invoke the cashback engine
/// explicitly after the payment commits.
pub async fn process_payment(
    pool: &DatabasePool,
    user_id: &str,
    merchant_id: &str,
    amount: f64,
    metadata: TransactionMetadata,
) -> Result<PaymentResult, ServiceError> {
    if !is_valid_amount(amount) {
        return Err(ServiceError::validation(
            "Payment amount must be a positive number",
        ));
    }
    let amount = round2(amount);

    let mut db_tx = pool.begin().await?;

    let merchant_exists =
        sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM merchants WHERE id = ?)")
            .bind(merchant_id)
            .fetch_one(&mut *db_tx)
            .await?;
    if !merchant_exists {
        return Err(ServiceError::NotFound("Merchant"));
    }

    let new_balance = debit_wallet(&mut *db_tx, user_id, amount).await?;
    let transaction_id = TransactionType::Payment.new_id();
    record_transaction(
        &mut *db_tx,
        NewRecord {
            id: &transaction_id,
            user_id,
            merchant_id: Some(merchant_id),
            amount,
            tx_type: TransactionType::Payment,
            metadata: &metadata,
        },
    )
    .await?;
    db_tx.commit().await?;

    tracing::debug!(user = %user_id, merchant = %merchant_id, amount, "payment completed");
    Ok(PaymentResult {
        transaction_id,
        merchant_id: merchant_id.to_string(),
        amount,
        new_balance,
    })
}

#[derive(Clone, Debug, Serialize)]
pub struct TopUpResult {
    pub transaction_id: String,
    pub amount: f64,
    pub new_balance: f64,
}

/// Credit the wallet and append a `topup` record.
pub async fn top_up_wallet(
    pool: &DatabasePool,
    user_id: &str,
    amount: f64,
) -> Result<TopUpResult, ServiceError> {
    if !is_valid_amount(amount) {
        return Err(ServiceError::validation(
            "Top-up amount must be a positive number",
        ));
    }
    let amount = round2(amount);

    let mut db_tx = pool.begin().await?;
    let (transaction_id, new_balance) = apply_credit(
        &mut db_tx,
        CreditSpec {
            user_id,
            merchant_id: None,
            amount,
            tx_type: TransactionType::Topup,
            metadata: TransactionMetadata::default(),
        },
    )
    .await?;
    db_tx.commit().await?;

    Ok(TopUpResult {
        transaction_id,
        amount,
        new_balance,
    })
}

// ---------------------------------------------------------------------------
// QR payments.

#[derive(Clone, Debug)]
pub struct QrPayload {
    pub qr_id: String,
    pub merchant_id: String,
    pub amount: f64,
    pub ts: Option<DateTime<Utc>>,
}

/// Parse caller-supplied QR data: either a JSON string or an object with
/// qr_id, merchant_id, amount (number or numeric string) and optional ts.
pub fn parse_qr_payload(raw: &serde_json::Value) -> Result<QrPayload, ServiceError> {
    let parsed;
    let obj = match raw {
        serde_json::Value::String(s) => {
            parsed = serde_json::from_str::<serde_json::Value>(s)
                .map_err(|_| ServiceError::validation("QR data is not valid JSON"))?;
            &parsed
        }
        other => other,
    };
    let obj = obj
        .as_object()
        .ok_or_else(|| ServiceError::validation("QR data must be an object"))?;

    let qr_id = obj
        .get("qr_id")
        .and_then(|v| v.as_str())
        .ok_or_else(|| ServiceError::validation("QR data is missing qr_id"))?
        .to_string();
    let merchant_id = obj
        .get("merchant_id")
        .and_then(|v| v.as_str())
        .ok_or_else(|| ServiceError::validation("QR data is missing merchant_id"))?
        .to_string();

    let amount = match obj.get("amount") {
        Some(serde_json::Value::Number(n)) => n.as_f64(),
        Some(serde_json::Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
    .filter(|a| is_valid_amount(*a))
    .ok_or_else(|| ServiceError::validation("QR amount must be a positive number"))?;

    let ts = match obj.get("ts") {
        None | Some(serde_json::Value::Null) => None,
        Some(serde_json::Value::String(s)) => Some(
            DateTime::parse_from_rfc3339(s)
                .map(|t| t.with_timezone(&Utc))
                .map_err(|_| ServiceError::validation("QR timestamp is not a valid RFC3339 date"))?,
        ),
        Some(_) => return Err(ServiceError::validation("QR timestamp must be a string")),
    };

    Ok(QrPayload {
        qr_id,
        merchant_id,
        amount,
        ts,
    })
}

#[derive(Clone, Debug, Serialize)]
pub struct QrPaymentResult {
    pub qr_id: String,
    #[serde(flatten)]
    pub payment: PaymentResult,
}

/// Validate the QR payload (including the 24h expiry window) and delegate to
/// [`process_payment`], tagging the record with the qr id.
pub async fn process_qr_payment(
    pool: &DatabasePool,
    user_id: &str,
    payload: QrPayload,
) -> Result<QrPaymentResult, ServiceError> {
    if let Some(ts) = payload.ts {
        if Utc::now().signed_duration_since(ts) > Duration::hours(24) {
            return Err(ServiceError::validation("QR code has expired"));
        }
    }
    let metadata = TransactionMetadata {
        qr_id: Some(payload.qr_id.clone()),
        ..Default::default()
    };
    let payment = process_payment(
        pool,
        user_id,
        &payload.merchant_id,
        payload.amount,
        metadata,
    )
    .await?;
    Ok(QrPaymentResult {
        qr_id: payload.qr_id,
        payment,
    })
}

#[derive(Clone, Debug, Serialize, sqlx::FromRow)]
pub struct QrInfo {
    pub qr_id: String,
    pub merchant_id: String,
    pub merchant_name: String,
    pub category: String,
    pub amount: f64,
}

/// Resolve a QR code from the demo code directory (public, no auth).
pub async fn qr_info(pool: &DatabasePool, qr_id: &str) -> Result<QrInfo, ServiceError> {
    sqlx::query_as::<_, QrInfo>(
        r#"
        SELECT q.qr_id, q.merchant_id, m.name AS merchant_name, m.category, q.amount
        FROM qr_codes q
        JOIN merchants m ON m.id = q.merchant_id
        WHERE q.qr_id = ?
        "#,
    )
    .bind(qr_id)
    .fetch_optional(&**pool)
    .await?
    .ok_or(ServiceError::NotFound("QR code"))
}

// ---------------------------------------------------------------------------
// Reads.

pub async fn get_wallet(pool: &DatabasePool, user_id: &str) -> Result<Wallet, ServiceError> {
    sqlx::query_as::<_, Wallet>(
        "SELECT user_id, balance, currency, updated_at FROM wallets WHERE user_id = ?",
    )
    .bind(user_id)
    .fetch_optional(&**pool)
    .await?
    .ok_or(ServiceError::NotFound("Wallet"))
}

#[derive(Clone, Debug, Serialize)]
pub struct HistoryPage {
    pub items: Vec<Transaction>,
    pub page: u32,
    pub page_size: u32,
    pub total: i64,
}

/// Paginated transaction history, newest first.
pub async fn transaction_history(
    pool: &DatabasePool,
    user_id: &str,
    page: Option<u32>,
    page_size: Option<u32>,
) -> Result<HistoryPage, ServiceError> {
    let page = page.unwrap_or(1).max(1);
    let page_size = page_size.unwrap_or(20).clamp(1, 100);
    let offset = (page - 1) * page_size;

    let total =
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM transactions WHERE user_id = ?")
            .bind(user_id)
            .fetch_one(&**pool)
            .await?;

    let items = sqlx::query_as::<_, Transaction>(
        r#"
        SELECT id, user_id, merchant_id, amount, currency, type, status, metadata, created_at
        FROM transactions
        WHERE user_id = ?
        ORDER BY created_at DESC, id DESC
        LIMIT ? OFFSET ?
        "#,
    )
    .bind(user_id)
    .bind(page_size)
    .bind(offset)
    .fetch_all(&**pool)
    .await?;

    Ok(HistoryPage {
        items,
        page,
        page_size,
        total,
    })
}

/// Look up one ledger entry by id.
pub async fn get_transaction(
    pool: &DatabasePool,
    transaction_id: &str,
) -> Result<Transaction, ServiceError> {
    sqlx::query_as::<_, Transaction>(
        r#"
        SELECT id, user_id, merchant_id, amount, currency, type, status, metadata, created_at
        FROM transactions
        WHERE id = ?
        "#,
    )
    .bind(transaction_id)
    .fetch_optional(&**pool)
    .await?
    .ok_or(ServiceError::NotFound("Transaction"))
}
