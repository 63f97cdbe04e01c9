//! Bill-Split Engine: decompose a completed payment into per-debtor
//! obligations (equal or weighted) and settle or cancel them later.
//! Settlement moves money through the ledger's shared transfer primitive in
//! the same DB transaction that marks the obligation settled.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::database::DatabasePool;
use crate::models::{TransactionMetadata, TransactionType};
use crate::services::error::ServiceError;
use crate::services::ledger::{self, TransferResult, TransferSpec};
use crate::utils::money::round2;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum SplitStatus {
    Pending,
    Settled,
    Cancelled,
}

#[derive(Clone, Debug, Serialize, sqlx::FromRow)]
pub struct BillSplit {
    pub id: i64,
    pub transaction_id: String,
    pub payer_user_id: String,
    pub debtor_user_id: String,
    pub total_amount: f64,
    pub share_amount: f64,
    pub weight: f64,
    pub status: SplitStatus,
    pub created_at: DateTime<Utc>,
    pub settled_at: Option<DateTime<Utc>>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct DebtorWeight {
    #[serde(alias = "userId")]
    pub user_id: String,
    pub weight: f64,
}

const SPLIT_COLUMNS: &str = "id, transaction_id, payer_user_id, debtor_user_id, total_amount, \
                             share_amount, weight, status, created_at, settled_at";

/// Equal split: the payer counts as a participant but is not billed — their
/// own share is implicitly absorbed, only debtors get rows.
pub async fn create_equal_split(
    pool: &DatabasePool,
    payer_user_id: &str,
    original_tx_id: &str,
    debtor_ids: Vec<String>,
) -> Result<Vec<BillSplit>, ServiceError> {
    let original = ledger::get_transaction(pool, original_tx_id).await?;
    if original.user_id != payer_user_id {
        return Err(ServiceError::forbidden(
            "Only the owner of the original transaction can split it",
        ));
    }

    let debtors = normalize_debtors(payer_user_id, debtor_ids)?;
    ensure_users_exist(pool, &debtors).await?;

    let total_users = debtors.len() as f64 + 1.0;
    let share = round2(original.amount / total_users);
    if share <= 0.0 {
        return Err(ServiceError::validation(
            "Split share rounds to zero; amount is too small for this many participants",
        ));
    }

    let entries: Vec<(String, f64, f64)> = debtors
        .into_iter()
        .map(|debtor| (debtor, share, 1.0))
        .collect();
    insert_splits(pool, payer_user_id, &original.id, original.amount, entries).await
}

/// Weighted split: share_i = round(amount * w_i / sum(w), 2). Shares are
/// rounded independently; the sum is not reconciled against the original
/// total, so residual cents from rounding are accepted.
pub async fn create_weighted_split(
    pool: &DatabasePool,
    payer_user_id: &str,
    original_tx_id: &str,
    debtor_weights: Vec<DebtorWeight>,
) -> Result<Vec<BillSplit>, ServiceError> {
    let original = ledger::get_transaction(pool, original_tx_id).await?;
    if original.user_id != payer_user_id {
        return Err(ServiceError::forbidden(
            "Only the owner of the original transaction can split it",
        ));
    }

    let mut seen = std::collections::HashSet::new();
    let mut weighted: Vec<DebtorWeight> = Vec::new();
    for dw in debtor_weights {
        if dw.user_id == payer_user_id {
            continue;
        }
        if !dw.weight.is_finite() || dw.weight <= 0.0 {
            return Err(ServiceError::validation(
                "Every split weight must be a positive number",
            ));
        }
        if seen.insert(dw.user_id.clone()) {
            weighted.push(dw);
        }
    }
    if weighted.is_empty() {
        return Err(ServiceError::validation(
            "At least one debtor besides the payer is required",
        ));
    }
    let ids: Vec<String> = weighted.iter().map(|d| d.user_id.clone()).collect();
    ensure_users_exist(pool, &ids).await?;

    let total_weight: f64 = weighted.iter().map(|d| d.weight).sum();
    let mut entries = Vec::with_capacity(weighted.len());
    for dw in weighted {
        let share = round2(original.amount * dw.weight / total_weight);
        if share <= 0.0 {
            return Err(ServiceError::validation(
                "A split share rounds to zero; adjust the weights",
            ));
        }
        entries.push((dw.user_id, share, dw.weight));
    }
    insert_splits(pool, payer_user_id, &original.id, original.amount, entries).await
}

fn normalize_debtors(
    payer_user_id: &str,
    debtor_ids: Vec<String>,
) -> Result<Vec<String>, ServiceError> {
    let mut seen = std::collections::HashSet::new();
    let debtors: Vec<String> = debtor_ids
        .into_iter()
        .filter(|id| id != payer_user_id)
        .filter(|id| seen.insert(id.clone()))
        .collect();
    if debtors.is_empty() {
        return Err(ServiceError::validation(
            "At least one debtor besides the payer is required",
        ));
    }
    Ok(debtors)
}

async fn ensure_users_exist(pool: &DatabasePool, ids: &[String]) -> Result<(), ServiceError> {
    for id in ids {
        let exists = sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM users WHERE id = ?)")
            .bind(id)
            .fetch_one(&**pool)
            .await?;
        if !exists {
            return Err(ServiceError::NotFound("Debtor user"));
        }
    }
    Ok(())
}

/// Batch-insert one pending row per debtor, atomically.
async fn insert_splits(
    pool: &DatabasePool,
    payer_user_id: &str,
    transaction_id: &str,
    total_amount: f64,
    entries: Vec<(String, f64, f64)>,
) -> Result<Vec<BillSplit>, ServiceError> {
    let mut db_tx = pool.begin().await?;
    let now = Utc::now();
    let mut created = Vec::with_capacity(entries.len());

    for (debtor, share, weight) in entries {
        let id = sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO bill_splits
                (transaction_id, payer_user_id, debtor_user_id, total_amount, share_amount, weight, status, created_at)
            VALUES (?, ?, ?, ?, ?, ?, 'pending', ?)
            RETURNING id
            "#,
        )
        .bind(transaction_id)
        .bind(payer_user_id)
        .bind(&debtor)
        .bind(total_amount)
        .bind(share)
        .bind(weight)
        .bind(now)
        .fetch_one(&mut *db_tx)
        .await?;

        created.push(BillSplit {
            id,
            transaction_id: transaction_id.to_string(),
            payer_user_id: payer_user_id.to_string(),
            debtor_user_id: debtor,
            total_amount,
            share_amount: share,
            weight,
            status: SplitStatus::Pending,
            created_at: now,
            settled_at: None,
        });
    }

    db_tx.commit().await?;
    tracing::debug!(payer = %payer_user_id, tx = %transaction_id, count = created.len(), "bill split created");
    Ok(created)
}

#[derive(Clone, Debug, Serialize)]
pub struct SettlementResult {
    pub split: BillSplit,
    pub transfer: TransferResult,
}

/// Settle one obligation: debtor pays the payer their share through the
/// shared transfer primitive, and the row flips to `settled` in the same DB
/// transaction. Only the debtor may settle, only from `pending`.
pub async fn settle_bill_split(
    pool: &DatabasePool,
    split_id: i64,
    paying_user_id: &str,
) -> Result<SettlementResult, ServiceError> {
    let mut db_tx = pool.begin().await?;

    let mut split = sqlx::query_as::<_, BillSplit>(&format!(
        "SELECT {SPLIT_COLUMNS} FROM bill_splits WHERE id = ?"
    ))
    .bind(split_id)
    .fetch_optional(&mut *db_tx)
    .await?
    .ok_or(ServiceError::NotFound("Bill split"))?;

    if split.debtor_user_id != paying_user_id {
        return Err(ServiceError::forbidden(
            "Only the debtor can settle this split",
        ));
    }
    match split.status {
        SplitStatus::Pending => {}
        SplitStatus::Settled => {
            return Err(ServiceError::conflict("Split has already been settled"))
        }
        SplitStatus::Cancelled => {
            return Err(ServiceError::conflict("Split has been cancelled"))
        }
    }

    let transfer = ledger::apply_transfer(
        &mut db_tx,
        TransferSpec {
            from_user: &split.debtor_user_id,
            to_user: &split.payer_user_id,
            amount: split.share_amount,
            out_type: TransactionType::BillSplit,
            in_type: TransactionType::TransferIn,
            metadata: TransactionMetadata {
                split_id: Some(split.id),
                original_transaction_id: Some(split.transaction_id.clone()),
                ..Default::default()
            },
        },
    )
    .await?;

    let settled_at = Utc::now();
    sqlx::query("UPDATE bill_splits SET status = 'settled', settled_at = ? WHERE id = ?")
        .bind(settled_at)
        .bind(split.id)
        .execute(&mut *db_tx)
        .await?;
    db_tx.commit().await?;

    split.status = SplitStatus::Settled;
    split.settled_at = Some(settled_at);
    tracing::info!(split = split.id, debtor = %split.debtor_user_id, amount = split.share_amount, "bill split settled");
    Ok(SettlementResult { split, transfer })
}

/// Cancel a pending obligation. Only the original payer may cancel; settled
/// splits are immutable. No money moves.
pub async fn cancel_bill_split(
    pool: &DatabasePool,
    split_id: i64,
    requesting_user_id: &str,
) -> Result<BillSplit, ServiceError> {
    let mut db_tx = pool.begin().await?;

    let mut split = sqlx::query_as::<_, BillSplit>(&format!(
        "SELECT {SPLIT_COLUMNS} FROM bill_splits WHERE id = ?"
    ))
    .bind(split_id)
    .fetch_optional(&mut *db_tx)
    .await?
    .ok_or(ServiceError::NotFound("Bill split"))?;

    if split.payer_user_id != requesting_user_id {
        return Err(ServiceError::forbidden(
            "Only the payer can cancel this split",
        ));
    }
    match split.status {
        SplitStatus::Pending => {}
        SplitStatus::Settled => {
            return Err(ServiceError::conflict("Split has already been settled"))
        }
        SplitStatus::Cancelled => {
            return Err(ServiceError::conflict("Split is already cancelled"))
        }
    }

    sqlx::query("UPDATE bill_splits SET status = 'cancelled' WHERE id = ?")
        .bind(split.id)
        .execute(&mut *db_tx)
        .await?;
    db_tx.commit().await?;

    split.status = SplitStatus::Cancelled;
    Ok(split)
}

#[derive(Clone, Debug, Serialize)]
pub struct SplitOverview {
    pub owed_by_me: Vec<BillSplit>,
    pub owed_to_me: Vec<BillSplit>,
}

/// Everything the user owes and is owed, newest first.
pub async fn list_splits(
    pool: &DatabasePool,
    user_id: &str,
) -> Result<SplitOverview, ServiceError> {
    let owed_by_me = sqlx::query_as::<_, BillSplit>(&format!(
        "SELECT {SPLIT_COLUMNS} FROM bill_splits WHERE debtor_user_id = ? ORDER BY created_at DESC, id DESC"
    ))
    .bind(user_id)
    .fetch_all(&**pool)
    .await?;

    let owed_to_me = sqlx::query_as::<_, BillSplit>(&format!(
        "SELECT {SPLIT_COLUMNS} FROM bill_splits WHERE payer_user_id = ? ORDER BY created_at DESC, id DESC"
    ))
    .bind(user_id)
    .fetch_all(&**pool)
    .await?;

    Ok(SplitOverview {
        owed_by_me,
        owed_to_me,
    })
}
