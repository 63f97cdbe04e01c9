//! Cashback Engine: post-payment rule evaluation. Given a committed payment,
//! find the applicable rules and credit the wallet once per rule, each award
//! chained to the originating payment through its metadata.

use chrono::{NaiveDate, Utc};
use serde::Serialize;

use crate::database::DatabasePool;
use crate::models::{TransactionMetadata, TransactionType};
use crate::services::error::ServiceError;
use crate::services::ledger;
use crate::utils::money::round2;

/// Wildcard rule category matching every merchant.
const ANY_CATEGORY: &str = "any";

#[derive(Clone, Debug, Serialize, sqlx::FromRow)]
pub struct CashbackRule {
    pub id: String,
    pub name: String,
    pub category: String,
    pub rule_type: String,
    pub rate: Option<f64>,
    pub flat_amount: Option<f64>,
    pub cap: Option<f64>,
    pub first_time_only: bool,
    pub valid_from: Option<NaiveDate>,
    pub valid_until: Option<NaiveDate>,
    pub active: bool,
}

impl CashbackRule {
    fn window_contains(&self, today: NaiveDate) -> bool {
        if let Some(from) = self.valid_from {
            if today < from {
                return false;
            }
        }
        if let Some(until) = self.valid_until {
            if today > until {
                return false;
            }
        }
        true
    }

    /// Cashback for a payment of `amount`, rounded to cents. `percent` rules
    /// are clamped to the cap when one is set; `flat` rules ignore the
    /// payment size.
    fn award_amount(&self, amount: f64) -> f64 {
        let raw = match self.rule_type.as_str() {
            "percent" => {
                let earned = amount * self.rate.unwrap_or(0.0);
                match self.cap {
                    Some(cap) => earned.min(cap),
                    None => earned,
                }
            }
            "flat" => self.flat_amount.unwrap_or(0.0),
            _ => 0.0,
        };
        round2(raw)
    }

    pub fn describe(&self) -> String {
        let where_part = if self.category == ANY_CATEGORY {
            "on any purchase".to_string()
        } else {
            format!("on {} purchases", self.category)
        };
        let mut desc = match self.rule_type.as_str() {
            "percent" => {
                let pct = self.rate.unwrap_or(0.0) * 100.0;
                match self.cap {
                    Some(cap) => format!("{:.0}% cashback {} (up to {:.2})", pct, where_part, cap),
                    None => format!("{:.0}% cashback {}", pct, where_part),
                }
            }
            _ => format!(
                "Flat {:.2} cashback {}",
                self.flat_amount.unwrap_or(0.0),
                where_part
            ),
        };
        if self.first_time_only {
            desc.push_str(", first purchase only");
        }
        desc
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct CashbackAward {
    pub rule_id: String,
    pub rule_name: String,
    pub amount: f64,
    pub transaction_id: String,
}

#[derive(Clone, Debug, Serialize)]
pub struct CashbackOutcome {
    pub total: f64,
    pub awards: Vec<CashbackAward>,
    pub new_balance: Option<f64>,
    pub message: Option<String>,
}

/// Evaluate all rules against a completed payment and credit each award as
/// its own `cashback` ledger entry. No applicable rule is not an error; the
/// outcome reports zero with an explanatory message.
pub async fn apply_cashback(
    pool: &DatabasePool,
    user_id: &str,
    merchant_id: &str,
    amount: f64,
    payment_transaction_id: &str,
) -> Result<CashbackOutcome, ServiceError> {
    let category =
        sqlx::query_scalar::<_, String>("SELECT category FROM merchants WHERE id = ?")
            .bind(merchant_id)
            .fetch_optional(&**pool)
            .await?
            .ok_or(ServiceError::NotFound("Merchant"))?;

    let rules = sqlx::query_as::<_, CashbackRule>(
        r#"
        SELECT id, name, category, rule_type, rate, flat_amount, cap,
               first_time_only, valid_from, valid_until, active
        FROM cashback_rules
        WHERE active = 1 AND (category = ? OR category = ?)
        "#,
    )
    .bind(&category)
    .bind(ANY_CATEGORY)
    .fetch_all(&**pool)
    .await?;

    let today = Utc::now().date_naive();
    let mut awards = Vec::new();
    let mut total = 0.0_f64;
    let mut new_balance = None;

    for rule in rules {
        if !rule.window_contains(today) {
            continue;
        }
        if rule.first_time_only && has_prior_award(pool, user_id, &rule.id).await? {
            tracing::debug!(user = %user_id, rule = %rule.id, "first-time rule already used, skipping");
            continue;
        }
        let award = rule.award_amount(amount);
        if award <= 0.0 {
            continue;
        }

        let metadata = TransactionMetadata {
            rule_id: Some(rule.id.clone()),
            original_transaction_id: Some(payment_transaction_id.to_string()),
            ..Default::default()
        };
        let transaction_id =
            credit_cashback(pool, user_id, merchant_id, award, metadata, &mut new_balance).await?;

        total = round2(total + award);
        awards.push(CashbackAward {
            rule_id: rule.id,
            rule_name: rule.name,
            amount: award,
            transaction_id,
        });
    }

    let message = if awards.is_empty() {
        Some("No cashback rules applied to this payment".to_string())
    } else {
        None
    };
    Ok(CashbackOutcome {
        total,
        awards,
        new_balance,
        message,
    })
}

/// True if the user already holds a cashback entry referencing this rule.
async fn has_prior_award(
    pool: &DatabasePool,
    user_id: &str,
    rule_id: &str,
) -> Result<bool, ServiceError> {
    let exists = sqlx::query_scalar::<_, bool>(
        r#"
        SELECT EXISTS(
            SELECT 1 FROM transactions
            WHERE user_id = ? AND type = 'cashback'
              AND json_extract(metadata, '$.rule_id') = ?
        )
        "#,
    )
    .bind(user_id)
    .bind(rule_id)
    .fetch_one(&**pool)
    .await?;
    Ok(exists)
}

/// One wallet credit + one `cashback` record, atomically, via the shared
/// ledger credit primitive.
async fn credit_cashback(
    pool: &DatabasePool,
    user_id: &str,
    merchant_id: &str,
    award: f64,
    metadata: TransactionMetadata,
    new_balance: &mut Option<f64>,
) -> Result<String, ServiceError> {
    let mut db_tx = pool.begin().await?;
    let (transaction_id, credited) = ledger::apply_credit(
        &mut db_tx,
        ledger::CreditSpec {
            user_id,
            merchant_id: Some(merchant_id),
            amount: award,
            tx_type: TransactionType::Cashback,
            metadata,
        },
    )
    .await?;
    db_tx.commit().await?;
    *new_balance = Some(credited);
    Ok(transaction_id)
}

/// Active rules with human-readable descriptions, for the public campaign
/// listing.
pub async fn list_active_campaigns(
    pool: &DatabasePool,
) -> Result<Vec<serde_json::Value>, ServiceError> {
    let rules = sqlx::query_as::<_, CashbackRule>(
        r#"
        SELECT id, name, category, rule_type, rate, flat_amount, cap,
               first_time_only, valid_from, valid_until, active
        FROM cashback_rules
        WHERE active = 1
        ORDER BY name
        "#,
    )
    .fetch_all(&**pool)
    .await?;

    let today = Utc::now().date_naive();
    Ok(rules
        .into_iter()
        .filter(|r| r.window_contains(today))
        .map(|r| {
            serde_json::json!({
                "id": r.id,
                "name": r.name,
                "category": r.category,
                "description": r.describe(),
                "first_time_only": r.first_time_only,
                "valid_from": r.valid_from,
                "valid_until": r.valid_until,
            })
        })
        .collect())
}
