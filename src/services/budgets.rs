//! Budget Aggregator: read-only rollup of spend against configured limits.
//! Actual spend is always recomputed from `payment`-type transactions at read
//! time; the stored spent_amount column is never consulted. The only writes
//! here are the limit upsert/delete.

use chrono::Utc;
use serde::Serialize;

use crate::database::DatabasePool;
use crate::models::Category;
use crate::services::error::ServiceError;
use crate::services::ledger;
use crate::utils::date::{current_month, parse_month};
use crate::utils::money::{is_valid_amount, round2};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BudgetHealth {
    Good,
    Warning,
    Danger,
}

/// Default display thresholds: good below 80%, warning up to 95%, danger
/// from 95%. Callers may re-bucket on their side; this is not enforced
/// beyond the tag.
fn health_tag(percentage: f64) -> BudgetHealth {
    if percentage < 80.0 {
        BudgetHealth::Good
    } else if percentage < 95.0 {
        BudgetHealth::Warning
    } else {
        BudgetHealth::Danger
    }
}

#[derive(Clone, Debug, Serialize, sqlx::FromRow)]
pub struct Budget {
    pub id: i64,
    pub user_id: String,
    pub month: String,
    pub category: Category,
    pub limit_amount: f64,
}

#[derive(Clone, Debug, Serialize)]
pub struct BudgetReport {
    pub id: i64,
    pub month: String,
    pub category: Category,
    pub limit_amount: f64,
    pub spent: f64,
    pub remaining: f64,
    pub percentage: f64,
    pub status: BudgetHealth,
}

/// Spend vs. limit for every budget the user configured for the month.
pub async fn get_user_budgets(
    pool: &DatabasePool,
    user_id: &str,
    month: &str,
) -> Result<Vec<BudgetReport>, ServiceError> {
    let month = parse_month(month).map_err(ServiceError::Validation)?;

    let budgets = sqlx::query_as::<_, Budget>(
        "SELECT id, user_id, month, category, limit_amount FROM budgets WHERE user_id = ? AND month = ? ORDER BY category",
    )
    .bind(user_id)
    .bind(&month)
    .fetch_all(&**pool)
    .await?;

    let mut reports = Vec::with_capacity(budgets.len());
    for budget in budgets {
        reports.push(build_report(pool, user_id, budget).await?);
    }
    Ok(reports)
}

async fn build_report(
    pool: &DatabasePool,
    user_id: &str,
    budget: Budget,
) -> Result<BudgetReport, ServiceError> {
    let spent = category_spend(pool, user_id, budget.category, &budget.month).await?;
    let percentage = round2(spent / budget.limit_amount * 100.0);
    Ok(BudgetReport {
        id: budget.id,
        month: budget.month,
        category: budget.category,
        limit_amount: budget.limit_amount,
        spent,
        remaining: round2(budget.limit_amount - spent),
        percentage,
        status: health_tag(percentage),
    })
}

/// Sum of ok-status payments at merchants of this category in the month.
async fn category_spend(
    pool: &DatabasePool,
    user_id: &str,
    category: Category,
    month: &str,
) -> Result<f64, ServiceError> {
    let spent = sqlx::query_scalar::<_, f64>(
        r#"
        SELECT COALESCE(SUM(t.amount), 0.0)
        FROM transactions t
        JOIN merchants m ON m.id = t.merchant_id
        WHERE t.user_id = ?
          AND t.type = 'payment'
          AND t.status = 'ok'
          AND m.category = ?
          AND substr(t.created_at, 1, 7) = ?
        "#,
    )
    .bind(user_id)
    .bind(category)
    .bind(month)
    .fetch_one(&**pool)
    .await?;
    Ok(round2(spent))
}

#[derive(Clone, Debug, Serialize)]
pub struct BudgetSummary {
    pub month: String,
    /// The wallet balance, used as the overall budget denominator.
    pub total_budget: f64,
    pub total_spent: f64,
    pub remaining: f64,
    pub utilization_percent: f64,
    pub budgets: Vec<BudgetReport>,
}

/// Current-month rollup. The overall "total budget" figure is the wallet
/// balance, not the sum of limits — reproduced as specified.
pub async fn get_budget_summary(
    pool: &DatabasePool,
    user_id: &str,
) -> Result<BudgetSummary, ServiceError> {
    let month = current_month();
    let budgets = get_user_budgets(pool, user_id, &month).await?;
    let wallet = ledger::get_wallet(pool, user_id).await?;

    let total_spent = round2(budgets.iter().map(|b| b.spent).sum());
    let utilization_percent = if wallet.balance > 0.0 {
        round2(total_spent / wallet.balance * 100.0)
    } else {
        0.0
    };

    Ok(BudgetSummary {
        month,
        total_budget: wallet.balance,
        total_spent,
        remaining: round2(wallet.balance - total_spent),
        utilization_percent,
        budgets,
    })
}

/// Upsert a (user, month, category) spend limit.
pub async fn set_budget(
    pool: &DatabasePool,
    user_id: &str,
    month: &str,
    category: &str,
    limit_amount: f64,
) -> Result<Budget, ServiceError> {
    let month = parse_month(month).map_err(ServiceError::Validation)?;
    let category = Category::from_str(category).ok_or_else(|| {
        ServiceError::validation(format!(
            "Invalid category '{}'; expected one of: {}",
            category,
            Category::ALL.map(|c| c.as_str()).join(", ")
        ))
    })?;
    if !is_valid_amount(limit_amount) {
        return Err(ServiceError::validation(
            "Budget limit must be a positive number",
        ));
    }
    let limit_amount = round2(limit_amount);

    let id = sqlx::query_scalar::<_, i64>(
        r#"
        INSERT INTO budgets (user_id, month, category, limit_amount, created_at)
        VALUES (?, ?, ?, ?, ?)
        ON CONFLICT(user_id, month, category) DO UPDATE SET limit_amount = excluded.limit_amount
        RETURNING id
        "#,
    )
    .bind(user_id)
    .bind(&month)
    .bind(category)
    .bind(limit_amount)
    .bind(Utc::now())
    .fetch_one(&**pool)
    .await?;

    Ok(Budget {
        id,
        user_id: user_id.to_string(),
        month,
        category,
        limit_amount,
    })
}

/// Delete one of the caller's budgets.
pub async fn delete_budget(
    pool: &DatabasePool,
    user_id: &str,
    budget_id: i64,
) -> Result<(), ServiceError> {
    let result = sqlx::query("DELETE FROM budgets WHERE id = ? AND user_id = ?")
        .bind(budget_id)
        .bind(user_id)
        .execute(&**pool)
        .await?;
    if result.rows_affected() == 0 {
        return Err(ServiceError::NotFound("Budget"));
    }
    Ok(())
}
