// Budget aggregator tests: limit CRUD, derived spend rollup and the
// wallet-balance-denominated summary.

use wallet_api::services::{budgets, ledger, ServiceError};
use wallet_api::utils::date::current_month;

mod test_helpers;
use test_helpers::*;

async fn pay(
    pool: &wallet_api::database::DatabasePool,
    user: &str,
    merchant: &str,
    amount: f64,
) {
    ledger::process_payment(pool, user, merchant, amount, Default::default())
        .await
        .unwrap();
}

#[tokio::test]
async fn test_set_budget_upserts_on_same_key() {
    let pool = setup_test_db().await;
    let u1 = create_test_user(&pool, "U1", 100.0).await;

    let first = budgets::set_budget(&pool, &u1, "2026-08", "cafe", 100.0).await.unwrap();
    let second = budgets::set_budget(&pool, &u1, "2026-08", "cafe", 150.0).await.unwrap();

    assert_eq!(first.id, second.id);
    assert_eq!(second.limit_amount, 150.0);

    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM budgets WHERE user_id = ?")
        .bind(&u1)
        .fetch_one(&*pool)
        .await
        .unwrap();
    assert_eq!(count, 1);
}

#[tokio::test]
async fn test_set_budget_validates_inputs() {
    let pool = setup_test_db().await;
    let u1 = create_test_user(&pool, "U1", 100.0).await;

    let err = budgets::set_budget(&pool, &u1, "2026-08", "jetskis", 100.0).await.unwrap_err();
    assert!(matches!(err, ServiceError::Validation(_)));

    let err = budgets::set_budget(&pool, &u1, "August", "cafe", 100.0).await.unwrap_err();
    assert!(matches!(err, ServiceError::Validation(_)));

    let err = budgets::set_budget(&pool, &u1, "2026-08", "cafe", 0.0).await.unwrap_err();
    assert!(matches!(err, ServiceError::Validation(_)));
}

#[tokio::test]
async fn test_fresh_budget_reports_zero_spend() {
    let pool = setup_test_db().await;
    let u1 = create_test_user(&pool, "U1", 100.0).await;

    let month = current_month();
    budgets::set_budget(&pool, &u1, &month, "cafe", 100.0).await.unwrap();

    // No payments yet: the rollup must still produce a report, not an error.
    let reports = budgets::get_user_budgets(&pool, &u1, &month).await.unwrap();
    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0].spent, 0.0);
    assert_eq!(reports[0].remaining, 100.0);
    assert_eq!(reports[0].percentage, 0.0);
    assert_eq!(serde_json::to_value(reports[0].status).unwrap(), "good");

    let summary = budgets::get_budget_summary(&pool, &u1).await.unwrap();
    assert_eq!(summary.total_spent, 0.0);
}

#[tokio::test]
async fn test_spend_is_derived_from_matching_payments_only() {
    let pool = setup_test_db().await;
    let u1 = create_test_user(&pool, "U1", 500.0).await;
    let u2 = create_test_user(&pool, "U2", 500.0).await;
    let cafe = create_test_merchant(&pool, "Cafe", "cafe").await;
    let grocer = create_test_merchant(&pool, "GreenMart", "groceries").await;

    let month = current_month();
    budgets::set_budget(&pool, &u1, &month, "cafe", 100.0).await.unwrap();

    pay(&pool, &u1, &cafe, 30.0).await;
    pay(&pool, &u1, &grocer, 20.0).await; // different category
    pay(&pool, &u2, &cafe, 40.0).await; // different user
    ledger::top_up_wallet(&pool, &u1, 10.0).await.unwrap(); // not a payment

    let reports = budgets::get_user_budgets(&pool, &u1, &month).await.unwrap();
    assert_eq!(reports.len(), 1);
    let report = &reports[0];
    assert_eq!(report.spent, 30.0);
    assert_eq!(report.remaining, 70.0);
    assert_eq!(report.percentage, 30.0);
}

#[tokio::test]
async fn test_health_tags_at_default_thresholds() {
    let pool = setup_test_db().await;
    let u1 = create_test_user(&pool, "U1", 1000.0).await;
    let cafe = create_test_merchant(&pool, "Cafe", "cafe").await;
    let grocer = create_test_merchant(&pool, "GreenMart", "groceries").await;
    let metro = create_test_merchant(&pool, "Metro", "transport").await;

    let month = current_month();
    budgets::set_budget(&pool, &u1, &month, "cafe", 100.0).await.unwrap();
    budgets::set_budget(&pool, &u1, &month, "groceries", 100.0).await.unwrap();
    budgets::set_budget(&pool, &u1, &month, "transport", 100.0).await.unwrap();

    pay(&pool, &u1, &cafe, 50.0).await; // 50% -> good
    pay(&pool, &u1, &grocer, 85.0).await; // 85% -> warning
    pay(&pool, &u1, &metro, 99.0).await; // 99% -> danger

    let reports = budgets::get_user_budgets(&pool, &u1, &month).await.unwrap();
    let status_of = |category: &str| {
        serde_json::to_value(
            reports
                .iter()
                .find(|r| r.category.as_str() == category)
                .unwrap()
                .status,
        )
        .unwrap()
    };
    assert_eq!(status_of("cafe"), "good");
    assert_eq!(status_of("groceries"), "warning");
    assert_eq!(status_of("transport"), "danger");
}

#[tokio::test]
async fn test_summary_uses_wallet_balance_as_total_budget() {
    let pool = setup_test_db().await;
    let u1 = create_test_user(&pool, "U1", 500.0).await;
    let cafe = create_test_merchant(&pool, "Cafe", "cafe").await;

    let month = current_month();
    budgets::set_budget(&pool, &u1, &month, "cafe", 100.0).await.unwrap();
    pay(&pool, &u1, &cafe, 50.0).await;

    let summary = budgets::get_budget_summary(&pool, &u1).await.unwrap();
    // Denominator is the wallet balance (450 after the payment), not the
    // configured limit sum.
    assert_eq!(summary.total_budget, 450.0);
    assert_eq!(summary.total_spent, 50.0);
    assert_eq!(summary.remaining, 400.0);
    assert_eq!(summary.budgets.len(), 1);
}

#[tokio::test]
async fn test_delete_budget_owner_scoped() {
    let pool = setup_test_db().await;
    let u1 = create_test_user(&pool, "U1", 100.0).await;
    let u2 = create_test_user(&pool, "U2", 100.0).await;

    let budget = budgets::set_budget(&pool, &u1, "2026-08", "cafe", 100.0).await.unwrap();

    // Another user cannot delete it
    let err = budgets::delete_budget(&pool, &u2, budget.id).await.unwrap_err();
    assert!(matches!(err, ServiceError::NotFound(_)));

    budgets::delete_budget(&pool, &u1, budget.id).await.unwrap();
    let err = budgets::delete_budget(&pool, &u1, budget.id).await.unwrap_err();
    assert!(matches!(err, ServiceError::NotFound(_)));
}

#[tokio::test]
async fn test_unknown_month_returns_empty_report() {
    let pool = setup_test_db().await;
    let u1 = create_test_user(&pool, "U1", 100.0).await;

    let reports = budgets::get_user_budgets(&pool, &u1, "1999-01").await.unwrap();
    assert!(reports.is_empty());

    let err = budgets::get_user_budgets(&pool, &u1, "not-a-month").await.unwrap_err();
    assert!(matches!(err, ServiceError::Validation(_)));
}
