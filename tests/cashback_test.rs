// Cashback engine tests: rule matching, caps, validity windows, first-time
// gating and the award records chained to the originating payment.

use chrono::{Duration, Utc};

use wallet_api::services::{cashback, ledger};

mod test_helpers;
use test_helpers::*;

async fn pay(pool: &wallet_api::database::DatabasePool, user: &str, merchant: &str, amount: f64) -> String {
    ledger::process_payment(pool, user, merchant, amount, Default::default())
        .await
        .unwrap()
        .transaction_id
}

#[tokio::test]
async fn test_percent_rule_awards_and_credits() {
    let pool = setup_test_db().await;
    let u1 = create_test_user(&pool, "U1", 250.0).await;
    let m1 = create_test_merchant(&pool, "Cafe", "cafe").await;
    create_test_rule(&pool, "cafe-5", "cafe", "percent", Some(0.05), None, Some(20.0), false, None, None, true).await;

    let tx_id = pay(&pool, &u1, &m1, 20.0).await;
    let outcome = cashback::apply_cashback(&pool, &u1, &m1, 20.0, &tx_id)
        .await
        .unwrap();

    assert_eq!(outcome.total, 1.0);
    assert_eq!(outcome.awards.len(), 1);
    assert!(outcome.message.is_none());
    // 250 - 20 payment + 1 cashback
    assert_eq!(get_balance(&pool, &u1).await, 231.0);

    let award_tx = ledger::get_transaction(&pool, &outcome.awards[0].transaction_id)
        .await
        .unwrap();
    assert_eq!(award_tx.metadata.rule_id.as_deref(), Some("cafe-5"));
    assert_eq!(
        award_tx.metadata.original_transaction_id.as_deref(),
        Some(tx_id.as_str())
    );
}

#[tokio::test]
async fn test_percent_rule_clamped_to_cap() {
    let pool = setup_test_db().await;
    let u1 = create_test_user(&pool, "U1", 2000.0).await;
    let m1 = create_test_merchant(&pool, "Cafe", "cafe").await;
    create_test_rule(&pool, "cafe-5", "cafe", "percent", Some(0.05), None, Some(20.0), false, None, None, true).await;

    let tx_id = pay(&pool, &u1, &m1, 1000.0).await;
    let outcome = cashback::apply_cashback(&pool, &u1, &m1, 1000.0, &tx_id)
        .await
        .unwrap();

    // 5% of 1000 is 50, clamped to the 20 cap
    assert_eq!(outcome.total, 20.0);
}

#[tokio::test]
async fn test_flat_rule_ignores_payment_size() {
    let pool = setup_test_db().await;
    let u1 = create_test_user(&pool, "U1", 100.0).await;
    let m1 = create_test_merchant(&pool, "Shop", "shopping").await;
    create_test_rule(&pool, "flat-any", "any", "flat", None, Some(2.0), None, false, None, None, true).await;

    let tx_id = pay(&pool, &u1, &m1, 55.0).await;
    let outcome = cashback::apply_cashback(&pool, &u1, &m1, 55.0, &tx_id)
        .await
        .unwrap();
    assert_eq!(outcome.total, 2.0);
}

#[tokio::test]
async fn test_first_time_only_rule_fires_once() {
    let pool = setup_test_db().await;
    let u1 = create_test_user(&pool, "U1", 500.0).await;
    let m1 = create_test_merchant(&pool, "Cafe", "cafe").await;
    create_test_rule(&pool, "welcome", "any", "flat", None, Some(2.0), None, true, None, None, true).await;

    let tx1 = pay(&pool, &u1, &m1, 10.0).await;
    let first = cashback::apply_cashback(&pool, &u1, &m1, 10.0, &tx1).await.unwrap();
    assert_eq!(first.total, 2.0);

    // Replay the same payment shape for the same user: no second award
    let tx2 = pay(&pool, &u1, &m1, 10.0).await;
    let second = cashback::apply_cashback(&pool, &u1, &m1, 10.0, &tx2).await.unwrap();
    assert_eq!(second.total, 0.0);
    assert!(second.awards.is_empty());
    assert!(second.message.is_some());

    assert_eq!(count_transactions(&pool, &u1, "cashback").await, 1);
}

#[tokio::test]
async fn test_inactive_and_expired_rules_are_skipped() {
    let pool = setup_test_db().await;
    let u1 = create_test_user(&pool, "U1", 100.0).await;
    let m1 = create_test_merchant(&pool, "Cafe", "cafe").await;

    let yesterday = (Utc::now() - Duration::days(1)).date_naive();
    let last_week = (Utc::now() - Duration::days(7)).date_naive();
    create_test_rule(&pool, "inactive", "cafe", "percent", Some(0.5), None, None, false, None, None, false).await;
    create_test_rule(&pool, "expired", "cafe", "percent", Some(0.5), None, None, false, Some(last_week), Some(yesterday), true).await;

    let tx_id = pay(&pool, &u1, &m1, 10.0).await;
    let outcome = cashback::apply_cashback(&pool, &u1, &m1, 10.0, &tx_id)
        .await
        .unwrap();

    assert_eq!(outcome.total, 0.0);
    assert!(outcome.message.is_some());
    assert_eq!(get_balance(&pool, &u1).await, 90.0);
}

#[tokio::test]
async fn test_category_mismatch_yields_zero_without_error() {
    let pool = setup_test_db().await;
    let u1 = create_test_user(&pool, "U1", 100.0).await;
    let m1 = create_test_merchant(&pool, "Metro", "transport").await;
    create_test_rule(&pool, "cafe-5", "cafe", "percent", Some(0.05), None, None, false, None, None, true).await;

    let tx_id = pay(&pool, &u1, &m1, 10.0).await;
    let outcome = cashback::apply_cashback(&pool, &u1, &m1, 10.0, &tx_id)
        .await
        .unwrap();
    assert_eq!(outcome.total, 0.0);
    assert!(outcome.message.is_some());
}

#[tokio::test]
async fn test_multiple_rules_each_award_separately() {
    let pool = setup_test_db().await;
    let u1 = create_test_user(&pool, "U1", 100.0).await;
    let m1 = create_test_merchant(&pool, "Cafe", "cafe").await;
    create_test_rule(&pool, "cafe-5", "cafe", "percent", Some(0.05), None, None, false, None, None, true).await;
    create_test_rule(&pool, "flat-any", "any", "flat", None, Some(2.0), None, false, None, None, true).await;

    let tx_id = pay(&pool, &u1, &m1, 20.0).await;
    let outcome = cashback::apply_cashback(&pool, &u1, &m1, 20.0, &tx_id)
        .await
        .unwrap();

    assert_eq!(outcome.awards.len(), 2);
    assert_eq!(outcome.total, 3.0);
    assert_eq!(count_transactions(&pool, &u1, "cashback").await, 2);
    // 100 - 20 + 1 + 2
    assert_eq!(get_balance(&pool, &u1).await, 83.0);
}

#[tokio::test]
async fn test_campaign_listing_describes_active_rules() {
    let pool = setup_test_db().await;
    create_test_rule(&pool, "cafe-5", "cafe", "percent", Some(0.05), None, Some(20.0), false, None, None, true).await;
    create_test_rule(&pool, "hidden", "cafe", "percent", Some(0.5), None, None, false, None, None, false).await;

    let campaigns = cashback::list_active_campaigns(&pool).await.unwrap();
    assert_eq!(campaigns.len(), 1);
    let description = campaigns[0]["description"].as_str().unwrap();
    assert!(description.contains("5%"), "got: {}", description);
    assert!(description.contains("cafe"), "got: {}", description);
}
