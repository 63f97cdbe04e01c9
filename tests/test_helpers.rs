// Shared helpers: in-memory test database and fixture rows.

#![allow(dead_code)]

use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use sqlx::sqlite::SqlitePoolOptions;
use uuid::Uuid;

use wallet_api::database::DatabasePool;
use wallet_api::{AppState, Config};

pub async fn setup_test_db() -> DatabasePool {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("Failed to open in-memory database");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to run migrations");

    Arc::new(pool)
}

pub fn create_test_app_state(pool: DatabasePool) -> AppState {
    let config = Arc::new(Config::from_env().expect("Failed to load config"));
    AppState::new(pool, config)
}

/// User plus wallet with the given starting balance.
pub async fn create_test_user(pool: &DatabasePool, name: &str, balance: f64) -> String {
    let user_id = create_test_user_without_wallet(pool, name).await;
    sqlx::query("INSERT INTO wallets (user_id, balance, currency, updated_at) VALUES (?, ?, 'USD', ?)")
        .bind(&user_id)
        .bind(balance)
        .bind(Utc::now())
        .execute(&**pool)
        .await
        .expect("Failed to create test wallet");
    user_id
}

pub async fn create_test_user_without_wallet(pool: &DatabasePool, name: &str) -> String {
    let user_id = Uuid::new_v4().to_string();
    let phone = format!("+65{}", &Uuid::new_v4().simple().to_string()[..8]);
    sqlx::query("INSERT INTO users (id, name, phone, created_at) VALUES (?, ?, ?, ?)")
        .bind(&user_id)
        .bind(name)
        .bind(phone)
        .bind(Utc::now())
        .execute(&**pool)
        .await
        .expect("Failed to create test user");
    user_id
}

pub async fn create_test_merchant(pool: &DatabasePool, name: &str, category: &str) -> String {
    let merchant_id = format!("merchant-{}", Uuid::new_v4());
    sqlx::query("INSERT INTO merchants (id, name, category, created_at) VALUES (?, ?, ?, ?)")
        .bind(&merchant_id)
        .bind(name)
        .bind(category)
        .bind(Utc::now())
        .execute(&**pool)
        .await
        .expect("Failed to create test merchant");
    merchant_id
}

#[allow(clippy::too_many_arguments)]
pub async fn create_test_rule(
    pool: &DatabasePool,
    id: &str,
    category: &str,
    rule_type: &str,
    rate: Option<f64>,
    flat_amount: Option<f64>,
    cap: Option<f64>,
    first_time_only: bool,
    valid_from: Option<NaiveDate>,
    valid_until: Option<NaiveDate>,
    active: bool,
) {
    sqlx::query(
        r#"
        INSERT INTO cashback_rules
            (id, name, category, rule_type, rate, flat_amount, cap, first_time_only, valid_from, valid_until, active)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(id)
    .bind(id)
    .bind(category)
    .bind(rule_type)
    .bind(rate)
    .bind(flat_amount)
    .bind(cap)
    .bind(first_time_only)
    .bind(valid_from)
    .bind(valid_until)
    .bind(active)
    .execute(&**pool)
    .await
    .expect("Failed to create test rule");
}

pub async fn create_test_qr_code(pool: &DatabasePool, qr_id: &str, merchant_id: &str, amount: f64) {
    sqlx::query("INSERT INTO qr_codes (qr_id, merchant_id, amount, issued_at) VALUES (?, ?, ?, NULL)")
        .bind(qr_id)
        .bind(merchant_id)
        .bind(amount)
        .execute(&**pool)
        .await
        .expect("Failed to create test QR code");
}

pub async fn get_balance(pool: &DatabasePool, user_id: &str) -> f64 {
    sqlx::query_scalar::<_, f64>("SELECT balance FROM wallets WHERE user_id = ?")
        .bind(user_id)
        .fetch_one(&**pool)
        .await
        .expect("Failed to read balance")
}

pub async fn count_transactions(pool: &DatabasePool, user_id: &str, tx_type: &str) -> i64 {
    sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM transactions WHERE user_id = ? AND type = ?",
    )
    .bind(user_id)
    .bind(tx_type)
    .fetch_one(&**pool)
    .await
    .expect("Failed to count transactions")
}

pub async fn count_all_transactions(pool: &DatabasePool) -> i64 {
    sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM transactions")
        .fetch_one(&**pool)
        .await
        .expect("Failed to count transactions")
}
