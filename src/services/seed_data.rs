//! Demo provisioning: users with wallets, merchants, cashback rules and QR
//! codes. Wallets are created here, alongside their users, outside the
//! runtime ledger core. Skipped when the database already has users.

use chrono::Utc;
use sqlx::SqlitePool;
use uuid::Uuid;

pub async fn seed_dummy_data(pool: &SqlitePool) -> anyhow::Result<()> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
        .fetch_one(pool)
        .await?;
    if count > 0 {
        tracing::info!("Database already has data, skipping seed");
        return Ok(());
    }

    tracing::info!("Seeding demo users, merchants, cashback rules and QR codes...");
    let now = Utc::now();

    let users = [
        ("Alice Tan", "+6591230001", 250.0),
        ("Bob Lim", "+6591230002", 90.0),
        ("Carol Ng", "+6591230003", 120.0),
    ];
    for (name, phone, balance) in users {
        let user_id = Uuid::new_v4().to_string();
        sqlx::query("INSERT INTO users (id, name, phone, created_at) VALUES (?, ?, ?, ?)")
            .bind(&user_id)
            .bind(name)
            .bind(phone)
            .bind(now)
            .execute(pool)
            .await?;
        sqlx::query(
            "INSERT INTO wallets (user_id, balance, currency, updated_at) VALUES (?, ?, 'USD', ?)",
        )
        .bind(&user_id)
        .bind(balance)
        .bind(now)
        .execute(pool)
        .await?;
        tracing::info!(user = name, id = %user_id, "seeded user (use the id as a bearer token)");
    }

    let merchants = [
        ("merchant-beanhouse", "Beanhouse Coffee", "cafe"),
        ("merchant-greenmart", "GreenMart", "groceries"),
        ("merchant-metroline", "Metroline Transit", "transport"),
        ("merchant-pixelplex", "Pixelplex Cinema", "entertainment"),
    ];
    for (id, name, category) in merchants {
        sqlx::query("INSERT INTO merchants (id, name, category, created_at) VALUES (?, ?, ?, ?)")
            .bind(id)
            .bind(name)
            .bind(category)
            .bind(now)
            .execute(pool)
            .await?;
    }

    sqlx::query(
        r#"
        INSERT INTO cashback_rules (id, name, category, rule_type, rate, flat_amount, cap, first_time_only, active)
        VALUES
            ('rule-cafe-5pct', 'Cafe 5%', 'cafe', 'percent', 0.05, NULL, 20.0, 0, 1),
            ('rule-groceries-2pct', 'Groceries 2%', 'groceries', 'percent', 0.02, NULL, 10.0, 0, 1),
            ('rule-welcome-flat', 'Welcome bonus', 'any', 'flat', NULL, 2.0, NULL, 1, 1)
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        INSERT INTO qr_codes (qr_id, merchant_id, amount, issued_at)
        VALUES
            ('qr-beanhouse-latte', 'merchant-beanhouse', 6.50, NULL),
            ('qr-greenmart-basket', 'merchant-greenmart', 42.00, NULL)
        "#,
    )
    .execute(pool)
    .await?;

    tracing::info!("Seed data created");
    Ok(())
}
