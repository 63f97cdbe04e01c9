//! Demo digital-wallet backend: users hold balances, transfer funds, pay
//! merchants (with rule-based cashback), split bills and track category
//! budgets. CRUD over HTTP on SQLite; every money movement is one atomic
//! balance+record bundle in the ledger service.

pub mod config;
pub mod database;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod services;
pub mod utils;

use std::sync::Arc;
use std::time::Duration;

use axum::{
    routing::{delete, get, post},
    Router,
};

pub use config::Config;
use database::DatabasePool;
use middleware::SessionStore;

#[derive(Clone)]
pub struct AppState {
    pub db_pool: DatabasePool,
    pub config: Arc<Config>,
    pub sessions: SessionStore,
}

impl AppState {
    pub fn new(db_pool: DatabasePool, config: Arc<Config>) -> Self {
        let sessions = SessionStore::new(Duration::from_secs(config.session_ttl_secs));
        Self {
            db_pool,
            config,
            sessions,
        }
    }
}

/// Build the API router with auth, CORS and trace layers applied.
pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/payments/transfer", post(handlers::post_transfer))
        .route("/payments/payment", post(handlers::post_payment))
        .route("/payments/topup", post(handlers::post_topup))
        .route("/payments/qr-payment", post(handlers::post_qr_payment))
        .route("/payments/balance", get(handlers::get_balance))
        .route("/payments/history", get(handlers::get_history))
        .route("/payments/qr-info/:qr_id", get(handlers::get_qr_info))
        .route("/splits", get(handlers::get_splits))
        .route("/splits/equal", post(handlers::create_equal_split))
        .route("/splits/weighted", post(handlers::create_weighted_split))
        .route("/splits/:split_id/settle", post(handlers::settle_split))
        .route("/splits/:split_id", delete(handlers::cancel_split))
        .route("/cashback/campaigns", get(handlers::get_campaigns))
        .route(
            "/budgets",
            get(handlers::get_budgets).post(handlers::set_budget),
        )
        .route("/budgets/summary", get(handlers::get_budget_summary))
        .route("/budgets/:budget_id", delete(handlers::delete_budget))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::auth::auth_middleware,
        ))
        .layer(tower_http::cors::CorsLayer::permissive())
        .layer(tower_http::trace::TraceLayer::new_for_http())
        .with_state(state)
}

async fn health_check() -> &'static str {
    "OK"
}
