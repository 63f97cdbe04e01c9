use axum::{
    extract::{Extension, Path, Query, State},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::handlers::{service_failure, ApiError, ApiResponse};
use crate::middleware::auth::AuthUser;
use crate::services::cashback::{self, CashbackOutcome};
use crate::services::ledger::{
    self, HistoryPage, PaymentResult, QrInfo, QrPaymentResult, TopUpResult, TransferResult, Wallet,
};
use crate::AppState;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferRequest {
    pub to_user_id: String,
    pub amount: f64,
}

pub async fn post_transfer(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Json(payload): Json<TransferRequest>,
) -> Result<Json<ApiResponse<TransferResult>>, ApiError> {
    let result = ledger::transfer(
        &state.db_pool,
        &auth_user.user_id,
        &payload.to_user_id,
        payload.amount,
    )
    .await
    .map_err(service_failure)?;
    Ok(ApiResponse::ok(result))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRequest {
    pub merchant_id: String,
    pub amount: f64,
}

#[derive(Serialize)]
pub struct PaymentWithCashback {
    #[serde(flatten)]
    pub payment: PaymentResult,
    pub cashback: CashbackOutcome,
}

/// Merchant payment. Cashback evaluation is a separate step the handler
/// invokes after the payment transaction commits.
pub async fn post_payment(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Json(payload): Json<PaymentRequest>,
) -> Result<Json<ApiResponse<PaymentWithCashback>>, ApiError> {
    let payment = ledger::process_payment(
        &state.db_pool,
        &auth_user.user_id,
        &payload.merchant_id,
        payload.amount,
        Default::default(),
    )
    .await
    .map_err(service_failure)?;

    let cashback = cashback::apply_cashback(
        &state.db_pool,
        &auth_user.user_id,
        &payment.merchant_id,
        payment.amount,
        &payment.transaction_id,
    )
    .await
    .map_err(service_failure)?;

    Ok(ApiResponse::ok(PaymentWithCashback { payment, cashback }))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopUpRequest {
    pub amount: f64,
}

pub async fn post_topup(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Json(payload): Json<TopUpRequest>,
) -> Result<Json<ApiResponse<TopUpResult>>, ApiError> {
    let result = ledger::top_up_wallet(&state.db_pool, &auth_user.user_id, payload.amount)
        .await
        .map_err(service_failure)?;
    Ok(ApiResponse::ok(result))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QrPaymentRequest {
    /// JSON string or object with qr_id, merchant_id, amount, optional ts.
    pub qr_data: serde_json::Value,
}

#[derive(Serialize)]
pub struct QrPaymentWithCashback {
    #[serde(flatten)]
    pub payment: QrPaymentResult,
    pub cashback: CashbackOutcome,
}

/// QR payment: validated payload delegates to the payment path, and cashback
/// is chained automatically.
pub async fn post_qr_payment(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Json(payload): Json<QrPaymentRequest>,
) -> Result<Json<ApiResponse<QrPaymentWithCashback>>, ApiError> {
    let qr_payload = ledger::parse_qr_payload(&payload.qr_data).map_err(service_failure)?;
    let payment = ledger::process_qr_payment(&state.db_pool, &auth_user.user_id, qr_payload)
        .await
        .map_err(service_failure)?;

    let cashback = cashback::apply_cashback(
        &state.db_pool,
        &auth_user.user_id,
        &payment.payment.merchant_id,
        payment.payment.amount,
        &payment.payment.transaction_id,
    )
    .await
    .map_err(service_failure)?;

    Ok(ApiResponse::ok(QrPaymentWithCashback { payment, cashback }))
}

pub async fn get_balance(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
) -> Result<Json<ApiResponse<Wallet>>, ApiError> {
    let wallet = ledger::get_wallet(&state.db_pool, &auth_user.user_id)
        .await
        .map_err(service_failure)?;
    Ok(ApiResponse::ok(wallet))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryParams {
    pub page: Option<u32>,
    pub page_size: Option<u32>,
}

pub async fn get_history(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Query(params): Query<HistoryParams>,
) -> Result<Json<ApiResponse<HistoryPage>>, ApiError> {
    let history = ledger::transaction_history(
        &state.db_pool,
        &auth_user.user_id,
        params.page,
        params.page_size,
    )
    .await
    .map_err(service_failure)?;
    Ok(ApiResponse::ok(history))
}

/// Public QR code lookup (no auth), resolving the demo code directory.
pub async fn get_qr_info(
    State(state): State<AppState>,
    Path(qr_id): Path<String>,
) -> Result<Json<ApiResponse<QrInfo>>, ApiError> {
    let info = ledger::qr_info(&state.db_pool, &qr_id)
        .await
        .map_err(service_failure)?;
    Ok(ApiResponse::ok(info))
}
