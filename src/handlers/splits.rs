use axum::{
    extract::{Extension, Path, State},
    Json,
};
use serde::Deserialize;

use crate::handlers::{service_failure, ApiError, ApiResponse};
use crate::middleware::auth::AuthUser;
use crate::services::splits::{
    self, BillSplit, DebtorWeight, SettlementResult, SplitOverview,
};
use crate::AppState;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EqualSplitRequest {
    pub original_tx_id: String,
    pub debtor_user_ids: Vec<String>,
}

pub async fn create_equal_split(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Json(payload): Json<EqualSplitRequest>,
) -> Result<Json<ApiResponse<Vec<BillSplit>>>, ApiError> {
    let created = splits::create_equal_split(
        &state.db_pool,
        &auth_user.user_id,
        &payload.original_tx_id,
        payload.debtor_user_ids,
    )
    .await
    .map_err(service_failure)?;
    Ok(ApiResponse::ok(created))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeightedSplitRequest {
    pub original_tx_id: String,
    pub debtor_weights: Vec<DebtorWeight>,
}

pub async fn create_weighted_split(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Json(payload): Json<WeightedSplitRequest>,
) -> Result<Json<ApiResponse<Vec<BillSplit>>>, ApiError> {
    let created = splits::create_weighted_split(
        &state.db_pool,
        &auth_user.user_id,
        &payload.original_tx_id,
        payload.debtor_weights,
    )
    .await
    .map_err(service_failure)?;
    Ok(ApiResponse::ok(created))
}

pub async fn get_splits(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
) -> Result<Json<ApiResponse<SplitOverview>>, ApiError> {
    let overview = splits::list_splits(&state.db_pool, &auth_user.user_id)
        .await
        .map_err(service_failure)?;
    Ok(ApiResponse::ok(overview))
}

pub async fn settle_split(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path(split_id): Path<i64>,
) -> Result<Json<ApiResponse<SettlementResult>>, ApiError> {
    let result = splits::settle_bill_split(&state.db_pool, split_id, &auth_user.user_id)
        .await
        .map_err(service_failure)?;
    Ok(ApiResponse::ok(result))
}

pub async fn cancel_split(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path(split_id): Path<i64>,
) -> Result<Json<ApiResponse<BillSplit>>, ApiError> {
    let cancelled = splits::cancel_bill_split(&state.db_pool, split_id, &auth_user.user_id)
        .await
        .map_err(service_failure)?;
    Ok(ApiResponse::ok_with_message(cancelled, "Split cancelled"))
}
