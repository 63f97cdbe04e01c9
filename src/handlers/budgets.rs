use axum::{
    extract::{Extension, Path, Query, State},
    Json,
};
use serde::Deserialize;

use crate::handlers::{service_failure, ApiError, ApiResponse};
use crate::middleware::auth::AuthUser;
use crate::services::budgets::{self, Budget, BudgetReport, BudgetSummary};
use crate::utils::date::current_month;
use crate::AppState;

#[derive(Deserialize)]
pub struct BudgetParams {
    pub month: Option<String>,
}

/// Spend vs. limit per configured category; defaults to the current month.
pub async fn get_budgets(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Query(params): Query<BudgetParams>,
) -> Result<Json<ApiResponse<Vec<BudgetReport>>>, ApiError> {
    let month = params.month.unwrap_or_else(current_month);
    let reports = budgets::get_user_budgets(&state.db_pool, &auth_user.user_id, &month)
        .await
        .map_err(service_failure)?;
    Ok(ApiResponse::ok(reports))
}

pub async fn get_budget_summary(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
) -> Result<Json<ApiResponse<BudgetSummary>>, ApiError> {
    let summary = budgets::get_budget_summary(&state.db_pool, &auth_user.user_id)
        .await
        .map_err(service_failure)?;
    Ok(ApiResponse::ok(summary))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetBudgetRequest {
    pub month: String,
    pub category: String,
    pub limit_amount: f64,
}

pub async fn set_budget(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Json(payload): Json<SetBudgetRequest>,
) -> Result<Json<ApiResponse<Budget>>, ApiError> {
    let budget = budgets::set_budget(
        &state.db_pool,
        &auth_user.user_id,
        &payload.month,
        &payload.category,
        payload.limit_amount,
    )
    .await
    .map_err(service_failure)?;
    Ok(ApiResponse::ok(budget))
}

pub async fn delete_budget(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path(budget_id): Path<i64>,
) -> Result<Json<ApiResponse<serde_json::Value>>, ApiError> {
    budgets::delete_budget(&state.db_pool, &auth_user.user_id, budget_id)
        .await
        .map_err(service_failure)?;
    Ok(ApiResponse::ok_with_message(
        serde_json::json!({ "id": budget_id }),
        "Budget deleted",
    ))
}
