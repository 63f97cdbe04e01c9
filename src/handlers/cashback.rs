use axum::{extract::State, Json};

use crate::handlers::{service_failure, ApiError, ApiResponse};
use crate::services::cashback;
use crate::AppState;

/// Public listing of active cashback campaigns with readable descriptions.
pub async fn get_campaigns(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<serde_json::Value>>>, ApiError> {
    let campaigns = cashback::list_active_campaigns(&state.db_pool)
        .await
        .map_err(service_failure)?;
    Ok(ApiResponse::ok(campaigns))
}
