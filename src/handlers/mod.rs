//! Thin request/response marshaling over the service layer. Every endpoint
//! answers with the `{success, message?, data?}` envelope; domain failures
//! map to 4xx and storage failures to a generic 500.

use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;

use crate::services::ServiceError;

pub mod budgets;
pub mod cashback;
pub mod payments;
pub mod splits;

pub use budgets::{delete_budget, get_budgets, get_budget_summary, set_budget, SetBudgetRequest};
pub use cashback::get_campaigns;
pub use payments::{
    get_balance, get_history, get_qr_info, post_payment, post_qr_payment, post_topup,
    post_transfer, PaymentRequest, QrPaymentRequest, TopUpRequest, TransferRequest,
};
pub use splits::{
    cancel_split, create_equal_split, create_weighted_split, get_splits, settle_split,
    EqualSplitRequest, WeightedSplitRequest,
};

#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(data: T) -> Json<Self> {
        Json(Self {
            success: true,
            message: None,
            data: Some(data),
        })
    }

    pub fn ok_with_message(data: T, message: impl Into<String>) -> Json<Self> {
        Json(Self {
            success: true,
            message: Some(message.into()),
            data: Some(data),
        })
    }
}

pub type ApiError = (StatusCode, Json<ApiResponse<serde_json::Value>>);

pub fn failure(status: StatusCode, message: impl Into<String>) -> ApiError {
    (
        status,
        Json(ApiResponse {
            success: false,
            message: Some(message.into()),
            data: None,
        }),
    )
}

/// Map a service error onto the response envelope. Only `Database` is
/// treated as unexpected; it is logged and hidden behind a generic message.
pub fn service_failure(err: ServiceError) -> ApiError {
    match &err {
        ServiceError::Validation(_) | ServiceError::InsufficientFunds { .. } => {
            failure(StatusCode::BAD_REQUEST, err.to_string())
        }
        ServiceError::NotFound(_) => failure(StatusCode::NOT_FOUND, err.to_string()),
        ServiceError::Forbidden(_) => failure(StatusCode::FORBIDDEN, err.to_string()),
        ServiceError::Conflict(_) => failure(StatusCode::CONFLICT, err.to_string()),
        ServiceError::Database(e) => {
            tracing::error!("Storage failure: {:?}", e);
            failure(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
        }
    }
}
