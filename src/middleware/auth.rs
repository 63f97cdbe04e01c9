//! Placeholder authentication: the bearer token IS the user id. The
//! middleware resolves it to a known user (through the TTL session cache)
//! and stashes an `AuthUser` extension for handlers. Not a real scheme;
//! real authn/authz is out of scope for this demo.

use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};

use crate::AppState;

#[derive(Clone, Debug)]
pub struct AuthUser {
    pub user_id: String,
    pub name: String,
}

/// Endpoints that work without a bearer token.
fn is_public_path(path: &str) -> bool {
    path == "/health"
        || path == "/cashback/campaigns"
        || path.starts_with("/payments/qr-info/")
}

pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    if is_public_path(req.uri().path()) {
        return Ok(next.run(req).await);
    }

    fn auth_declined_response() -> Response {
        let body = serde_json::json!({
            "success": false,
            "message": "Authentication required"
        });
        (StatusCode::UNAUTHORIZED, Json(body)).into_response()
    }

    let auth_header = match req.headers().get(AUTHORIZATION).and_then(|h| h.to_str().ok()) {
        Some(h) => h,
        None => return Ok(auth_declined_response()),
    };
    if !auth_header.starts_with("Bearer ") {
        return Ok(auth_declined_response());
    }
    let token = &auth_header[7..];

    let auth_user = match state.sessions.get(token).await {
        Some(user) => user,
        None => {
            let row = sqlx::query_as::<_, (String, String)>(
                "SELECT id, name FROM users WHERE id = ?",
            )
            .bind(token)
            .fetch_optional(&*state.db_pool)
            .await
            .map_err(|e| {
                tracing::error!("Error resolving bearer token: {:?}", e);
                StatusCode::INTERNAL_SERVER_ERROR
            })?;

            let (user_id, name) = match row {
                Some(r) => r,
                None => return Ok(auth_declined_response()),
            };
            let user = AuthUser { user_id, name };
            state.sessions.insert(token.to_string(), user.clone()).await;
            user
        }
    };

    req.extensions_mut().insert(auth_user);
    Ok(next.run(req).await)
}
