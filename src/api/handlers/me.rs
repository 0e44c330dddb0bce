//! Authenticated self-service endpoint.
//!
//! Flow Overview:
//! 1) Authenticate via the `Authorization: Bearer` session token.
//! 2) Resolve the current account from the credential store.
//! 3) Return the profile fields a session is allowed to see.

use axum::{
    Json,
    extract::Extension,
    http::{HeaderMap, StatusCode, header::AUTHORIZATION},
    response::IntoResponse,
};
use serde::Serialize;
use std::sync::Arc;
use tracing::error;
use utoipa::ToSchema;

use crate::auth::{Account, AuthError, AuthService};

#[derive(Debug, Serialize, ToSchema)]
pub struct MeResponse {
    pub email: String,
    pub role: String,
}

#[utoipa::path(
    get,
    path = "/v1/me",
    responses(
        (status = 200, description = "Return the authenticated account profile.", body = MeResponse),
        (status = 401, description = "Missing or invalid session token."),
    ),
    tag = "me"
)]
pub async fn me(headers: HeaderMap, service: Extension<Arc<AuthService>>) -> impl IntoResponse {
    let account = match require_session(&headers, &service).await {
        Ok(account) => account,
        Err(status) => return status.into_response(),
    };

    let response = MeResponse {
        email: account.email,
        role: account.role,
    };
    (StatusCode::OK, Json(response)).into_response()
}

/// Resolve the session on `Authorization: Bearer <token>`.
///
/// Every rejection path is a bare 401; the reason a token was refused is
/// not surfaced to the caller.
async fn require_session(
    headers: &HeaderMap,
    service: &AuthService,
) -> Result<Account, StatusCode> {
    let Some(token) = bearer_token(headers) else {
        return Err(StatusCode::UNAUTHORIZED);
    };

    match service.authenticate(token).await {
        Ok((account, _claims)) => Ok(account),
        Err(AuthError::Internal(detail)) => {
            error!("Failed to resolve session: {detail:?}");
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
        Err(_) => Err(StatusCode::UNAUTHORIZED),
    }
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
}
