//! Email verification endpoints.

use axum::{extract::Extension, http::StatusCode, response::IntoResponse, Json};
use serde::Deserialize;
use std::sync::Arc;
use tracing::error;
use utoipa::ToSchema;

use crate::api::handlers::{error_response, valid_email, GENERIC_ACK};
use crate::auth::account::normalize_email;
use crate::auth::AuthService;

#[derive(ToSchema, Deserialize)]
pub struct VerifyEmailRequest {
    token: String,
}

#[derive(ToSchema, Deserialize)]
pub struct ResendVerificationRequest {
    email: String,
}

/// Consume a verification link token and activate the address.
///
/// Replay of a consumed token and a genuinely expired token get distinct
/// statuses; forged tokens are indistinguishable from never-issued ones.
#[utoipa::path(
    post,
    path = "/v1/auth/verify-email",
    request_body = VerifyEmailRequest,
    responses(
        (status = 204, description = "Email verified"),
        (status = 400, description = "Invalid or already used token", body = String),
        (status = 410, description = "Token expired", body = String)
    ),
    tag = "auth"
)]
pub async fn verify_email(
    service: Extension<Arc<AuthService>>,
    payload: Option<Json<VerifyEmailRequest>>,
) -> impl IntoResponse {
    let request: VerifyEmailRequest = match payload {
        Some(Json(payload)) => payload,
        None => return (StatusCode::BAD_REQUEST, "Missing payload".to_string()).into_response(),
    };

    let token = request.token.trim();
    if token.is_empty() {
        return (StatusCode::BAD_REQUEST, "Missing token".to_string()).into_response();
    }

    match service.verify_email(token).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(err) => error_response(&err).into_response(),
    }
}

/// Resend a verification email (always 202 to avoid user enumeration).
#[utoipa::path(
    post,
    path = "/v1/auth/resend-verification",
    request_body = ResendVerificationRequest,
    responses(
        (status = 202, description = "Resend accepted", body = String)
    ),
    tag = "auth"
)]
pub async fn resend_verification(
    service: Extension<Arc<AuthService>>,
    payload: Option<Json<ResendVerificationRequest>>,
) -> impl IntoResponse {
    let request: ResendVerificationRequest = match payload {
        Some(Json(payload)) => payload,
        None => return (StatusCode::BAD_REQUEST, "Missing payload".to_string()).into_response(),
    };

    let email = normalize_email(&request.email);
    if !valid_email(&email) {
        // Malformed addresses get the same acknowledgement as real ones.
        return (StatusCode::ACCEPTED, GENERIC_ACK.to_string()).into_response();
    }

    if let Err(err) = service.resend_verification(&email).await {
        // Keep the response opaque even when the backend fails.
        error!("Failed to resend verification: {err:?}");
    }

    (StatusCode::ACCEPTED, GENERIC_ACK.to_string()).into_response()
}
