//! Account registration endpoint.

use axum::{extract::Extension, http::StatusCode, response::IntoResponse, Json};
use serde::Deserialize;
use std::sync::Arc;
use utoipa::ToSchema;

use crate::api::handlers::{error_response, valid_email, valid_password, GENERIC_ACK};
use crate::auth::account::normalize_email;
use crate::auth::AuthService;

#[derive(ToSchema, Deserialize)]
pub struct RegisterRequest {
    email: String,
    password: String,
}

impl std::fmt::Debug for RegisterRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegisterRequest")
            .field("email", &self.email)
            .field("password", &"***")
            .finish()
    }
}

/// Create an unverified account and trigger the verification email.
///
/// The 201 body is the same generic acknowledgement used by resend, so the
/// response never confirms that an address was new.
#[utoipa::path(
    post,
    path = "/v1/auth/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Registration accepted", body = String),
        (status = 400, description = "Invalid email or password", body = String),
        (status = 409, description = "Account with this email already exists", body = String)
    ),
    tag = "auth"
)]
pub async fn register(
    service: Extension<Arc<AuthService>>,
    payload: Option<Json<RegisterRequest>>,
) -> impl IntoResponse {
    let request: RegisterRequest = match payload {
        Some(Json(payload)) => payload,
        None => return (StatusCode::BAD_REQUEST, "Missing payload".to_string()),
    };

    let email = normalize_email(&request.email);

    if !valid_email(&email) {
        return (StatusCode::BAD_REQUEST, "Invalid email".to_string());
    }

    if !valid_password(&request.password) {
        return (StatusCode::BAD_REQUEST, "Invalid password".to_string());
    }

    match service.register(&email, &request.password).await {
        Ok(()) => (StatusCode::CREATED, GENERIC_ACK.to_string()),
        Err(err) => error_response(&err),
    }
}
