//! Login endpoint minting session tokens.

use axum::{extract::Extension, http::StatusCode, response::IntoResponse, Json};
use chrono::SecondsFormat;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;

use crate::api::handlers::error_response;
use crate::auth::AuthService;

#[derive(ToSchema, Deserialize)]
pub struct LoginRequest {
    email: String,
    password: String,
}

impl std::fmt::Debug for LoginRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginRequest")
            .field("email", &self.email)
            .field("password", &"***")
            .finish()
    }
}

#[derive(ToSchema, Serialize)]
pub struct LoginResponse {
    token: String,
    role: String,
    expires_at: String,
}

/// Exchange credentials for a signed session token.
///
/// A 401 never says which part of the credential pair was wrong; only the
/// unverified-email case gets its own status because it is actionable.
#[utoipa::path(
    post,
    path = "/v1/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Session token minted", body = LoginResponse),
        (status = 401, description = "Credentials rejected", body = String),
        (status = 403, description = "Email not verified yet", body = String)
    ),
    tag = "auth"
)]
pub async fn login(
    service: Extension<Arc<AuthService>>,
    payload: Option<Json<LoginRequest>>,
) -> impl IntoResponse {
    let request: LoginRequest = match payload {
        Some(Json(payload)) => payload,
        None => return (StatusCode::BAD_REQUEST, "Missing payload".to_string()).into_response(),
    };

    match service.login(&request.email, &request.password).await {
        Ok(session) => {
            let response = LoginResponse {
                token: session.token,
                role: session.role,
                expires_at: session
                    .expires_at
                    .to_rfc3339_opts(SecondsFormat::Secs, true),
            };
            (StatusCode::OK, Json(response)).into_response()
        }
        Err(err) => error_response(&err).into_response(),
    }
}
