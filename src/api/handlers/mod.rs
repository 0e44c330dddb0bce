//! API handlers and shared utilities for Atesti.
//!
//! This module organizes the service's route handlers and provides common
//! functions for request validation and core-error-to-HTTP mapping.

pub mod health;
pub mod login;
pub mod me;
pub mod register;
pub mod root;
pub mod verification;

use axum::http::StatusCode;
use regex::Regex;
use tracing::error;

use crate::auth::AuthError;

/// Body shared by register and resend responses so neither endpoint reveals
/// whether an address is already registered.
pub const GENERIC_ACK: &str = "If the email exists, a verification link has been sent.";

/// Lightweight email sanity check used by auth handlers before persisting data.
pub fn valid_email(email: &str) -> bool {
    Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").is_ok_and(|re| re.is_match(email))
}

/// Passwords must carry at least one non-whitespace character.
pub fn valid_password(password: &str) -> bool {
    !password.trim().is_empty()
}

/// Map a core failure to an HTTP status plus user-facing body.
///
/// Display text on `AuthError` is already generic; internal detail is logged
/// here and never forwarded to the client.
pub(crate) fn error_response(err: &AuthError) -> (StatusCode, String) {
    let status = match err {
        AuthError::AccountAlreadyExists => StatusCode::CONFLICT,
        AuthError::InvalidCredentials | AuthError::InvalidSession => StatusCode::UNAUTHORIZED,
        AuthError::EmailNotVerified => StatusCode::FORBIDDEN,
        AuthError::InvalidToken | AuthError::TokenAlreadyUsed => StatusCode::BAD_REQUEST,
        AuthError::TokenExpired => StatusCode::GONE,
        AuthError::Internal(detail) => {
            error!("Request failed: {detail:?}");
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };

    (status, err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_email_accepts_simple() {
        assert!(valid_email("user@example.com"));
    }

    #[test]
    fn valid_email_rejects_missing_at() {
        assert!(!valid_email("user.example.com"));
    }

    #[test]
    fn valid_email_rejects_missing_domain_dot() {
        assert!(!valid_email("user@example"));
    }

    #[test]
    fn valid_email_rejects_embedded_spaces() {
        assert!(!valid_email("us er@example.com"));
    }

    #[test]
    fn valid_password_rejects_empty_and_whitespace() {
        assert!(!valid_password(""));
        assert!(!valid_password("   "));
        assert!(valid_password("hunter2"));
    }

    #[test]
    fn error_response_statuses() {
        let (status, body) = error_response(&AuthError::AccountAlreadyExists);
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body, "account already exists");

        let (status, _) = error_response(&AuthError::InvalidCredentials);
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, _) = error_response(&AuthError::EmailNotVerified);
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, _) = error_response(&AuthError::InvalidToken);
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, body) = error_response(&AuthError::TokenAlreadyUsed);
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, "verification token already used");

        let (status, _) = error_response(&AuthError::TokenExpired);
        assert_eq!(status, StatusCode::GONE);

        let (status, _) = error_response(&AuthError::InvalidSession);
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn error_response_hides_internal_detail() {
        let err = AuthError::Internal(anyhow::anyhow!("pool exhausted on 10.0.0.7"));
        let (status, body) = error_response(&err);
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, "internal error");
    }
}
