//! Typed failures surfaced by the authentication core.

use crate::auth::store::StoreError;
use thiserror::Error;

/// Failures the authentication core reports to its callers.
///
/// The variants are deliberately coarse. `InvalidCredentials` covers a
/// missing account, a deactivated account, and a wrong password so none of
/// the three can be told apart from outside. `InvalidSession` does the same
/// for every way a session token can be rejected. `TokenAlreadyUsed` and
/// `TokenExpired` are only reachable for tokens this service genuinely
/// issued; forged input always lands on `InvalidToken`.
#[derive(Debug, Error)]
pub enum AuthError {
    /// An account with the same normalized email already exists.
    #[error("account already exists")]
    AccountAlreadyExists,

    /// The email/password pair was not accepted.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// Credentials are fine but the address has not been verified yet.
    #[error("email not verified")]
    EmailNotVerified,

    /// The verification token matches no usable row.
    #[error("invalid verification token")]
    InvalidToken,

    /// The verification token was already consumed once.
    #[error("verification token already used")]
    TokenAlreadyUsed,

    /// The verification token was issued but its validity window has passed.
    #[error("verification token expired")]
    TokenExpired,

    /// The session token was rejected.
    #[error("invalid session")]
    InvalidSession,

    /// A collaborator failed; detail stays server-side.
    #[error("internal error")]
    Internal(#[source] anyhow::Error),
}

impl From<StoreError> for AuthError {
    fn from(err: StoreError) -> Self {
        match err {
            // Only account writes can trip the unique-email constraint, so
            // the mapping is unambiguous wherever `?` applies it.
            StoreError::DuplicateEmail => Self::AccountAlreadyExists,
            StoreError::Backend(err) => Self::Internal(err),
        }
    }
}
