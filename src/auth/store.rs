//! Credential-store contract consumed by the authentication core.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;
use uuid::Uuid;

use super::account::{Account, VerificationToken};

/// Failures a store implementation reports.
///
/// `DuplicateEmail` is the one variant callers branch on (it carries the
/// unique-email invariant); everything else is backend detail wrapped
/// opaquely.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("an account with this email already exists")]
    DuplicateEmail,
    #[error(transparent)]
    Backend(#[from] anyhow::Error),
}

/// Durable storage for accounts and verification tokens.
///
/// Implementations own the atomicity the flows rely on: `save_account`
/// must fail with [`StoreError::DuplicateEmail`] when another account
/// holds the same normalized email, and [`Self::mark_token_consumed`]
/// must let exactly one concurrent caller win. Emails arrive already
/// normalized; stores compare them byte-wise.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    async fn find_account_by_email(&self, email: &str) -> Result<Option<Account>, StoreError>;

    async fn find_account_by_id(&self, id: Uuid) -> Result<Option<Account>, StoreError>;

    async fn account_exists_by_email(&self, email: &str) -> Result<bool, StoreError>;

    /// Insert or update an account, keyed by id.
    async fn save_account(&self, account: Account) -> Result<Account, StoreError>;

    /// Most recent token row for the owner, terminated or not.
    async fn find_token_by_owner(
        &self,
        account_id: Uuid,
    ) -> Result<Option<VerificationToken>, StoreError>;

    async fn find_token_by_fingerprint(
        &self,
        fingerprint: &str,
    ) -> Result<Option<VerificationToken>, StoreError>;

    /// Insert or update a token row, keyed by id.
    async fn save_token(
        &self,
        token: VerificationToken,
    ) -> Result<VerificationToken, StoreError>;

    /// Set `consumed_at = now` iff the row exists and is not yet consumed.
    /// Returns true iff this call did the write; a concurrent loser gets
    /// false and must report the token as already used.
    async fn mark_token_consumed(
        &self,
        token_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<bool, StoreError>;

    /// Cheap liveness probe for the health endpoint.
    async fn ping(&self) -> Result<(), StoreError>;
}
