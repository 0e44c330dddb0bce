//! In-process credential store for tests and offline runs.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::auth::account::{Account, VerificationToken};
use crate::auth::store::{CredentialStore, StoreError};

#[derive(Debug, Default)]
struct Inner {
    accounts: HashMap<Uuid, Account>,
    tokens: HashMap<Uuid, VerificationToken>,
}

/// RwLock-guarded maps. The write lock is the transaction boundary: the
/// duplicate-email check and the consume compare-and-set each happen under
/// one guard, which is all the atomicity the contract asks for.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored accounts, for assertions in tests.
    pub async fn account_count(&self) -> usize {
        self.inner.read().await.accounts.len()
    }
}

#[async_trait]
impl CredentialStore for MemoryStore {
    async fn find_account_by_email(&self, email: &str) -> Result<Option<Account>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner
            .accounts
            .values()
            .find(|account| account.email == email)
            .cloned())
    }

    async fn find_account_by_id(&self, id: Uuid) -> Result<Option<Account>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner.accounts.get(&id).cloned())
    }

    async fn account_exists_by_email(&self, email: &str) -> Result<bool, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner.accounts.values().any(|account| account.email == email))
    }

    async fn save_account(&self, account: Account) -> Result<Account, StoreError> {
        let mut inner = self.inner.write().await;
        let taken = inner
            .accounts
            .values()
            .any(|existing| existing.email == account.email && existing.id != account.id);
        if taken {
            return Err(StoreError::DuplicateEmail);
        }
        inner.accounts.insert(account.id, account.clone());
        Ok(account)
    }

    async fn find_token_by_owner(
        &self,
        account_id: Uuid,
    ) -> Result<Option<VerificationToken>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner
            .tokens
            .values()
            .filter(|token| token.account_id == account_id)
            .max_by_key(|token| (token.created_at, token.id))
            .cloned())
    }

    async fn find_token_by_fingerprint(
        &self,
        fingerprint: &str,
    ) -> Result<Option<VerificationToken>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner
            .tokens
            .values()
            .find(|token| token.token_hash == fingerprint)
            .cloned())
    }

    async fn save_token(
        &self,
        token: VerificationToken,
    ) -> Result<VerificationToken, StoreError> {
        let mut inner = self.inner.write().await;
        inner.tokens.insert(token.id, token.clone());
        Ok(token)
    }

    async fn mark_token_consumed(
        &self,
        token_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<bool, StoreError> {
        let mut inner = self.inner.write().await;
        match inner.tokens.get_mut(&token_id) {
            Some(token) if token.consumed_at.is_none() => {
                token.consumed_at = Some(now);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}
