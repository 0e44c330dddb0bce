//! Verification-token lifecycle: issuance, resend, consumption.
//!
//! One open token per account: issuing revokes whatever came before, so
//! only the newest link can verify. Consumption runs its checks in a fixed
//! order (existence, consumed, revoked, expired) and defers the final
//! mark-consumed write to the store so exactly one concurrent attempt wins.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, info};
use uuid::Uuid;

use super::account::{normalize_email, VerificationToken};
use super::config::AuthConfig;
use super::error::AuthError;
use super::notifier::VerificationNotifier;
use super::store::CredentialStore;
use super::token;
use super::Account;

/// Owns the per-account single-active-token invariant.
pub struct VerificationService {
    store: Arc<dyn CredentialStore>,
    notifier: Arc<dyn VerificationNotifier>,
    config: AuthConfig,
}

impl VerificationService {
    #[must_use]
    pub fn new(
        store: Arc<dyn CredentialStore>,
        notifier: Arc<dyn VerificationNotifier>,
        config: AuthConfig,
    ) -> Self {
        Self {
            store,
            notifier,
            config,
        }
    }

    /// Issue a verification token for a freshly registered account and hand
    /// the link to the notifier. Returns the raw token so registration can
    /// feed the event publisher, or `None` when the account is already
    /// verified and nothing was issued.
    ///
    /// # Errors
    ///
    /// Fails with [`AuthError::Internal`] when the store or the token
    /// generator gives out.
    pub async fn issue_initial(&self, account: &Account) -> Result<Option<String>, AuthError> {
        if account.verified {
            return Ok(None);
        }

        let now = Utc::now();
        let raw = self.rotate(account.id, now).await?;
        self.notifier
            .notify_verification_link(&account.email, &self.config.verification_link(&raw));

        debug!(account_id = %account.id, "issued verification token");
        Ok(Some(raw))
    }

    /// Re-issue the verification token for `email`.
    ///
    /// Unknown or already-verified addresses are a silent no-op so the
    /// outcome never reveals whether an email is registered. For a known
    /// unverified account this rotates the token exactly like the initial
    /// issuance and additionally stamps the throttling bookkeeping.
    ///
    /// # Errors
    ///
    /// Fails with [`AuthError::Internal`] when the store or the token
    /// generator gives out.
    pub async fn resend(&self, email: &str) -> Result<(), AuthError> {
        let normalized = normalize_email(email);
        let Some(mut account) = self.store.find_account_by_email(&normalized).await? else {
            debug!("verification resend for unknown email");
            return Ok(());
        };
        if account.verified {
            debug!(account_id = %account.id, "verification resend for verified account");
            return Ok(());
        }

        let now = Utc::now();
        let raw = self.rotate(account.id, now).await?;

        account.verification_last_sent_at = Some(now);
        account.verification_send_count += 1;
        let account = self.store.save_account(account).await?;

        self.notifier
            .notify_verification_link(&account.email, &self.config.verification_link(&raw));

        debug!(
            account_id = %account.id,
            send_count = account.verification_send_count,
            "reissued verification token"
        );
        Ok(())
    }

    /// Consume a raw verification token and mark its owner verified.
    ///
    /// Checks run in a fixed order so a replayed token reports
    /// [`AuthError::TokenAlreadyUsed`] even when it has also expired by the
    /// time of the replay:
    /// row absent → [`AuthError::InvalidToken`]; consumed →
    /// [`AuthError::TokenAlreadyUsed`]; revoked →
    /// [`AuthError::InvalidToken`]; expired → [`AuthError::TokenExpired`].
    ///
    /// # Errors
    ///
    /// One of the token failures above, or [`AuthError::Internal`] when a
    /// collaborator gives out.
    pub async fn consume(&self, raw_token: &str) -> Result<(), AuthError> {
        let now = Utc::now();
        let fingerprint = token::fingerprint(raw_token.trim());

        let Some(row) = self.store.find_token_by_fingerprint(&fingerprint).await? else {
            return Err(AuthError::InvalidToken);
        };
        if row.is_consumed() {
            return Err(AuthError::TokenAlreadyUsed);
        }
        if row.is_revoked() {
            return Err(AuthError::InvalidToken);
        }
        if row.is_expired(now) {
            return Err(AuthError::TokenExpired);
        }

        // The store arbitrates concurrent attempts; the loser surfaces the
        // same error a later replay would see.
        if !self.store.mark_token_consumed(row.id, now).await? {
            return Err(AuthError::TokenAlreadyUsed);
        }

        let Some(mut account) = self.store.find_account_by_id(row.account_id).await? else {
            return Err(AuthError::Internal(anyhow::anyhow!(
                "verification token owner missing"
            )));
        };
        if !account.verified {
            account.verified = true;
            account.email_verified_at = Some(now);
            account = self.store.save_account(account).await?;
        }

        info!(account_id = %account.id, "email verified");
        Ok(())
    }

    /// Revoke the owner's open token, if any, then persist a fresh row.
    /// Returns the new raw token.
    async fn rotate(&self, account_id: Uuid, now: DateTime<Utc>) -> Result<String, AuthError> {
        if let Some(mut current) = self.store.find_token_by_owner(account_id).await? {
            if !current.is_consumed() && !current.is_revoked() {
                current.revoked_at = Some(now);
                self.store.save_token(current).await?;
            }
        }

        let raw = token::generate().map_err(AuthError::Internal)?;
        let row = VerificationToken::new(
            account_id,
            token::fingerprint(&raw),
            now,
            self.config.token_ttl(),
        );
        self.store.save_token(row).await?;
        Ok(raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::notifier::testing::RecordingNotifier;
    use crate::auth::{account::DEFAULT_ROLE, hasher};
    use crate::store::memory::MemoryStore;
    use anyhow::Result;
    use chrono::Duration;

    struct Harness {
        store: Arc<MemoryStore>,
        notifier: Arc<RecordingNotifier>,
        service: VerificationService,
    }

    fn harness() -> Harness {
        let store = Arc::new(MemoryStore::new());
        let notifier = Arc::new(RecordingNotifier::default());
        let service = VerificationService::new(
            store.clone(),
            notifier.clone(),
            AuthConfig::new("https://atesti.dev".to_string()),
        );
        Harness {
            store,
            notifier,
            service,
        }
    }

    async fn seed_account(store: &MemoryStore, email: &str) -> Account {
        let account = Account::new(
            email.to_string(),
            hasher::hash("hunter2").unwrap(),
            DEFAULT_ROLE.to_string(),
        );
        store.save_account(account).await.unwrap()
    }

    #[tokio::test]
    async fn issue_initial_persists_fingerprint_and_notifies() -> Result<()> {
        let h = harness();
        let account = seed_account(&h.store, "a@example.com").await;

        let raw = h.service.issue_initial(&account).await?.unwrap();

        let row = h.store.find_token_by_owner(account.id).await?.unwrap();
        assert_eq!(row.token_hash, token::fingerprint(&raw));
        assert_ne!(row.token_hash, raw);
        assert!(row.is_valid(Utc::now()));

        assert_eq!(h.notifier.sent_count(), 1);
        assert_eq!(h.notifier.last_recipient().as_deref(), Some("a@example.com"));
        assert_eq!(h.notifier.last_raw_token().as_deref(), Some(raw.as_str()));
        Ok(())
    }

    #[tokio::test]
    async fn issue_initial_noops_for_verified_account() -> Result<()> {
        let h = harness();
        let mut account = seed_account(&h.store, "a@example.com").await;
        account.verified = true;
        let account = h.store.save_account(account).await?;

        assert!(h.service.issue_initial(&account).await?.is_none());
        assert_eq!(h.notifier.sent_count(), 0);
        assert!(h.store.find_token_by_owner(account.id).await?.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn reissue_revokes_prior_token() -> Result<()> {
        let h = harness();
        let account = seed_account(&h.store, "a@example.com").await;

        let first = h.service.issue_initial(&account).await?.unwrap();
        h.service.resend("a@example.com").await?;
        let second = h.notifier.last_raw_token().unwrap();
        assert_ne!(first, second);

        // Only the newest link verifies.
        let result = h.service.consume(&first).await;
        assert!(matches!(result, Err(AuthError::InvalidToken)));
        h.service.consume(&second).await?;

        let account = h.store.find_account_by_id(account.id).await?.unwrap();
        assert!(account.verified);
        Ok(())
    }

    #[tokio::test]
    async fn resend_unknown_email_is_silent() -> Result<()> {
        let h = harness();
        h.service.resend("ghost@example.com").await?;
        assert_eq!(h.notifier.sent_count(), 0);
        Ok(())
    }

    #[tokio::test]
    async fn resend_verified_account_is_silent() -> Result<()> {
        let h = harness();
        let mut account = seed_account(&h.store, "a@example.com").await;
        account.verified = true;
        h.store.save_account(account.clone()).await?;

        h.service.resend("a@example.com").await?;

        assert_eq!(h.notifier.sent_count(), 0);
        let account = h.store.find_account_by_id(account.id).await?.unwrap();
        assert_eq!(account.verification_send_count, 0);
        assert!(account.verification_last_sent_at.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn resend_normalizes_email_and_stamps_bookkeeping() -> Result<()> {
        let h = harness();
        let account = seed_account(&h.store, "a@example.com").await;

        h.service.resend("  A@Example.COM ").await?;
        h.service.resend("a@example.com").await?;

        let account = h.store.find_account_by_id(account.id).await?.unwrap();
        assert_eq!(account.verification_send_count, 2);
        assert!(account.verification_last_sent_at.is_some());
        assert_eq!(h.notifier.sent_count(), 2);
        Ok(())
    }

    #[tokio::test]
    async fn consume_flips_verified_exactly_once() -> Result<()> {
        let h = harness();
        let account = seed_account(&h.store, "a@example.com").await;
        let raw = h.service.issue_initial(&account).await?.unwrap();

        h.service.consume(&raw).await?;

        let verified = h.store.find_account_by_id(account.id).await?.unwrap();
        assert!(verified.verified);
        assert!(verified.email_verified_at.is_some());
        let row = h.store.find_token_by_owner(account.id).await?.unwrap();
        assert!(row.is_consumed());

        // Replay of the same raw token.
        let result = h.service.consume(&raw).await;
        assert!(matches!(result, Err(AuthError::TokenAlreadyUsed)));
        Ok(())
    }

    #[tokio::test]
    async fn consume_unknown_token_is_invalid() {
        let h = harness();
        let result = h.service.consume("no-such-token").await;
        assert!(matches!(result, Err(AuthError::InvalidToken)));
    }

    #[tokio::test]
    async fn consume_expired_token_reports_expired() -> Result<()> {
        let h = harness();
        let account = seed_account(&h.store, "a@example.com").await;

        let raw = token::generate()?;
        let stale = VerificationToken::new(
            account.id,
            token::fingerprint(&raw),
            Utc::now() - Duration::hours(48),
            Duration::hours(24),
        );
        h.store.save_token(stale).await?;

        let result = h.service.consume(&raw).await;
        assert!(matches!(result, Err(AuthError::TokenExpired)));

        let account = h.store.find_account_by_id(account.id).await?.unwrap();
        assert!(!account.verified);
        Ok(())
    }

    #[tokio::test]
    async fn consumed_wins_over_expired_on_replay() -> Result<()> {
        let h = harness();
        let account = seed_account(&h.store, "a@example.com").await;

        let raw = token::generate()?;
        let mut row = VerificationToken::new(
            account.id,
            token::fingerprint(&raw),
            Utc::now() - Duration::hours(48),
            Duration::hours(24),
        );
        row.consumed_at = Some(Utc::now() - Duration::hours(30));
        h.store.save_token(row).await?;

        // Expired too, but the consumed check runs first.
        let result = h.service.consume(&raw).await;
        assert!(matches!(result, Err(AuthError::TokenAlreadyUsed)));
        Ok(())
    }

    #[tokio::test]
    async fn consume_trims_presented_token() -> Result<()> {
        let h = harness();
        let account = seed_account(&h.store, "a@example.com").await;
        let raw = h.service.issue_initial(&account).await?.unwrap();

        h.service.consume(&format!("  {raw}\n")).await?;
        Ok(())
    }
}
