//! Account and verification-token models plus email normalization.

use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

/// Role claim stamped on accounts created by registration.
pub const DEFAULT_ROLE: &str = "user";

/// Normalize an email for lookup/uniqueness checks.
#[must_use]
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// A registered account.
///
/// `verified` flips to true exactly once, when a verification token is
/// consumed. `active` is an operator-controlled kill switch this crate reads
/// on login but never writes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Account {
    pub id: Uuid,
    /// Normalized (trimmed, lowercased) address; unique across accounts.
    pub email: String,
    /// Argon2id PHC string. The plaintext never reaches this struct.
    pub password_hash: String,
    pub role: String,
    pub active: bool,
    pub verified: bool,
    pub email_verified_at: Option<DateTime<Utc>>,
    /// Bookkeeping for resend throttling; the window policy lives with the
    /// caller, this crate only stamps and counts.
    pub verification_last_sent_at: Option<DateTime<Utc>>,
    pub verification_send_count: i32,
}

impl Account {
    /// New unverified, active account. `email` must already be normalized.
    #[must_use]
    pub fn new(email: String, password_hash: String, role: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            email,
            password_hash,
            role,
            active: true,
            verified: false,
            email_verified_at: None,
            verification_last_sent_at: None,
            verification_send_count: 0,
        }
    }
}

/// A single-use email verification token row.
///
/// Only the fingerprint of the raw token is stored; `consumed_at` and
/// `revoked_at` are terminal and mutually independent of `expires_at`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerificationToken {
    pub id: Uuid,
    pub account_id: Uuid,
    /// SHA-256 fingerprint of the raw token, URL-safe base64 unpadded.
    pub token_hash: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub consumed_at: Option<DateTime<Utc>>,
    pub revoked_at: Option<DateTime<Utc>>,
}

impl VerificationToken {
    /// New token row for `account_id`, valid from `now` until `now + ttl`.
    #[must_use]
    pub fn new(account_id: Uuid, token_hash: String, now: DateTime<Utc>, ttl: Duration) -> Self {
        Self {
            id: Uuid::new_v4(),
            account_id,
            token_hash,
            created_at: now,
            expires_at: now + ttl,
            consumed_at: None,
            revoked_at: None,
        }
    }

    #[must_use]
    pub fn is_consumed(&self) -> bool {
        self.consumed_at.is_some()
    }

    #[must_use]
    pub fn is_revoked(&self) -> bool {
        self.revoked_at.is_some()
    }

    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }

    /// Usable for consumption: never consumed, never revoked, not expired.
    #[must_use]
    pub fn is_valid(&self, now: DateTime<Utc>) -> bool {
        !self.is_consumed() && !self.is_revoked() && !self.is_expired(now)
    }
}
