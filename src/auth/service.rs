//! Registration, login gating, and bearer-session authentication.

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::info;

use super::account::{normalize_email, Account};
use super::config::AuthConfig;
use super::error::AuthError;
use super::hasher;
use super::notifier::VerificationNotifier;
use super::publisher::RegistrationPublisher;
use super::session::{self, SessionClaims, SessionIssuer};
use super::store::CredentialStore;
use super::verification::VerificationService;

/// Successful login payload: the signed token plus what callers echo back
/// to the client.
#[derive(Clone)]
pub struct LoginSession {
    pub token: String,
    pub role: String,
    pub expires_at: DateTime<Utc>,
}

impl fmt::Debug for LoginSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Keep the signed token out of debug output and logs.
        f.debug_struct("LoginSession")
            .field("token", &"***")
            .field("role", &self.role)
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// Orchestrates the hasher, the verification lifecycle, and the session
/// issuer over one credential store.
pub struct AuthService {
    store: Arc<dyn CredentialStore>,
    verification: VerificationService,
    sessions: SessionIssuer,
    publisher: Arc<dyn RegistrationPublisher>,
    config: AuthConfig,
}

impl AuthService {
    #[must_use]
    pub fn new(
        store: Arc<dyn CredentialStore>,
        sessions: SessionIssuer,
        notifier: Arc<dyn VerificationNotifier>,
        publisher: Arc<dyn RegistrationPublisher>,
        config: AuthConfig,
    ) -> Self {
        let verification = VerificationService::new(store.clone(), notifier, config.clone());
        Self {
            store,
            verification,
            sessions,
            publisher,
            config,
        }
    }

    /// Create an unverified account and kick off email verification.
    ///
    /// Returns nothing on success on purpose: no session exists until the
    /// address is verified, and the caller-facing acknowledgement must not
    /// depend on what happened downstream of the store write.
    ///
    /// # Errors
    ///
    /// [`AuthError::AccountAlreadyExists`] when the normalized email is
    /// taken (checked up front and again by the store's unique constraint,
    /// so a racing duplicate loses too); [`AuthError::Internal`] when a
    /// collaborator gives out.
    pub async fn register(&self, email: &str, password: &str) -> Result<(), AuthError> {
        let normalized = normalize_email(email);
        if self.store.account_exists_by_email(&normalized).await? {
            return Err(AuthError::AccountAlreadyExists);
        }

        let password_hash = hasher::hash(password).map_err(AuthError::Internal)?;
        let account = Account::new(
            normalized,
            password_hash,
            self.config.default_role().to_string(),
        );
        let account = self.store.save_account(account).await?;

        if let Some(raw) = self.verification.issue_initial(&account).await? {
            // Post-commit, best-effort; a consumer outage cannot undo the
            // registration.
            self.publisher
                .publish_user_registered(&account.email, &raw)
                .await;
        }

        info!(account_id = %account.id, "account registered");
        Ok(())
    }

    /// Gate a login attempt and mint a session on success.
    ///
    /// # Errors
    ///
    /// The checks run in a fixed order. A missing account, a deactivated
    /// account, and a wrong password all surface as
    /// [`AuthError::InvalidCredentials`]; only the unverified-email gate is
    /// distinguishable, as [`AuthError::EmailNotVerified`], because it is
    /// actionable and not a secret.
    pub async fn login(&self, email: &str, password: &str) -> Result<LoginSession, AuthError> {
        let normalized = normalize_email(email);

        // 1. Lookup; absence reads exactly like a wrong password.
        let Some(account) = self.store.find_account_by_email(&normalized).await? else {
            return Err(AuthError::InvalidCredentials);
        };
        // 2. Deactivation is not revealed either.
        if !account.active {
            return Err(AuthError::InvalidCredentials);
        }
        // 3. The one distinguishable gate.
        if !account.verified {
            return Err(AuthError::EmailNotVerified);
        }
        // 4. Constant-time digest comparison inside the hasher.
        if !hasher::verify(password, &account.password_hash) {
            return Err(AuthError::InvalidCredentials);
        }

        // 5. Mint.
        let now = Utc::now();
        let ttl = self.config.session_ttl();
        let claims = SessionClaims::new(&account.email, &account.role, now, ttl);
        let token = self
            .sessions
            .mint(&claims)
            .map_err(|err| AuthError::Internal(err.into()))?;

        info!(account_id = %account.id, "login succeeded");
        Ok(LoginSession {
            token,
            role: account.role,
            expires_at: session::expires_at(now, ttl),
        })
    }

    /// Validate a bearer session token and re-check its subject.
    ///
    /// # Errors
    ///
    /// Every token-level failure and every subject-level failure (unknown
    /// email, deactivated account) collapses into
    /// [`AuthError::InvalidSession`]; nothing about the reason leaks.
    /// Store failures stay [`AuthError::Internal`].
    pub async fn authenticate(&self, token: &str) -> Result<(Account, SessionClaims), AuthError> {
        let claims = self
            .sessions
            .validate(token, Utc::now().timestamp())
            .map_err(|_| AuthError::InvalidSession)?;

        let Some(account) = self.store.find_account_by_email(&claims.sub).await? else {
            return Err(AuthError::InvalidSession);
        };
        if !account.active {
            return Err(AuthError::InvalidSession);
        }

        Ok((account, claims))
    }

    /// Consume a verification token presented by a link click.
    ///
    /// # Errors
    ///
    /// See [`VerificationService::consume`].
    pub async fn verify_email(&self, raw_token: &str) -> Result<(), AuthError> {
        self.verification.consume(raw_token).await
    }

    /// Re-send the verification email, silently ignoring unknown or
    /// already-verified addresses.
    ///
    /// # Errors
    ///
    /// [`AuthError::Internal`] only; outcome is otherwise uniform.
    pub async fn resend_verification(&self, email: &str) -> Result<(), AuthError> {
        self.verification.resend(email).await
    }
}
