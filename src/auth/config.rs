//! Core configuration: TTLs, link base, default role.

use chrono::Duration;

use super::account::DEFAULT_ROLE;

const DEFAULT_SESSION_TTL_SECONDS: i64 = 60 * 60;
const DEFAULT_TOKEN_TTL_SECONDS: i64 = 24 * 60 * 60;

/// Tunables the authentication core consumes but does not own. Built once
/// at process start from CLI/env and injected.
#[derive(Clone, Debug)]
pub struct AuthConfig {
    base_url: String,
    session_ttl_seconds: i64,
    token_ttl_seconds: i64,
    default_role: String,
}

impl AuthConfig {
    #[must_use]
    pub fn new(base_url: String) -> Self {
        Self {
            base_url,
            session_ttl_seconds: DEFAULT_SESSION_TTL_SECONDS,
            token_ttl_seconds: DEFAULT_TOKEN_TTL_SECONDS,
            default_role: DEFAULT_ROLE.to_string(),
        }
    }

    #[must_use]
    pub fn with_session_ttl_seconds(mut self, seconds: i64) -> Self {
        self.session_ttl_seconds = seconds;
        self
    }

    #[must_use]
    pub fn with_token_ttl_seconds(mut self, seconds: i64) -> Self {
        self.token_ttl_seconds = seconds;
        self
    }

    #[must_use]
    pub fn with_default_role(mut self, role: String) -> Self {
        self.default_role = role;
        self
    }

    #[must_use]
    pub fn session_ttl(&self) -> Duration {
        Duration::seconds(self.session_ttl_seconds)
    }

    #[must_use]
    pub fn token_ttl(&self) -> Duration {
        Duration::seconds(self.token_ttl_seconds)
    }

    #[must_use]
    pub fn default_role(&self) -> &str {
        &self.default_role
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Absolute verification link for outbound email, raw token in the
    /// query string.
    #[must_use]
    pub fn verification_link(&self, raw_token: &str) -> String {
        let base = self.base_url.trim_end_matches('/');
        format!("{base}/verify-email?token={raw_token}")
    }
}
