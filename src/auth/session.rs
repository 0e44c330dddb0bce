//! Signed, time-boxed session tokens.
//!
//! Tokens are compact `header.claims.signature` strings with unpadded
//! URL-safe base64 segments, signed with HMAC-SHA-256 under a process-wide
//! secret. Nothing is persisted; possession of an unexpired token with a
//! valid signature is the whole proof.

use base64ct::{Base64UrlUnpadded, Encoding};
use chrono::{DateTime, Duration, Utc};
use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use thiserror::Error;

type HmacSha256 = Hmac<Sha256>;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SessionHeader {
    pub alg: String,
    pub typ: String,
}

impl SessionHeader {
    fn hs256() -> Self {
        Self {
            alg: "HS256".to_string(),
            typ: "JWT".to_string(),
        }
    }
}

/// Claims carried by a session token: subject email, role, and the issuance
/// and expiry instants as unix seconds.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SessionClaims {
    pub sub: String,
    pub role: String,
    pub iat: i64,
    pub exp: i64,
}

impl SessionClaims {
    /// Claims for `subject` issued at `now`, expiring after `ttl`.
    #[must_use]
    pub fn new(subject: &str, role: &str, now: DateTime<Utc>, ttl: Duration) -> Self {
        Self {
            sub: subject.to_string(),
            role: role.to_string(),
            iat: now.timestamp(),
            exp: (now + ttl).timestamp(),
        }
    }
}

/// Expiry instant a token minted at `now` with `ttl` would carry. Lets
/// callers report expiry without minting.
#[must_use]
pub fn expires_at(now: DateTime<Utc>, ttl: Duration) -> DateTime<Utc> {
    now + ttl
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid token format")]
    TokenFormat,
    #[error("invalid base64url encoding")]
    Base64,
    #[error("invalid json")]
    Json(#[from] serde_json::Error),
    #[error("unsupported algorithm: {0}")]
    UnsupportedAlg(String),
    #[error("invalid signing key")]
    Key,
    #[error("invalid signature")]
    InvalidSignature,
    #[error("token expired")]
    Expired,
}

fn b64e_json<T: Serialize>(value: &T) -> Result<String, Error> {
    let json = serde_json::to_vec(value)?;
    Ok(Base64UrlUnpadded::encode_string(&json))
}

fn b64d_json<T: for<'de> Deserialize<'de>>(s: &str) -> Result<T, Error> {
    let bytes = Base64UrlUnpadded::decode_vec(s).map_err(|_| Error::Base64)?;
    Ok(serde_json::from_slice(&bytes)?)
}

/// Mints and validates HS256 session tokens under one signing secret.
///
/// Construct once at process start and inject; the secret never leaves the
/// issuer and is only exposed at sign/verify time.
pub struct SessionIssuer {
    secret: SecretString,
}

impl SessionIssuer {
    #[must_use]
    pub fn new(secret: SecretString) -> Self {
        Self { secret }
    }

    fn mac(&self) -> Result<HmacSha256, Error> {
        HmacSha256::new_from_slice(self.secret.expose_secret().as_bytes()).map_err(|_| Error::Key)
    }

    /// Sign `claims` into a `header.claims.signature` token.
    ///
    /// # Errors
    ///
    /// Returns an error if the claims cannot be encoded or the key is
    /// rejected by the MAC.
    pub fn mint(&self, claims: &SessionClaims) -> Result<String, Error> {
        let header_b64 = b64e_json(&SessionHeader::hs256())?;
        let claims_b64 = b64e_json(claims)?;
        let signing_input = format!("{header_b64}.{claims_b64}");

        let mut mac = self.mac()?;
        mac.update(signing_input.as_bytes());
        let signature_b64 = Base64UrlUnpadded::encode_string(&mac.finalize().into_bytes());

        Ok(format!("{signing_input}.{signature_b64}"))
    }

    /// Verify a session token and return its decoded claims.
    ///
    /// Checks run structure → algorithm → signature → expiry. Callers that
    /// face the outside world must collapse every variant of [`Error`] into
    /// one opaque rejection; the variants exist for logs and tests only.
    ///
    /// # Errors
    ///
    /// Returns an error if the token is malformed, carries an unexpected
    /// algorithm, fails the signature check, or `exp <= now`.
    pub fn validate(&self, token: &str, now_unix_seconds: i64) -> Result<SessionClaims, Error> {
        let mut parts = token.split('.');
        let header_b64 = parts.next().ok_or(Error::TokenFormat)?;
        let claims_b64 = parts.next().ok_or(Error::TokenFormat)?;
        let sig_b64 = parts.next().ok_or(Error::TokenFormat)?;
        if parts.next().is_some() {
            return Err(Error::TokenFormat);
        }

        let header: SessionHeader = b64d_json(header_b64)?;
        if header.alg != "HS256" {
            return Err(Error::UnsupportedAlg(header.alg));
        }

        let signature = Base64UrlUnpadded::decode_vec(sig_b64).map_err(|_| Error::Base64)?;
        let mut mac = self.mac()?;
        mac.update(format!("{header_b64}.{claims_b64}").as_bytes());
        // verify_slice is constant-time over the MAC output.
        mac.verify_slice(&signature)
            .map_err(|_| Error::InvalidSignature)?;

        let claims: SessionClaims = b64d_json(claims_b64)?;
        if claims.exp <= now_unix_seconds {
            return Err(Error::Expired);
        }

        Ok(claims)
    }
}
