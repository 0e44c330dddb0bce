//! Opaque verification-token generation and fingerprinting.

use anyhow::{Context, Result};
use base64ct::{Base64UrlUnpadded, Encoding};
use rand::{rngs::OsRng, RngCore};
use sha2::{Digest, Sha256};

/// Create a fresh raw verification token: 32 bytes from the OS RNG, encoded
/// URL-safe so it can sit in a link without further escaping.
///
/// The returned value goes to the recipient only; storage and lookups use
/// [`fingerprint`].
///
/// # Errors
///
/// Fails only if the OS RNG refuses to produce bytes.
pub fn generate() -> Result<String> {
    let mut bytes = [0u8; 32];
    OsRng
        .try_fill_bytes(&mut bytes)
        .context("failed to generate verification token")?;
    Ok(Base64UrlUnpadded::encode_string(&bytes))
}

/// One-way fingerprint of a raw token: SHA-256, URL-safe base64 unpadded.
///
/// Deterministic so the stored value can be found again from the presented
/// token; not invertible, so a leaked store never yields usable tokens.
#[must_use]
pub fn fingerprint(raw: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(raw.as_bytes());
    Base64UrlUnpadded::encode_string(&hasher.finalize())
}
