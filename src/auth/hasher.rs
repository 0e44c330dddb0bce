//! Password hashing and verification using Argon2id.

use anyhow::{anyhow, Result};
use argon2::{
    password_hash::{rand_core::OsRng, SaltString},
    Argon2, PasswordHasher, PasswordVerifier,
};

/// Hash a plaintext password into an Argon2id PHC-format string.
///
/// The salt comes from the OS RNG per call, so hashing the same password
/// twice yields different digests.
///
/// # Errors
///
/// Fails if the hasher rejects its parameters; never inspects the password.
pub fn hash(plaintext: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let digest = argon2
        .hash_password(plaintext.as_bytes(), &salt)
        .map_err(|err| anyhow!("password hashing failed: {err}"))?;
    Ok(digest.to_string())
}

/// Verify a plaintext password against a stored PHC-format digest.
///
/// A malformed digest is reported as a non-match, not an error: callers
/// treat every failure the same way, and a corrupt row must not behave
/// differently from a wrong password.
#[must_use]
pub fn verify(plaintext: &str, digest: &str) -> bool {
    let Ok(parsed) = argon2::PasswordHash::new(digest) else {
        return false;
    };
    Argon2::default()
        .verify_password(plaintext.as_bytes(), &parsed)
        .is_ok()
}
