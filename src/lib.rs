//! # Atesti (Account Authentication & Email Verification)
//!
//! `atesti` decides whether a credential presented at login is acceptable,
//! manages the lifecycle of the one-time verification tokens that gate
//! account activation, and issues short-lived signed session tokens.
//!
//! ## Accounts
//!
//! Accounts are keyed by a normalized email (trimmed, lowercased). A new
//! account starts `active` but unverified; login is gated until a
//! verification token sent to the address is consumed.
//!
//! - **Hash at rest:** passwords are stored as Argon2id digests and
//!   verification tokens as SHA-256 fingerprints. Raw values never reach
//!   storage or logs.
//! - **Single active token:** issuing a verification token revokes any
//!   prior token for the same account; only the newest link works.
//! - **Anti enumeration:** resending a verification email for an unknown
//!   or already-verified address is indistinguishable from the sent case.
//!
//! ## Sessions
//!
//! A successful login mints an HMAC-SHA-256 signed session token carrying
//! the account email and role. Validation collapses every failure mode
//! (bad signature, malformed token, expiry, unknown subject) into one
//! opaque rejection.

pub mod api;
pub mod auth;
pub mod cli;
pub mod store;

#[allow(clippy::doc_markdown, clippy::needless_raw_string_hashes)]
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub const GIT_COMMIT_HASH: &str = match built_info::GIT_COMMIT_HASH {
    Some(hash) => hash,
    None => "unknown",
};

pub const APP_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"),);
