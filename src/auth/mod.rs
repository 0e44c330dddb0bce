//! Authentication core: accounts, password hashing, verification-token
//! lifecycle, session issuance, and the orchestration service.
//!
//! Everything here is pure logic over the [`store::CredentialStore`]
//! contract. Transport concerns (HTTP, email delivery, event fan-out) stay
//! behind the [`notifier`] and [`publisher`] capability traits and the axum
//! adapter in `crate::api`.

pub mod account;
pub mod config;
pub mod error;
pub mod hasher;
pub mod notifier;
pub mod publisher;
pub mod service;
pub mod session;
pub mod store;
pub mod token;
pub mod verification;

pub use account::{Account, VerificationToken};
pub use config::AuthConfig;
pub use error::AuthError;
pub use service::{AuthService, LoginSession};
pub use session::SessionIssuer;
pub use verification::VerificationService;
