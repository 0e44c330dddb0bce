//! Credential-store implementations.
//!
//! [`postgres::PostgresStore`] is the production store; [`memory::MemoryStore`]
//! backs tests and DSN-less offline runs. Both uphold the contract's
//! atomicity guarantees: unique normalized emails and single-winner token
//! consumption.

pub mod memory;
pub mod postgres;
