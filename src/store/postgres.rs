//! PostgreSQL credential store.
//!
//! Runtime-checked sqlx queries; schema lives in `db/sql/`. Uniqueness of
//! normalized emails rides on the `accounts_email_key` constraint and
//! single-winner consumption on a conditional `UPDATE`, so the guarantees
//! hold across processes, not just within one.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use tracing::{info_span, Instrument};
use uuid::Uuid;

use crate::auth::account::{Account, VerificationToken};
use crate::auth::store::{CredentialStore, StoreError};

pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn db_err(err: sqlx::Error, context: &'static str) -> StoreError {
    StoreError::Backend(anyhow::Error::new(err).context(context))
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => db_err.code().is_some_and(|code| code.as_ref() == "23505"),
        _ => false,
    }
}

fn account_from_row(row: &PgRow) -> Account {
    Account {
        id: row.get("id"),
        email: row.get("email"),
        password_hash: row.get("password_hash"),
        role: row.get("role"),
        active: row.get("active"),
        verified: row.get("verified"),
        email_verified_at: row.get("email_verified_at"),
        verification_last_sent_at: row.get("verification_last_sent_at"),
        verification_send_count: row.get("verification_send_count"),
    }
}

fn token_from_row(row: &PgRow) -> VerificationToken {
    VerificationToken {
        id: row.get("id"),
        account_id: row.get("account_id"),
        token_hash: row.get("token_hash"),
        created_at: row.get("created_at"),
        expires_at: row.get("expires_at"),
        consumed_at: row.get("consumed_at"),
        revoked_at: row.get("revoked_at"),
    }
}

const ACCOUNT_COLUMNS: &str = r"
    id, email, password_hash, role, active, verified,
    email_verified_at, verification_last_sent_at, verification_send_count
";

#[async_trait]
impl CredentialStore for PostgresStore {
    async fn find_account_by_email(&self, email: &str) -> Result<Option<Account>, StoreError> {
        let query = format!("SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE email = $1 LIMIT 1");
        let span = info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "SELECT",
            db.statement = query.as_str()
        );
        let row = sqlx::query(&query)
            .bind(email)
            .fetch_optional(&self.pool)
            .instrument(span)
            .await
            .map_err(|err| db_err(err, "failed to load account by email"))?;
        Ok(row.as_ref().map(account_from_row))
    }

    async fn find_account_by_id(&self, id: Uuid) -> Result<Option<Account>, StoreError> {
        let query = format!("SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE id = $1 LIMIT 1");
        let span = info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "SELECT",
            db.statement = query.as_str()
        );
        let row = sqlx::query(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .instrument(span)
            .await
            .map_err(|err| db_err(err, "failed to load account by id"))?;
        Ok(row.as_ref().map(account_from_row))
    }

    async fn account_exists_by_email(&self, email: &str) -> Result<bool, StoreError> {
        let query = "SELECT 1 FROM accounts WHERE email = $1 LIMIT 1";
        let span = info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "SELECT",
            db.statement = query
        );
        let row = sqlx::query(query)
            .bind(email)
            .fetch_optional(&self.pool)
            .instrument(span)
            .await
            .map_err(|err| db_err(err, "failed to check account existence"))?;
        Ok(row.is_some())
    }

    async fn save_account(&self, account: Account) -> Result<Account, StoreError> {
        let query = r"
            INSERT INTO accounts (
                id, email, password_hash, role, active, verified,
                email_verified_at, verification_last_sent_at, verification_send_count
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            ON CONFLICT (id) DO UPDATE SET
                email = EXCLUDED.email,
                password_hash = EXCLUDED.password_hash,
                role = EXCLUDED.role,
                active = EXCLUDED.active,
                verified = EXCLUDED.verified,
                email_verified_at = EXCLUDED.email_verified_at,
                verification_last_sent_at = EXCLUDED.verification_last_sent_at,
                verification_send_count = EXCLUDED.verification_send_count
        ";
        let span = info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "INSERT",
            db.statement = query
        );
        let result = sqlx::query(query)
            .bind(account.id)
            .bind(&account.email)
            .bind(&account.password_hash)
            .bind(&account.role)
            .bind(account.active)
            .bind(account.verified)
            .bind(account.email_verified_at)
            .bind(account.verification_last_sent_at)
            .bind(account.verification_send_count)
            .execute(&self.pool)
            .instrument(span)
            .await;

        match result {
            Ok(_) => Ok(account),
            Err(err) if is_unique_violation(&err) => Err(StoreError::DuplicateEmail),
            Err(err) => Err(db_err(err, "failed to save account")),
        }
    }

    async fn find_token_by_owner(
        &self,
        account_id: Uuid,
    ) -> Result<Option<VerificationToken>, StoreError> {
        let query = r"
            SELECT id, account_id, token_hash, created_at, expires_at, consumed_at, revoked_at
            FROM verification_tokens
            WHERE account_id = $1
            ORDER BY created_at DESC
            LIMIT 1
        ";
        let span = info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "SELECT",
            db.statement = query
        );
        let row = sqlx::query(query)
            .bind(account_id)
            .fetch_optional(&self.pool)
            .instrument(span)
            .await
            .map_err(|err| db_err(err, "failed to load token by owner"))?;
        Ok(row.as_ref().map(token_from_row))
    }

    async fn find_token_by_fingerprint(
        &self,
        fingerprint: &str,
    ) -> Result<Option<VerificationToken>, StoreError> {
        let query = r"
            SELECT id, account_id, token_hash, created_at, expires_at, consumed_at, revoked_at
            FROM verification_tokens
            WHERE token_hash = $1
            LIMIT 1
        ";
        let span = info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "SELECT",
            db.statement = query
        );
        let row = sqlx::query(query)
            .bind(fingerprint)
            .fetch_optional(&self.pool)
            .instrument(span)
            .await
            .map_err(|err| db_err(err, "failed to load token by fingerprint"))?;
        Ok(row.as_ref().map(token_from_row))
    }

    async fn save_token(
        &self,
        token: VerificationToken,
    ) -> Result<VerificationToken, StoreError> {
        let query = r"
            INSERT INTO verification_tokens (
                id, account_id, token_hash, created_at, expires_at, consumed_at, revoked_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (id) DO UPDATE SET
                token_hash = EXCLUDED.token_hash,
                expires_at = EXCLUDED.expires_at,
                consumed_at = EXCLUDED.consumed_at,
                revoked_at = EXCLUDED.revoked_at
        ";
        let span = info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "INSERT",
            db.statement = query
        );
        sqlx::query(query)
            .bind(token.id)
            .bind(token.account_id)
            .bind(&token.token_hash)
            .bind(token.created_at)
            .bind(token.expires_at)
            .bind(token.consumed_at)
            .bind(token.revoked_at)
            .execute(&self.pool)
            .instrument(span)
            .await
            .map_err(|err| db_err(err, "failed to save verification token"))?;
        Ok(token)
    }

    async fn mark_token_consumed(
        &self,
        token_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<bool, StoreError> {
        // Conditional write: concurrent callers race on consumed_at IS NULL
        // and exactly one row update wins.
        let query = r"
            UPDATE verification_tokens
            SET consumed_at = $2
            WHERE id = $1 AND consumed_at IS NULL
        ";
        let span = info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "UPDATE",
            db.statement = query
        );
        let result = sqlx::query(query)
            .bind(token_id)
            .bind(now)
            .execute(&self.pool)
            .instrument(span)
            .await
            .map_err(|err| db_err(err, "failed to mark token consumed"))?;
        Ok(result.rows_affected() == 1)
    }

    async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|err| db_err(err, "database ping failed"))?;
        Ok(())
    }
}
