use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::models::{Account, Credentials};

const ACCOUNT_COLUMNS: &str = "id, nullifier, username, kyc_hash, password_hash, wallet_address, \
     state, posts_count, user_level, is_active, created_at, last_login";

/// Account fields supplied at registration
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub nullifier: String,
    pub username: String,
    pub kyc_hash: String,
    pub credentials: Credentials,
    pub wallet_address: String,
    pub state: String,
}

/// Repository for account rows
///
/// Returns raw `sqlx::Error` so callers can translate unique violations by
/// constraint name.
#[derive(Clone)]
pub struct AccountRepository {
    pool: PgPool,
}

impl AccountRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn nullifier_exists(&self, nullifier: &str) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar(
            r#"
            SELECT EXISTS(SELECT 1 FROM accounts WHERE nullifier = $1)
            "#,
        )
        .bind(nullifier)
        .fetch_one(&self.pool)
        .await
    }

    pub async fn insert(&self, account: &NewAccount) -> Result<Account, sqlx::Error> {
        let sql = format!(
            r#"
            INSERT INTO accounts (id, nullifier, username, kyc_hash, password_hash, wallet_address, state)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {}
            "#,
            ACCOUNT_COLUMNS
        );

        sqlx::query_as::<_, Account>(&sql)
            .bind(Uuid::new_v4())
            .bind(&account.nullifier)
            .bind(&account.username)
            .bind(&account.kyc_hash)
            .bind(account.credentials.password_hash())
            .bind(&account.wallet_address)
            .bind(&account.state)
            .fetch_one(&self.pool)
            .await
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Account>, sqlx::Error> {
        let sql = format!("SELECT {} FROM accounts WHERE id = $1", ACCOUNT_COLUMNS);
        sqlx::query_as::<_, Account>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
    }

    pub async fn find_active_by_kyc_hash(
        &self,
        kyc_hash: &str,
    ) -> Result<Option<Account>, sqlx::Error> {
        let sql = format!(
            "SELECT {} FROM accounts WHERE kyc_hash = $1 AND is_active",
            ACCOUNT_COLUMNS
        );
        sqlx::query_as::<_, Account>(&sql)
            .bind(kyc_hash)
            .fetch_optional(&self.pool)
            .await
    }

    pub async fn find_active_by_username(
        &self,
        username: &str,
    ) -> Result<Option<Account>, sqlx::Error> {
        let sql = format!(
            "SELECT {} FROM accounts WHERE username = $1 AND is_active",
            ACCOUNT_COLUMNS
        );
        sqlx::query_as::<_, Account>(&sql)
            .bind(username)
            .fetch_optional(&self.pool)
            .await
    }

    pub async fn touch_last_login(&self, id: Uuid, at: DateTime<Utc>) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE accounts SET last_login = $2 WHERE id = $1")
            .bind(id)
            .bind(at)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn update_wallet(
        &self,
        id: Uuid,
        wallet_address: &str,
    ) -> Result<Option<Account>, sqlx::Error> {
        let sql = format!(
            "UPDATE accounts SET wallet_address = $2 WHERE id = $1 RETURNING {}",
            ACCOUNT_COLUMNS
        );
        sqlx::query_as::<_, Account>(&sql)
            .bind(id)
            .bind(wallet_address)
            .fetch_optional(&self.pool)
            .await
    }
}
