use sqlx::PgPool;

use crate::domain::models::WalletLink;

#[derive(Clone)]
pub struct WalletRepository {
    pool: PgPool,
}

impl WalletRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create or replace the link stored for `wallet_address`
    pub async fn upsert(
        &self,
        wallet_address: &str,
        user_ref: &str,
        tx_hash: &str,
    ) -> Result<WalletLink, sqlx::Error> {
        sqlx::query_as::<_, WalletLink>(
            r#"
            INSERT INTO wallet_links (wallet_address, user_ref, tx_hash)
            VALUES ($1, $2, $3)
            ON CONFLICT (wallet_address) DO UPDATE
            SET user_ref = EXCLUDED.user_ref,
                tx_hash = EXCLUDED.tx_hash,
                updated_at = NOW()
            RETURNING wallet_address, user_ref, tx_hash, created_at, updated_at
            "#,
        )
        .bind(wallet_address)
        .bind(user_ref)
        .bind(tx_hash)
        .fetch_one(&self.pool)
        .await
    }

    pub async fn find(&self, wallet_address: &str) -> Result<Option<WalletLink>, sqlx::Error> {
        sqlx::query_as::<_, WalletLink>(
            r#"
            SELECT wallet_address, user_ref, tx_hash, created_at, updated_at
            FROM wallet_links
            WHERE wallet_address = $1
            "#,
        )
        .bind(wallet_address)
        .fetch_optional(&self.pool)
        .await
    }
}
