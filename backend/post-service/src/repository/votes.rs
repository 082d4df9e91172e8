use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use super::{VoteStore, VoteTransaction, DUPLICATE_LEDGER_ENTRY};
use crate::domain::models::{Interaction, InteractionType};
use crate::domain::PostCounters;
use crate::error::{AppError, Result};

/// Postgres-backed vote storage
///
/// The post row is taken with `SELECT ... FOR UPDATE`, so votes on one post
/// run one after another while votes on different posts proceed in parallel.
#[derive(Clone)]
pub struct PgVoteStore {
    pool: PgPool,
}

impl PgVoteStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl VoteStore for PgVoteStore {
    async fn begin(&self) -> Result<Box<dyn VoteTransaction>> {
        let tx = self.pool.begin().await?;
        Ok(Box::new(PgVoteTransaction { tx: Some(tx) }))
    }
}

pub struct PgVoteTransaction {
    tx: Option<Transaction<'static, Postgres>>,
}

impl PgVoteTransaction {
    fn tx(&mut self) -> Result<&mut Transaction<'static, Postgres>> {
        self.tx
            .as_mut()
            .ok_or_else(|| AppError::Internal("vote transaction already committed".to_string()))
    }
}

#[async_trait]
impl VoteTransaction for PgVoteTransaction {
    async fn lock_post(&mut self, post_id: &str) -> Result<Option<PostCounters>> {
        let tx = self.tx()?;
        let row: Option<(i64, i64, bool)> = sqlx::query_as(
            r#"
            SELECT like_count, dislike_count, active
            FROM posts
            WHERE post_id = $1
            FOR UPDATE
            "#,
        )
        .bind(post_id)
        .fetch_optional(&mut **tx)
        .await?;

        Ok(row.map(|(likes, dislikes, active)| PostCounters::new(likes, dislikes, active)))
    }

    async fn find_interaction(
        &mut self,
        user_id: Uuid,
        post_id: &str,
    ) -> Result<Option<InteractionType>> {
        let tx = self.tx()?;
        let existing = sqlx::query_scalar::<_, InteractionType>(
            r#"
            SELECT interaction_type
            FROM post_interactions
            WHERE user_id = $1 AND post_id = $2
            "#,
        )
        .bind(user_id)
        .bind(post_id)
        .fetch_optional(&mut **tx)
        .await?;

        Ok(existing)
    }

    async fn insert_interaction(&mut self, interaction: &Interaction) -> Result<()> {
        let tx = self.tx()?;
        sqlx::query(
            r#"
            INSERT INTO post_interactions (user_id, post_id, interaction_type, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $4)
            "#,
        )
        .bind(interaction.user_id)
        .bind(&interaction.post_id)
        .bind(interaction.interaction_type)
        .bind(interaction.created_at)
        .execute(&mut **tx)
        .await
        .map_err(|e| AppError::from_unique_violation(e, &[], DUPLICATE_LEDGER_ENTRY))?;

        Ok(())
    }

    async fn update_interaction(
        &mut self,
        user_id: Uuid,
        post_id: &str,
        interaction_type: InteractionType,
        at: DateTime<Utc>,
    ) -> Result<()> {
        let tx = self.tx()?;
        let result = sqlx::query(
            r#"
            UPDATE post_interactions
            SET interaction_type = $3, updated_at = $4
            WHERE user_id = $1 AND post_id = $2
            "#,
        )
        .bind(user_id)
        .bind(post_id)
        .bind(interaction_type)
        .bind(at)
        .execute(&mut **tx)
        .await?;

        if result.rows_affected() != 1 {
            return Err(AppError::InternalInconsistency(format!(
                "ledger entry for post {} vanished before flip",
                post_id
            )));
        }
        Ok(())
    }

    async fn save_counters(
        &mut self,
        post_id: &str,
        counters: &PostCounters,
        at: DateTime<Utc>,
    ) -> Result<()> {
        let tx = self.tx()?;
        sqlx::query(
            r#"
            UPDATE posts
            SET like_count = $2, dislike_count = $3, active = $4, last_interaction = $5
            WHERE post_id = $1
            "#,
        )
        .bind(post_id)
        .bind(counters.like_count)
        .bind(counters.dislike_count)
        .bind(counters.active)
        .bind(at)
        .execute(&mut **tx)
        .await?;

        Ok(())
    }

    async fn commit(&mut self) -> Result<()> {
        let tx = self
            .tx
            .take()
            .ok_or_else(|| AppError::Internal("vote transaction already committed".to_string()))?;
        tx.commit().await?;
        Ok(())
    }
}
