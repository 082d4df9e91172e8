//! Like/dislike voting with automatic moderation
//!
//! A vote locks the post, reads the caller's ledger entry, decides the
//! transition, rewrites the counters and commits everything together. A
//! failure at any step drops the transaction and nothing is persisted.
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::domain::models::{Interaction, InteractionType};
use crate::domain::{Outcome, PostCounters, VoteState};
use crate::error::{AppError, Result};
use crate::metrics::{record_vote, POST_DEACTIVATIONS_TOTAL};
use crate::repository::{VoteStore, VoteTransaction};

/// Source of the current time for interaction timestamps
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Result of an accepted vote
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteSummary {
    pub post_id: String,
    pub like_count: i64,
    pub dislike_count: i64,
    pub active: bool,
    #[serde(skip)]
    pub outcome: Outcome,
    /// True only for the vote that took the post down
    #[serde(skip)]
    pub deactivated: bool,
}

impl VoteSummary {
    /// Human-readable confirmation for the HTTP response
    pub fn message(&self) -> &'static str {
        match (self.outcome, self.deactivated) {
            (Outcome::Created(InteractionType::Dislike), true) => {
                "Post disliked and deactivated due to excessive dislikes"
            }
            (Outcome::Created(InteractionType::Like), _) => "Post liked successfully",
            (Outcome::Created(InteractionType::Dislike), _) => "Post disliked successfully",
            (
                Outcome::Flipped {
                    to: InteractionType::Like,
                    ..
                },
                _,
            ) => "Post liked successfully (changed from dislike)",
            (
                Outcome::Flipped {
                    to: InteractionType::Dislike,
                    ..
                },
                _,
            ) => "Post disliked successfully (changed from like)",
        }
    }
}

#[derive(Clone)]
pub struct InteractionService {
    store: Arc<dyn VoteStore>,
    clock: Arc<dyn Clock>,
}

impl InteractionService {
    pub fn new(store: Arc<dyn VoteStore>) -> Self {
        Self::with_clock(store, Arc::new(SystemClock))
    }

    pub fn with_clock(store: Arc<dyn VoteStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// Record `desired` as `user_id`'s vote on `post_id`
    ///
    /// Errors: `PostNotFound`, `PostInactive`, `DuplicateVote`, `Conflict` when
    /// a racing insert wins the ledger key, `InternalInconsistency` when the
    /// counters cannot absorb the transition.
    pub async fn vote(
        &self,
        user_id: Uuid,
        post_id: &str,
        desired: InteractionType,
    ) -> Result<VoteSummary> {
        let post_id = post_id.trim();
        if post_id.is_empty() {
            return Err(AppError::Validation("Post ID is required".to_string()));
        }

        let result = self.vote_in_transaction(user_id, post_id, desired).await;
        match &result {
            Ok(summary) => {
                record_vote(desired.as_str(), summary.outcome.label());
                info!(
                    user_id = %user_id,
                    post_id = %post_id,
                    interaction = %desired,
                    outcome = summary.outcome.label(),
                    like_count = summary.like_count,
                    dislike_count = summary.dislike_count,
                    "Vote recorded"
                );
            }
            Err(AppError::DuplicateVote(_)) => {
                record_vote(desired.as_str(), "duplicate");
                debug!(user_id = %user_id, post_id = %post_id, interaction = %desired, "Duplicate vote rejected");
            }
            Err(e) => {
                record_vote(desired.as_str(), "rejected");
                debug!(user_id = %user_id, post_id = %post_id, error = %e, "Vote rejected");
            }
        }
        result
    }

    async fn vote_in_transaction(
        &self,
        user_id: Uuid,
        post_id: &str,
        desired: InteractionType,
    ) -> Result<VoteSummary> {
        let mut tx = self.store.begin().await?;

        let mut counters = tx.lock_post(post_id).await?.ok_or(AppError::PostNotFound)?;
        if !counters.active {
            return Err(AppError::PostInactive);
        }

        let now = self.clock.now();
        let outcome = record_or_flip(tx.as_mut(), user_id, post_id, desired, now).await?;

        counters.apply_outcome(outcome).map_err(|e| {
            error!(
                post_id = %post_id,
                user_id = %user_id,
                error = %e,
                "Post counters disagree with the interaction ledger"
            );
            AppError::InternalInconsistency(format!("post {}: {}", post_id, e))
        })?;

        tx.save_counters(post_id, &counters, now).await?;
        tx.commit().await?;

        let deactivated = !counters.active;
        if deactivated {
            POST_DEACTIVATIONS_TOTAL.inc();
            warn!(
                post_id = %post_id,
                dislike_count = counters.dislike_count,
                "Post deactivated by dislike threshold"
            );
        }

        Ok(summarize(post_id, counters, outcome, deactivated))
    }
}

/// Write the ledger change for `desired`, returning what was written
async fn record_or_flip(
    tx: &mut dyn VoteTransaction,
    user_id: Uuid,
    post_id: &str,
    desired: InteractionType,
    now: DateTime<Utc>,
) -> Result<Outcome> {
    let state = VoteState::from(tx.find_interaction(user_id, post_id).await?);
    let outcome = state.transition(desired)?;

    match outcome {
        Outcome::Created(interaction_type) => {
            tx.insert_interaction(&Interaction {
                user_id,
                post_id: post_id.to_string(),
                interaction_type,
                created_at: now,
            })
            .await?
        }
        Outcome::Flipped { to, .. } => tx.update_interaction(user_id, post_id, to, now).await?,
    }

    Ok(outcome)
}

fn summarize(
    post_id: &str,
    counters: PostCounters,
    outcome: Outcome,
    deactivated: bool,
) -> VoteSummary {
    VoteSummary {
        post_id: post_id.to_string(),
        like_count: counters.like_count,
        dislike_count: counters.dislike_count,
        active: counters.active,
        outcome,
        deactivated,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::MemoryVoteStore;

    #[tokio::test]
    async fn test_blank_post_id_is_validation_error() {
        let service = InteractionService::new(Arc::new(MemoryVoteStore::new()));
        let err = service
            .vote(Uuid::new_v4(), "   ", InteractionType::Like)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn test_underflow_is_internal_inconsistency() {
        let store = MemoryVoteStore::new();
        store
            .insert_post("POST-1", PostCounters::new(0, 0, true))
            .await;
        let user = Uuid::new_v4();

        // Ledger says the user liked, counters say nobody did.
        let mut tx = store.begin().await.unwrap();
        tx.insert_interaction(&Interaction {
            user_id: user,
            post_id: "POST-1".into(),
            interaction_type: InteractionType::Like,
            created_at: Utc::now(),
        })
        .await
        .unwrap();
        tx.commit().await.unwrap();
        drop(tx);

        let service = InteractionService::new(Arc::new(store.clone()));
        let err = service
            .vote(user, "POST-1", InteractionType::Dislike)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InternalInconsistency(_)));

        // The flip was rolled back with the transaction.
        let entry = store.interaction(user, "POST-1").await.unwrap();
        assert_eq!(entry.interaction_type, InteractionType::Like);
        assert_eq!(store.counters("POST-1").await, Some(PostCounters::new(0, 0, true)));
    }

    #[test]
    fn test_summary_messages() {
        let mut summary = summarize(
            "POST-1",
            PostCounters::new(0, 10, false),
            Outcome::Created(InteractionType::Dislike),
            true,
        );
        assert_eq!(
            summary.message(),
            "Post disliked and deactivated due to excessive dislikes"
        );

        summary.deactivated = false;
        summary.outcome = Outcome::Flipped {
            from: InteractionType::Dislike,
            to: InteractionType::Like,
        };
        assert_eq!(
            summary.message(),
            "Post liked successfully (changed from dislike)"
        );
    }

    #[test]
    fn test_flip_across_threshold_keeps_flip_message() {
        let summary = summarize(
            "POST-1",
            PostCounters::new(0, 10, false),
            Outcome::Flipped {
                from: InteractionType::Like,
                to: InteractionType::Dislike,
            },
            true,
        );
        assert!(!summary.active);
        assert_eq!(
            summary.message(),
            "Post disliked successfully (changed from like)"
        );
    }
}
