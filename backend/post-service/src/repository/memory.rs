//! In-process `VoteStore` used by tests and local tooling
//!
//! A transaction holds the store-wide lock from `begin` until it is committed
//! or dropped. Writes are staged and applied only on commit.
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};
use uuid::Uuid;

use super::{VoteStore, VoteTransaction, DUPLICATE_LEDGER_ENTRY};
use crate::domain::models::{Interaction, InteractionType};
use crate::domain::PostCounters;
use crate::error::{AppError, Result};

#[derive(Debug, Clone)]
struct StoredPost {
    counters: PostCounters,
    last_interaction: Option<DateTime<Utc>>,
}

#[derive(Debug, Default)]
struct MemoryState {
    posts: HashMap<String, StoredPost>,
    interactions: HashMap<(Uuid, String), Interaction>,
}

#[derive(Debug, Clone)]
enum StagedWrite {
    Insert(Interaction),
    Update {
        user_id: Uuid,
        post_id: String,
        interaction_type: InteractionType,
    },
    Counters {
        post_id: String,
        counters: PostCounters,
        at: DateTime<Utc>,
    },
}

#[derive(Clone, Default)]
pub struct MemoryVoteStore {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryVoteStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a post with the given counters
    pub async fn insert_post(&self, post_id: &str, counters: PostCounters) {
        self.state.lock().await.posts.insert(
            post_id.to_string(),
            StoredPost {
                counters,
                last_interaction: None,
            },
        );
    }

    pub async fn counters(&self, post_id: &str) -> Option<PostCounters> {
        self.state
            .lock()
            .await
            .posts
            .get(post_id)
            .map(|p| p.counters)
    }

    pub async fn last_interaction(&self, post_id: &str) -> Option<DateTime<Utc>> {
        self.state
            .lock()
            .await
            .posts
            .get(post_id)
            .and_then(|p| p.last_interaction)
    }

    /// Ledger entries referencing `post_id`
    pub async fn interactions(&self, post_id: &str) -> Vec<Interaction> {
        self.state
            .lock()
            .await
            .interactions
            .values()
            .filter(|i| i.post_id == post_id)
            .cloned()
            .collect()
    }

    pub async fn interaction(&self, user_id: Uuid, post_id: &str) -> Option<Interaction> {
        self.state
            .lock()
            .await
            .interactions
            .get(&(user_id, post_id.to_string()))
            .cloned()
    }
}

#[async_trait]
impl VoteStore for MemoryVoteStore {
    async fn begin(&self) -> Result<Box<dyn VoteTransaction>> {
        let guard = self.state.clone().lock_owned().await;
        Ok(Box::new(MemoryTransaction {
            guard,
            staged: Vec::new(),
            committed: false,
        }))
    }
}

pub struct MemoryTransaction {
    guard: OwnedMutexGuard<MemoryState>,
    staged: Vec<StagedWrite>,
    committed: bool,
}

impl MemoryTransaction {
    fn ensure_open(&self) -> Result<()> {
        if self.committed {
            return Err(AppError::Internal(
                "vote transaction already committed".to_string(),
            ));
        }
        Ok(())
    }

    fn staged_counters(&self, post_id: &str) -> Option<PostCounters> {
        self.staged.iter().rev().find_map(|w| match w {
            StagedWrite::Counters {
                post_id: id,
                counters,
                ..
            } if id == post_id => Some(*counters),
            _ => None,
        })
    }

    fn staged_interaction(&self, user_id: Uuid, post_id: &str) -> Option<InteractionType> {
        self.staged.iter().rev().find_map(|w| match w {
            StagedWrite::Insert(i) if i.user_id == user_id && i.post_id == post_id => {
                Some(i.interaction_type)
            }
            StagedWrite::Update {
                user_id: u,
                post_id: p,
                interaction_type,
            } if *u == user_id && p == post_id => Some(*interaction_type),
            _ => None,
        })
    }
}

#[async_trait]
impl VoteTransaction for MemoryTransaction {
    async fn lock_post(&mut self, post_id: &str) -> Result<Option<PostCounters>> {
        self.ensure_open()?;
        if let Some(counters) = self.staged_counters(post_id) {
            return Ok(Some(counters));
        }
        Ok(self.guard.posts.get(post_id).map(|p| p.counters))
    }

    async fn find_interaction(
        &mut self,
        user_id: Uuid,
        post_id: &str,
    ) -> Result<Option<InteractionType>> {
        self.ensure_open()?;
        if let Some(staged) = self.staged_interaction(user_id, post_id) {
            return Ok(Some(staged));
        }
        Ok(self
            .guard
            .interactions
            .get(&(user_id, post_id.to_string()))
            .map(|i| i.interaction_type))
    }

    async fn insert_interaction(&mut self, interaction: &Interaction) -> Result<()> {
        self.ensure_open()?;
        let key = (interaction.user_id, interaction.post_id.clone());
        if self.guard.interactions.contains_key(&key)
            || self
                .staged_interaction(interaction.user_id, &interaction.post_id)
                .is_some()
        {
            return Err(AppError::Conflict(DUPLICATE_LEDGER_ENTRY.to_string()));
        }
        self.staged.push(StagedWrite::Insert(interaction.clone()));
        Ok(())
    }

    async fn update_interaction(
        &mut self,
        user_id: Uuid,
        post_id: &str,
        interaction_type: InteractionType,
        _at: DateTime<Utc>,
    ) -> Result<()> {
        self.ensure_open()?;
        let exists = self
            .guard
            .interactions
            .contains_key(&(user_id, post_id.to_string()))
            || self.staged_interaction(user_id, post_id).is_some();
        if !exists {
            return Err(AppError::InternalInconsistency(format!(
                "ledger entry for post {} vanished before flip",
                post_id
            )));
        }
        self.staged.push(StagedWrite::Update {
            user_id,
            post_id: post_id.to_string(),
            interaction_type,
        });
        Ok(())
    }

    async fn save_counters(
        &mut self,
        post_id: &str,
        counters: &PostCounters,
        at: DateTime<Utc>,
    ) -> Result<()> {
        self.ensure_open()?;
        self.staged.push(StagedWrite::Counters {
            post_id: post_id.to_string(),
            counters: *counters,
            at,
        });
        Ok(())
    }

    async fn commit(&mut self) -> Result<()> {
        self.ensure_open()?;
        let state = &mut *self.guard;
        for write in self.staged.drain(..) {
            match write {
                StagedWrite::Insert(interaction) => {
                    state.interactions.insert(
                        (interaction.user_id, interaction.post_id.clone()),
                        interaction,
                    );
                }
                StagedWrite::Update {
                    user_id,
                    post_id,
                    interaction_type,
                } => {
                    if let Some(entry) = state.interactions.get_mut(&(user_id, post_id)) {
                        entry.interaction_type = interaction_type;
                    }
                }
                StagedWrite::Counters {
                    post_id,
                    counters,
                    at,
                } => {
                    if let Some(post) = state.posts.get_mut(&post_id) {
                        post.counters = counters;
                        post.last_interaction = Some(at);
                    }
                }
            }
        }
        self.committed = true;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn like(user_id: Uuid, post_id: &str) -> Interaction {
        Interaction {
            user_id,
            post_id: post_id.to_string(),
            interaction_type: InteractionType::Like,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_dropped_transaction_leaves_store_unchanged() {
        let store = MemoryVoteStore::new();
        store.insert_post("POST-1", PostCounters::new(0, 0, true)).await;
        let user = Uuid::new_v4();

        {
            let mut tx = store.begin().await.unwrap();
            tx.insert_interaction(&like(user, "POST-1")).await.unwrap();
            tx.save_counters("POST-1", &PostCounters::new(1, 0, true), Utc::now())
                .await
                .unwrap();
        }

        assert_eq!(store.counters("POST-1").await, Some(PostCounters::new(0, 0, true)));
        assert!(store.interactions("POST-1").await.is_empty());
    }

    #[tokio::test]
    async fn test_committed_writes_are_visible() {
        let store = MemoryVoteStore::new();
        store.insert_post("POST-1", PostCounters::new(0, 0, true)).await;
        let user = Uuid::new_v4();

        let mut tx = store.begin().await.unwrap();
        tx.insert_interaction(&like(user, "POST-1")).await.unwrap();
        tx.save_counters("POST-1", &PostCounters::new(1, 0, true), Utc::now())
            .await
            .unwrap();
        tx.commit().await.unwrap();
        drop(tx);

        assert_eq!(store.counters("POST-1").await, Some(PostCounters::new(1, 0, true)));
        assert_eq!(store.interactions("POST-1").await.len(), 1);
        assert!(store.last_interaction("POST-1").await.is_some());
    }

    #[tokio::test]
    async fn test_second_insert_for_same_key_conflicts() {
        let store = MemoryVoteStore::new();
        store.insert_post("POST-1", PostCounters::new(0, 0, true)).await;
        let user = Uuid::new_v4();

        let mut tx = store.begin().await.unwrap();
        tx.insert_interaction(&like(user, "POST-1")).await.unwrap();
        let err = tx.insert_interaction(&like(user, "POST-1")).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_commit_twice_is_rejected() {
        let store = MemoryVoteStore::new();
        let mut tx = store.begin().await.unwrap();
        tx.commit().await.unwrap();
        assert!(tx.commit().await.is_err());
    }
}
