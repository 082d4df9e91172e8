pub mod accounts;
pub mod memory;
pub mod posts;
pub mod votes;
pub mod wallets;

pub use accounts::{AccountRepository, NewAccount};
pub use memory::MemoryVoteStore;
pub use posts::{NewPost, PostRepository};
pub use votes::PgVoteStore;
pub use wallets::WalletRepository;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::models::{Interaction, InteractionType};
use crate::domain::PostCounters;
use crate::error::Result;

/// Storage backing the vote engine.
///
/// Every vote runs inside one transaction obtained from `begin`. Nothing
/// written through the transaction is visible to others until `commit`, and a
/// transaction dropped without commit leaves storage unchanged.
#[async_trait]
pub trait VoteStore: Send + Sync {
    async fn begin(&self) -> Result<Box<dyn VoteTransaction>>;
}

/// Unit of work for a single vote
#[async_trait]
pub trait VoteTransaction: Send {
    /// Lock the post row and read its counters; `None` if no such post.
    ///
    /// Concurrent transactions locking the same post are serialized until
    /// this one commits or is dropped.
    async fn lock_post(&mut self, post_id: &str) -> Result<Option<PostCounters>>;

    /// Vote the user currently holds on the post
    async fn find_interaction(
        &mut self,
        user_id: Uuid,
        post_id: &str,
    ) -> Result<Option<InteractionType>>;

    /// Insert a new ledger entry; `Conflict` if one already exists
    async fn insert_interaction(&mut self, interaction: &Interaction) -> Result<()>;

    /// Change the type of an existing ledger entry
    async fn update_interaction(
        &mut self,
        user_id: Uuid,
        post_id: &str,
        interaction_type: InteractionType,
        at: DateTime<Utc>,
    ) -> Result<()>;

    /// Persist counters, active flag and last interaction time
    async fn save_counters(
        &mut self,
        post_id: &str,
        counters: &PostCounters,
        at: DateTime<Utc>,
    ) -> Result<()>;

    async fn commit(&mut self) -> Result<()>;
}

/// Message for a ledger insert rejected by the (user_id, post_id) key
pub(crate) const DUPLICATE_LEDGER_ENTRY: &str = "A vote for this post is already recorded";
