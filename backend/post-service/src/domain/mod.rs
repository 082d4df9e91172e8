pub mod aggregate;
pub mod ledger;
pub mod models;
pub mod moderation;

pub use aggregate::{CounterUnderflow, PostCounters};
pub use ledger::{Outcome, VoteState};
pub use models::{InteractionType, PageInfo, PageRequest, Post, UserLevel};
