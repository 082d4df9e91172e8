//! Denormalized vote counters cached on the post row
use serde::Serialize;
use thiserror::Error;

use super::ledger::Outcome;
use super::models::InteractionType;
use super::moderation::should_deactivate;

/// Which counter an outcome tried to decrement below zero
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{counter} would underflow applying {outcome:?}")]
pub struct CounterUnderflow {
    pub counter: &'static str,
    pub outcome: Outcome,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostCounters {
    pub like_count: i64,
    pub dislike_count: i64,
    pub active: bool,
}

impl PostCounters {
    pub fn new(like_count: i64, dislike_count: i64, active: bool) -> Self {
        Self {
            like_count,
            dislike_count,
            active,
        }
    }

    /// Apply a ledger outcome to the counters.
    ///
    /// On error the counters are left untouched. Moderation runs only when the
    /// outcome adds a dislike, and never sets `active` back to true.
    pub fn apply_outcome(&mut self, outcome: Outcome) -> Result<(), CounterUnderflow> {
        let mut next = *self;
        match outcome {
            Outcome::Created(InteractionType::Like) => next.like_count += 1,
            Outcome::Created(InteractionType::Dislike) => next.dislike_count += 1,
            Outcome::Flipped { from, to } => {
                next.decrement(from, outcome)?;
                next.increment(to);
            }
        }

        if outcome.increases_dislikes() && should_deactivate(next.dislike_count) {
            next.active = false;
        }

        *self = next;
        Ok(())
    }

    fn increment(&mut self, kind: InteractionType) {
        match kind {
            InteractionType::Like => self.like_count += 1,
            InteractionType::Dislike => self.dislike_count += 1,
        }
    }

    fn decrement(&mut self, kind: InteractionType, outcome: Outcome) -> Result<(), CounterUnderflow> {
        let (counter, name) = match kind {
            InteractionType::Like => (&mut self.like_count, "like_count"),
            InteractionType::Dislike => (&mut self.dislike_count, "dislike_count"),
        };
        if *counter <= 0 {
            return Err(CounterUnderflow {
                counter: name,
                outcome,
            });
        }
        *counter -= 1;
        Ok(())
    }

    pub fn total(&self) -> i64 {
        self.like_count + self.dislike_count
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use InteractionType::{Dislike, Like};

    #[test]
    fn test_created_like_increments_likes() {
        let mut counters = PostCounters::new(0, 0, true);
        counters.apply_outcome(Outcome::Created(Like)).unwrap();
        assert_eq!(counters, PostCounters::new(1, 0, true));
    }

    #[test]
    fn test_tenth_dislike_deactivates() {
        let mut counters = PostCounters::new(0, 9, true);
        counters.apply_outcome(Outcome::Created(Dislike)).unwrap();
        assert_eq!(counters, PostCounters::new(0, 10, false));
    }

    #[test]
    fn test_flip_to_dislike_runs_moderation() {
        let mut counters = PostCounters::new(3, 9, true);
        counters
            .apply_outcome(Outcome::Flipped {
                from: Like,
                to: Dislike,
            })
            .unwrap();
        assert_eq!(counters, PostCounters::new(2, 10, false));
    }

    #[test]
    fn test_flip_to_like_never_reactivates() {
        let mut counters = PostCounters::new(0, 10, false);
        counters
            .apply_outcome(Outcome::Flipped {
                from: Dislike,
                to: Like,
            })
            .unwrap();
        assert_eq!(counters, PostCounters::new(1, 9, false));
    }

    #[test]
    fn test_underflow_leaves_counters_untouched() {
        let mut counters = PostCounters::new(0, 4, true);
        let err = counters
            .apply_outcome(Outcome::Flipped {
                from: Like,
                to: Dislike,
            })
            .unwrap_err();
        assert_eq!(err.counter, "like_count");
        assert_eq!(counters, PostCounters::new(0, 4, true));
    }
}
