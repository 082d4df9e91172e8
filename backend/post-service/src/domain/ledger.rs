//! Per-user vote state machine for the interaction ledger
//!
//! A user holds at most one vote per post. The first vote creates the ledger
//! entry, a changed vote flips it in place, and repeating the current vote is
//! rejected without touching anything.
use super::models::InteractionType;
use crate::error::AppError;

/// Vote a user currently holds on a post
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoteState {
    NoVote,
    Liked,
    Disliked,
}

impl From<Option<InteractionType>> for VoteState {
    fn from(existing: Option<InteractionType>) -> Self {
        match existing {
            None => VoteState::NoVote,
            Some(InteractionType::Like) => VoteState::Liked,
            Some(InteractionType::Dislike) => VoteState::Disliked,
        }
    }
}

impl VoteState {
    pub fn current(&self) -> Option<InteractionType> {
        match self {
            VoteState::NoVote => None,
            VoteState::Liked => Some(InteractionType::Like),
            VoteState::Disliked => Some(InteractionType::Dislike),
        }
    }

    /// Decide the ledger write for a `desired` vote
    pub fn transition(self, desired: InteractionType) -> Result<Outcome, AppError> {
        match self.current() {
            None => Ok(Outcome::Created(desired)),
            Some(held) if held == desired => Err(AppError::DuplicateVote(desired)),
            Some(held) => Ok(Outcome::Flipped {
                from: held,
                to: desired,
            }),
        }
    }
}

/// Accepted ledger change; exactly one ledger row is written for each
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Created(InteractionType),
    Flipped {
        from: InteractionType,
        to: InteractionType,
    },
}

impl Outcome {
    pub fn resulting_type(&self) -> InteractionType {
        match self {
            Outcome::Created(t) => *t,
            Outcome::Flipped { to, .. } => *to,
        }
    }

    /// Whether this change adds a dislike, which triggers moderation
    pub fn increases_dislikes(&self) -> bool {
        self.resulting_type() == InteractionType::Dislike
    }

    pub fn label(&self) -> &'static str {
        match self {
            Outcome::Created(_) => "created",
            Outcome::Flipped { .. } => "flipped",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use InteractionType::{Dislike, Like};

    #[test]
    fn test_first_vote_creates_entry() {
        assert_eq!(VoteState::NoVote.transition(Like).unwrap(), Outcome::Created(Like));
        assert_eq!(
            VoteState::NoVote.transition(Dislike).unwrap(),
            Outcome::Created(Dislike)
        );
    }

    #[test]
    fn test_repeated_vote_is_duplicate() {
        assert!(matches!(
            VoteState::Liked.transition(Like),
            Err(AppError::DuplicateVote(Like))
        ));
        assert!(matches!(
            VoteState::Disliked.transition(Dislike),
            Err(AppError::DuplicateVote(Dislike))
        ));
    }

    #[test]
    fn test_changed_vote_flips() {
        assert_eq!(
            VoteState::Liked.transition(Dislike).unwrap(),
            Outcome::Flipped {
                from: Like,
                to: Dislike
            }
        );
        assert_eq!(
            VoteState::Disliked.transition(Like).unwrap(),
            Outcome::Flipped {
                from: Dislike,
                to: Like
            }
        );
    }

    #[test]
    fn test_only_dislike_outcomes_trigger_moderation() {
        assert!(Outcome::Created(Dislike).increases_dislikes());
        assert!(Outcome::Flipped {
            from: Like,
            to: Dislike
        }
        .increases_dislikes());
        assert!(!Outcome::Created(Like).increases_dislikes());
        assert!(!Outcome::Flipped {
            from: Dislike,
            to: Like
        }
        .increases_dislikes());
    }
}
