//! Automatic moderation of disliked posts

/// Dislike count at which a post is taken down
pub const DISLIKE_THRESHOLD: i64 = 10;

/// Whether a post with `dislike_count` dislikes must be deactivated
///
/// Deactivation is permanent; no rule ever sets a post active again.
pub fn should_deactivate(dislike_count: i64) -> bool {
    dislike_count >= DISLIKE_THRESHOLD
}
