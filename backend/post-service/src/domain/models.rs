use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Kind of vote a user holds on a post
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "interaction_type", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum InteractionType {
    Like,
    Dislike,
}

impl InteractionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            InteractionType::Like => "like",
            InteractionType::Dislike => "dislike",
        }
    }

    pub fn past_tense(&self) -> &'static str {
        match self {
            InteractionType::Like => "liked",
            InteractionType::Dislike => "disliked",
        }
    }
}

impl fmt::Display for InteractionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ledger entry: one user's vote on one post
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Interaction {
    pub user_id: Uuid,
    pub post_id: String,
    pub interaction_type: InteractionType,
    pub created_at: DateTime<Utc>,
}

/// Activity tier derived from how many posts an account has created
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "user_level", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum UserLevel {
    New,
    Active,
    SuperActive,
}

impl UserLevel {
    pub fn from_posts_count(posts_count: i32) -> Self {
        if posts_count >= 10 {
            UserLevel::SuperActive
        } else if posts_count >= 5 {
            UserLevel::Active
        } else {
            UserLevel::New
        }
    }
}

/// Post row including its denormalized vote counters
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub post_id: String,
    pub caption: String,
    pub hashtags: Vec<String>,
    pub image_url: String,
    pub author_id: Uuid,
    pub author_username: String,
    pub author_state: String,
    pub author_level: UserLevel,
    pub like_count: i64,
    pub dislike_count: i64,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub last_interaction: DateTime<Utc>,
}

/// How an account proves its identity at login
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Credentials {
    /// The KYC hash is the only login key
    KycOnly,
    /// Argon2id PHC hash; username + password login is enabled
    Password(String),
}

impl Credentials {
    pub fn from_password_hash(password_hash: Option<String>) -> Self {
        match password_hash {
            Some(hash) => Credentials::Password(hash),
            None => Credentials::KycOnly,
        }
    }

    pub fn password_hash(&self) -> Option<&str> {
        match self {
            Credentials::KycOnly => None,
            Credentials::Password(hash) => Some(hash),
        }
    }
}

/// Registered account
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Account {
    pub id: Uuid,
    pub nullifier: String,
    pub username: String,
    pub kyc_hash: String,
    pub password_hash: Option<String>,
    pub wallet_address: String,
    pub state: String,
    pub posts_count: i32,
    pub user_level: UserLevel,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub last_login: Option<DateTime<Utc>>,
}

impl Account {
    pub fn credentials(&self) -> Credentials {
        Credentials::from_password_hash(self.password_hash.clone())
    }
}

/// Account projection returned to clients; never carries secrets
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub id: Uuid,
    pub username: String,
    pub wallet_address: String,
    pub state: String,
    pub posts_count: i32,
    pub user_level: UserLevel,
    pub has_password: bool,
    pub created_at: DateTime<Utc>,
    pub last_login: Option<DateTime<Utc>>,
}

impl From<&Account> for Profile {
    fn from(account: &Account) -> Self {
        Self {
            id: account.id,
            username: account.username.clone(),
            wallet_address: account.wallet_address.clone(),
            state: account.state.clone(),
            posts_count: account.posts_count,
            user_level: account.user_level,
            has_password: account.password_hash.is_some(),
            created_at: account.created_at,
            last_login: account.last_login,
        }
    }
}

/// Legacy wallet registry entry
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct WalletLink {
    pub wallet_address: String,
    #[serde(rename = "userId")]
    pub user_ref: String,
    pub tx_hash: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Page selection for feed queries
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: i64,
    pub limit: i64,
}

impl PageRequest {
    pub const DEFAULT_LIMIT: i64 = 20;
    pub const MAX_LIMIT: i64 = 100;

    /// Page defaults to 1; limit defaults to 20 and is clamped to 1..=100
    pub fn new(page: Option<i64>, limit: Option<i64>) -> Self {
        Self {
            page: page.filter(|p| *p >= 1).unwrap_or(1),
            limit: limit
                .unwrap_or(Self::DEFAULT_LIMIT)
                .clamp(1, Self::MAX_LIMIT),
        }
    }

    pub fn offset(&self) -> i64 {
        (self.page - 1).saturating_mul(self.limit)
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::new(None, None)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PageInfo {
    pub current_page: i64,
    pub total_pages: i64,
    pub total_posts: i64,
    pub has_next: bool,
    pub has_prev: bool,
}

impl PageInfo {
    pub fn new(request: PageRequest, total_posts: i64) -> Self {
        let total_pages = (total_posts + request.limit - 1) / request.limit;
        Self {
            current_page: request.page,
            total_pages,
            total_posts,
            has_next: request.page < total_pages,
            has_prev: request.page > 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_level_thresholds() {
        assert_eq!(UserLevel::from_posts_count(0), UserLevel::New);
        assert_eq!(UserLevel::from_posts_count(4), UserLevel::New);
        assert_eq!(UserLevel::from_posts_count(5), UserLevel::Active);
        assert_eq!(UserLevel::from_posts_count(9), UserLevel::Active);
        assert_eq!(UserLevel::from_posts_count(10), UserLevel::SuperActive);
    }

    #[test]
    fn test_page_request_defaults_and_clamping() {
        assert_eq!(PageRequest::new(None, None), PageRequest { page: 1, limit: 20 });
        assert_eq!(PageRequest::new(Some(0), Some(500)).limit, 100);
        assert_eq!(PageRequest::new(Some(-3), Some(0)), PageRequest { page: 1, limit: 1 });
        assert_eq!(PageRequest::new(Some(3), Some(10)).offset(), 20);
    }

    #[test]
    fn test_page_info() {
        let info = PageInfo::new(PageRequest::new(Some(2), Some(20)), 45);
        assert_eq!(info.total_pages, 3);
        assert!(info.has_next);
        assert!(info.has_prev);

        let empty = PageInfo::new(PageRequest::default(), 0);
        assert_eq!(empty.total_pages, 0);
        assert!(!empty.has_next);
        assert!(!empty.has_prev);
    }

    #[test]
    fn test_credentials_from_optional_hash() {
        assert_eq!(Credentials::from_password_hash(None), Credentials::KycOnly);
        let creds = Credentials::from_password_hash(Some("$argon2id$v=19$abc".into()));
        assert_eq!(creds.password_hash(), Some("$argon2id$v=19$abc"));
    }

    #[test]
    fn test_interaction_type_display() {
        assert_eq!(InteractionType::Like.to_string(), "like");
        assert_eq!(InteractionType::Dislike.to_string(), "dislike");
    }
}
