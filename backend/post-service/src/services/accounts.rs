use chrono::Utc;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;
use validator::Validate;

use crate::domain::models::{Account, Credentials, Post, Profile};
use crate::error::{AppError, Result};
use crate::metrics::AUTH_EVENTS_TOTAL;
use crate::repository::{AccountRepository, NewAccount, PostRepository};
use crate::security::password;

const USERNAME_ATTEMPTS: usize = 5;

const NULLIFIER_TAKEN: &str = "This Aadhaar has already been used for registration";
const REGISTRATION_CONFLICTS: &[(&str, &str)] = &[
    ("accounts_nullifier_key", NULLIFIER_TAKEN),
    ("accounts_kyc_hash_key", "This KYC hash has already been used"),
    ("accounts_wallet_address_key", "Wallet address already registered"),
];
const WALLET_TAKEN: &str = "Wallet address already registered by another user";

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    #[validate(length(min = 1, message = "nullifier is required"))]
    #[serde(default)]
    pub nullifier: String,
    #[validate(length(min = 1, message = "kycHash is required"))]
    #[serde(default)]
    pub kyc_hash: String,
    pub password: Option<String>,
    #[validate(length(min = 1, message = "walletAddress is required"))]
    #[serde(default)]
    pub wallet_address: String,
    #[validate(length(min = 1, message = "state is required"))]
    #[serde(default)]
    pub state: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub username: Option<String>,
    pub password: Option<String>,
    pub kyc_hash: Option<String>,
}

/// Credential a login request presents
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginMethod {
    Kyc(String),
    Password { username: String, password: String },
}

impl TryFrom<LoginRequest> for LoginMethod {
    type Error = AppError;

    /// A KYC hash wins over username/password when both are present
    fn try_from(req: LoginRequest) -> Result<Self> {
        let non_empty = |v: Option<String>| v.filter(|s| !s.trim().is_empty());
        if let Some(kyc_hash) = non_empty(req.kyc_hash) {
            return Ok(LoginMethod::Kyc(kyc_hash));
        }
        match (non_empty(req.username), non_empty(req.password)) {
            (Some(username), Some(password)) => Ok(LoginMethod::Password { username, password }),
            _ => Err(AppError::Validation(
                "Either kycHash or username/password are required".to_string(),
            )),
        }
    }
}

/// Authenticated account plus a freshly issued session token
#[derive(Debug, Clone)]
pub struct Session {
    pub token: String,
    pub account: Account,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostStats {
    pub total_posts: usize,
    pub active_posts: usize,
    pub inactive_posts: usize,
    pub total_likes: i64,
    pub total_dislikes: i64,
    pub engagement_ratio: f64,
}

impl PostStats {
    pub fn from_posts(posts: &[Post]) -> Self {
        let total_posts = posts.len();
        let active_posts = posts.iter().filter(|p| p.active).count();
        let total_likes: i64 = posts.iter().map(|p| p.like_count).sum();
        let total_dislikes: i64 = posts.iter().map(|p| p.dislike_count).sum();
        let engagement_ratio = if total_posts == 0 {
            0.0
        } else {
            let raw = (total_likes + total_dislikes) as f64 / total_posts as f64;
            (raw * 100.0).round() / 100.0
        };

        Self {
            total_posts,
            active_posts,
            inactive_posts: total_posts - active_posts,
            total_likes,
            total_dislikes,
            engagement_ratio,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Dashboard {
    pub user: Profile,
    pub stats: PostStats,
    pub posts: Vec<Post>,
}

pub fn generate_username<R: Rng>(rng: &mut R) -> String {
    format!("metis{}", rng.gen_range(0..1_000_000_000u32))
}

pub fn normalize_state(state: &str) -> String {
    state.trim().to_lowercase()
}

#[derive(Clone)]
pub struct AccountService {
    accounts: AccountRepository,
    posts: PostRepository,
}

impl AccountService {
    pub fn new(accounts: AccountRepository, posts: PostRepository) -> Self {
        Self { accounts, posts }
    }

    pub async fn check_nullifier(&self, nullifier: &str) -> Result<()> {
        if nullifier.trim().is_empty() {
            return Err(AppError::Validation("Nullifier is required".to_string()));
        }
        if self.accounts.nullifier_exists(nullifier).await? {
            return Err(AppError::Conflict(NULLIFIER_TAKEN.to_string()));
        }
        Ok(())
    }

    pub async fn register(&self, req: RegisterRequest) -> Result<Session> {
        req.validate()?;

        let credentials = match req.password.as_deref().filter(|p| !p.is_empty()) {
            Some(plain) => Credentials::Password(password::hash_password(plain)?),
            None => Credentials::KycOnly,
        };

        let mut new_account = NewAccount {
            nullifier: req.nullifier,
            username: String::new(),
            kyc_hash: req.kyc_hash,
            credentials,
            wallet_address: req.wallet_address,
            state: normalize_state(&req.state),
        };

        for attempt in 1..=USERNAME_ATTEMPTS {
            new_account.username = generate_username(&mut rand::thread_rng());

            match self.accounts.insert(&new_account).await {
                Ok(account) => {
                    AUTH_EVENTS_TOTAL
                        .with_label_values(&["register", "success"])
                        .inc();
                    info!(
                        user_id = %account.id,
                        username = %account.username,
                        state = %account.state,
                        "Account registered"
                    );
                    let token = issue_token(&account)?;
                    return Ok(Session { token, account });
                }
                Err(e) => match db_pool::unique_violation_constraint(&e).as_deref() {
                    Some("accounts_username_key") => {
                        warn!(attempt, "Generated username collided, retrying");
                        continue;
                    }
                    _ => {
                        AUTH_EVENTS_TOTAL
                            .with_label_values(&["register", "failure"])
                            .inc();
                        return Err(AppError::from_unique_violation(
                            e,
                            REGISTRATION_CONFLICTS,
                            "Account already registered",
                        ));
                    }
                },
            }
        }

        Err(AppError::Conflict(
            "Could not allocate a unique username, try again".to_string(),
        ))
    }

    pub async fn login(&self, req: LoginRequest) -> Result<Session> {
        let method = LoginMethod::try_from(req)?;

        let account = match &method {
            LoginMethod::Kyc(kyc_hash) => self
                .accounts
                .find_active_by_kyc_hash(kyc_hash)
                .await?
                .ok_or_else(|| AppError::Unauthorized("Invalid KYC hash".to_string()))?,
            LoginMethod::Password {
                username,
                password: plain,
            } => {
                let invalid = || AppError::Unauthorized("Invalid username or password".to_string());
                let account = self
                    .accounts
                    .find_active_by_username(username)
                    .await?
                    .ok_or_else(invalid)?;
                let verified = match account.credentials() {
                    Credentials::Password(hash) => password::verify_password(plain, &hash)?,
                    Credentials::KycOnly => false,
                };
                if !verified {
                    AUTH_EVENTS_TOTAL
                        .with_label_values(&["login", "failure"])
                        .inc();
                    return Err(invalid());
                }
                account
            }
        };

        let now = Utc::now();
        self.accounts.touch_last_login(account.id, now).await?;
        let account = Account {
            last_login: Some(now),
            ..account
        };

        AUTH_EVENTS_TOTAL.with_label_values(&["login", "success"]).inc();
        info!(user_id = %account.id, "Login successful");

        let token = issue_token(&account)?;
        Ok(Session { token, account })
    }

    /// Load the account behind an authenticated request; it must still be active
    pub async fn current_user(&self, user_id: Uuid) -> Result<Account> {
        match self.accounts.find_by_id(user_id).await? {
            Some(account) if account.is_active => Ok(account),
            _ => Err(AppError::Unauthorized(
                "Invalid token. User not found.".to_string(),
            )),
        }
    }

    pub async fn update_wallet(&self, user_id: Uuid, wallet_address: &str) -> Result<Account> {
        let wallet_address = wallet_address.trim();
        if wallet_address.is_empty() {
            return Err(AppError::Validation("Wallet address is required".to_string()));
        }

        let updated = self
            .accounts
            .update_wallet(user_id, wallet_address)
            .await
            .map_err(|e| AppError::from_unique_violation(e, &[], WALLET_TAKEN))?;

        let account = updated.ok_or_else(|| AppError::NotFound("User not found".to_string()))?;
        info!(user_id = %user_id, "Wallet address updated");
        Ok(account)
    }

    pub async fn dashboard(&self, account: &Account) -> Result<Dashboard> {
        let posts = self.posts.list_by_author(account.id, true).await?;
        Ok(Dashboard {
            user: Profile::from(account),
            stats: PostStats::from_posts(&posts),
            posts,
        })
    }
}

fn issue_token(account: &Account) -> Result<String> {
    crypto_core::jwt::generate_session_token(account.id, &account.username, &account.state)
        .map_err(|e| AppError::Internal(format!("Failed to issue session token: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::UserLevel;
    use chrono::Utc;

    fn post(active: bool, likes: i64, dislikes: i64) -> Post {
        Post {
            post_id: format!("POST-{}", Uuid::new_v4()),
            caption: "caption".into(),
            hashtags: vec![],
            image_url: "ipfs://hash".into(),
            author_id: Uuid::new_v4(),
            author_username: "metis1".into(),
            author_state: "kerala".into(),
            author_level: UserLevel::New,
            like_count: likes,
            dislike_count: dislikes,
            active,
            created_at: Utc::now(),
            last_interaction: Utc::now(),
        }
    }

    #[test]
    fn test_login_method_prefers_kyc_hash() {
        let method = LoginMethod::try_from(LoginRequest {
            username: Some("metis1".into()),
            password: Some("secret1".into()),
            kyc_hash: Some("kyc".into()),
        })
        .unwrap();
        assert_eq!(method, LoginMethod::Kyc("kyc".into()));
    }

    #[test]
    fn test_login_method_requires_both_username_and_password() {
        let err = LoginMethod::try_from(LoginRequest {
            username: Some("metis1".into()),
            ..LoginRequest::default()
        })
        .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));

        assert!(LoginMethod::try_from(LoginRequest::default()).is_err());
    }

    #[test]
    fn test_register_request_reports_missing_fields() {
        let req = RegisterRequest {
            nullifier: String::new(),
            kyc_hash: "kyc".into(),
            password: None,
            wallet_address: String::new(),
            state: "Kerala".into(),
        };
        let err = AppError::from(req.validate().unwrap_err());
        let message = err.to_string();
        assert!(message.contains("nullifier is required"));
        assert!(message.contains("walletAddress is required"));
    }

    #[test]
    fn test_generated_username_shape() {
        let name = generate_username(&mut rand::thread_rng());
        let digits = name.strip_prefix("metis").unwrap();
        assert!(!digits.is_empty());
        assert!(digits.parse::<u32>().unwrap() < 1_000_000_000);
    }

    #[test]
    fn test_state_is_normalized() {
        assert_eq!(normalize_state("  Tamil Nadu "), "tamil nadu");
    }

    #[test]
    fn test_post_stats() {
        let posts = vec![post(true, 3, 1), post(false, 0, 10), post(true, 1, 0)];
        let stats = PostStats::from_posts(&posts);
        assert_eq!(stats.total_posts, 3);
        assert_eq!(stats.active_posts, 2);
        assert_eq!(stats.inactive_posts, 1);
        assert_eq!(stats.total_likes, 4);
        assert_eq!(stats.total_dislikes, 11);
        assert_eq!(stats.engagement_ratio, 5.0);

        let stats = PostStats::from_posts(&[post(true, 1, 0), post(true, 0, 1), post(true, 0, 0)]);
        assert_eq!(stats.engagement_ratio, 0.67);

        assert_eq!(PostStats::from_posts(&[]), PostStats::default());
    }
}
