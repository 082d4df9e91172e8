use chrono::Utc;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::info;
use validator::Validate;

use crate::domain::models::{Account, PageInfo, PageRequest, Post};
use crate::error::{AppError, Result};
use crate::metrics::POSTS_CREATED_TOTAL;
use crate::repository::{NewPost, PostRepository};

const BASE36: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
const POST_ID_TAKEN: &str = "Post ID already exists, try again.";

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreatePostRequest {
    #[validate(length(min = 1, max = 1000, message = "Caption must be 1-1000 characters"))]
    #[serde(default)]
    pub caption: String,
    #[serde(default)]
    pub hashtags: Vec<String>,
    #[validate(length(min = 1, message = "Image URL (IPFS hash) is required"))]
    #[serde(default)]
    pub image_url: String,
}

/// One page of a feed
#[derive(Debug, Clone, Serialize)]
pub struct FeedPage {
    pub posts: Vec<Post>,
    pub pagination: PageInfo,
}

/// `POST-<9 base36 chars>-<unix millis>`
pub fn generate_post_id<R: Rng>(rng: &mut R, unix_millis: i64) -> String {
    let suffix: String = (0..9)
        .map(|_| BASE36[rng.gen_range(0..BASE36.len())] as char)
        .collect();
    format!("POST-{}-{}", suffix, unix_millis)
}

#[derive(Clone)]
pub struct PostService {
    posts: PostRepository,
}

impl PostService {
    pub fn new(posts: PostRepository) -> Self {
        Self { posts }
    }

    /// Create a post and credit it to the author's post count and level
    pub async fn create_post(&self, author: &Account, req: CreatePostRequest) -> Result<Post> {
        req.validate()?;
        let caption = req.caption.trim();
        if caption.is_empty() {
            return Err(AppError::Validation(
                "Caption must be 1-1000 characters".to_string(),
            ));
        }

        let new_post = NewPost {
            post_id: generate_post_id(&mut rand::thread_rng(), Utc::now().timestamp_millis()),
            caption: caption.to_string(),
            hashtags: req
                .hashtags
                .into_iter()
                .map(|h| h.trim().to_string())
                .filter(|h| !h.is_empty())
                .collect(),
            image_url: req.image_url.trim().to_string(),
            author_id: author.id,
            author_username: author.username.clone(),
            author_state: author.state.clone(),
            author_level: author.user_level,
        };

        let mut tx = self.posts.pool().begin().await?;
        let post = PostRepository::insert(&mut tx, &new_post)
            .await
            .map_err(|e| AppError::from_unique_violation(e, &[], POST_ID_TAKEN))?;
        let (posts_count, level) = PostRepository::record_authored_post(&mut tx, author.id).await?;
        tx.commit().await?;

        POSTS_CREATED_TOTAL.inc();
        info!(
            post_id = %post.post_id,
            author_id = %author.id,
            posts_count,
            user_level = ?level,
            "Post created"
        );
        Ok(post)
    }

    /// Active posts from the viewer's own state, newest first
    pub async fn feed_for_region(&self, viewer: &Account, page: PageRequest) -> Result<FeedPage> {
        let posts = self
            .posts
            .list_active_by_state(&viewer.state, page.limit, page.offset())
            .await?;
        let total = self.posts.count_active_by_state(&viewer.state).await?;
        Ok(FeedPage {
            posts,
            pagination: PageInfo::new(page, total),
        })
    }

    pub async fn all_posts(&self, page: PageRequest) -> Result<FeedPage> {
        let posts = self.posts.list_active(page.limit, page.offset()).await?;
        let total = self.posts.count_active().await?;
        Ok(FeedPage {
            posts,
            pagination: PageInfo::new(page, total),
        })
    }

    pub async fn my_posts(&self, author: &Account) -> Result<Vec<Post>> {
        Ok(self.posts.list_by_author(author.id, false).await?)
    }

    pub async fn get_post(&self, viewer: &Account, post_id: &str) -> Result<Post> {
        let post = self
            .posts
            .find_active(post_id)
            .await?
            .ok_or(AppError::PostNotFound)?;
        ensure_same_region(viewer, &post)?;
        Ok(post)
    }
}

pub fn ensure_same_region(viewer: &Account, post: &Post) -> Result<()> {
    if viewer.state != post.author_state {
        return Err(AppError::Forbidden(
            "You can only view posts from your state".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::UserLevel;
    use uuid::Uuid;

    fn account(state: &str) -> Account {
        Account {
            id: Uuid::new_v4(),
            nullifier: "n".into(),
            username: "metis42".into(),
            kyc_hash: "k".into(),
            password_hash: None,
            wallet_address: "0xabc".into(),
            state: state.into(),
            posts_count: 0,
            user_level: UserLevel::New,
            is_active: true,
            created_at: Utc::now(),
            last_login: None,
        }
    }

    fn post_in(state: &str) -> Post {
        Post {
            post_id: "POST-abc123xyz-1700000000000".into(),
            caption: "hello".into(),
            hashtags: vec![],
            image_url: "Qm123".into(),
            author_id: Uuid::new_v4(),
            author_username: "metis7".into(),
            author_state: state.into(),
            author_level: UserLevel::New,
            like_count: 0,
            dislike_count: 0,
            active: true,
            created_at: Utc::now(),
            last_interaction: Utc::now(),
        }
    }

    #[test]
    fn test_post_id_format() {
        let id = generate_post_id(&mut rand::thread_rng(), 1_700_000_000_000);
        let parts: Vec<&str> = id.split('-').collect();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0], "POST");
        assert_eq!(parts[1].len(), 9);
        assert!(parts[1]
            .chars()
            .all(|c| c.is_ascii_digit() || c.is_ascii_lowercase()));
        assert_eq!(parts[2], "1700000000000");
    }

    #[test]
    fn test_cross_region_view_forbidden() {
        assert!(ensure_same_region(&account("kerala"), &post_in("kerala")).is_ok());
        let err = ensure_same_region(&account("goa"), &post_in("kerala")).unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
    }

    #[test]
    fn test_create_request_validation() {
        let req = CreatePostRequest {
            caption: "x".repeat(1001),
            hashtags: vec![],
            image_url: String::new(),
        };
        let err = AppError::from(req.validate().unwrap_err()).to_string();
        assert!(err.contains("Caption must be 1-1000 characters"));
        assert!(err.contains("Image URL (IPFS hash) is required"));
    }
}
