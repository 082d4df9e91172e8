use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::domain::models::{Post, UserLevel};

const POST_COLUMNS: &str = "post_id, caption, hashtags, image_url, author_id, author_username, \
     author_state, author_level, like_count, dislike_count, active, created_at, last_interaction";

/// Post fields supplied at creation; counters start at zero
#[derive(Debug, Clone)]
pub struct NewPost {
    pub post_id: String,
    pub caption: String,
    pub hashtags: Vec<String>,
    pub image_url: String,
    pub author_id: Uuid,
    pub author_username: String,
    pub author_state: String,
    pub author_level: UserLevel,
}

#[derive(Clone)]
pub struct PostRepository {
    pool: PgPool,
}

impl PostRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Insert a post on an open transaction
    pub async fn insert(conn: &mut PgConnection, post: &NewPost) -> Result<Post, sqlx::Error> {
        let sql = format!(
            r#"
            INSERT INTO posts (post_id, caption, hashtags, image_url, author_id,
                               author_username, author_state, author_level)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {}
            "#,
            POST_COLUMNS
        );

        sqlx::query_as::<_, Post>(&sql)
            .bind(&post.post_id)
            .bind(&post.caption)
            .bind(&post.hashtags)
            .bind(&post.image_url)
            .bind(post.author_id)
            .bind(&post.author_username)
            .bind(&post.author_state)
            .bind(post.author_level)
            .fetch_one(conn)
            .await
    }

    /// Bump an author's post count and store the level it implies
    pub async fn record_authored_post(
        conn: &mut PgConnection,
        author_id: Uuid,
    ) -> Result<(i32, UserLevel), sqlx::Error> {
        let posts_count: i32 = sqlx::query_scalar(
            r#"
            UPDATE accounts SET posts_count = posts_count + 1
            WHERE id = $1
            RETURNING posts_count
            "#,
        )
        .bind(author_id)
        .fetch_one(&mut *conn)
        .await?;

        let level = UserLevel::from_posts_count(posts_count);
        sqlx::query("UPDATE accounts SET user_level = $2 WHERE id = $1")
            .bind(author_id)
            .bind(level)
            .execute(&mut *conn)
            .await?;

        Ok((posts_count, level))
    }

    pub async fn find_active(&self, post_id: &str) -> Result<Option<Post>, sqlx::Error> {
        let sql = format!(
            "SELECT {} FROM posts WHERE post_id = $1 AND active",
            POST_COLUMNS
        );
        sqlx::query_as::<_, Post>(&sql)
            .bind(post_id)
            .fetch_optional(&self.pool)
            .await
    }

    /// Active posts from one state, newest first
    pub async fn list_active_by_state(
        &self,
        state: &str,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Post>, sqlx::Error> {
        let sql = format!(
            r#"
            SELECT {} FROM posts
            WHERE author_state = $1 AND active
            ORDER BY created_at DESC
            LIMIT $2 OFFSET $3
            "#,
            POST_COLUMNS
        );
        sqlx::query_as::<_, Post>(&sql)
            .bind(state)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await
    }

    pub async fn count_active_by_state(&self, state: &str) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar("SELECT COUNT(*) FROM posts WHERE author_state = $1 AND active")
            .bind(state)
            .fetch_one(&self.pool)
            .await
    }

    pub async fn list_active(&self, limit: i64, offset: i64) -> Result<Vec<Post>, sqlx::Error> {
        let sql = format!(
            r#"
            SELECT {} FROM posts
            WHERE active
            ORDER BY created_at DESC
            LIMIT $1 OFFSET $2
            "#,
            POST_COLUMNS
        );
        sqlx::query_as::<_, Post>(&sql)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await
    }

    pub async fn count_active(&self) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar("SELECT COUNT(*) FROM posts WHERE active")
            .fetch_one(&self.pool)
            .await
    }

    /// Posts written by `author_id`, newest first
    pub async fn list_by_author(
        &self,
        author_id: Uuid,
        include_inactive: bool,
    ) -> Result<Vec<Post>, sqlx::Error> {
        let sql = format!(
            r#"
            SELECT {} FROM posts
            WHERE author_id = $1 AND (active OR $2)
            ORDER BY created_at DESC
            "#,
            POST_COLUMNS
        );
        sqlx::query_as::<_, Post>(&sql)
            .bind(author_id)
            .bind(include_inactive)
            .fetch_all(&self.pool)
            .await
    }
}
