/// Post handlers - creation, regional feeds and voting
use actix_web::{web, HttpResponse};
use serde::Deserialize;

use crate::domain::models::{InteractionType, PageRequest, Profile};
use crate::error::Result;
use crate::middleware::AuthUser;
use crate::services::{AccountService, CreatePostRequest, InteractionService, PostService};

#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

impl From<&PageQuery> for PageRequest {
    fn from(query: &PageQuery) -> Self {
        PageRequest::new(query.page, query.limit)
    }
}

pub async fn create_post(
    accounts: web::Data<AccountService>,
    posts: web::Data<PostService>,
    auth: AuthUser,
    req: web::Json<CreatePostRequest>,
) -> Result<HttpResponse> {
    let author = accounts.current_user(auth.user_id).await?;
    let post = posts.create_post(&author, req.into_inner()).await?;
    Ok(HttpResponse::Created().json(serde_json::json!({
        "success": true,
        "message": "Post created successfully",
        "post": post,
    })))
}

/// Feed of active posts from the caller's own state
pub async fn get_regional_feed(
    accounts: web::Data<AccountService>,
    posts: web::Data<PostService>,
    auth: AuthUser,
    query: web::Query<PageQuery>,
) -> Result<HttpResponse> {
    let viewer = accounts.current_user(auth.user_id).await?;
    let page = posts.feed_for_region(&viewer, (&*query).into()).await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "posts": page.posts,
        "pagination": page.pagination,
    })))
}

pub async fn get_all_posts(
    posts: web::Data<PostService>,
    query: web::Query<PageQuery>,
) -> Result<HttpResponse> {
    let page = posts.all_posts((&*query).into()).await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "posts": page.posts,
        "pagination": page.pagination,
    })))
}

pub async fn get_my_posts(
    accounts: web::Data<AccountService>,
    posts: web::Data<PostService>,
    auth: AuthUser,
) -> Result<HttpResponse> {
    let author = accounts.current_user(auth.user_id).await?;
    let mine = posts.my_posts(&author).await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "count": mine.len(),
        "posts": mine,
        "user": Profile::from(&author),
    })))
}

pub async fn get_post(
    accounts: web::Data<AccountService>,
    posts: web::Data<PostService>,
    auth: AuthUser,
    path: web::Path<String>,
) -> Result<HttpResponse> {
    let viewer = accounts.current_user(auth.user_id).await?;
    let post = posts.get_post(&viewer, &path).await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "post": post,
    })))
}

pub async fn like_post(
    accounts: web::Data<AccountService>,
    interactions: web::Data<InteractionService>,
    auth: AuthUser,
    path: web::Path<String>,
) -> Result<HttpResponse> {
    vote(accounts, interactions, auth, path, InteractionType::Like).await
}

pub async fn dislike_post(
    accounts: web::Data<AccountService>,
    interactions: web::Data<InteractionService>,
    auth: AuthUser,
    path: web::Path<String>,
) -> Result<HttpResponse> {
    vote(accounts, interactions, auth, path, InteractionType::Dislike).await
}

async fn vote(
    accounts: web::Data<AccountService>,
    interactions: web::Data<InteractionService>,
    auth: AuthUser,
    path: web::Path<String>,
    desired: InteractionType,
) -> Result<HttpResponse> {
    let voter = accounts.current_user(auth.user_id).await?;
    let summary = interactions.vote(voter.id, &path, desired).await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "message": summary.message(),
        "post": summary,
    })))
}
