/// Account handlers - registration, login and profile endpoints
use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};

use crate::domain::models::Profile;
use crate::error::Result;
use crate::middleware::AuthUser;
use crate::services::{AccountService, LoginRequest, RegisterRequest, Session};

#[derive(Debug, Deserialize)]
pub struct CheckNullifierRequest {
    #[serde(default)]
    pub nullifier: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileRequest {
    #[serde(default)]
    pub wallet_address: String,
}

#[derive(Debug, Serialize)]
struct SessionResponse {
    success: bool,
    message: &'static str,
    token: String,
    user: Profile,
}

impl SessionResponse {
    fn new(message: &'static str, session: Session) -> Self {
        Self {
            success: true,
            message,
            user: Profile::from(&session.account),
            token: session.token,
        }
    }
}

pub async fn check_nullifier(
    accounts: web::Data<AccountService>,
    req: web::Json<CheckNullifierRequest>,
) -> Result<HttpResponse> {
    accounts.check_nullifier(&req.nullifier).await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "message": "Nullifier is valid and available for registration",
    })))
}

pub async fn register(
    accounts: web::Data<AccountService>,
    req: web::Json<RegisterRequest>,
) -> Result<HttpResponse> {
    let session = accounts.register(req.into_inner()).await?;
    Ok(HttpResponse::Created().json(SessionResponse::new("User registered successfully", session)))
}

pub async fn login(
    accounts: web::Data<AccountService>,
    req: web::Json<LoginRequest>,
) -> Result<HttpResponse> {
    let session = accounts.login(req.into_inner()).await?;
    Ok(HttpResponse::Ok().json(SessionResponse::new("Login successful", session)))
}

pub async fn me(accounts: web::Data<AccountService>, auth: AuthUser) -> Result<HttpResponse> {
    let account = accounts.current_user(auth.user_id).await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "user": Profile::from(&account),
    })))
}

pub async fn dashboard(
    accounts: web::Data<AccountService>,
    auth: AuthUser,
) -> Result<HttpResponse> {
    let account = accounts.current_user(auth.user_id).await?;
    let dashboard = accounts.dashboard(&account).await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "dashboard": dashboard,
    })))
}

pub async fn update_profile(
    accounts: web::Data<AccountService>,
    auth: AuthUser,
    req: web::Json<UpdateProfileRequest>,
) -> Result<HttpResponse> {
    accounts.current_user(auth.user_id).await?;
    let account = accounts
        .update_wallet(auth.user_id, &req.wallet_address)
        .await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "message": "Profile updated successfully",
        "user": Profile::from(&account),
    })))
}

/// Tokens are stateless; the client discards its copy
pub async fn logout(auth: AuthUser) -> HttpResponse {
    tracing::info!(user_id = %auth.user_id, "Logout");
    HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "message": "Logged out successfully",
    }))
}
