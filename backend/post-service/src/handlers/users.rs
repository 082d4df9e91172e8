/// Legacy wallet registry endpoints
use actix_web::{web, HttpResponse};
use serde::Deserialize;

use crate::error::Result;
use crate::services::{SaveWalletRequest, WalletService};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WalletQuery {
    #[serde(default)]
    pub wallet_address: String,
}

pub async fn save_user(
    wallets: web::Data<WalletService>,
    req: web::Json<SaveWalletRequest>,
) -> Result<HttpResponse> {
    let link = wallets.save_wallet_link(req.into_inner()).await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "message": "User saved successfully",
        "user": link,
    })))
}

pub async fn get_user_by_wallet(
    wallets: web::Data<WalletService>,
    query: web::Query<WalletQuery>,
) -> Result<HttpResponse> {
    let link = wallets.get_wallet_link(&query.wallet_address).await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "user": link,
    })))
}
