use serde::Deserialize;
use tracing::info;
use validator::Validate;

use crate::domain::models::WalletLink;
use crate::error::{AppError, Result};
use crate::repository::WalletRepository;

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SaveWalletRequest {
    #[validate(length(min = 1, message = "walletAddress is required"))]
    #[serde(default)]
    pub wallet_address: String,
    #[validate(length(min = 1, message = "userId is required"))]
    #[serde(default, rename = "userId")]
    pub user_ref: String,
    #[validate(length(min = 1, message = "txHash is required"))]
    #[serde(default)]
    pub tx_hash: String,
}

#[derive(Clone)]
pub struct WalletService {
    wallets: WalletRepository,
}

impl WalletService {
    pub fn new(wallets: WalletRepository) -> Self {
        Self { wallets }
    }

    pub async fn save_wallet_link(&self, req: SaveWalletRequest) -> Result<WalletLink> {
        req.validate()?;
        let link = self
            .wallets
            .upsert(req.wallet_address.trim(), &req.user_ref, &req.tx_hash)
            .await?;
        info!(
            wallet = %crypto_core::hash::fingerprint(&link.wallet_address),
            "Wallet link saved"
        );
        Ok(link)
    }

    pub async fn get_wallet_link(&self, wallet_address: &str) -> Result<WalletLink> {
        let wallet_address = wallet_address.trim();
        if wallet_address.is_empty() {
            return Err(AppError::Validation("Wallet address is required".to_string()));
        }
        self.wallets
            .find(wallet_address)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))
    }
}
