pub mod accounts;
pub mod interactions;
pub mod posts;
pub mod wallets;

pub use accounts::{AccountService, Dashboard, LoginMethod, LoginRequest, PostStats, RegisterRequest, Session};
pub use interactions::{Clock, InteractionService, SystemClock, VoteSummary};
pub use posts::{CreatePostRequest, FeedPage, PostService};
pub use wallets::{SaveWalletRequest, WalletService};
