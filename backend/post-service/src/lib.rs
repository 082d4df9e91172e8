pub mod config;
pub mod domain;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod repository;
pub mod security;
pub mod services;

pub use config::Config;
pub use error::{AppError, Result};
