use actix_cors::Cors;
use actix_web::{web, App, HttpServer};
use anyhow::{Context, Result};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use post_service::config::Config;
use post_service::handlers;
use post_service::repository::{AccountRepository, PgVoteStore, PostRepository, WalletRepository};
use post_service::services::{AccountService, InteractionService, PostService, WalletService};

const SERVICE_NAME: &str = "post-service";

async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        match signal(SignalKind::terminate()) {
            Ok(mut terminate) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {},
                    _ = terminate.recv() => {},
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "SIGTERM handler unavailable, waiting for Ctrl+C");
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,actix_web=info,sqlx=warn".into());

    let json = std::env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
}

fn build_cors(origins: &[String]) -> Cors {
    let mut cors = Cors::default();
    for origin in origins {
        if origin == "*" {
            cors = cors.allow_any_origin();
        } else {
            cors = cors.allowed_origin(origin);
        }
    }
    cors.allow_any_method()
        .allow_any_header()
        .supports_credentials()
        .max_age(3600)
}

/// Post service
///
/// Accounts keyed by an anonymized Aadhaar nullifier, posts visible only
/// within the author's state, and like/dislike voting with automatic
/// takedown of heavily disliked posts.
#[actix_web::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();
    init_tracing();

    let config = Config::from_env().context("Failed to load configuration")?;
    tracing::info!("Starting {} v{}", SERVICE_NAME, env!("CARGO_PKG_VERSION"));
    tracing::info!("Environment: {}", config.app.env);

    crypto_core::jwt::initialize_jwt_keys(
        &config.auth.jwt_private_key_pem,
        &config.auth.jwt_public_key_pem,
    )
    .context("Failed to initialize JWT keys")?;
    crypto_core::jwt::set_session_expiry_hours(config.auth.session_expiry_hours)
        .context("Invalid session expiry")?;

    let db_config = db_pool::DbConfig {
        service_name: SERVICE_NAME.to_string(),
        database_url: config.database.url.clone(),
        max_connections: config.database.max_connections,
        min_connections: config.database.min_connections,
        ..db_pool::DbConfig::default()
    };
    db_config.log_config();
    let pool = db_pool::create_pool(db_config)
        .await
        .context("Failed to connect to database")?;

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .context("Failed to run database migrations")?;
    tracing::info!("Database migrations applied");

    let post_repo = PostRepository::new(pool.clone());
    let accounts_data = web::Data::new(AccountService::new(
        AccountRepository::new(pool.clone()),
        post_repo.clone(),
    ));
    let posts_data = web::Data::new(PostService::new(post_repo));
    let interactions_data = web::Data::new(InteractionService::new(Arc::new(
        PgVoteStore::new(pool.clone()),
    )));
    let wallets_data = web::Data::new(WalletService::new(WalletRepository::new(pool.clone())));
    let pool_data = web::Data::new(pool);

    let bind_address = format!("{}:{}", config.app.host, config.app.http_port);
    tracing::info!("HTTP server listening on {}", bind_address);

    let origins = config.cors.allowed_origins.clone();
    let server = HttpServer::new(move || {
        App::new()
            .app_data(pool_data.clone())
            .app_data(accounts_data.clone())
            .app_data(posts_data.clone())
            .app_data(interactions_data.clone())
            .app_data(wallets_data.clone())
            .wrap(build_cors(&origins))
            .wrap(tracing_actix_web::TracingLogger::default())
            .route("/health", web::get().to(handlers::health))
            .route(
                "/metrics",
                web::get().to(post_service::metrics::serve_metrics),
            )
            .configure(handlers::configure_routes)
    })
    .bind(&bind_address)
    .with_context(|| format!("Failed to bind {}", bind_address))?
    .run();

    let server_handle = server.handle();
    let server_task = tokio::spawn(server);

    let shutdown = shutdown_signal();
    tokio::pin!(shutdown);

    tokio::select! {
        result = server_task => {
            result
                .context("HTTP server task panicked")?
                .context("HTTP server failed")?;
        }
        _ = &mut shutdown => {
            tracing::info!("Shutdown signal received");
            server_handle.stop(true).await;
        }
    }

    tracing::info!("{} shutting down", SERVICE_NAME);
    Ok(())
}
