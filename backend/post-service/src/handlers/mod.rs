/// HTTP handlers for post-service
///
/// - auth: nullifier check, registration, login, profile and dashboard
/// - posts: post creation, regional feeds, like/dislike
/// - users: legacy wallet registry
pub mod auth;
pub mod posts;
pub mod users;

use actix_web::{web, HttpResponse};
use sqlx::PgPool;

use crate::middleware::JwtAuthMiddleware;

/// Liveness plus a database round trip
pub async fn health(pool: web::Data<PgPool>) -> HttpResponse {
    let probe = async {
        let mut conn = db_pool::acquire_with_metrics(&pool, "post-service").await?;
        sqlx::query("SELECT 1").execute(&mut *conn).await
    };

    match probe.await {
        Ok(_) => HttpResponse::Ok().json(serde_json::json!({
            "status": "OK",
            "message": "Server is running",
        })),
        Err(e) => {
            tracing::warn!(error = %e, "Health check failed");
            HttpResponse::ServiceUnavailable().json(serde_json::json!({
                "status": "UNAVAILABLE",
                "message": "Database unreachable",
            }))
        }
    }
}

/// Mount the auth, posts and users routes.
///
/// Expects `AccountService`, `PostService`, `InteractionService` and
/// `WalletService` registered as app data.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/auth")
            .route("/check-nullifier", web::post().to(auth::check_nullifier))
            .route("/register", web::post().to(auth::register))
            .route("/login", web::post().to(auth::login))
            .service(
                web::resource("/me")
                    .wrap(JwtAuthMiddleware)
                    .route(web::get().to(auth::me)),
            )
            .service(
                web::resource("/dashboard")
                    .wrap(JwtAuthMiddleware)
                    .route(web::get().to(auth::dashboard)),
            )
            .service(
                web::resource("/profile")
                    .wrap(JwtAuthMiddleware)
                    .route(web::put().to(auth::update_profile)),
            )
            .service(
                web::resource("/logout")
                    .wrap(JwtAuthMiddleware)
                    .route(web::post().to(auth::logout)),
            ),
    )
    .service(
        web::scope("/api/posts")
            .route("/all", web::get().to(posts::get_all_posts))
            .service(
                web::resource("")
                    .wrap(JwtAuthMiddleware)
                    .route(web::post().to(posts::create_post))
                    .route(web::get().to(posts::get_regional_feed)),
            )
            .service(
                web::resource("/my-posts")
                    .wrap(JwtAuthMiddleware)
                    .route(web::get().to(posts::get_my_posts)),
            )
            .service(
                web::resource("/{post_id}/like")
                    .wrap(JwtAuthMiddleware)
                    .route(web::post().to(posts::like_post)),
            )
            .service(
                web::resource("/{post_id}/dislike")
                    .wrap(JwtAuthMiddleware)
                    .route(web::post().to(posts::dislike_post)),
            )
            .service(
                web::resource("/{post_id}")
                    .wrap(JwtAuthMiddleware)
                    .route(web::get().to(posts::get_post)),
            ),
    )
    .service(
        web::scope("/api/users")
            .route("/save", web::post().to(users::save_user))
            .route("", web::get().to(users::get_user_by_wallet)),
    );
}
