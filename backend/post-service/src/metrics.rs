//! Prometheus metrics for post-service.
//!
//! Vote and moderation collectors plus the `/metrics` handler.

use actix_web::HttpResponse;
use lazy_static::lazy_static;
use prometheus::{
    register_int_counter, register_int_counter_vec, Encoder, IntCounter, IntCounterVec,
    TextEncoder,
};

lazy_static! {
    /// Vote requests by interaction type and result (created/flipped/duplicate/rejected)
    pub static ref VOTES_TOTAL: IntCounterVec = register_int_counter_vec!(
        "post_votes_total",
        "Vote requests processed by the interaction service",
        &["type", "result"]
    )
    .expect("post_votes_total registration");

    pub static ref POST_DEACTIVATIONS_TOTAL: IntCounter = register_int_counter!(
        "post_deactivations_total",
        "Posts deactivated by the dislike threshold"
    )
    .expect("post_deactivations_total registration");

    pub static ref POSTS_CREATED_TOTAL: IntCounter = register_int_counter!(
        "posts_created_total",
        "Posts created"
    )
    .expect("posts_created_total registration");

    /// Registrations and logins by result
    pub static ref AUTH_EVENTS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "auth_events_total",
        "Authentication events",
        &["event", "result"]
    )
    .expect("auth_events_total registration");
}

pub fn record_vote(kind: &str, result: &str) {
    VOTES_TOTAL.with_label_values(&[kind, result]).inc();
}

/// Actix handler that renders Prometheus metrics in text format.
pub async fn serve_metrics() -> HttpResponse {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();

    let mut buffer = Vec::new();
    if let Err(err) = encoder.encode(&metric_families, &mut buffer) {
        return HttpResponse::InternalServerError().body(err.to_string());
    }

    HttpResponse::Ok()
        .content_type(encoder.format_type())
        .body(buffer)
}
