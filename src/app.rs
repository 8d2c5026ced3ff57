use crate::handlers;
use crate::state::AppState;
use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};

const MAX_BODY_BYTES: usize = 32 * 1024 * 1024;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route("/optimize", post(handlers::optimize_now))
        .route("/api/records", get(handlers::get_records).post(handlers::create_record))
        .route("/api/optimize", post(handlers::optimize))
        .route("/api/compress", post(handlers::compress))
        .route("/api/stats", get(handlers::get_stats))
        .route("/api/notifications", get(handlers::get_notifications))
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .with_state(state)
}
