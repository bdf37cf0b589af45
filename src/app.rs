use crate::handlers;
use crate::state::AppState;
use axum::{routing::{get, post}, Router};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route("/click/:user/:drink", post(handlers::click_form))
        .route("/api/scores", get(handlers::get_scores))
        .route("/api/stats", get(handlers::get_stats))
        .route("/api/events", get(handlers::get_events))
        .route("/api/click", post(handlers::click))
        .route("/healthz", get(handlers::healthz))
        .with_state(state)
}
