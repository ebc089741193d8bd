use crate::handlers;
use crate::state::AppState;
use axum::{routing::{get, post}, Router};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route("/entry", post(handlers::entry_form))
        .route("/exercise", post(handlers::exercise_form))
        .route("/api/today", get(handlers::get_today))
        .route("/api/stats", get(handlers::get_stats))
        .route("/api/entries", post(handlers::add_entries))
        .route("/api/exercise", post(handlers::log_exercise))
        .route("/api/chat/parse", post(handlers::parse_chat))
        .route("/api/chat/apply", post(handlers::apply_chat))
        .route(
            "/api/settings",
            get(handlers::get_settings).put(handlers::update_settings),
        )
        .route("/api/onboarding", post(handlers::onboarding))
        .with_state(state)
}
