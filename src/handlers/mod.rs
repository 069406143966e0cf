pub mod health;
pub mod voice;

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;

use crate::state::AppState;

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health::health))
        .route("/voice", post(voice::voice_entry))
        .route("/handle_speech", post(voice::handle_speech))
        .route("/call_status", post(voice::call_status))
        .with_state(state)
}
