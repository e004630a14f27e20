pub mod health;

use axum::{
    http::Uri,
    routing::{get, post},
    Router,
};

use crate::career::handlers;
use crate::errors::AppError;
use crate::state::AppState;

async fn not_found(uri: Uri) -> AppError {
    AppError::NotFound(format!("No route for {uri}"))
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Career simulator
        .route("/career/start", post(handlers::handle_start))
        .route("/career/act", post(handlers::handle_act))
        .fallback(not_found)
        .with_state(state)
}
