//! Axum route handlers for the career simulator.
//!
//! The handlers are thin: the engine never fails, so the only error path is
//! a request body that does not decode.

use axum::{extract::rejection::JsonRejection, extract::State, Json};
use serde::Deserialize;

use crate::career::models::GameState;
use crate::errors::AppError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct StartRequest {
    pub role: String,
    pub industry: String,
}

#[derive(Debug, Deserialize)]
pub struct ActRequest {
    pub state: GameState,
    /// Free text; not checked against `state.options`.
    #[serde(default)]
    pub action: String,
}

/// POST /career/start
pub async fn handle_start(
    State(state): State<AppState>,
    payload: Result<Json<StartRequest>, JsonRejection>,
) -> Result<Json<GameState>, AppError> {
    let Json(request) = payload.map_err(|e| AppError::Validation(e.body_text()))?;
    let game = state
        .engine
        .start_game(&request.role, &request.industry)
        .await;
    Ok(Json(game))
}

/// POST /career/act
pub async fn handle_act(
    State(state): State<AppState>,
    payload: Result<Json<ActRequest>, JsonRejection>,
) -> Result<Json<GameState>, AppError> {
    let Json(request) = payload.map_err(|e| AppError::Validation(e.body_text()))?;
    let next = state
        .engine
        .process_turn(&request.state, &request.action)
        .await;
    Ok(Json(next))
}
