use crate::career::engine::GameEngine;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// Game engine with the injected prompt client. Game state itself is
    /// never stored server-side.
    pub engine: GameEngine,
}
