use axum::{extract::State, Json};
use serde_json::{json, Value};

use crate::state::AppState;

pub const WELCOME_MESSAGE: &str = "Bem-vindo à API de Extração de Incidentes!";

/// GET /
pub async fn root_handler() -> Json<Value> {
    Json(json!({ "message": WELCOME_MESSAGE }))
}

/// GET /health
/// Returns service version plus the model and strategy this process runs with.
pub async fn health_handler(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "service": "incident-api",
        "model": state.llm.model(),
        "strategy": state.strategy.name(),
    }))
}
