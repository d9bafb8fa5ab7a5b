//! Axum route handlers for the Extraction API.

use axum::{extract::rejection::JsonRejection, extract::State, Json};

use crate::errors::AppError;
use crate::extraction::pipeline::extract_incident;
use crate::models::incident::{IncidentInput, IncidentOutput};
use crate::state::AppState;

/// POST /extract
///
/// Extracts date, location, type and impact from a free-text incident
/// description. Absent fields come back as `null`.
pub async fn handle_extract(
    State(state): State<AppState>,
    payload: Result<Json<IncidentInput>, JsonRejection>,
) -> Result<Json<IncidentOutput>, AppError> {
    let Json(input) = payload.map_err(|rejection| AppError::Validation(rejection.body_text()))?;

    if input.text.trim().is_empty() {
        return Err(AppError::Validation("O campo 'text' não pode ser vazio.".to_string()));
    }

    let output = extract_incident(
        &input.text,
        state.strategy.as_ref(),
        state.llm.as_ref(),
        state.config.strictness,
    )
    .await?;

    Ok(Json(output))
}
