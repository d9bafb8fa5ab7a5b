use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::extraction::parser::{ParseError, SchemaViolations};
use crate::llm_client::GatewayError;

pub const UPSTREAM_UNAVAILABLE_DETAIL: &str = "Erro na comunicação com o serviço LLM";
pub const UPSTREAM_MALFORMED_DETAIL: &str =
    "O LLM retornou um formato inválido: a resposta não é um JSON válido.";
pub const SCHEMA_MISMATCH_DETAIL: &str =
    "O LLM retornou um JSON malformado. Não corresponde ao schema esperado.";
pub const INTERNAL_DETAIL: &str = "Erro inesperado ao processar a requisição.";

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
/// The body is always `{"detail": "..."}`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("LLM gateway error: {0}")]
    UpstreamUnavailable(#[from] GatewayError),

    #[error("LLM output is not JSON: {source}")]
    UpstreamMalformed {
        source: serde_json::Error,
        raw: String,
    },

    #[error("LLM output does not match schema: {violations}")]
    SchemaMismatch {
        violations: SchemaViolations,
        raw: String,
    },

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// Classifies a parser failure, keeping the raw model output for logs.
    pub fn from_parse(err: ParseError, raw: &str) -> Self {
        match err {
            ParseError::NotJson(source) => AppError::UpstreamMalformed {
                source,
                raw: raw.to_string(),
            },
            ParseError::Schema(violations) => AppError::SchemaMismatch {
                violations,
                raw: raw.to_string(),
            },
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AppError::Validation(msg) => (StatusCode::UNPROCESSABLE_ENTITY, msg.clone()),
            AppError::UpstreamUnavailable(e) => {
                tracing::error!("LLM gateway error: {e}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    format!("{UPSTREAM_UNAVAILABLE_DETAIL}: {}", e.public_summary()),
                )
            }
            AppError::UpstreamMalformed { source, raw } => {
                tracing::error!("LLM output is not valid JSON ({source}); raw output: {raw}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    UPSTREAM_MALFORMED_DETAIL.to_string(),
                )
            }
            AppError::SchemaMismatch { violations, raw } => {
                tracing::error!("LLM output does not match schema ({violations}); raw output: {raw}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    SCHEMA_MISMATCH_DETAIL.to_string(),
                )
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                (StatusCode::INTERNAL_SERVER_ERROR, INTERNAL_DETAIL.to_string())
            }
        };

        (status, Json(json!({ "detail": message }))).into_response()
    }
}
