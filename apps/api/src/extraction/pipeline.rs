//! Incident extraction — orchestrates the full pipeline for one request.
//!
//! Flow: preprocess → build prompt → LLM call → parse/validate.
//!
//! Strictly sequential, one suspension point (the gateway call), no retries.
//! Any failure is returned as-is; there are no partial results.

use tracing::{info, Instrument};
use uuid::Uuid;

use crate::errors::AppError;
use crate::extraction::parser::{parse_llm_output, Strictness};
use crate::extraction::strategy::PromptStrategy;
use crate::llm_client::LlmGateway;
use crate::models::incident::IncidentOutput;

/// Runs one extraction. `text` must already be checked for emptiness.
pub async fn extract_incident(
    text: &str,
    strategy: &dyn PromptStrategy,
    gateway: &dyn LlmGateway,
    strictness: Strictness,
) -> Result<IncidentOutput, AppError> {
    let request_id = Uuid::new_v4();
    let span = tracing::info_span!(
        "extract",
        %request_id,
        strategy = strategy.name(),
        model = gateway.model()
    );

    async move {
        info!("Starting incident extraction");

        // Step 1: Preprocess
        let processed = strategy.preprocess(text);
        info!("Preprocessed text: {processed}");

        // Step 2: Build prompt
        let request = strategy.build(&processed);

        // Step 3: LLM call
        let raw = gateway.generate(&request).await?;
        info!("Raw LLM response: {raw}");

        // Step 4: Parse and validate
        let output = parse_llm_output(&raw, strictness).map_err(|e| AppError::from_parse(e, &raw))?;
        info!(
            "Extraction complete: {} of {} fields found",
            [
                &output.data_ocorrencia,
                &output.local,
                &output.tipo_incidente,
                &output.impacto
            ]
            .iter()
            .filter(|f| f.is_some())
            .count(),
            IncidentOutput::FIELDS.len()
        );

        Ok(output)
    }
    .instrument(span)
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extraction::strategy::ExplicitPromptStrategy;
    use crate::llm_client::{GatewayError, LlmRequest};
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Returns a canned reply and records every request it sees.
    struct RecordingGateway {
        reply: Result<String, u16>,
        seen: Mutex<Vec<LlmRequest>>,
    }

    impl RecordingGateway {
        fn replying(text: &str) -> Self {
            Self { reply: Ok(text.to_string()), seen: Mutex::new(Vec::new()) }
        }

        fn failing(status: u16) -> Self {
            Self { reply: Err(status), seen: Mutex::new(Vec::new()) }
        }
    }

    #[async_trait]
    impl LlmGateway for RecordingGateway {
        async fn generate(&self, request: &LlmRequest) -> Result<String, GatewayError> {
            self.seen.lock().unwrap().push(request.clone());
            match &self.reply {
                Ok(text) => Ok(text.clone()),
                Err(status) => Err(GatewayError::Status { status: *status, body: String::new() }),
            }
        }

        fn model(&self) -> &str {
            "stub"
        }
    }

    #[tokio::test]
    async fn test_pipeline_sends_normalized_text_once() {
        let gateway = RecordingGateway::replying(r#"{"local": "Recife"}"#);
        let strategy = ExplicitPromptStrategy::new();

        let output = extract_incident("Falha em RECIFE!", &strategy, &gateway, Strictness::Lenient)
            .await
            .unwrap();
        assert_eq!(output.local.as_deref(), Some("Recife"));

        let seen = gateway.seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        match &seen[0] {
            LlmRequest::Completion { prompt, .. } => assert!(prompt.contains("\"falha em recife\"")),
            other => panic!("unexpected request {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_gateway_failure_is_not_retried() {
        let gateway = RecordingGateway::failing(503);
        let strategy = ExplicitPromptStrategy::new();

        let err = extract_incident("x", &strategy, &gateway, Strictness::Lenient)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::UpstreamUnavailable(_)));
        assert_eq!(gateway.seen.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_malformed_and_mismatched_output_are_distinct() {
        let strategy = ExplicitPromptStrategy::new();

        let gateway = RecordingGateway::replying("sem json aqui");
        let err = extract_incident("x", &strategy, &gateway, Strictness::Lenient)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::UpstreamMalformed { .. }));

        let gateway = RecordingGateway::replying(r#"{"local": 42}"#);
        let err = extract_incident("x", &strategy, &gateway, Strictness::Lenient)
            .await
            .unwrap_err();
        match err {
            AppError::SchemaMismatch { raw, .. } => assert_eq!(raw, r#"{"local": 42}"#),
            other => panic!("expected schema mismatch, got {other:?}"),
        }
    }
}
