// Prompt templates and the fixed worked example for incident extraction.

use crate::models::incident::IncidentOutput;

/// Worked example shown to the model. Also the labeled demo the signature
/// strategy compiles from.
pub const EXAMPLE_INPUT: &str = "Ontem às 14h, no escritório de São Paulo, houve uma falha \
    no servidor principal que afetou o sistema de faturamento por 2 horas.";

pub fn example_output() -> IncidentOutput {
    IncidentOutput {
        data_ocorrencia: Some("2025-08-12 14:00".to_string()),
        local: Some("São Paulo".to_string()),
        tipo_incidente: Some("Falha no servidor".to_string()),
        impacto: Some("Sistema de faturamento indisponível por 2 horas".to_string()),
    }
}

/// Explicit extraction prompt. Replace `{instruction}`, `{schema}`,
/// `{example_input}`, `{example_output}` and `{text}` before sending.
pub const EXTRACTION_PROMPT_TEMPLATE: &str = r#"Extract the following information from the incident text below.
{instruction}

Your response must strictly follow the following JSON schema:
{schema}

Example of input and output:
Input: "{example_input}"
Output: {example_output}

Text for analysis: "{text}"
"#;

/// Instruction for the declarative signature.
pub const SIGNATURE_INSTRUCTION: &str = "Extract structured information from text.";

/// Per-field descriptions for the declarative signature, in field order.
pub const SIGNATURE_FIELD_DESCRIPTIONS: [(&str, &str); 4] = [
    ("data_ocorrencia", "data e hora do incidente (se presente no texto)"),
    ("local", "local do incidente"),
    ("tipo_incidente", "tipo ou categoria do incidente"),
    ("impacto", "descrição breve do impacto"),
];
