use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Request body for `POST /extract`.
#[derive(Debug, Clone, Deserialize)]
pub struct IncidentInput {
    /// Free-text description of the incident.
    pub text: String,
}

/// Structured fields extracted from an incident description.
///
/// Every field is optional: `None` means the information is not in the text.
/// Absent values serialize as `null` so the response always has all four keys.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct IncidentOutput {
    /// Data e hora do incidente.
    pub data_ocorrencia: Option<String>,
    /// Local do incidente.
    pub local: Option<String>,
    /// Tipo ou categoria do incidente.
    pub tipo_incidente: Option<String>,
    /// Descrição breve do impacto gerado.
    pub impacto: Option<String>,
}

impl IncidentOutput {
    /// Declared field names, in serialization order.
    pub const FIELDS: [&'static str; 4] = ["data_ocorrencia", "local", "tipo_incidente", "impacto"];

    /// Pretty-printed JSON Schema of this record, embedded in prompts.
    pub fn json_schema_pretty() -> String {
        let schema = schemars::schema_for!(IncidentOutput);
        serde_json::to_string_pretty(&schema).unwrap_or_else(|_| "{}".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_absent_fields_serialize_as_null() {
        let output = IncidentOutput {
            local: Some("Brasília".to_string()),
            ..Default::default()
        };
        assert_eq!(
            serde_json::to_value(&output).unwrap(),
            json!({
                "data_ocorrencia": null,
                "local": "Brasília",
                "tipo_incidente": null,
                "impacto": null,
            })
        );
    }

    #[test]
    fn test_schema_lists_every_field_with_description() {
        let schema: serde_json::Value =
            serde_json::from_str(&IncidentOutput::json_schema_pretty()).unwrap();
        let properties = schema["properties"].as_object().unwrap();
        for field in IncidentOutput::FIELDS {
            let property = &properties[field];
            assert!(property["description"].is_string(), "{field} has no description");
        }
        assert_eq!(properties.len(), IncidentOutput::FIELDS.len());
        // Optional fields are never listed as required.
        assert!(schema.get("required").map_or(true, |r| r.as_array().unwrap().is_empty()));
    }
}
