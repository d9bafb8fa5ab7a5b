//! Declarative signature strategy.
//!
//! The task is declared as one typed input field, N described output fields
//! and a set of labeled examples. `LabeledFewShot::compile` runs once at
//! startup and produces a `CompiledExtractor`: a rendered system message plus
//! validated demo turns. Requests only fill in the input; nothing is
//! recompiled per request.

use serde_json::{Map, Value};
use thiserror::Error;

use crate::config::StrategyKind;
use crate::extraction::normalize::collapse_spaces;
use crate::extraction::prompts::{
    example_output, EXAMPLE_INPUT, SIGNATURE_FIELD_DESCRIPTIONS, SIGNATURE_INSTRUCTION,
};
use crate::extraction::strategy::PromptStrategy;
use crate::llm_client::prompts::{JSON_ONLY_INSTRUCTION, NULL_WHEN_ABSENT};
use crate::llm_client::{ChatMessage, LlmRequest};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    pub name: String,
    pub description: String,
}

impl Field {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self { name: name.into(), description: description.into() }
    }
}

/// Typed description of an extraction task.
#[derive(Debug, Clone)]
pub struct Signature {
    pub instruction: String,
    pub input: Field,
    /// Output fields are `str | null`, in declaration order.
    pub outputs: Vec<Field>,
}

/// A labeled example: input text and the expected output object.
#[derive(Debug, Clone)]
pub struct Example {
    pub input: String,
    pub outputs: Map<String, Value>,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CompileError {
    #[error("signature declares no output fields")]
    NoOutputFields,

    #[error("trainset is empty")]
    EmptyTrainset,

    #[error("demo {index} has an empty input")]
    EmptyInput { index: usize },

    #[error("demo {index} is missing output field '{field}'")]
    MissingField { index: usize, field: String },

    #[error("demo {index} sets undeclared field '{field}'")]
    UndeclaredField { index: usize, field: String },

    #[error("demo {index} field '{field}' must be a string or null")]
    NonStringField { index: usize, field: String },
}

/// Few-shot optimizer that uses the first `k` labeled examples verbatim as
/// demonstrations, after validating them against the signature.
pub struct LabeledFewShot {
    k: usize,
}

impl LabeledFewShot {
    pub fn new(k: usize) -> Self {
        Self { k }
    }

    pub fn compile(&self, signature: &Signature, trainset: &[Example]) -> Result<CompiledExtractor, CompileError> {
        if signature.outputs.is_empty() {
            return Err(CompileError::NoOutputFields);
        }
        if trainset.is_empty() {
            return Err(CompileError::EmptyTrainset);
        }

        let mut demos = Vec::new();
        for (index, example) in trainset.iter().take(self.k.max(1)).enumerate() {
            validate_demo(signature, index, example)?;
            // Re-serialize in declaration order so the demo reads like the schema.
            let mut ordered = Map::new();
            for field in &signature.outputs {
                ordered.insert(field.name.clone(), example.outputs[&field.name].clone());
            }
            demos.push(Demo {
                user: render_input(&signature.input, &example.input),
                assistant: Value::Object(ordered).to_string(),
            });
        }

        Ok(CompiledExtractor {
            input: signature.input.clone(),
            system_prompt: render_system_prompt(signature),
            demos,
        })
    }
}

fn validate_demo(signature: &Signature, index: usize, example: &Example) -> Result<(), CompileError> {
    if example.input.trim().is_empty() {
        return Err(CompileError::EmptyInput { index });
    }
    for field in &signature.outputs {
        match example.outputs.get(&field.name) {
            None => {
                return Err(CompileError::MissingField { index, field: field.name.clone() });
            }
            Some(Value::String(_)) | Some(Value::Null) => {}
            Some(_) => {
                return Err(CompileError::NonStringField { index, field: field.name.clone() });
            }
        }
    }
    if let Some(extra) = example
        .outputs
        .keys()
        .find(|key| !signature.outputs.iter().any(|f| &f.name == *key))
    {
        return Err(CompileError::UndeclaredField { index, field: extra.clone() });
    }
    Ok(())
}

fn render_input(input: &Field, text: &str) -> String {
    format!("[[ ## {} ## ]]\n{}", input.name, text)
}

fn render_system_prompt(signature: &Signature) -> String {
    let mut prompt = String::from("Your input fields are:\n");
    prompt.push_str(&format!(
        "1. `{}` (str): {}\n",
        signature.input.name, signature.input.description
    ));
    prompt.push_str("Your output fields are:\n");
    for (i, field) in signature.outputs.iter().enumerate() {
        prompt.push_str(&format!("{}. `{}` (str | null): {}\n", i + 1, field.name, field.description));
    }
    let keys: Vec<String> = signature.outputs.iter().map(|f| format!("\"{}\"", f.name)).collect();
    prompt.push_str(&format!(
        "All interactions will be structured as follows: the user sends `{}`, and you reply \
         with a single JSON object whose keys are exactly {}.\n",
        signature.input.name,
        keys.join(", ")
    ));
    prompt.push_str(&format!(
        "In adhering to this structure, your objective is: {}\n{} {}",
        signature.instruction, JSON_ONLY_INSTRUCTION, NULL_WHEN_ABSENT
    ));
    prompt
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Demo {
    user: String,
    assistant: String,
}

/// Output of compilation. Read-only after startup.
#[derive(Debug, Clone)]
pub struct CompiledExtractor {
    input: Field,
    system_prompt: String,
    demos: Vec<Demo>,
}

impl CompiledExtractor {
    pub fn demo_count(&self) -> usize {
        self.demos.len()
    }

    /// `[system, (demo user, demo assistant)*, user]`.
    pub fn messages(&self, text: &str) -> Vec<ChatMessage> {
        let mut messages = Vec::with_capacity(2 + self.demos.len() * 2);
        messages.push(ChatMessage::system(self.system_prompt.clone()));
        for demo in &self.demos {
            messages.push(ChatMessage::user(demo.user.clone()));
            messages.push(ChatMessage::assistant(demo.assistant.clone()));
        }
        messages.push(ChatMessage::user(render_input(&self.input, text)));
        messages
    }
}

/// The incident extraction task as a declarative signature, with its one
/// labeled example.
pub fn incident_signature() -> (Signature, Vec<Example>) {
    let signature = Signature {
        instruction: SIGNATURE_INSTRUCTION.to_string(),
        input: Field::new("text", "texto livre descrevendo o incidente"),
        outputs: SIGNATURE_FIELD_DESCRIPTIONS
            .iter()
            .map(|(name, description)| Field::new(*name, *description))
            .collect(),
    };

    let outputs = match serde_json::to_value(example_output()) {
        Ok(Value::Object(map)) => map,
        _ => Map::new(),
    };
    let trainset = vec![Example { input: EXAMPLE_INPUT.to_string(), outputs }];

    (signature, trainset)
}

/// Chat-based strategy backed by a `CompiledExtractor`. Keeps case and
/// accents; only whitespace is collapsed.
pub struct SignatureStrategy {
    compiled: CompiledExtractor,
}

impl SignatureStrategy {
    pub fn new(compiled: CompiledExtractor) -> Self {
        Self { compiled }
    }
}

impl PromptStrategy for SignatureStrategy {
    fn name(&self) -> &'static str {
        StrategyKind::Signature.as_str()
    }

    fn preprocess(&self, text: &str) -> String {
        collapse_spaces(text)
    }

    fn build(&self, processed_text: &str) -> LlmRequest {
        LlmRequest::Chat { messages: self.compiled.messages(processed_text) }
    }
}
