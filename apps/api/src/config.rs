use anyhow::{bail, Context, Result};

use crate::extraction::parser::Strictness;

pub const DEFAULT_OLLAMA_HOST: &str = "http://localhost:11434";
pub const DEFAULT_MODEL_NAME: &str = "tinyllama";
/// Local inference is slow; ten minutes matches the longest generations we see.
pub const DEFAULT_LLM_TIMEOUT_SECS: u64 = 600;

/// Which prompt builder the process runs with. Chosen once at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StrategyKind {
    /// Instruction + JSON Schema + worked example, one completion call.
    Prompt,
    /// Declarative signature compiled into a few-shot chat at startup.
    Signature,
}

impl StrategyKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            StrategyKind::Prompt => "prompt",
            StrategyKind::Signature => "signature",
        }
    }
}

impl std::str::FromStr for StrategyKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "prompt" => Ok(StrategyKind::Prompt),
            "signature" => Ok(StrategyKind::Signature),
            other => bail!("unknown extraction strategy '{other}' (expected 'prompt' or 'signature')"),
        }
    }
}

/// Application configuration loaded from environment variables.
/// Every value has a default; malformed values fail startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub ollama_host: String,
    pub model_name: String,
    pub llm_timeout_secs: u64,
    pub strategy: StrategyKind,
    pub strictness: Strictness,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from an arbitrary key lookup so tests never touch
    /// the process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let ollama_host = get("OLLAMA_HOST", DEFAULT_OLLAMA_HOST)
            .trim_end_matches('/')
            .to_string();
        if ollama_host.is_empty() {
            bail!("OLLAMA_HOST must not be empty");
        }

        Ok(Config {
            ollama_host,
            model_name: get("MODEL_NAME", DEFAULT_MODEL_NAME),
            llm_timeout_secs: get("LLM_TIMEOUT_SECS", &DEFAULT_LLM_TIMEOUT_SECS.to_string())
                .parse::<u64>()
                .context("LLM_TIMEOUT_SECS must be a whole number of seconds")?,
            strategy: get("EXTRACTION_STRATEGY", "prompt").parse()?,
            strictness: if parse_bool(&get("EXTRACTION_STRICT", "false"))
                .context("EXTRACTION_STRICT must be true or false")?
            {
                Strictness::Strict
            } else {
                Strictness::Lenient
            },
            port: get("PORT", "8000")
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: get("RUST_LOG", "info"),
        })
    }
}

fn parse_bool(raw: &str) -> Result<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        other => bail!("'{other}' is not a boolean"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Result<Config> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults_when_nothing_is_set() {
        let config = config_from(&[]).unwrap();
        assert_eq!(config.ollama_host, "http://localhost:11434");
        assert_eq!(config.model_name, "tinyllama");
        assert_eq!(config.llm_timeout_secs, 600);
        assert_eq!(config.strategy, StrategyKind::Prompt);
        assert_eq!(config.strictness, Strictness::Lenient);
        assert_eq!(config.port, 8000);
    }

    #[test]
    fn test_overrides_are_applied() {
        let config = config_from(&[
            ("OLLAMA_HOST", "http://ollama:11434/"),
            ("MODEL_NAME", "llama3.2"),
            ("EXTRACTION_STRATEGY", "Signature"),
            ("EXTRACTION_STRICT", "true"),
            ("LLM_TIMEOUT_SECS", "30"),
        ])
        .unwrap();
        assert_eq!(config.ollama_host, "http://ollama:11434");
        assert_eq!(config.model_name, "llama3.2");
        assert_eq!(config.strategy, StrategyKind::Signature);
        assert_eq!(config.strictness, Strictness::Strict);
        assert_eq!(config.llm_timeout_secs, 30);
    }

    #[test]
    fn test_unknown_strategy_is_rejected() {
        let err = config_from(&[("EXTRACTION_STRATEGY", "few-shot")]).unwrap_err();
        assert!(err.to_string().contains("few-shot"));
    }

    #[test]
    fn test_invalid_port_is_rejected() {
        assert!(config_from(&[("PORT", "not-a-port")]).is_err());
    }
}
