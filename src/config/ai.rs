// src/config/ai.rs
use anyhow::{anyhow, Result};
use std::env;

const DEFAULT_MODEL: &str = "gpt-4o-mini";

/// Summarizer settings. The API key is required; construction fails fast
/// when it is absent so a misconfigured deployment never starts.
#[derive(Debug, Clone)]
pub struct AiConfig {
    pub api_key: String,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
}

impl AiConfig {
    pub fn from_env() -> Result<Self> {
        let api_key =
            env::var("OPENAI_API_KEY").map_err(|_| anyhow!("Missing OPENAI_API_KEY env var"))?;
        let model = env::var("OPENAI_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string());
        Ok(Self {
            api_key,
            model,
            temperature: 0.4,
            max_tokens: 200,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[serial_test::serial]
    #[test]
    fn missing_key_is_fatal_and_model_defaults() {
        env::remove_var("OPENAI_API_KEY");
        env::remove_var("OPENAI_MODEL");
        assert!(AiConfig::from_env().is_err());

        env::set_var("OPENAI_API_KEY", "sk-test");
        let cfg = AiConfig::from_env().unwrap();
        assert_eq!(cfg.model, DEFAULT_MODEL);
        assert_eq!(cfg.max_tokens, 200);
        env::remove_var("OPENAI_API_KEY");
    }
}
