// src/summarize.rs
//! Headline + content -> short human-readable summary.
//!
//! The external completion API is modelled as a trait so handlers and tests
//! inject their own client; the production client talks to the OpenAI
//! chat-completions endpoint.

use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::ai::AiConfig;

/// Below this many characters the headline already carries the story;
/// no external call is made and the headline is returned as the summary.
pub const MIN_CONTENT_CHARS: usize = 200;

const SUMMARIZE_PROMPT: &str = "You are an assistant that writes concise theatre news summaries for a UK audience.\n\
- Produce 2-3 sentences (max 80 words total).\n\
- Highlight premiere dates or venues when available.\n\
- Avoid marketing language and keep a neutral tone.\n\
- Include the source outlet name if relevant.";

/// Chat-completion style collaborator: system instruction + user content in,
/// generated text out. Treated as unreliable by callers.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    async fn complete(&self, system: &str, user: &str) -> Result<String>;
    fn provider_name(&self) -> &'static str;
}

pub type DynCompletionClient = Arc<dyn CompletionClient>;

pub struct Summarizer {
    client: DynCompletionClient,
}

impl Summarizer {
    pub fn new(client: DynCompletionClient) -> Self {
        Self { client }
    }

    /// Summarize one article. Thin content degrades to the headline;
    /// an upstream failure (error, empty output) propagates to the caller,
    /// which records it as a per-article skip.
    pub async fn summarize(&self, headline: &str, content: &str) -> Result<String> {
        if content.chars().count() < MIN_CONTENT_CHARS {
            return Ok(headline.to_string());
        }

        let user = format!("Headline: {headline}\n\nArticle:\n{content}");
        let text = self
            .client
            .complete(SUMMARIZE_PROMPT, &user)
            .await
            .with_context(|| format!("summarizer ({})", self.client.provider_name()))?;

        let text = text.trim().to_string();
        if text.is_empty() {
            anyhow::bail!("summarizer returned no usable text");
        }
        Ok(text)
    }
}

/// OpenAI chat-completions client. Credentials are resolved by the config
/// layer before construction; a missing key fails at startup, not here.
pub struct OpenAiClient {
    http: reqwest::Client,
    api_key: String,
    model: String,
    temperature: f32,
    max_tokens: u32,
}

impl OpenAiClient {
    pub fn new(cfg: &AiConfig, http: reqwest::Client) -> Self {
        Self {
            http,
            api_key: cfg.api_key.clone(),
            model: cfg.model.clone(),
            temperature: cfg.temperature,
            max_tokens: cfg.max_tokens,
        }
    }
}

#[async_trait]
impl CompletionClient for OpenAiClient {
    async fn complete(&self, system: &str, user: &str) -> Result<String> {
        #[derive(Serialize)]
        struct Msg<'a> {
            role: &'a str,
            content: &'a str,
        }
        #[derive(Serialize)]
        struct Req<'a> {
            model: &'a str,
            messages: Vec<Msg<'a>>,
            temperature: f32,
            max_tokens: u32,
        }
        #[derive(Deserialize)]
        struct Resp {
            choices: Vec<Choice>,
        }
        #[derive(Deserialize)]
        struct Choice {
            message: ChoiceMsg,
        }
        #[derive(Deserialize)]
        struct ChoiceMsg {
            content: Option<String>,
        }

        let req = Req {
            model: &self.model,
            messages: vec![
                Msg {
                    role: "system",
                    content: system,
                },
                Msg {
                    role: "user",
                    content: user,
                },
            ],
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        };

        let resp = self
            .http
            .post("https://api.openai.com/v1/chat/completions")
            .bearer_auth(&self.api_key)
            .json(&req)
            .send()
            .await
            .context("completion request")?;

        if !resp.status().is_success() {
            anyhow::bail!("completion API returned HTTP {}", resp.status());
        }

        let body: Resp = resp.json().await.context("completion response body")?;
        let content = body
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .unwrap_or_default();
        Ok(content)
    }

    fn provider_name(&self) -> &'static str {
        "openai"
    }
}
