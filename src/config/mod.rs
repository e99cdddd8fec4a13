// src/config/mod.rs
//! Process configuration, resolved once at startup and passed down
//! explicitly. Individual modules never look up environment variables.

pub mod ai;
pub mod sources;

pub use ai::AiConfig;
pub use sources::FeedSource;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub sources: Vec<FeedSource>,
    pub ai: AiConfig,
}

impl AppConfig {
    /// Resolve all configuration. Missing credentials are fatal here;
    /// an invalid source override degrades to the default source list.
    pub fn from_env() -> anyhow::Result<Self> {
        Ok(Self {
            sources: sources::load_sources(),
            ai: AiConfig::from_env()?,
        })
    }
}
