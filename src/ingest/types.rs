// src/ingest/types.rs
use anyhow::Result;
use chrono::{DateTime, Utc};

/// One entry as the feed handed it to us. Field contents are untrusted:
/// titles/links may be missing or padded, `published` is whatever date
/// string the feed carries (RFC 3339 or RFC 2822).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawFeedEntry {
    pub title: Option<String>,
    pub link: Option<String>,
    pub published: Option<String>,
    pub snippet: Option<String>,
}

/// A normalized candidate article. Exists only within one pipeline run;
/// `headline` and `url` are guaranteed non-empty by the normalizer.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize, PartialEq, Eq)]
pub struct ScrapedArticle {
    pub headline: String,
    pub url: String,
    pub source: String, // display name, e.g. "The Stage"
    pub published_at: DateTime<Utc>,
    pub content: String, // plain text, may be empty
}

#[async_trait::async_trait]
pub trait FeedProvider: Send + Sync {
    /// Newest-first entries as provided by the feed, capped per provider.
    async fn fetch_latest(&self) -> Result<Vec<RawFeedEntry>>;
    /// Display name of the outlet this provider covers.
    fn source(&self) -> &str;
}
