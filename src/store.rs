// src/store.rs
//! Persistence gateway for stored articles.
//!
//! The trait mirrors what a hosted document store offers this service:
//! equality lookup on url, insert with server-assigned id/timestamp, and an
//! ordered range scan over `published_at` with start-after pagination.
//! `MemoryStore` is the in-process implementation behind that seam.

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tokio::sync::RwLock;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StoredArticle {
    pub id: String,
    pub headline: String,
    pub summary: String,
    pub url: String,
    pub source: String,
    pub published_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

/// Validated candidate plus its summary, ready for persistence.
#[derive(Debug, Clone)]
pub struct NewArticle {
    pub headline: String,
    pub summary: String,
    pub url: String,
    pub source: String,
    pub published_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct ArticlePage {
    pub articles: Vec<StoredArticle>,
    /// `published_at` of the last returned row; `None` when the page came
    /// back short, signalling no further pages.
    pub next_cursor: Option<DateTime<Utc>>,
}

/// Wire shape served to clients. Timestamps are RFC 3339 with milliseconds.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArticleDto {
    pub id: String,
    pub headline: String,
    pub summary: String,
    pub url: String,
    pub source: String,
    pub published_at: String,
    pub created_at: String,
}

impl StoredArticle {
    pub fn to_dto(&self) -> ArticleDto {
        ArticleDto {
            id: self.id.clone(),
            headline: self.headline.clone(),
            summary: self.summary.clone(),
            url: self.url.clone(),
            source: self.source.clone(),
            published_at: self.published_at.to_rfc3339_opts(SecondsFormat::Millis, true),
            created_at: self.created_at.to_rfc3339_opts(SecondsFormat::Millis, true),
        }
    }
}

#[async_trait]
pub trait ArticleStore: Send + Sync {
    /// Equality lookup on url. Callers run this before `insert` to keep
    /// at most one stored article per url; the guard is best-effort and a
    /// hosted backend wanting cross-process guarantees needs its own
    /// unique index on url.
    async fn find_by_url(&self, url: &str) -> Result<Option<StoredArticle>>;

    /// Assigns id + creation timestamp, persists, returns the stored row.
    async fn insert(&self, article: NewArticle) -> Result<StoredArticle>;

    /// Up to `page_size` articles ordered by `published_at` descending
    /// (id-descending tie-break), strictly after `start_after` if given.
    async fn page(
        &self,
        start_after: Option<DateTime<Utc>>,
        page_size: usize,
    ) -> Result<ArticlePage>;
}

/// Deterministic document id derived from the url. Distinct from the url
/// itself so the wire id stays short and opaque.
fn article_id(url: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(url.as_bytes());
    let digest = hasher.finalize();
    hex_prefix(&digest, 16)
}

fn hex_prefix(bytes: &[u8], len: usize) -> String {
    use std::fmt::Write as _;
    let mut s = String::with_capacity(len + 2);
    for b in bytes {
        let _ = write!(s, "{b:02x}");
        if s.len() >= len {
            break;
        }
    }
    s.truncate(len);
    s
}

/// In-process document store guarded by an async RwLock.
#[derive(Default)]
pub struct MemoryStore {
    docs: RwLock<Vec<StoredArticle>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ArticleStore for MemoryStore {
    async fn find_by_url(&self, url: &str) -> Result<Option<StoredArticle>> {
        let docs = self.docs.read().await;
        Ok(docs.iter().find(|a| a.url == url).cloned())
    }

    async fn insert(&self, article: NewArticle) -> Result<StoredArticle> {
        let mut docs = self.docs.write().await;
        // Re-check under the write lock; within one process two inserts for
        // the same url cannot interleave, so the earlier row wins.
        if let Some(existing) = docs.iter().find(|a| a.url == article.url) {
            return Ok(existing.clone());
        }

        let stored = StoredArticle {
            id: article_id(&article.url),
            headline: article.headline,
            summary: article.summary,
            url: article.url,
            source: article.source,
            published_at: article.published_at,
            created_at: Utc::now(),
        };
        docs.push(stored.clone());
        Ok(stored)
    }

    async fn page(
        &self,
        start_after: Option<DateTime<Utc>>,
        page_size: usize,
    ) -> Result<ArticlePage> {
        let docs = self.docs.read().await;

        let mut rows: Vec<StoredArticle> = docs
            .iter()
            .filter(|a| match start_after {
                Some(cursor) => a.published_at < cursor,
                None => true,
            })
            .cloned()
            .collect();
        rows.sort_by(|a, b| {
            b.published_at
                .cmp(&a.published_at)
                .then_with(|| b.id.cmp(&a.id))
        });
        rows.truncate(page_size);

        let next_cursor = if rows.len() == page_size {
            rows.last().map(|a| a.published_at)
        } else {
            None
        };

        Ok(ArticlePage {
            articles: rows,
            next_cursor,
        })
    }
}
