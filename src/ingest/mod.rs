// src/ingest/mod.rs
pub mod extract;
pub mod providers;
pub mod types;

use std::collections::HashMap;

use anyhow::Result;
use chrono::{DateTime, Utc};
use futures::future::join_all;
use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge};
use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};

use crate::ingest::extract::ContentExtractor;
use crate::ingest::types::{FeedProvider, RawFeedEntry, ScrapedArticle};
use crate::store::{ArticleStore, NewArticle, StoredArticle};
use crate::summarize::Summarizer;

/// One-time metrics registration (so series show up on /metrics).
fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("ingest_entries_total", "Raw entries parsed from feeds.");
        describe_counter!(
            "ingest_dropped_total",
            "Entries dropped for missing headline or url."
        );
        describe_counter!(
            "ingest_dedup_total",
            "Candidates removed as cross-source url duplicates."
        );
        describe_counter!(
            "ingest_provider_errors_total",
            "Feed fetch/parse errors."
        );
        describe_counter!("articles_created_total", "Articles persisted by runs.");
        describe_counter!(
            "articles_skipped_total",
            "Candidates skipped (already stored or failed)."
        );
        describe_histogram!("ingest_parse_ms", "Feed parse time in milliseconds.");
        describe_gauge!(
            "ingest_pipeline_last_run_ts",
            "Unix ts when the ingest pipeline last ran."
        );
    });
}

/// Strip feed snippets down to plain text: entity decode, drop tags,
/// normalize curly quotes, collapse whitespace.
pub fn clean_text(s: &str) -> String {
    let mut out = html_escape::decode_html_entities(s).to_string();

    static RE_TAGS: OnceCell<regex::Regex> = OnceCell::new();
    let re_tags = RE_TAGS.get_or_init(|| regex::Regex::new(r"(?is)</?[^>]+>").unwrap());
    out = re_tags.replace_all(&out, "").to_string();

    out = out
        .replace(['\u{201C}', '\u{201D}', '\u{00AB}', '\u{00BB}'], "\"")
        .replace(['\u{2018}', '\u{2019}'], "'");

    static RE_WS: OnceCell<regex::Regex> = OnceCell::new();
    let re_ws = RE_WS.get_or_init(|| regex::Regex::new(r"\s+").unwrap());
    out = re_ws.replace_all(&out, " ").to_string();
    out.trim().to_string()
}

/// Feeds disagree on date formats: try RFC 3339 first, then RFC 2822
/// (which tolerates the obsolete `GMT`-style zone names RSS still uses).
pub fn parse_feed_date(ts: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(ts)
        .or_else(|_| DateTime::parse_from_rfc2822(ts))
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Normalize one raw entry into a candidate, or drop it.
///
/// Entries without a non-empty headline and url are discarded silently.
/// The extractor is consulted only when the feed carried no usable snippet.
async fn normalize_entry(
    source: &str,
    entry: RawFeedEntry,
    extractor: &ContentExtractor,
) -> Option<ScrapedArticle> {
    let headline = entry.title.as_deref().unwrap_or_default().trim().to_string();
    let url = entry.link.as_deref().unwrap_or_default().trim().to_string();
    if headline.is_empty() || url.is_empty() {
        counter!("ingest_dropped_total").increment(1);
        return None;
    }

    let published_at = entry
        .published
        .as_deref()
        .and_then(parse_feed_date)
        .unwrap_or_else(Utc::now);

    let snippet = entry
        .snippet
        .as_deref()
        .map(clean_text)
        .filter(|s| !s.is_empty());
    let content = match snippet {
        Some(s) => s,
        None => extractor.extract(&url).await,
    };

    Some(ScrapedArticle {
        headline,
        url,
        source: source.to_string(),
        published_at,
        content,
    })
}

/// Normalize a whole source's entries; extraction fans out concurrently.
pub async fn normalize_source(
    source: &str,
    entries: Vec<RawFeedEntry>,
    extractor: &ContentExtractor,
) -> Vec<ScrapedArticle> {
    let tasks = entries
        .into_iter()
        .map(|entry| normalize_entry(source, entry, extractor));
    join_all(tasks).await.into_iter().flatten().collect()
}

/// Merge candidates from all sources into one url-unique list, most recent
/// first. A later occurrence of a url overwrites an earlier one, so the
/// last source in configuration order wins for shared urls.
pub fn dedup_and_rank(candidates: Vec<ScrapedArticle>) -> Vec<ScrapedArticle> {
    let mut by_url: HashMap<String, ScrapedArticle> = HashMap::with_capacity(candidates.len());
    for candidate in candidates {
        by_url.insert(candidate.url.clone(), candidate);
    }

    let mut out: Vec<ScrapedArticle> = by_url.into_values().collect();
    out.sort_by(|a, b| {
        b.published_at
            .cmp(&a.published_at)
            .then_with(|| a.url.cmp(&b.url))
    });
    out
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SkipReason {
    Exists,
    Error,
}

impl SkipReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            SkipReason::Exists => "exists",
            SkipReason::Error => "error",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkippedCandidate {
    pub url: String,
    pub reason: SkipReason,
}

/// Tally of one pipeline run.
#[derive(Debug, Default)]
pub struct IngestReport {
    pub inserted: Vec<StoredArticle>,
    pub skipped: Vec<SkippedCandidate>,
}

/// Run the ingestion pipeline once: fetch every configured feed, normalize,
/// dedup, rank, then persist up to `limit` candidates with summaries.
///
/// Failures are isolated per unit of work. A failing feed contributes an
/// empty list; a failing candidate is recorded as skipped and the run
/// continues. Only failures outside those boundaries propagate as `Err`.
pub async fn run_once(
    providers: &[Box<dyn FeedProvider>],
    extractor: &ContentExtractor,
    summarizer: &Summarizer,
    store: &dyn ArticleStore,
    limit: usize,
) -> Result<IngestReport> {
    ensure_metrics_described();

    let fetches = providers.iter().map(|p| async move {
        match p.fetch_latest().await {
            Ok(entries) => (p.source().to_string(), entries),
            Err(e) => {
                tracing::warn!(error = ?e, source = p.source(), "feed fetch failed");
                counter!("ingest_provider_errors_total").increment(1);
                (p.source().to_string(), Vec::new())
            }
        }
    });
    let per_source = join_all(fetches).await;

    let normalized = join_all(
        per_source
            .into_iter()
            .map(|(source, entries)| async move {
                normalize_source(&source, entries, extractor).await
            }),
    )
    .await;
    let combined: Vec<ScrapedArticle> = normalized.into_iter().flatten().collect();

    let total = combined.len();
    let mut candidates = dedup_and_rank(combined);
    counter!("ingest_dedup_total").increment((total - candidates.len()) as u64);
    candidates.truncate(limit);

    let mut report = IngestReport::default();
    for candidate in candidates {
        match process_candidate(&candidate, summarizer, store).await {
            Ok(Some(stored)) => report.inserted.push(stored),
            Ok(None) => report.skipped.push(SkippedCandidate {
                url: candidate.url,
                reason: SkipReason::Exists,
            }),
            Err(e) => {
                tracing::warn!(
                    error = ?e,
                    source = %candidate.source,
                    url = %candidate.url,
                    "article processing failed"
                );
                report.skipped.push(SkippedCandidate {
                    url: candidate.url,
                    reason: SkipReason::Error,
                });
            }
        }
    }

    counter!("articles_created_total").increment(report.inserted.len() as u64);
    counter!("articles_skipped_total").increment(report.skipped.len() as u64);
    gauge!("ingest_pipeline_last_run_ts").set(Utc::now().timestamp().max(0) as f64);

    Ok(report)
}

/// Existence check, then summarize + insert. `Ok(None)` means the url is
/// already stored. The check-then-insert pair runs sequentially per
/// candidate, so one run cannot race against itself for a url.
async fn process_candidate(
    candidate: &ScrapedArticle,
    summarizer: &Summarizer,
    store: &dyn ArticleStore,
) -> Result<Option<StoredArticle>> {
    if store.find_by_url(&candidate.url).await?.is_some() {
        return Ok(None);
    }

    let summary = summarizer
        .summarize(&candidate.headline, &candidate.content)
        .await?;

    let stored = store
        .insert(NewArticle {
            headline: candidate.headline.clone(),
            summary,
            url: candidate.url.clone(),
            source: candidate.source.clone(),
            published_at: candidate.published_at,
        })
        .await?;
    Ok(Some(stored))
}
