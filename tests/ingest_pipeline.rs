// tests/ingest_pipeline.rs
//
// Orchestrator behavior under mixed per-article outcomes: one candidate
// already stored, one inserting cleanly, one failing in the summarizer.

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use chrono::{TimeZone, Utc};

use stagefeed::ingest::extract::ContentExtractor;
use stagefeed::ingest::types::{FeedProvider, RawFeedEntry};
use stagefeed::store::{ArticleStore, MemoryStore, NewArticle};
use stagefeed::summarize::{CompletionClient, Summarizer};
use stagefeed::{run_once, SkipReason};

const EXISTS_URL: &str = "https://stage.example/already-stored";
const OK_URL: &str = "https://stage.example/fresh";
const FAIL_URL: &str = "https://stage.example/summarizer-breaks";

struct ThreeEntryProvider;

#[async_trait]
impl FeedProvider for ThreeEntryProvider {
    async fn fetch_latest(&self) -> Result<Vec<RawFeedEntry>> {
        let long = |marker: &str| format!("{marker} {}", "theatre news body text. ".repeat(20));
        Ok(vec![
            RawFeedEntry {
                title: Some("Already stored".into()),
                link: Some(EXISTS_URL.into()),
                published: Some("Wed, 06 Aug 2025 09:00:00 GMT".into()),
                snippet: Some(long("stored")),
            },
            RawFeedEntry {
                title: Some("Fresh story".into()),
                link: Some(OK_URL.into()),
                published: Some("Tue, 05 Aug 2025 09:00:00 GMT".into()),
                snippet: Some(long("fresh")),
            },
            RawFeedEntry {
                title: Some("Summarizer breaks on this one".into()),
                link: Some(FAIL_URL.into()),
                published: Some("Mon, 04 Aug 2025 09:00:00 GMT".into()),
                snippet: Some(long("TRIGGER-FAILURE")),
            },
        ])
    }

    fn source(&self) -> &str {
        "Mock Outlet"
    }
}

struct FlakyClient;

#[async_trait]
impl CompletionClient for FlakyClient {
    async fn complete(&self, _system: &str, user: &str) -> Result<String> {
        if user.contains("TRIGGER-FAILURE") {
            anyhow::bail!("upstream completion exploded");
        }
        Ok("A tidy two-sentence summary of the story.".to_string())
    }
    fn provider_name(&self) -> &'static str {
        "flaky"
    }
}

#[tokio::test]
async fn mixed_outcomes_tally_in_candidate_order() {
    let store = MemoryStore::new();
    store
        .insert(NewArticle {
            headline: "Already stored".into(),
            summary: "seeded".into(),
            url: EXISTS_URL.into(),
            source: "Mock Outlet".into(),
            published_at: Utc.with_ymd_and_hms(2025, 8, 6, 9, 0, 0).unwrap(),
        })
        .await
        .expect("seed store");

    let providers: Vec<Box<dyn FeedProvider>> = vec![Box::new(ThreeEntryProvider)];
    let extractor = ContentExtractor::new(reqwest::Client::new());
    let summarizer = Summarizer::new(Arc::new(FlakyClient));

    let report = run_once(&providers, &extractor, &summarizer, &store, 20)
        .await
        .expect("run completes despite per-article failures");

    assert_eq!(report.inserted.len(), 1);
    assert_eq!(report.skipped.len(), 2);
    assert_eq!(report.inserted[0].url, OK_URL);

    // Skips surface in candidate (publication) order with their reasons.
    assert_eq!(report.skipped[0].url, EXISTS_URL);
    assert_eq!(report.skipped[0].reason, SkipReason::Exists);
    assert_eq!(report.skipped[1].url, FAIL_URL);
    assert_eq!(report.skipped[1].reason, SkipReason::Error);

    // The failed candidate left nothing behind.
    assert!(store.find_by_url(FAIL_URL).await.unwrap().is_none());
}

#[tokio::test]
async fn limit_truncates_before_any_processing() {
    let store = MemoryStore::new();
    let providers: Vec<Box<dyn FeedProvider>> = vec![Box::new(ThreeEntryProvider)];
    let extractor = ContentExtractor::new(reqwest::Client::new());
    let summarizer = Summarizer::new(Arc::new(FlakyClient));

    let report = run_once(&providers, &extractor, &summarizer, &store, 1)
        .await
        .expect("run");

    // Only the most recent candidate is considered at all.
    assert_eq!(report.inserted.len() + report.skipped.len(), 1);
    assert!(store.find_by_url(OK_URL).await.unwrap().is_none());
}

struct BrokenProvider;

#[async_trait]
impl FeedProvider for BrokenProvider {
    async fn fetch_latest(&self) -> Result<Vec<RawFeedEntry>> {
        anyhow::bail!("feed unreachable")
    }
    fn source(&self) -> &str {
        "Broken Outlet"
    }
}

#[tokio::test]
async fn one_broken_feed_does_not_abort_the_run() {
    let store = MemoryStore::new();
    let providers: Vec<Box<dyn FeedProvider>> =
        vec![Box::new(BrokenProvider), Box::new(ThreeEntryProvider)];
    let extractor = ContentExtractor::new(reqwest::Client::new());
    let summarizer = Summarizer::new(Arc::new(FlakyClient));

    let report = run_once(&providers, &extractor, &summarizer, &store, 20)
        .await
        .expect("broken provider is isolated");

    assert_eq!(report.inserted.len() + report.skipped.len(), 3);
    assert!(store.find_by_url(OK_URL).await.unwrap().is_some());
}
