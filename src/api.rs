// src/api.rs
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use axum::body::Bytes;
use axum::{
    extract::{Query, State},
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, SecondsFormat, Utc};
use tower_http::cors::CorsLayer;

use crate::config::{AppConfig, FeedSource};
use crate::error::{ApiError, FieldErrors};
use crate::ingest::extract::ContentExtractor;
use crate::ingest::providers::rss::RssFeedProvider;
use crate::ingest::types::FeedProvider;
use crate::ingest::{self, SkippedCandidate};
use crate::store::{ArticleDto, ArticleStore, MemoryStore};
use crate::summarize::{OpenAiClient, Summarizer};

const DEFAULT_RUN_LIMIT: i64 = 20;
const MAX_RUN_LIMIT: i64 = 50;
const DEFAULT_PAGE_SIZE: usize = 10;
const MAX_PAGE_SIZE: usize = 50;

// UA matching what news sites serve full markup to.
const USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) \
AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.0 Safari/605.1.15";

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn ArticleStore>,
    pub summarizer: Arc<Summarizer>,
    pub extractor: Arc<ContentExtractor>,
    pub sources: Arc<Vec<FeedSource>>,
    pub http: reqwest::Client,
}

impl AppState {
    pub fn new(
        store: Arc<dyn ArticleStore>,
        summarizer: Arc<Summarizer>,
        sources: Vec<FeedSource>,
        http: reqwest::Client,
    ) -> Self {
        Self {
            store,
            summarizer,
            extractor: Arc::new(ContentExtractor::new(http.clone())),
            sources: Arc::new(sources),
            http,
        }
    }

    /// Production wiring: in-process store, OpenAI summarizer, shared HTTP
    /// client with bounded timeouts for feeds and article pages.
    pub fn from_config(config: &AppConfig) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .connect_timeout(Duration::from_secs(10))
            .timeout(Duration::from_secs(30))
            .build()?;

        let summarizer = Summarizer::new(Arc::new(OpenAiClient::new(&config.ai, http.clone())));

        Ok(Self::new(
            Arc::new(MemoryStore::new()),
            Arc::new(summarizer),
            config.sources.clone(),
            http,
        ))
    }
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "OK" }))
        .route("/news", get(get_news))
        .route("/news/refresh", post(refresh_news))
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}

#[derive(serde::Deserialize, Default)]
struct RefreshReq {
    limit: Option<i64>,
}

#[derive(serde::Serialize)]
#[serde(rename_all = "camelCase")]
struct RefreshResponse {
    inserted_count: usize,
    skipped_count: usize,
    inserted: Vec<ArticleDto>,
    skipped: Vec<SkippedCandidate>,
}

async fn refresh_news(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<RefreshResponse>, ApiError> {
    // All validation happens before the pipeline runs, so a rejected
    // request has zero side effects.
    let req: RefreshReq = if body.is_empty() {
        RefreshReq::default()
    } else {
        serde_json::from_slice(&body).map_err(|e| {
            let mut errors = FieldErrors::default();
            errors.push("body", format!("invalid json: {e}"));
            ApiError::validation(errors)
        })?
    };

    let limit = req.limit.unwrap_or(DEFAULT_RUN_LIMIT);
    if !(1..=MAX_RUN_LIMIT).contains(&limit) {
        let mut errors = FieldErrors::default();
        errors.push("limit", format!("must be between 1 and {MAX_RUN_LIMIT}"));
        return Err(ApiError::validation(errors));
    }

    let providers: Vec<Box<dyn FeedProvider>> = state
        .sources
        .iter()
        .map(|s| {
            Box::new(RssFeedProvider::from_url(
                s.source.clone(),
                s.feed_url.clone(),
                state.http.clone(),
            )) as Box<dyn FeedProvider>
        })
        .collect();

    let report = ingest::run_once(
        &providers,
        &state.extractor,
        &state.summarizer,
        state.store.as_ref(),
        limit as usize,
    )
    .await?;

    Ok(Json(RefreshResponse {
        inserted_count: report.inserted.len(),
        skipped_count: report.skipped.len(),
        inserted: report.inserted.iter().map(|a| a.to_dto()).collect(),
        skipped: report.skipped,
    }))
}

#[derive(serde::Serialize)]
#[serde(rename_all = "camelCase")]
struct NewsPageResponse {
    articles: Vec<ArticleDto>,
    next_cursor: Option<String>,
}

async fn get_news(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<NewsPageResponse>, ApiError> {
    let mut errors = FieldErrors::default();

    let cursor = match params.get("cursor") {
        Some(raw) => match DateTime::parse_from_rfc3339(raw) {
            Ok(dt) => Some(dt.with_timezone(&Utc)),
            Err(_) => {
                errors.push("cursor", "must be an ISO-8601 timestamp");
                None
            }
        },
        None => None,
    };

    let page_size = match params.get("pageSize") {
        Some(raw) => match raw.parse::<usize>() {
            Ok(n) if (1..=MAX_PAGE_SIZE).contains(&n) => n,
            Ok(_) => {
                errors.push("pageSize", format!("must be between 1 and {MAX_PAGE_SIZE}"));
                DEFAULT_PAGE_SIZE
            }
            Err(_) => {
                errors.push("pageSize", "must be a number");
                DEFAULT_PAGE_SIZE
            }
        },
        None => DEFAULT_PAGE_SIZE,
    };

    if !errors.is_empty() {
        return Err(ApiError::validation(errors));
    }

    let page = state.store.page(cursor, page_size).await?;

    Ok(Json(NewsPageResponse {
        articles: page.articles.iter().map(|a| a.to_dto()).collect(),
        next_cursor: page
            .next_cursor
            .map(|c| c.to_rfc3339_opts(SecondsFormat::Millis, true)),
    }))
}
