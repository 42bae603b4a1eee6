//! Shared fixtures for the scraper integration tests.
#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use serde_json::Value;
use wiremock::ResponseTemplate;

use custard_scraper::{FetchConfig, PageFetcher, RenderSession, Renderer, ScrapeContext, ScraperError};

/// Renderer that serves one fixed document, or refuses to open at all.
pub struct StaticRenderer {
    html: Option<String>,
    pub opened: Arc<AtomicUsize>,
    pub closed: Arc<AtomicUsize>,
}

impl StaticRenderer {
    pub fn serving(html: &str) -> Arc<Self> {
        Arc::new(Self {
            html: Some(html.to_string()),
            opened: Arc::new(AtomicUsize::new(0)),
            closed: Arc::new(AtomicUsize::new(0)),
        })
    }

    pub fn unavailable() -> Arc<Self> {
        Arc::new(Self {
            html: None,
            opened: Arc::new(AtomicUsize::new(0)),
            closed: Arc::new(AtomicUsize::new(0)),
        })
    }

    pub fn opened(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }

    pub fn closed(&self) -> usize {
        self.closed.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Renderer for StaticRenderer {
    async fn open(&self, url: &str) -> Result<Box<dyn RenderSession>, ScraperError> {
        let Some(html) = self.html.clone() else {
            return Err(ScraperError::Browser(format!("no browser for {url}")));
        };
        self.opened.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(StaticSession {
            html,
            closed: Arc::clone(&self.closed),
        }))
    }
}

struct StaticSession {
    html: String,
    closed: Arc<AtomicUsize>,
}

#[async_trait]
impl RenderSession for StaticSession {
    async fn content(&self) -> Result<String, ScraperError> {
        Ok(self.html.clone())
    }

    async fn evaluate(&self, _script: &str) -> Result<Value, ScraperError> {
        Ok(Value::Null)
    }

    async fn close(&mut self) {
        self.closed.fetch_add(1, Ordering::SeqCst);
    }
}

/// Fetch config with no pacing delays, so retries run back to back.
pub fn fast_config(max_attempts: u32) -> FetchConfig {
    FetchConfig {
        request_timeout: Duration::from_secs(5),
        session_budget: Duration::from_secs(5),
        max_attempts,
        pacing_unit: Duration::ZERO,
        ..FetchConfig::default()
    }
}

pub fn fetcher(renderer: Arc<dyn Renderer>, max_attempts: u32) -> Arc<PageFetcher> {
    Arc::new(PageFetcher::new(fast_config(max_attempts), renderer).expect("build fetcher"))
}

pub fn context(renderer: Arc<dyn Renderer>, today: NaiveDate) -> ScrapeContext {
    let fetcher = fetcher(renderer, 1);
    ScrapeContext {
        site_budget: fetcher.config().session_budget,
        fetcher,
        today,
    }
}

pub fn html(body: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_raw(body, "text/html; charset=utf-8")
}

pub fn tuesday_15() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 7, 15).expect("valid date")
}
