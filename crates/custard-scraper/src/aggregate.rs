//! Runs every site extractor for one shop-local day.
//!
//! Sites run concurrently, each as its own task under a wall-clock budget.
//! A site that errors, panics, or overruns contributes nothing; the rest of
//! the batch is unaffected. When the run-wide deadline passes, sites still
//! in flight are aborted and whatever already finished is returned.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use custard_core::{shop_today, AppConfig, FlavorRecord};
use tokio::task::JoinError;
use tokio::time::Instant;

use crate::browser::Renderer;
use crate::error::ScraperError;
use crate::fetch::{FetchConfig, PageFetcher};
use crate::sites::{default_sites, ScrapeContext, SiteExtractor};
use crate::types::Extraction;

/// Anything that can produce today's flavor list.
#[async_trait]
pub trait FlavorSource: Send + Sync {
    async fn scrape(&self, today: NaiveDate) -> Vec<FlavorRecord>;
}

pub struct Aggregator {
    fetcher: Arc<PageFetcher>,
    sites: Vec<Arc<dyn SiteExtractor>>,
    site_timeout: Duration,
    deadline: Duration,
}

impl Aggregator {
    #[must_use]
    pub fn new(fetcher: Arc<PageFetcher>, sites: Vec<Arc<dyn SiteExtractor>>) -> Self {
        let defaults = AppConfig::default();
        Self {
            fetcher,
            sites,
            site_timeout: Duration::from_secs(defaults.site_timeout_secs),
            deadline: Duration::from_secs(defaults.scrape_deadline_secs),
        }
    }

    /// The production roster with a fetcher built from `config`.
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::Http`] if the HTTP client cannot be built.
    pub fn from_config(
        config: &AppConfig,
        renderer: Arc<dyn Renderer>,
    ) -> Result<Self, ScraperError> {
        let fetcher = PageFetcher::new(FetchConfig::from_app_config(config), renderer)?;
        Ok(Self::new(Arc::new(fetcher), default_sites(config)).with_timeouts(
            Duration::from_secs(config.site_timeout_secs),
            Duration::from_secs(config.scrape_deadline_secs),
        ))
    }

    #[must_use]
    pub fn with_timeouts(mut self, site_timeout: Duration, deadline: Duration) -> Self {
        self.site_timeout = site_timeout;
        self.deadline = deadline;
        self
    }

    #[must_use]
    pub fn site_ids(&self) -> Vec<&'static str> {
        self.sites.iter().map(|s| s.id()).collect()
    }

    /// Scrape every site for the current shop-local date.
    pub async fn scrape_all(&self) -> Vec<FlavorRecord> {
        self.scrape_all_on(shop_today()).await
    }

    /// Scrape every site for `today`. Records come back grouped by site in
    /// roster order, each site's records in extraction order.
    pub async fn scrape_all_on(&self, today: NaiveDate) -> Vec<FlavorRecord> {
        let deadline = Instant::now() + self.deadline;
        let ctx = self.context(today);

        let tasks: Vec<_> = self
            .sites
            .iter()
            .map(|site| {
                let site = Arc::clone(site);
                let ctx = ctx.clone();
                let budget = self.site_timeout;
                (site.id(), tokio::spawn(async move { run_site(site.as_ref(), &ctx, budget).await }))
            })
            .collect();

        let mut records = Vec::new();
        let mut expired = false;
        for (site, mut task) in tasks {
            if !expired {
                match tokio::time::timeout_at(deadline, &mut task).await {
                    Ok(joined) => {
                        records.extend(joined_records(site, joined));
                        continue;
                    }
                    Err(_) => {
                        expired = true;
                        tracing::warn!(secs = self.deadline.as_secs(), "scrape deadline passed");
                    }
                }
            }
            // Past the deadline: keep what already finished, drop the rest.
            if task.is_finished() {
                records.extend(joined_records(site, task.await));
            } else {
                task.abort();
                tracing::warn!(site, "abandoning site still in flight");
            }
        }

        tracing::info!(records = records.len(), sites = self.sites.len(), %today, "scrape run complete");
        records
    }

    /// Run the site named `id` on its own, under the same per-site budget.
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::UnknownSite`] for an id not in the roster, or
    /// the site's own error.
    pub async fn scrape_site(
        &self,
        id: &str,
        today: NaiveDate,
    ) -> Result<Vec<FlavorRecord>, ScraperError> {
        let site = self
            .sites
            .iter()
            .find(|s| s.id() == id)
            .ok_or_else(|| ScraperError::UnknownSite(id.to_string()))?;
        let outcome = run_site(site.as_ref(), &self.context(today), self.site_timeout).await?;
        Ok(site_records(site.id(), outcome))
    }

    fn context(&self, today: NaiveDate) -> ScrapeContext {
        ScrapeContext {
            fetcher: Arc::clone(&self.fetcher),
            today,
            site_budget: self.site_timeout,
        }
    }
}

#[async_trait]
impl FlavorSource for Aggregator {
    async fn scrape(&self, today: NaiveDate) -> Vec<FlavorRecord> {
        self.scrape_all_on(today).await
    }
}

async fn run_site(
    site: &dyn SiteExtractor,
    ctx: &ScrapeContext,
    budget: Duration,
) -> Result<Extraction, ScraperError> {
    let started = Instant::now();
    let outcome = tokio::time::timeout(budget, site.extract(ctx))
        .await
        .map_err(|_| ScraperError::SiteTimeout {
            site: site.id().to_string(),
            secs: budget.as_secs(),
        })?;
    tracing::debug!(site = site.id(), elapsed_ms = started.elapsed().as_millis(), "site finished");
    outcome
}

fn joined_records(
    site: &str,
    joined: Result<Result<Extraction, ScraperError>, JoinError>,
) -> Vec<FlavorRecord> {
    match joined {
        Ok(Ok(outcome)) => site_records(site, outcome),
        Ok(Err(e)) => {
            tracing::warn!(site, error = %e, "site failed; contributing no records");
            Vec::new()
        }
        Err(e) => {
            tracing::error!(site, error = %e, "site task panicked");
            Vec::new()
        }
    }
}

fn site_records(site: &str, outcome: Extraction) -> Vec<FlavorRecord> {
    match outcome {
        Extraction::Found(records) => {
            tracing::info!(site, count = records.len(), "site scraped");
            records
        }
        Extraction::NotFound => {
            tracing::info!(site, "no flavor published for today");
            Vec::new()
        }
        Extraction::StructuralMismatch(reason) => {
            tracing::warn!(site, reason = %reason, "page structure not recognised");
            Vec::new()
        }
    }
}
