//! Per-shop extractors.
//!
//! Each shop has one [`SiteExtractor`] that tries an ordered chain of
//! [`Strategy`] fallbacks and reports an [`Extraction`].

pub mod bubbas;
pub mod culvers;
pub mod kopps;
pub mod murfs;
pub mod oscars;

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use custard_core::AppConfig;

use crate::error::ScraperError;
use crate::fetch::PageFetcher;
use crate::types::{Extraction, Strategy};

pub use bubbas::BubbasExtractor;
pub use culvers::{CulversExtractor, CulversLocation};
pub use kopps::KoppsExtractor;
pub use murfs::MurfsExtractor;
pub use oscars::OscarsExtractor;

/// Everything an extractor needs for one scrape run.
#[derive(Clone)]
pub struct ScrapeContext {
    pub fetcher: Arc<PageFetcher>,
    /// Shop-local date the run is scraping for.
    pub today: NaiveDate,
    /// Wall-clock budget the whole site runs under.
    pub site_budget: Duration,
}

#[async_trait]
pub trait SiteExtractor: Send + Sync {
    /// Stable identifier used in logs and the CLI.
    fn id(&self) -> &'static str;

    /// Extract today's flavors for this shop.
    async fn extract(&self, ctx: &ScrapeContext) -> Result<Extraction, ScraperError>;
}

/// The production roster, in output order.
#[must_use]
pub fn default_sites(config: &AppConfig) -> Vec<Arc<dyn SiteExtractor>> {
    vec![
        Arc::new(CulversExtractor::default()),
        Arc::new(KoppsExtractor::default()),
        Arc::new(MurfsExtractor::default()),
        Arc::new(OscarsExtractor::default()),
        Arc::new(BubbasExtractor::default().with_cookie(config.bubbas_cookie.clone())),
    ]
}

/// Run `strategies` in order and return the first hit.
///
/// A strategy that errors is logged and treated as a miss. When every
/// strategy misses, the last miss is returned, or the last error if every
/// strategy errored.
pub(crate) async fn first_found<F, Fut>(
    site: &str,
    strategies: &[Strategy],
    mut run: F,
) -> Result<Extraction, ScraperError>
where
    F: FnMut(Strategy) -> Fut,
    Fut: Future<Output = Result<Extraction, ScraperError>>,
{
    let mut last_miss: Option<Extraction> = None;
    let mut last_error: Option<ScraperError> = None;

    for &strategy in strategies {
        match run(strategy).await {
            Ok(outcome) if outcome.is_hit() => {
                tracing::debug!(site, %strategy, "strategy matched");
                return Ok(outcome);
            }
            Ok(outcome) => {
                match &outcome {
                    Extraction::StructuralMismatch(reason) => {
                        tracing::debug!(site, %strategy, reason = %reason, "strategy missed");
                    }
                    _ => tracing::debug!(site, %strategy, "strategy found nothing"),
                }
                last_miss = Some(outcome);
            }
            Err(err) => {
                tracing::warn!(site, %strategy, error = %err, "strategy failed");
                last_error = Some(err);
            }
        }
    }

    match (last_miss, last_error) {
        (Some(miss), _) => Ok(miss),
        (None, Some(err)) => Err(err),
        (None, None) => Ok(Extraction::NotFound),
    }
}
