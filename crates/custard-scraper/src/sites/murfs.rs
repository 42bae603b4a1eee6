//! Murf's: a flavor forecast page with classed spans for today's flavor.

use async_trait::async_trait;
use chrono::Datelike;

use super::{ScrapeContext, SiteExtractor};
use crate::calendar::parse_month_day;
use crate::error::ScraperError;
use crate::markup::ParsedMarkup;
use crate::normalize::normalize_flavor;
use crate::types::{Extraction, RawFlavor, Strategy};

const SITE: &str = "murfs";
const LOCATION: &str = "Murfs";
const DEFAULT_URL: &str = "https://www.murfsfrozencustard.com/flavorForecast";

pub struct MurfsExtractor {
    url: String,
}

impl MurfsExtractor {
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }
}

impl Default for MurfsExtractor {
    fn default() -> Self {
        Self::new(DEFAULT_URL)
    }
}

#[async_trait]
impl SiteExtractor for MurfsExtractor {
    fn id(&self) -> &'static str {
        SITE
    }

    async fn extract(&self, ctx: &ScrapeContext) -> Result<Extraction, ScraperError> {
        let page = ctx.fetcher.fetch(&self.url).await?;
        Ok(forecast_flavor(&page.html, ctx.today.year()))
    }
}

/// Today's flavor from the forecast page. The date label reads like
/// `"Sunday, Jul. 06"` and carries no year, so `year` is assumed.
pub(crate) fn forecast_flavor(html: &str, year: i32) -> Extraction {
    let markup = ParsedMarkup::parse(html);

    let Some(flavor) = markup.select_first("span.flavorOfDayWhiteSpan") else {
        tracing::warn!(site = SITE, strategy = %Strategy::DomHeading, "flavor span not found");
        return Extraction::StructuralMismatch("no flavorOfDayWhiteSpan element".to_string());
    };
    let flavor = flavor.text();
    if flavor.is_empty() {
        return Extraction::NotFound;
    }

    let description = markup
        .select_first("span.flavorDescriptionSpan")
        .map(|span| span.text());
    let date = markup
        .select_first("span.subDateSpan")
        .and_then(|span| parse_month_day(&span.text(), year));
    if date.is_none() {
        tracing::debug!(site = SITE, "forecast date label missing or unreadable");
    }

    Extraction::Found(vec![normalize_flavor(RawFlavor {
        location: LOCATION.to_string(),
        flavor: Some(flavor),
        description,
        date,
        url: None,
    })])
}
