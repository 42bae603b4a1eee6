//! Kopp's: a "today's flavors" block on the home page.

use std::sync::LazyLock;

use async_trait::async_trait;
use chrono::{Datelike, NaiveDate};
use regex::Regex;

use super::{ScrapeContext, SiteExtractor};
use crate::calendar::parse_month_day;
use crate::error::ScraperError;
use crate::markup::{Node, ParsedMarkup};
use crate::normalize::normalize_flavor;
use crate::types::{Extraction, RawFlavor, Strategy};

const SITE: &str = "kopps";
const LOCATION: &str = "Kopps";
const DEFAULT_URL: &str = "https://www.kopps.com/";

/// Monthly specials listed alongside the daily flavors.
const PROMOTIONAL_HEADINGS: [&str; 2] = ["shake of the month", "sundae of the month"];

static TODAYS_FLAVORS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)TODAY['’`ʼ]?S?\s*FLAVORS\s*[–—:-]\s*(.+)").expect("valid regex")
});

pub struct KoppsExtractor {
    url: String,
}

impl KoppsExtractor {
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }
}

impl Default for KoppsExtractor {
    fn default() -> Self {
        Self::new(DEFAULT_URL)
    }
}

#[async_trait]
impl SiteExtractor for KoppsExtractor {
    fn id(&self) -> &'static str {
        SITE
    }

    async fn extract(&self, ctx: &ScrapeContext) -> Result<Extraction, ScraperError> {
        let page = ctx.fetcher.fetch(&self.url).await?;
        Ok(todays_flavors(&page.html, ctx.today))
    }
}

/// Flavors listed in the "today's flavors" section of the home page.
pub(crate) fn todays_flavors(html: &str, today: NaiveDate) -> Extraction {
    let markup = ParsedMarkup::parse(html);

    let section = markup
        .select_first("div.wp-block-todays-flavors")
        .map(|s| (Strategy::DomHeading, s))
        .or_else(|| heading_section(&markup).map(|s| (Strategy::TextPattern, s)));
    let Some((strategy, section)) = section else {
        tracing::warn!(
            site = SITE,
            tried = "dom_heading,text_pattern",
            "today's flavors section not found"
        );
        return Extraction::StructuralMismatch("today's flavors section not found".to_string());
    };
    tracing::debug!(site = SITE, %strategy, "located today's flavors section");

    let date = section_date(&section, today);
    let records: Vec<_> = section
        .select("h3")
        .into_iter()
        .filter_map(|heading| {
            let flavor = heading.text();
            let lowered = flavor.to_lowercase();
            if flavor.chars().count() <= 2 || PROMOTIONAL_HEADINGS.iter().any(|p| lowered.contains(p)) {
                return None;
            }
            Some(normalize_flavor(RawFlavor {
                location: LOCATION.to_string(),
                flavor: Some(flavor),
                description: heading_description(&heading),
                date: Some(date),
                url: None,
            }))
        })
        .collect();

    if records.is_empty() {
        tracing::info!(site = SITE, "today's flavors section lists no flavors");
    }
    Extraction::from_records(records)
}

/// The element wrapping an `h2` that reads "TODAY'S FLAVORS – ...".
fn heading_section<'a>(markup: &'a ParsedMarkup) -> Option<Node<'a>> {
    markup
        .select("h2")
        .into_iter()
        .find(|h| TODAYS_FLAVORS.is_match(&h.text()))
        .and_then(|h| h.parent_element())
}

/// Date from the section heading, or `today` when the heading's date
/// cannot be read.
fn section_date(section: &Node<'_>, today: NaiveDate) -> NaiveDate {
    section
        .select("h2")
        .into_iter()
        .find_map(|h| {
            let text = h.text();
            let caps = TODAYS_FLAVORS.captures(&text)?;
            parse_month_day(&caps[1], today.year())
        })
        .unwrap_or(today)
}

/// The first paragraph following a flavor heading, if it says anything.
fn heading_description(heading: &Node<'_>) -> Option<String> {
    let mut next = heading.next_element_sibling();
    while let Some(node) = next {
        if node.tag() == "p" {
            let text = node.text();
            return (text.chars().count() > 5).then_some(text);
        }
        next = node.next_element_sibling();
    }
    None
}
