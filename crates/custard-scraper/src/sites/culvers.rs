//! Culver's: several restaurant pages, each with a flavor calendar.
//!
//! Restaurant pages are Next.js apps. The calendar normally sits in the
//! `__NEXT_DATA__` block; when it doesn't, the page still links to the
//! day's flavor, and the linked detail page carries the description.

use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use serde_json::Value;
use url::Url;

use super::{first_found, ScrapeContext, SiteExtractor};
use crate::embedded::{json_path, next_data};
use crate::error::ScraperError;
use crate::markup::ParsedMarkup;
use crate::normalize::normalize_flavor;
use crate::types::{Extraction, RawFlavor, Strategy};

const SITE: &str = "culvers";

const DEFAULT_LOCATIONS: [(&str, &str); 4] = [
    (
        "Culvers (Capital)",
        "https://www.culvers.com/restaurants/brookfield-capitol",
    ),
    (
        "Culvers (Waukesha Main St)",
        "https://www.culvers.com/restaurants/waukesha-hwy-164",
    ),
    (
        "Culvers (Waukesha Grandview)",
        "https://www.culvers.com/restaurants/waukesha-grandview",
    ),
    ("Culvers (Sussex)", "https://www.culvers.com/restaurants/sussex"),
];

/// Where the flavor calendar has lived inside `props.pageProps` over
/// successive site releases, newest first.
const CALENDAR_PATHS: [&[&str]; 5] = [
    &["restaurantCalendar", "flavors"],
    &["page", "customData", "flavorDetails", "flavors"],
    &["customData", "flavorDetails", "flavors"],
    &["flavorDetails", "flavors"],
    &["page", "customData", "restaurantCalendar", "flavors"],
];

const LOCATION_BUDGET_SHARE: f64 = 0.95;

const FLAVOR_PATH: &str = "/flavor-of-the-day/";
const FLAVOR_LINK: &str = "a[href*='/flavor-of-the-day/']";
const DETAIL_DESCRIPTION_CLASS: &str = "FlavorOfTheDayDetails_containerPrimaryContentDescription";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CulversLocation {
    pub name: String,
    pub url: String,
}

impl CulversLocation {
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
        }
    }
}

pub struct CulversExtractor {
    locations: Vec<CulversLocation>,
}

impl CulversExtractor {
    #[must_use]
    pub fn new(locations: Vec<CulversLocation>) -> Self {
        Self { locations }
    }

    async fn scrape_location(
        &self,
        ctx: &ScrapeContext,
        location: &CulversLocation,
    ) -> Result<Extraction, ScraperError> {
        let page = ctx.fetcher.fetch(&location.url).await?;
        let html = page.html.as_str();

        first_found(
            SITE,
            &[Strategy::StructuredData, Strategy::DomHeading],
            |strategy| async move {
                match strategy {
                    Strategy::StructuredData => calendar_flavor(html, location, ctx.today),
                    _ => linked_flavor(ctx, location, html).await,
                }
            },
        )
        .await
    }
}

impl Default for CulversExtractor {
    fn default() -> Self {
        Self::new(
            DEFAULT_LOCATIONS
                .iter()
                .map(|(name, url)| CulversLocation::new(*name, *url))
                .collect(),
        )
    }
}

#[async_trait]
impl SiteExtractor for CulversExtractor {
    fn id(&self) -> &'static str {
        SITE
    }

    async fn extract(&self, ctx: &ScrapeContext) -> Result<Extraction, ScraperError> {
        let mut records = Vec::new();
        let per_location = location_budget(ctx.site_budget, self.locations.len());
        // One host: locations are fetched one after another to keep pacing.
        for location in &self.locations {
            let Ok(outcome) =
                tokio::time::timeout(per_location, self.scrape_location(ctx, location)).await
            else {
                tracing::warn!(
                    site = SITE,
                    location = %location.name,
                    budget_ms = per_location.as_millis(),
                    "location timed out"
                );
                continue;
            };
            match outcome {
                Ok(Extraction::Found(mut found)) => records.append(&mut found),
                Ok(Extraction::NotFound) => {
                    tracing::info!(site = SITE, location = %location.name, "no flavor published");
                }
                Ok(Extraction::StructuralMismatch(reason)) => {
                    tracing::warn!(
                        site = SITE,
                        location = %location.name,
                        reason = %reason,
                        "no extraction strategy matched"
                    );
                }
                Err(e) => {
                    tracing::warn!(site = SITE, location = %location.name, error = %e, "location failed");
                }
            }
        }
        Ok(Extraction::from_records(records))
    }
}

/// Equal share of the site budget for each location. The shares add up to
/// slightly less than the whole so the finished locations are returned
/// before the site itself is cut off.
fn location_budget(site_budget: Duration, locations: usize) -> Duration {
    let shares = u32::try_from(locations.max(1)).unwrap_or(u32::MAX);
    site_budget.mul_f64(LOCATION_BUDGET_SHARE) / shares
}

/// Today's entry from the `__NEXT_DATA__` flavor calendar.
fn calendar_flavor(
    html: &str,
    location: &CulversLocation,
    today: NaiveDate,
) -> Result<Extraction, ScraperError> {
    let Some(data) = next_data(html)? else {
        return Ok(Extraction::StructuralMismatch(
            "no __NEXT_DATA__ block".to_string(),
        ));
    };
    let Some(props) = json_path(&data, &["props", "pageProps"]) else {
        return Ok(Extraction::StructuralMismatch(
            "__NEXT_DATA__ has no props.pageProps".to_string(),
        ));
    };
    let Some(entries) = CALENDAR_PATHS.iter().find_map(|path| {
        json_path(props, path)
            .and_then(Value::as_array)
            .filter(|a| !a.is_empty())
    }) else {
        return Ok(Extraction::StructuralMismatch(
            "no flavor calendar in page props".to_string(),
        ));
    };

    let Some(entry) = pick_entry(entries, today) else {
        return Ok(Extraction::NotFound);
    };
    let Some(flavor) = string_field(entry, &["title", "name"]) else {
        return Ok(Extraction::StructuralMismatch(
            "calendar entry has no title".to_string(),
        ));
    };

    let record = normalize_flavor(RawFlavor {
        location: location.name.clone(),
        flavor: Some(flavor),
        description: string_field(entry, &["description"]),
        date: entry_date(entry),
        url: Some(location.url.clone()),
    });
    Ok(Extraction::Found(vec![record]))
}

/// Pick the entry dated `today`; otherwise the earliest future entry;
/// otherwise the latest entry.
///
/// The future fallback shows the next scheduled flavor when today's slot is
/// missing, which can also paper over a date computed in the wrong
/// timezone.
fn pick_entry(entries: &[Value], today: NaiveDate) -> Option<&Value> {
    let mut dated: Vec<(NaiveDate, &Value)> = entries
        .iter()
        .filter_map(|e| entry_date(e).map(|d| (d, e)))
        .collect();
    dated.sort_by_key(|(date, _)| *date);

    dated
        .iter()
        .find(|(date, _)| *date == today)
        .or_else(|| dated.iter().find(|(date, _)| *date > today))
        .or_else(|| dated.last())
        .map(|(_, entry)| *entry)
        .or_else(|| entries.last())
}

fn entry_date(entry: &Value) -> Option<NaiveDate> {
    let raw = string_field(entry, &["onDate", "calendarDate"])?;
    let day = raw.get(..10)?;
    NaiveDate::parse_from_str(day, "%Y-%m-%d").ok()
}

fn string_field(entry: &Value, keys: &[&str]) -> Option<String> {
    keys.iter()
        .filter_map(|k| entry.get(*k).and_then(Value::as_str))
        .map(str::trim)
        .find(|s| !s.is_empty())
        .map(str::to_string)
}

/// The day's flavor link on the restaurant page, then its detail page for a
/// description.
async fn linked_flavor(
    ctx: &ScrapeContext,
    location: &CulversLocation,
    html: &str,
) -> Result<Extraction, ScraperError> {
    let Some((flavor, href)) = flavor_link(html) else {
        return Ok(Extraction::StructuralMismatch(
            "no flavor-of-the-day link".to_string(),
        ));
    };

    let detail_url = Url::parse(&location.url)
        .and_then(|base| base.join(&href))
        .map_err(|e| ScraperError::InvalidUrl {
            url: href.clone(),
            reason: e.to_string(),
        })?
        .to_string();

    let description = match ctx.fetcher.fetch(&detail_url).await {
        Ok(detail) => detail_description(&detail.html),
        Err(e) => {
            tracing::warn!(site = SITE, url = %detail_url, error = %e, "detail page unavailable");
            None
        }
    };

    let record = normalize_flavor(RawFlavor {
        location: location.name.clone(),
        flavor: Some(flavor),
        description,
        date: Some(ctx.today),
        url: Some(detail_url),
    });
    Ok(Extraction::Found(vec![record]))
}

fn flavor_link(html: &str) -> Option<(String, String)> {
    let markup = ParsedMarkup::parse(html);
    markup.select(FLAVOR_LINK).into_iter().find_map(|a| {
        let href = a.attr("href")?;
        // Skip the index link; a flavor link names its flavor after the prefix.
        let (_, slug) = href.split_once(FLAVOR_PATH)?;
        if slug.trim_matches('/').is_empty() {
            return None;
        }
        let name = a.text();
        (!name.is_empty()).then(|| (name, href.to_string()))
    })
}

/// Description on a flavor detail page: the known container first, then any
/// description-classed block of plausible length.
fn detail_description(html: &str) -> Option<String> {
    let markup = ParsedMarkup::parse(html);

    let primary = markup
        .find_all("div", |d| d.has_class_containing(DETAIL_DESCRIPTION_CLASS))
        .into_iter()
        .map(|d| d.text())
        .find(|t| !t.is_empty());
    if let Some(text) = primary {
        tracing::debug!(site = SITE, strategy = %Strategy::DomHeading, "detail description found");
        return Some(text);
    }

    let scanned = markup
        .find_all("div", |d| d.has_class_containing("description"))
        .into_iter()
        .map(|d| d.text())
        .find(|t| {
            let len = t.chars().count();
            len > 30 && len < 400
        });
    if scanned.is_some() {
        tracing::debug!(site = SITE, strategy = %Strategy::RawScan, "detail description found");
    }
    scanned
}

#[cfg(test)]
#[path = "culvers_test.rs"]
mod tests;
