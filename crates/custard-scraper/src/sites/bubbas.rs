//! Bubba's: a client-rendered Popmenu site.
//!
//! The calendar lives in the Apollo cache the page serializes into
//! `window.POPMENU_APOLLO_STATE`, so the page has to be rendered. The site's
//! GraphQL calendar endpoint answers directly, but only for a browser
//! session, so it is tried first and only when a session cookie is
//! configured.

use std::collections::HashSet;

use async_trait::async_trait;
use chrono::{Days, NaiveDate};
use custard_core::FlavorRecord;
use reqwest::header;
use serde_json::{json, Value};
use url::Url;

use super::{first_found, ScrapeContext, SiteExtractor};
use crate::calendar::api_range_bound;
use crate::embedded::{json_path, window_assignment};
use crate::error::ScraperError;
use crate::normalize::normalize_flavor;
use crate::types::{Extraction, RawFlavor, Strategy};

const SITE: &str = "bubbas";
const LOCATION: &str = "Bubbas";
const DEFAULT_BASE_URL: &str = "https://www.bubbasfrozencustard.com";
const STATE_VAR: &str = "POPMENU_APOLLO_STATE";
const EVENT_TYPENAME: &str = "CalendarEvent";

const SECTION_ID: u64 = 1_332_549;
const OPERATION_NAME: &str = "customPageCalendarSection";
const OPERATION_ID: &str = "PopmenuClient/84a8c72179c517e7d584420f7a69a194";

pub struct BubbasExtractor {
    base_url: String,
    page_url: String,
    graphql_url: String,
    cookie: Option<String>,
}

impl BubbasExtractor {
    /// Extractor for a Popmenu site rooted at `base_url`.
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            page_url: format!("{base_url}/events"),
            graphql_url: format!("{base_url}/graphql"),
            base_url,
            cookie: None,
        }
    }

    /// Session cookie that unlocks the calendar API. Blank values are ignored.
    #[must_use]
    pub fn with_cookie(mut self, cookie: Option<String>) -> Self {
        self.cookie = cookie.filter(|c| !c.trim().is_empty());
        self
    }

    async fn embedded_state(&self, ctx: &ScrapeContext) -> Result<Extraction, ScraperError> {
        let page = ctx.fetcher.fetch_rendered(&self.page_url).await?;
        state_events(&page.html, STATE_VAR, ctx.today, &self.base_url)
    }

    async fn calendar_api(
        &self,
        ctx: &ScrapeContext,
        cookie: &str,
    ) -> Result<Extraction, ScraperError> {
        let response = ctx
            .fetcher
            .client()
            .post(&self.graphql_url)
            .header(header::ACCEPT, "*/*")
            .header(header::ORIGIN, &self.base_url)
            .header(header::REFERER, &self.page_url)
            .header(header::USER_AGENT, &ctx.fetcher.config().user_agent)
            .header(header::COOKIE, cookie)
            .json(&calendar_query(ctx.today))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ScraperError::UnexpectedStatus {
                status: status.as_u16(),
                url: self.graphql_url.clone(),
            });
        }
        let body = response.text().await?;
        let data: Value = serde_json::from_str(&body).map_err(|source| ScraperError::Deserialize {
            context: "calendar API response".to_string(),
            source,
        })?;
        Ok(api_events(&data, ctx.today, &self.base_url))
    }
}

impl Default for BubbasExtractor {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL)
    }
}

#[async_trait]
impl SiteExtractor for BubbasExtractor {
    fn id(&self) -> &'static str {
        SITE
    }

    async fn extract(&self, ctx: &ScrapeContext) -> Result<Extraction, ScraperError> {
        let strategies: &[Strategy] = match self.cookie {
            Some(_) => &[Strategy::StructuredData, Strategy::RawScan],
            None => &[Strategy::RawScan],
        };
        first_found(SITE, strategies, |strategy| async move {
            match (strategy, self.cookie.as_deref()) {
                (Strategy::StructuredData, Some(cookie)) => self.calendar_api(ctx, cookie).await,
                _ => self.embedded_state(ctx).await,
            }
        })
        .await
    }
}

/// GraphQL request for the calendar section, covering yesterday through
/// the day after tomorrow.
fn calendar_query(today: NaiveDate) -> Value {
    let start = today.checked_sub_days(Days::new(1)).unwrap_or(today);
    let end = today.checked_add_days(Days::new(2)).unwrap_or(today);
    json!({
        "operationName": OPERATION_NAME,
        "variables": {
            "rangeStartAt": api_range_bound(start),
            "rangeEndAt": api_range_bound(end),
            "limit": null,
            "sectionId": SECTION_ID,
        },
        "extensions": { "operationId": OPERATION_ID },
    })
}

/// Today's events from the calendar API response.
fn api_events(data: &Value, today: NaiveDate, base_url: &str) -> Extraction {
    let Some(events) = json_path(data, &["data", "customPageSection", "upcomingCalendarEvents"])
        .and_then(Value::as_array)
    else {
        tracing::warn!(site = SITE, strategy = %Strategy::StructuredData, "calendar API response has no events list");
        return Extraction::StructuralMismatch("no upcomingCalendarEvents in response".to_string());
    };
    todays_records(events.iter(), &["startAt"], today, base_url)
}

/// Today's `CalendarEvent` entries from the page's serialized state object.
fn state_events(
    html: &str,
    var: &str,
    today: NaiveDate,
    base_url: &str,
) -> Result<Extraction, ScraperError> {
    let Some(state) = window_assignment(html, var)? else {
        tracing::warn!(site = SITE, strategy = %Strategy::RawScan, var, "state assignment not found");
        return Ok(Extraction::StructuralMismatch(format!(
            "no window.{var} assignment"
        )));
    };

    let mut events = Vec::new();
    collect_calendar_events(&state, &mut events);
    if events.is_empty() {
        return Ok(Extraction::StructuralMismatch(format!(
            "window.{var} holds no {EVENT_TYPENAME} entries"
        )));
    }
    Ok(todays_records(
        events.into_iter(),
        &["eventDate", "startAt"],
        today,
        base_url,
    ))
}

fn collect_calendar_events<'a>(value: &'a Value, out: &mut Vec<&'a Value>) {
    match value {
        Value::Object(map) => {
            if map.get("__typename").and_then(Value::as_str) == Some(EVENT_TYPENAME) {
                out.push(value);
            }
            for child in map.values() {
                collect_calendar_events(child, out);
            }
        }
        Value::Array(items) => {
            for item in items {
                collect_calendar_events(item, out);
            }
        }
        _ => {}
    }
}

/// Events whose date field starts with today's `YYYY-MM-DD`, one record per
/// distinct name. The state cache often holds the same event under several
/// keys.
fn todays_records<'a>(
    events: impl Iterator<Item = &'a Value>,
    date_keys: &[&str],
    today: NaiveDate,
    base_url: &str,
) -> Extraction {
    let day = today.format("%Y-%m-%d").to_string();
    let mut seen = HashSet::new();

    let records: Vec<FlavorRecord> = events
        .filter(|event| {
            date_keys
                .iter()
                .find_map(|key| event.get(*key).and_then(Value::as_str))
                .is_some_and(|date| date.starts_with(&day))
        })
        .filter_map(|event| {
            let name = text_field(event, "name")?;
            seen.insert(name.clone()).then(|| {
                normalize_flavor(RawFlavor {
                    location: LOCATION.to_string(),
                    flavor: Some(name),
                    description: text_field(event, "description"),
                    date: Some(today),
                    url: text_field(event, "calendarEventPageUrl")
                        .and_then(|path| event_url(base_url, &path)),
                })
            })
        })
        .collect();

    if records.is_empty() {
        tracing::info!(site = SITE, %day, "no calendar event for today");
    }
    Extraction::from_records(records)
}

fn text_field(event: &Value, key: &str) -> Option<String> {
    event
        .get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn event_url(base_url: &str, path: &str) -> Option<String> {
    Url::parse(base_url)
        .and_then(|base| base.join(path))
        .map(String::from)
        .ok()
}
