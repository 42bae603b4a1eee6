//! Oscar's: a rendered monthly calendar whose flavor links open overlays.
//!
//! The row for today is found by its "Tue 15" style label. Each flavor link
//! in that row is clicked in turn; the overlay it opens carries the flavor's
//! name and description. A flavor whose overlay cannot be read still yields
//! a record, with an empty description.

use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use serde_json::Value;

use super::{ScrapeContext, SiteExtractor};
use crate::browser::{with_session, RenderSession};
use crate::calendar::{day_label, day_label_matches, has_or_separator, split_flavor_candidates};
use crate::error::ScraperError;
use crate::fetch::pacing;
use crate::markup::{Node, ParsedMarkup};
use crate::normalize::normalize_flavor;
use crate::types::{Extraction, RawFlavor};

const SITE: &str = "oscars";
const LOCATION: &str = "Oscars";
const DEFAULT_URL: &str = "https://www.oscarscustard.com/index.php/flavors";

/// Time units to wait after a click for the overlay to animate in or out.
const OVERLAY_UNITS: f64 = 1.0;
/// Shortest text accepted as an overlay description.
const MIN_DESCRIPTION_CHARS: usize = 10;
const TEXT_BLOCKS: &str = "span, div, p";
const NESTED_BLOCKS: &str = "div, p";

/// Returns the innerHTML of the first visible open overlay, or `null`.
const OPEN_OVERLAY_JS: &str = r"(() => {
    const open = Array.from(document.querySelectorAll(`[class*='divioverlay-open']`))
        .find(el => el.getClientRects().length > 0);
    return open ? open.innerHTML : null;
})()";

/// Clicks a visible close control, or dispatches Escape when there is none.
const CLOSE_OVERLAY_JS: &str = r"(() => {
    const button = Array.from(document.querySelectorAll(`[class*='close']`))
        .find(el => el.getClientRects().length > 0);
    if (button) { button.click(); return 'control'; }
    document.body.dispatchEvent(new KeyboardEvent('keydown', { key: 'Escape', keyCode: 27, bubbles: true }));
    return 'escape';
})()";

pub struct OscarsExtractor {
    url: String,
}

impl OscarsExtractor {
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }
}

impl Default for OscarsExtractor {
    fn default() -> Self {
        Self::new(DEFAULT_URL)
    }
}

#[async_trait]
impl SiteExtractor for OscarsExtractor {
    fn id(&self) -> &'static str {
        SITE
    }

    async fn extract(&self, ctx: &ScrapeContext) -> Result<Extraction, ScraperError> {
        let config = ctx.fetcher.config();
        let flow = CalendarFlow {
            page_url: self.url.clone(),
            today: ctx.today,
            pacing_unit: config.pacing_unit,
        };
        with_session(
            ctx.fetcher.renderer(),
            &self.url,
            config.session_budget,
            move |session| Box::pin(async move { flow.run(session).await }),
        )
        .await
    }
}

/// Today's calendar cell, located in the rendered document.
#[derive(Debug, Clone, PartialEq, Eq)]
struct TodayCell {
    /// Index among `table tr` in document order.
    row: usize,
    /// Index among the row's `td` elements.
    cell: usize,
    text: String,
    /// Link texts, in order; empty strings are kept so indexes line up with
    /// the live document.
    links: Vec<String>,
}

impl TodayCell {
    fn is_multi_flavor(&self) -> bool {
        has_or_separator(&self.text) || self.links.len() > 1
    }

    /// Flavor names to look up, each paired with the index of the link that
    /// opens its overlay when there is one.
    fn candidates(&self) -> Vec<(String, Option<usize>)> {
        if self.is_multi_flavor() {
            let linked: Vec<_> = self
                .links
                .iter()
                .enumerate()
                .filter(|(_, name)| !name.is_empty())
                .map(|(i, name)| (name.clone(), Some(i)))
                .collect();
            if !linked.is_empty() {
                return linked;
            }
            return split_flavor_candidates(&self.text)
                .into_iter()
                .enumerate()
                .map(|(i, name)| (name, (i < self.links.len()).then_some(i)))
                .collect();
        }

        let name = self
            .links
            .first()
            .filter(|name| !name.is_empty())
            .cloned()
            .unwrap_or_else(|| self.text.clone());
        vec![(name, (!self.links.is_empty()).then_some(0))]
    }
}

/// What the calendar says about today, before any overlay is opened.
#[derive(Debug, PartialEq, Eq)]
enum CalendarLookup {
    NoRow,
    EmptyCell,
    Cell(TodayCell),
}

struct CalendarFlow {
    page_url: String,
    today: NaiveDate,
    pacing_unit: Duration,
}

impl CalendarFlow {
    async fn run(self, session: &dyn RenderSession) -> Result<Extraction, ScraperError> {
        let html = session.content().await?;
        let cell = match locate_today(&html, self.today) {
            CalendarLookup::Cell(cell) => cell,
            CalendarLookup::NoRow => {
                tracing::warn!(site = SITE, label = %day_label(self.today), "no calendar row for today");
                return Ok(Extraction::NotFound);
            }
            CalendarLookup::EmptyCell => {
                tracing::warn!(site = SITE, label = %day_label(self.today), "calendar row has no flavor");
                return Ok(Extraction::NotFound);
            }
        };

        let candidates = cell.candidates();
        tracing::debug!(
            site = SITE,
            multi = cell.is_multi_flavor(),
            count = candidates.len(),
            "resolved today's calendar cell"
        );

        let mut records = Vec::with_capacity(candidates.len());
        for (name, link) in candidates {
            let overlay = match link {
                Some(index) => self.read_overlay(session, &cell, index, &name).await,
                None => Err(ScraperError::Browser(format!("no link for flavor {name}"))),
            };
            let (flavor, description) = match overlay {
                Ok(found) => found,
                Err(e) => {
                    tracing::warn!(site = SITE, flavor = %name, error = %e, "overlay unavailable; keeping name only");
                    (name, None)
                }
            };
            records.push(self.record(flavor, description));
        }
        Ok(Extraction::from_records(records))
    }

    /// Click link `index` in today's cell, read the overlay it opens, then
    /// close it again.
    async fn read_overlay(
        &self,
        session: &dyn RenderSession,
        cell: &TodayCell,
        index: usize,
        expected: &str,
    ) -> Result<(String, Option<String>), ScraperError> {
        let clicked = session.evaluate(&click_link_js(cell.row, cell.cell, index)).await?;
        if clicked != Value::Bool(true) {
            return Err(ScraperError::Browser(format!(
                "flavor link {index} is not in the rendered calendar"
            )));
        }
        pacing::pause(self.pacing_unit, OVERLAY_UNITS).await;

        let overlay = session.evaluate(OPEN_OVERLAY_JS).await;
        self.close_overlay(session).await;

        match overlay? {
            Value::String(html) => Ok(parse_overlay(&html, expected)),
            _ => Err(ScraperError::Browser("no open overlay after click".to_string())),
        }
    }

    async fn close_overlay(&self, session: &dyn RenderSession) {
        match session.evaluate(CLOSE_OVERLAY_JS).await {
            Ok(how) => tracing::trace!(site = SITE, how = %how, "overlay closed"),
            Err(e) => tracing::warn!(site = SITE, error = %e, "failed to close overlay"),
        }
        pacing::pause(self.pacing_unit, OVERLAY_UNITS).await;
    }

    fn record(&self, flavor: String, description: Option<String>) -> custard_core::FlavorRecord {
        normalize_flavor(RawFlavor {
            location: LOCATION.to_string(),
            flavor: Some(flavor),
            description,
            date: Some(self.today),
            url: Some(self.page_url.clone()),
        })
    }
}

fn click_link_js(row: usize, cell: usize, link: usize) -> String {
    format!(
        "(() => {{
    const row = document.querySelectorAll('table tr')[{row}];
    const cell = row && row.querySelectorAll('td')[{cell}];
    const link = cell && cell.querySelectorAll('a')[{link}];
    if (!link) return false;
    link.click();
    return true;
}})()"
    )
}

/// Find today's row and the cell holding its flavors.
///
/// The flavor cell is the first cell with links, else the first cell with
/// text other than the day label.
fn locate_today(html: &str, today: NaiveDate) -> CalendarLookup {
    let markup = ParsedMarkup::parse(html);
    let rows = markup.select("table tr");

    let Some((row_index, row)) = rows.iter().enumerate().find(|(_, row)| {
        row.select("td")
            .iter()
            .any(|td| day_label_matches(&td.text(), today))
    }) else {
        return CalendarLookup::NoRow;
    };

    let cells = row.select("td");
    let linked = cells
        .iter()
        .position(|td| td.select("a").iter().any(|a| !a.text().is_empty()));
    let texted = || {
        cells.iter().position(|td| {
            let text = td.text();
            !text.is_empty() && !is_day_label(&text, today)
        })
    };
    let Some(cell_index) = linked.or_else(texted) else {
        return CalendarLookup::EmptyCell;
    };

    let cell = cells[cell_index];
    CalendarLookup::Cell(TodayCell {
        row: row_index,
        cell: cell_index,
        text: cell.text(),
        links: cell.select("a").iter().map(|a| a.text()).collect(),
    })
}

/// A cell holding only the day label, e.g. `"Tue 15"`.
fn is_day_label(text: &str, today: NaiveDate) -> bool {
    day_label_matches(text, today) && text.split_whitespace().count() <= 2
}

/// Flavor name and description from an overlay's markup.
///
/// The name is the overlay's `h4`, else `expected`. The description is the
/// first span/div/p after the heading whose text is long enough and is not
/// just the name again; failing that, the longest such text anywhere in the
/// overlay.
fn parse_overlay(html: &str, expected: &str) -> (String, Option<String>) {
    let markup = ParsedMarkup::parse_fragment(html);
    let heading = markup.select_first("h4");
    let name = heading
        .map(|h| h.text())
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| expected.to_string());
    let upper_name = name.to_uppercase();

    let qualifies = |text: &String| {
        text.chars().count() > MIN_DESCRIPTION_CHARS && text.to_uppercase() != upper_name
    };
    // Blocks with no block-level children, so a wrapper never wins with its
    // children's text but inline emphasis stays inside its sentence.
    let is_text_block = |n: &Node<'_>| {
        matches!(n.tag(), "span" | "div" | "p") && n.select(NESTED_BLOCKS).is_empty()
    };

    let following = heading.and_then(|h| {
        markup
            .elements_after(&h)
            .into_iter()
            .filter(|n| is_text_block(n))
            .map(|n| n.text())
            .find(|t| qualifies(t))
    });
    if following.is_some() {
        return (name, following);
    }

    let longest = markup
        .select(TEXT_BLOCKS)
        .into_iter()
        .filter(|n| is_text_block(n))
        .map(|n| n.text())
        .filter(|t| qualifies(t))
        .max_by_key(|t| t.chars().count());
    (name, longest)
}

#[cfg(test)]
#[path = "oscars_test.rs"]
mod tests;
