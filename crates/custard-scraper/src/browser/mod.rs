//! Headless-browser rendering.
//!
//! [`Renderer`] opens a [`RenderSession`] on a URL; the session exposes the
//! rendered document and script evaluation. Sessions own a browser process,
//! so callers go through [`with_session`], which closes the session exactly
//! once on every exit path.

mod chrome;
#[cfg(test)]
pub(crate) mod fake;

use std::panic::AssertUnwindSafe;
use std::time::Duration;

use async_trait::async_trait;
use futures::future::BoxFuture;
use futures::FutureExt;
use serde_json::Value;

use crate::error::ScraperError;
use crate::fetch::{self, pacing};

pub use chrome::{ChromeConfig, ChromeRenderer};

/// Waits spent on a bot-protection interstitial before giving up.
const INTERSTITIAL_WAIT_UNITS: f64 = 15.0;

#[async_trait]
pub trait Renderer: Send + Sync {
    /// Navigate a fresh session to `url` and wait until the document body is
    /// present and client-side rendering has had time to settle.
    async fn open(&self, url: &str) -> Result<Box<dyn RenderSession>, ScraperError>;
}

#[async_trait]
pub trait RenderSession: Send + Sync {
    /// Current serialized DOM.
    async fn content(&self) -> Result<String, ScraperError>;

    /// Evaluate a script expression and return its JSON value (`null` for
    /// `undefined`).
    async fn evaluate(&self, script: &str) -> Result<Value, ScraperError>;

    /// Tear down the session. Must be safe to call on a broken session.
    async fn close(&mut self);
}

/// Open a session on `url`, run `body` against it within `budget`, and close
/// the session whatever `body` did: returned, failed, panicked, or ran out
/// of time.
///
/// `body` must own everything it captures; the session borrow is the only
/// borrow its future may hold.
///
/// # Errors
///
/// Returns the error from opening the session, [`ScraperError::BrowserTimeout`]
/// when `budget` elapses, [`ScraperError::SessionPanicked`] when `body`
/// panics, or `body`'s own error.
pub async fn with_session<T, F>(
    renderer: &dyn Renderer,
    url: &str,
    budget: Duration,
    body: F,
) -> Result<T, ScraperError>
where
    F: for<'s> FnOnce(&'s dyn RenderSession) -> BoxFuture<'s, Result<T, ScraperError>>,
{
    let timeout = || ScraperError::BrowserTimeout {
        url: url.to_string(),
        secs: budget.as_secs(),
    };

    let mut session = tokio::time::timeout(budget, renderer.open(url))
        .await
        .map_err(|_| timeout())??;

    let outcome = {
        let run = AssertUnwindSafe(body(session.as_ref())).catch_unwind();
        tokio::time::timeout(budget, run).await
    };
    session.close().await;

    match outcome {
        Ok(Ok(result)) => result,
        Ok(Err(_)) => {
            tracing::error!(url, "rendering session body panicked");
            Err(ScraperError::SessionPanicked {
                url: url.to_string(),
            })
        }
        Err(_) => {
            tracing::warn!(url, secs = budget.as_secs(), "rendering session timed out");
            Err(timeout())
        }
    }
}

/// Render `url` and return its markup, waiting out a bot-protection
/// interstitial once before giving up.
///
/// # Errors
///
/// Returns [`ScraperError::BotChallenge`] when the interstitial persists,
/// [`ScraperError::Browser`] for an empty document, or any session error.
pub async fn fetch_rendered(
    renderer: &dyn Renderer,
    url: &str,
    budget: Duration,
    pacing_unit: Duration,
) -> Result<String, ScraperError> {
    let page_url = url.to_string();
    with_session(renderer, url, budget, move |session| {
        Box::pin(async move {
            let mut html = session.content().await?;
            if shows_interstitial(&html) {
                tracing::warn!(url = %page_url, "bot-protection interstitial detected; waiting");
                pacing::pause(pacing_unit, INTERSTITIAL_WAIT_UNITS).await;
                html = session.content().await?;
                if shows_interstitial(&html) {
                    return Err(ScraperError::BotChallenge { url: page_url });
                }
            }
            if html.trim().is_empty() {
                return Err(ScraperError::Browser(format!(
                    "empty document rendered for {page_url}"
                )));
            }
            Ok(html)
        })
    })
    .await
}

/// Same markers the HTTP path rejects, plus the rendered "checking your
/// browser" wait screen. Ordinary copy that merely says "just a moment" or
/// "access denied" is left alone.
fn shows_interstitial(html: &str) -> bool {
    html.to_ascii_lowercase()
        .contains("checking your browser before accessing")
        || fetch::looks_like_bot_challenge(html)
}
