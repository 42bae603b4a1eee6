//! Page fetching: plain HTTP with paced retries, then a rendered fallback.

pub mod headers;
pub mod pacing;

use std::sync::Arc;
use std::time::Duration;

use custard_core::AppConfig;

use crate::browser::{self, Renderer};
use crate::error::ScraperError;

/// Tunables for [`PageFetcher`] and the rendered fallback.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    pub request_timeout: Duration,
    pub render_wait_timeout: Duration,
    /// Upper bound on a whole rendering session, from open to close.
    pub session_budget: Duration,
    pub max_attempts: u32,
    pub pacing_unit: Duration,
    pub user_agent: String,
}

impl FetchConfig {
    #[must_use]
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            request_timeout: Duration::from_secs(config.request_timeout_secs),
            render_wait_timeout: Duration::from_secs(config.render_wait_timeout_secs),
            session_budget: Duration::from_secs(config.site_timeout_secs),
            max_attempts: config.max_retries.max(1),
            pacing_unit: Duration::from_millis(config.pacing_unit_ms),
            user_agent: config.user_agent.clone(),
        }
    }
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self::from_app_config(&AppConfig::default())
    }
}

/// How a page body was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchPath {
    Http,
    Rendered,
}

/// An owned page body. Parse it with [`FetchedPage::markup`] where it is
/// used; the parsed tree must not be held across an `.await`.
#[derive(Debug, Clone)]
pub struct FetchedPage {
    pub url: String,
    pub html: String,
    pub path: FetchPath,
}

/// HTTP page fetcher shared by every extractor in a scrape run.
pub struct PageFetcher {
    client: reqwest::Client,
    renderer: Arc<dyn Renderer>,
    config: FetchConfig,
}

impl PageFetcher {
    /// Build a fetcher with its own HTTP client.
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::Http`] if the client cannot be constructed.
    pub fn new(config: FetchConfig, renderer: Arc<dyn Renderer>) -> Result<Self, ScraperError> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;
        Ok(Self {
            client,
            renderer,
            config,
        })
    }

    #[must_use]
    pub fn client(&self) -> &reqwest::Client {
        &self.client
    }

    #[must_use]
    pub fn renderer(&self) -> &dyn Renderer {
        self.renderer.as_ref()
    }

    #[must_use]
    pub fn config(&self) -> &FetchConfig {
        &self.config
    }

    /// Fetch `url` with the configured attempt count and the rendered
    /// fallback enabled.
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::AllAttemptsFailed`] or a rendering error when
    /// every path fails.
    pub async fn fetch(&self, url: &str) -> Result<FetchedPage, ScraperError> {
        self.fetch_with(url, self.config.max_attempts, true).await
    }

    /// Fetch `url` over plain HTTP, making up to `max_attempts` paced
    /// attempts, then optionally falling back to a rendered fetch.
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::AllAttemptsFailed`] when every HTTP attempt
    /// fails and `allow_fallback` is false, or the rendering error when the
    /// fallback also fails.
    pub async fn fetch_with(
        &self,
        url: &str,
        max_attempts: u32,
        allow_fallback: bool,
    ) -> Result<FetchedPage, ScraperError> {
        let max_attempts = max_attempts.max(1);
        for attempt in 0..max_attempts {
            let delay = pacing::attempt_delay(self.config.pacing_unit, attempt);
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }

            match self.attempt(url, attempt).await {
                Ok(html) => {
                    tracing::debug!(url, attempt, "fetched page over HTTP");
                    return Ok(FetchedPage {
                        url: url.to_string(),
                        html,
                        path: FetchPath::Http,
                    });
                }
                Err(err @ ScraperError::Forbidden { .. }) => {
                    tracing::warn!(url, attempt, max_attempts, error = %err, "fetch attempt refused");
                }
                Err(err) => {
                    tracing::warn!(url, attempt, max_attempts, error = %err, "fetch attempt failed");
                }
            }

            if attempt + 1 < max_attempts {
                let backoff = pacing::failure_backoff(self.config.pacing_unit);
                if !backoff.is_zero() {
                    tokio::time::sleep(backoff).await;
                }
            }
        }

        if !allow_fallback {
            return Err(ScraperError::AllAttemptsFailed {
                url: url.to_string(),
            });
        }

        tracing::info!(url, "HTTP attempts exhausted; falling back to headless browser");
        self.fetch_rendered(url).await
    }

    /// Render `url` in a headless browser session and return its markup.
    ///
    /// # Errors
    ///
    /// Returns the rendering error when the session cannot be opened, times
    /// out, or yields no markup.
    pub async fn fetch_rendered(&self, url: &str) -> Result<FetchedPage, ScraperError> {
        let html = browser::fetch_rendered(
            self.renderer.as_ref(),
            url,
            self.config.session_budget,
            self.config.pacing_unit,
        )
        .await?;
        Ok(FetchedPage {
            url: url.to_string(),
            html,
            path: FetchPath::Rendered,
        })
    }

    async fn attempt(&self, url: &str, attempt: u32) -> Result<String, ScraperError> {
        let response = self
            .client
            .get(url)
            .headers(headers::request_headers(attempt, &self.config.user_agent))
            .send()
            .await?;

        let status = response.status();
        if status == reqwest::StatusCode::FORBIDDEN {
            return Err(ScraperError::Forbidden {
                url: url.to_string(),
            });
        }
        if status != reqwest::StatusCode::OK {
            return Err(ScraperError::UnexpectedStatus {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();
        if !is_html_content_type(&content_type) {
            return Err(ScraperError::NotHtml {
                url: url.to_string(),
                content_type,
            });
        }

        let body = response.text().await?;
        if looks_like_bot_challenge(&body) {
            return Err(ScraperError::BotChallenge {
                url: url.to_string(),
            });
        }
        Ok(body)
    }
}

#[must_use]
pub fn is_html_content_type(content_type: &str) -> bool {
    content_type.to_ascii_lowercase().contains("html")
}

/// Challenge interstitials are served with a 200 and an HTML content type,
/// so they have to be recognised by body.
#[must_use]
pub fn looks_like_bot_challenge(body: &str) -> bool {
    let lowered = body.to_ascii_lowercase();
    let has_cloudflare_banner = lowered.contains("attention required! | cloudflare");
    let has_challenge_platform = lowered.contains("/cdn-cgi/challenge-platform/");
    let has_just_a_moment = lowered.contains("just a moment...");
    let has_cookie_gate = lowered.contains("please enable cookies");
    let has_cf_chl = lowered.contains("cf-chl-");

    has_cloudflare_banner
        || has_challenge_platform
        || (has_just_a_moment && has_cookie_gate)
        || (has_just_a_moment && has_cf_chl)
}
