//! Chromium-backed [`Renderer`].

use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::page::AddScriptToEvaluateOnNewDocumentParams;
use chromiumoxide::handler::viewport::Viewport;
use chromiumoxide::Page;
use custard_core::AppConfig;
use futures::StreamExt;
use serde_json::Value;
use tempfile::TempDir;
use tokio::task::JoinHandle;

use super::{RenderSession, Renderer};
use crate::error::ScraperError;
use crate::fetch::pacing;

/// Hides the usual automation tells before any page script runs.
const STEALTH_JS: &str = r"
    Object.defineProperty(navigator, 'webdriver', { get: () => undefined });
    Object.defineProperty(navigator, 'languages', { get: () => ['en-US', 'en'] });
    window.chrome = window.chrome || { runtime: {} };
";

const BODY_POLL_INTERVAL: Duration = Duration::from_millis(250);
const EXIT_WAIT: Duration = Duration::from_secs(5);
const PROFILE_PREFIX: &str = "custard-chrome-";

#[derive(Debug, Clone)]
pub struct ChromeConfig {
    pub executable: Option<PathBuf>,
    pub user_agent: String,
    pub navigation_timeout: Duration,
    pub render_wait_timeout: Duration,
    pub pacing_unit: Duration,
    /// Time units to let client-side rendering settle after the body appears.
    pub settle_units: f64,
}

impl ChromeConfig {
    #[must_use]
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            executable: config.chrome_path.clone(),
            user_agent: config.user_agent.clone(),
            navigation_timeout: Duration::from_secs(config.request_timeout_secs),
            render_wait_timeout: Duration::from_secs(config.render_wait_timeout_secs),
            pacing_unit: Duration::from_millis(config.pacing_unit_ms),
            settle_units: 5.0,
        }
    }
}

/// Launches one isolated headless Chromium per session.
pub struct ChromeRenderer {
    config: ChromeConfig,
}

impl ChromeRenderer {
    #[must_use]
    pub fn new(config: ChromeConfig) -> Self {
        Self { config }
    }

    fn browser_config(&self, profile: &TempDir) -> Result<BrowserConfig, ScraperError> {
        let args = [
            "--disable-dev-shm-usage".to_string(),
            "--disable-gpu".to_string(),
            "--disable-blink-features=AutomationControlled".to_string(),
            "--disable-extensions".to_string(),
            "--disable-infobars".to_string(),
            "--no-first-run".to_string(),
            format!("--user-agent={}", self.config.user_agent),
        ];

        let mut builder = BrowserConfig::builder()
            .no_sandbox()
            .window_size(1920, 1080)
            .viewport(Some(Viewport {
                width: 1920,
                height: 1080,
                ..Default::default()
            }))
            .user_data_dir(profile.path())
            .args(args);
        if let Some(executable) = &self.config.executable {
            builder = builder.chrome_executable(executable);
        }
        builder
            .build()
            .map_err(|e| ScraperError::Browser(format!("failed to configure chromium: {e}")))
    }
}

#[async_trait]
impl Renderer for ChromeRenderer {
    async fn open(&self, url: &str) -> Result<Box<dyn RenderSession>, ScraperError> {
        let profile = profile_dir()?;
        let browser_config = self.browser_config(&profile)?;

        let (browser, mut handler) = Browser::launch(browser_config)
            .await
            .map_err(|e| ScraperError::Browser(format!("failed to launch chromium: {e}")))?;
        let handler_task = tokio::spawn(async move { while handler.next().await.is_some() {} });

        // From here on an early return drops `session`, which tears the
        // browser down.
        let mut session = ChromeSession {
            browser: Some(browser),
            page: None,
            handler_task,
            _profile: profile,
        };

        let page = session
            .browser()?
            .new_page("about:blank")
            .await
            .map_err(|e| ScraperError::Browser(format!("failed to create page: {e}")))?;
        page.execute(AddScriptToEvaluateOnNewDocumentParams::new(STEALTH_JS))
            .await
            .map_err(|e| ScraperError::Browser(format!("failed to install stealth script: {e}")))?;

        match tokio::time::timeout(self.config.navigation_timeout, page.goto(url)).await {
            Ok(Ok(_)) => {}
            Ok(Err(e)) => {
                return Err(ScraperError::Browser(format!("navigation to {url} failed: {e}")));
            }
            Err(_) => {
                return Err(ScraperError::BrowserTimeout {
                    url: url.to_string(),
                    secs: self.config.navigation_timeout.as_secs(),
                });
            }
        }

        wait_for_body(&page, url, self.config.render_wait_timeout).await?;
        pacing::pause(self.config.pacing_unit, self.config.settle_units).await;

        tracing::debug!(url, "rendered page ready");
        session.page = Some(page);
        Ok(Box::new(session))
    }
}

async fn wait_for_body(page: &Page, url: &str, limit: Duration) -> Result<(), ScraperError> {
    let deadline = tokio::time::Instant::now() + limit;
    loop {
        if page.find_element("body").await.is_ok() {
            return Ok(());
        }
        if tokio::time::Instant::now() >= deadline {
            return Err(ScraperError::BrowserTimeout {
                url: url.to_string(),
                secs: limit.as_secs(),
            });
        }
        tokio::time::sleep(BODY_POLL_INTERVAL).await;
    }
}

struct ChromeSession {
    browser: Option<Browser>,
    page: Option<Page>,
    handler_task: JoinHandle<()>,
    _profile: TempDir,
}

impl ChromeSession {
    fn browser(&self) -> Result<&Browser, ScraperError> {
        self.browser
            .as_ref()
            .ok_or_else(|| ScraperError::Browser("browser already closed".to_string()))
    }

    fn page(&self) -> Result<&Page, ScraperError> {
        self.page
            .as_ref()
            .ok_or_else(|| ScraperError::Browser("no page open".to_string()))
    }
}

#[async_trait]
impl RenderSession for ChromeSession {
    async fn content(&self) -> Result<String, ScraperError> {
        self.page()?
            .content()
            .await
            .map_err(|e| ScraperError::Browser(format!("failed to read page content: {e}")))
    }

    async fn evaluate(&self, script: &str) -> Result<Value, ScraperError> {
        let result = self
            .page()?
            .evaluate(script)
            .await
            .map_err(|e| ScraperError::Browser(format!("script evaluation failed: {e}")))?;
        Ok(result.value().cloned().unwrap_or(Value::Null))
    }

    async fn close(&mut self) {
        if let Some(page) = self.page.take() {
            if let Err(e) = page.close().await {
                tracing::debug!(error = %e, "page close failed");
            }
        }
        if let Some(mut browser) = self.browser.take() {
            if let Err(e) = browser.close().await {
                tracing::warn!(error = %e, "browser close failed; killing process");
            }
            if tokio::time::timeout(EXIT_WAIT, browser.wait()).await.is_err() {
                let _ = browser.kill().await;
            }
        }
        self.handler_task.abort();
    }
}

impl Drop for ChromeSession {
    fn drop(&mut self) {
        self.handler_task.abort();
        let Some(mut browser) = self.browser.take() else {
            return;
        };
        tracing::debug!("browser session dropped without close; killing process");
        if let Ok(runtime) = tokio::runtime::Handle::try_current() {
            runtime.spawn(async move {
                let _ = browser.kill().await;
            });
        }
    }
}

/// Fresh Chromium profile directory for one session, removed on drop.
fn profile_dir() -> Result<TempDir, ScraperError> {
    tempfile::Builder::new()
        .prefix(PROFILE_PREFIX)
        .tempdir()
        .map_err(|e| {
            ScraperError::Browser(format!("failed to create browser profile directory: {e}"))
        })
}
