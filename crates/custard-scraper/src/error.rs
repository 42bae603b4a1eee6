use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScraperError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("forbidden (403) from {url}")]
    Forbidden { url: String },

    #[error("unexpected HTTP status {status} from {url}")]
    UnexpectedStatus { status: u16, url: String },

    #[error("non-HTML content type \"{content_type}\" from {url}")]
    NotHtml { url: String, content_type: String },

    #[error("bot challenge page served by {url}")]
    BotChallenge { url: String },

    #[error("all fetch attempts failed for {url}")]
    AllAttemptsFailed { url: String },

    #[error("browser error: {0}")]
    Browser(String),

    #[error("browser session for {url} timed out after {secs}s")]
    BrowserTimeout { url: String, secs: u64 },

    #[error("browser session for {url} panicked")]
    SessionPanicked { url: String },

    #[error("invalid URL \"{url}\": {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("site {site} exceeded its {secs}s budget")]
    SiteTimeout { site: String, secs: u64 },

    #[error("unknown site \"{0}\"")]
    UnknownSite(String),
}
