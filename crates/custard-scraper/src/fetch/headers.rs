//! Browser-like request headers that vary by attempt.

use reqwest::header::{
    HeaderMap, HeaderName, HeaderValue, ACCEPT, ACCEPT_CHARSET, ACCEPT_LANGUAGE, CACHE_CONTROL,
    CONNECTION, DNT, REFERER, UPGRADE_INSECURE_REQUESTS, USER_AGENT,
};

pub const CHROME_136_UA: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/136.0.0.0 Safari/537.36";
pub const SAFARI_UA: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/18.1 Safari/605.1.15";

const ACCEPT_HTML: &str =
    "text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,image/webp,image/apng,*/*;q=0.8";
const SEARCH_REFERER: &str = "https://www.google.com/";

/// User-Agent for `attempt`: the configured base on attempt 0, then rotating
/// through two alternates.
#[must_use]
pub fn user_agent_for(attempt: u32, base: &str) -> &str {
    match attempt % 3 {
        0 => base,
        1 => CHROME_136_UA,
        _ => SAFARI_UA,
    }
}

/// Header set for one GET attempt.
///
/// The first attempt looks like a typed-in navigation; later attempts add a
/// search-engine `Referer` and report a cross-site fetch. `Accept-Encoding`
/// is left to the client so it can decode what it advertises.
#[must_use]
pub fn request_headers(attempt: u32, base_user_agent: &str) -> HeaderMap {
    let mut headers = HeaderMap::new();
    if let Ok(ua) = HeaderValue::from_str(user_agent_for(attempt, base_user_agent)) {
        headers.insert(USER_AGENT, ua);
    }
    headers.insert(ACCEPT, HeaderValue::from_static(ACCEPT_HTML));
    headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.9"));
    headers.insert(
        ACCEPT_CHARSET,
        HeaderValue::from_static("utf-8, iso-8859-1;q=0.5"),
    );
    headers.insert(CONNECTION, HeaderValue::from_static("keep-alive"));
    headers.insert(UPGRADE_INSECURE_REQUESTS, HeaderValue::from_static("1"));
    headers.insert(CACHE_CONTROL, HeaderValue::from_static("max-age=0"));
    headers.insert(DNT, HeaderValue::from_static("1"));
    headers.insert(
        HeaderName::from_static("sec-fetch-dest"),
        HeaderValue::from_static("document"),
    );
    headers.insert(
        HeaderName::from_static("sec-fetch-mode"),
        HeaderValue::from_static("navigate"),
    );
    headers.insert(
        HeaderName::from_static("sec-fetch-user"),
        HeaderValue::from_static("?1"),
    );
    let fetch_site = if attempt == 0 { "none" } else { "cross-site" };
    headers.insert(
        HeaderName::from_static("sec-fetch-site"),
        HeaderValue::from_static(fetch_site),
    );
    if attempt > 0 {
        headers.insert(REFERER, HeaderValue::from_static(SEARCH_REFERER));
    }
    headers
}
