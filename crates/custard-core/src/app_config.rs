use std::net::SocketAddr;
use std::path::PathBuf;

pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/137.0.0.0 Safari/537.36";

#[derive(Clone)]
pub struct AppConfig {
    pub bind_addr: SocketAddr,
    pub log_level: String,
    pub static_dir: PathBuf,
    pub request_timeout_secs: u64,
    pub render_wait_timeout_secs: u64,
    pub max_retries: u32,
    pub user_agent: String,
    pub pacing_unit_ms: u64,
    pub site_timeout_secs: u64,
    pub scrape_deadline_secs: u64,
    pub chrome_path: Option<PathBuf>,
    pub refresh_cron: String,
    pub bubbas_cookie: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 8080)),
            log_level: "info".to_string(),
            static_dir: PathBuf::from("./static"),
            request_timeout_secs: 30,
            render_wait_timeout_secs: 10,
            max_retries: 3,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            pacing_unit_ms: 1000,
            site_timeout_secs: 120,
            scrape_deadline_secs: 300,
            chrome_path: None,
            refresh_cron: "0 5 6 * * *".to_string(),
            bubbas_cookie: None,
        }
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("bind_addr", &self.bind_addr)
            .field("log_level", &self.log_level)
            .field("static_dir", &self.static_dir)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("render_wait_timeout_secs", &self.render_wait_timeout_secs)
            .field("max_retries", &self.max_retries)
            .field("user_agent", &self.user_agent)
            .field("pacing_unit_ms", &self.pacing_unit_ms)
            .field("site_timeout_secs", &self.site_timeout_secs)
            .field("scrape_deadline_secs", &self.scrape_deadline_secs)
            .field("chrome_path", &self.chrome_path)
            .field("refresh_cron", &self.refresh_cron)
            .field(
                "bubbas_cookie",
                &self.bubbas_cookie.as_ref().map(|_| "[redacted]"),
            )
            .finish()
    }
}
