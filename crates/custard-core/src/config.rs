use crate::app_config::{AppConfig, DEFAULT_USER_AGENT};
use crate::ConfigError;

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if a value is present but invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if a value is present but invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Every key has a default, so an empty environment yields a usable config.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::net::SocketAddr;
    use std::path::PathBuf;

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    // Unset and blank are the same thing for optional values.
    let optional = |var: &str| -> Option<String> {
        lookup(var)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    };

    let parse_addr = |var: &str, default: &str| -> Result<SocketAddr, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<SocketAddr>()
            .map_err(|e| ConfigError::InvalidEnvVar {
                var: var.to_string(),
                reason: e.to_string(),
            })
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u32>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u64>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let bind_addr = parse_addr("CUSTARD_BIND_ADDR", "0.0.0.0:8080")?;
    let log_level = or_default("CUSTARD_LOG_LEVEL", "info");
    let static_dir = PathBuf::from(or_default("CUSTARD_STATIC_DIR", "./static"));

    let request_timeout_secs = parse_u64("CUSTARD_REQUEST_TIMEOUT_SECS", "30")?;
    let render_wait_timeout_secs = parse_u64("CUSTARD_RENDER_WAIT_TIMEOUT_SECS", "10")?;
    let max_retries = parse_u32("CUSTARD_MAX_RETRIES", "3")?;
    if max_retries == 0 {
        return Err(ConfigError::InvalidEnvVar {
            var: "CUSTARD_MAX_RETRIES".to_string(),
            reason: "must be at least 1".to_string(),
        });
    }
    let user_agent = optional("CUSTARD_USER_AGENT").unwrap_or_else(|| DEFAULT_USER_AGENT.to_string());
    let pacing_unit_ms = parse_u64("CUSTARD_PACING_UNIT_MS", "1000")?;
    let site_timeout_secs = parse_u64("CUSTARD_SITE_TIMEOUT_SECS", "120")?;
    let scrape_deadline_secs = parse_u64("CUSTARD_SCRAPE_DEADLINE_SECS", "300")?;
    let chrome_path = optional("CUSTARD_CHROME_PATH").map(PathBuf::from);
    let refresh_cron = or_default("CUSTARD_REFRESH_CRON", "0 5 6 * * *");
    let bubbas_cookie = optional("CUSTARD_BUBBAS_COOKIE");

    Ok(AppConfig {
        bind_addr,
        log_level,
        static_dir,
        request_timeout_secs,
        render_wait_timeout_secs,
        max_retries,
        user_agent,
        pacing_unit_ms,
        site_timeout_secs,
        scrape_deadline_secs,
        chrome_path,
        refresh_cron,
        bubbas_cookie,
    })
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
