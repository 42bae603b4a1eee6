use std::collections::HashMap;
use std::env::VarError;

use super::*;

fn lookup_from_map<'a>(
    map: &'a HashMap<&'a str, &'a str>,
) -> impl Fn(&str) -> Result<String, VarError> + 'a {
    move |key| {
        map.get(key)
            .map(|v| (*v).to_string())
            .ok_or(VarError::NotPresent)
    }
}

#[test]
fn empty_environment_yields_defaults() {
    let map: HashMap<&str, &str> = HashMap::new();
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    assert_eq!(cfg.bind_addr.to_string(), "0.0.0.0:8080");
    assert_eq!(cfg.log_level, "info");
    assert_eq!(cfg.static_dir, std::path::PathBuf::from("./static"));
    assert_eq!(cfg.request_timeout_secs, 30);
    assert_eq!(cfg.render_wait_timeout_secs, 10);
    assert_eq!(cfg.max_retries, 3);
    assert_eq!(cfg.user_agent, DEFAULT_USER_AGENT);
    assert_eq!(cfg.pacing_unit_ms, 1000);
    assert_eq!(cfg.site_timeout_secs, 120);
    assert_eq!(cfg.scrape_deadline_secs, 300);
    assert!(cfg.chrome_path.is_none());
    assert_eq!(cfg.refresh_cron, "0 5 6 * * *");
    assert!(cfg.bubbas_cookie.is_none());
}

#[test]
fn defaults_match_default_impl() {
    let map: HashMap<&str, &str> = HashMap::new();
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    let dflt = AppConfig::default();
    assert_eq!(cfg.bind_addr, dflt.bind_addr);
    assert_eq!(cfg.user_agent, dflt.user_agent);
    assert_eq!(cfg.refresh_cron, dflt.refresh_cron);
    assert_eq!(cfg.site_timeout_secs, dflt.site_timeout_secs);
}

#[test]
fn invalid_bind_addr_is_rejected() {
    let mut map = HashMap::new();
    map.insert("CUSTARD_BIND_ADDR", "not-a-socket-addr");
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "CUSTARD_BIND_ADDR"),
        "expected InvalidEnvVar(CUSTARD_BIND_ADDR), got: {result:?}"
    );
}

#[test]
fn request_timeout_override() {
    let mut map = HashMap::new();
    map.insert("CUSTARD_REQUEST_TIMEOUT_SECS", "60");
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    assert_eq!(cfg.request_timeout_secs, 60);
}

#[test]
fn request_timeout_invalid() {
    let mut map = HashMap::new();
    map.insert("CUSTARD_REQUEST_TIMEOUT_SECS", "soon");
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "CUSTARD_REQUEST_TIMEOUT_SECS"),
        "got: {result:?}"
    );
}

#[test]
fn max_retries_zero_is_rejected() {
    let mut map = HashMap::new();
    map.insert("CUSTARD_MAX_RETRIES", "0");
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "CUSTARD_MAX_RETRIES"),
        "got: {result:?}"
    );
}

#[test]
fn negative_pacing_unit_is_rejected() {
    let mut map = HashMap::new();
    map.insert("CUSTARD_PACING_UNIT_MS", "-5");
    let result = build_app_config(lookup_from_map(&map));
    assert!(matches!(result, Err(ConfigError::InvalidEnvVar { .. })));
}

#[test]
fn blank_optional_values_are_treated_as_unset() {
    let mut map = HashMap::new();
    map.insert("CUSTARD_CHROME_PATH", "  ");
    map.insert("CUSTARD_BUBBAS_COOKIE", "");
    map.insert("CUSTARD_USER_AGENT", "");
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    assert!(cfg.chrome_path.is_none());
    assert!(cfg.bubbas_cookie.is_none());
    assert_eq!(cfg.user_agent, DEFAULT_USER_AGENT);
}

#[test]
fn chrome_path_and_cookie_are_read() {
    let mut map = HashMap::new();
    map.insert("CUSTARD_CHROME_PATH", "/usr/bin/chromium");
    map.insert("CUSTARD_BUBBAS_COOKIE", "session=abc123");
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    assert_eq!(
        cfg.chrome_path,
        Some(std::path::PathBuf::from("/usr/bin/chromium"))
    );
    assert_eq!(cfg.bubbas_cookie.as_deref(), Some("session=abc123"));
}

#[test]
fn debug_output_redacts_cookie() {
    let mut map = HashMap::new();
    map.insert("CUSTARD_BUBBAS_COOKIE", "session=abc123");
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    let debug = format!("{cfg:?}");
    assert!(!debug.contains("abc123"));
    assert!(debug.contains("[redacted]"));
}
