pub mod app_config;
pub mod clock;
pub mod config;
pub mod flavor;

pub use app_config::AppConfig;
pub use clock::{shop_today, SHOP_TZ};
pub use config::{load_app_config, load_app_config_from_env};
pub use flavor::FlavorRecord;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}
