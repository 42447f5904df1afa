use config::Config;
use error_stack::ResultExt;
use thiserror::Error;

use super::account_config::ExchangeAccountConfig;
use super::notification_config::NotificationConfig;
use super::wallet_api_config::WalletApiConfig;

#[derive(Error, Debug)]
pub enum ConfigLoadError {
    #[error("failed to read config file")]
    Read,
    #[error("failed to deserialize config")]
    Parse,
}

#[derive(serde::Deserialize, Debug, Clone)]
pub struct AppConfig {
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub scheduler: SchedulerConfig,
    #[serde(default)]
    pub notifications: NotificationConfig,
    #[serde(default)]
    pub wallet_api: WalletApiConfig,
    #[serde(default)]
    pub accounts: Vec<ExchangeAccountConfig>,
}

#[derive(serde::Deserialize, Debug, Clone)]
pub struct DatabaseConfig {
    #[serde(default = "DatabaseConfig::default_path")]
    pub path: String,
}

impl DatabaseConfig {
    fn default_path() -> String {
        "balance_history.db".to_string()
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: Self::default_path(),
        }
    }
}

#[derive(serde::Deserialize, Debug, Clone)]
pub struct SchedulerConfig {
    #[serde(default = "SchedulerConfig::default_interval_hours")]
    pub interval_hours: u64,
}

impl SchedulerConfig {
    fn default_interval_hours() -> u64 {
        6
    }
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            interval_hours: Self::default_interval_hours(),
        }
    }
}

impl AppConfig {
    /// Reads `Config.toml` from the working directory. Called at the top of
    /// every check pass so edits take effect without a restart.
    pub fn load() -> error_stack::Result<Self, ConfigLoadError> {
        Config::builder()
            .add_source(config::File::with_name("Config"))
            .build()
            .change_context(ConfigLoadError::Read)?
            .try_deserialize()
            .change_context(ConfigLoadError::Parse)
    }
}
