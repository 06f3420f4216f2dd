use std::collections::HashMap;
use std::path::Path;

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub jira: JiraConfig,
    pub warehouse: WarehouseConfig,
    pub sync: SyncConfig,
    pub api: ApiConfig,
    #[serde(default)]
    pub report: Option<ReportConfig>,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from_path(".")
    }

    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        Config::builder()
            .add_source(
                File::with_name(
                    path.as_ref()
                        .join("config/default")
                        .to_string_lossy()
                        .as_ref(),
                )
                .required(false),
            )
            .add_source(
                File::with_name(
                    path.as_ref()
                        .join("config/local")
                        .to_string_lossy()
                        .as_ref(),
                )
                .required(false),
            )
            .add_source(Environment::default().separator("__"))
            .build()?
            .try_deserialize()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct JiraConfig {
    pub base_url: String,
    pub email: String,
    pub api_token: String,
    #[serde(default = "JiraConfig::default_user_agent")]
    pub user_agent: String,
}

impl JiraConfig {
    fn default_user_agent() -> String {
        "issue-warehouse-sync/0.1".to_string()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct WarehouseConfig {
    pub url: String,
    #[serde(default)]
    pub test_admin_url: Option<String>,
    #[serde(default = "WarehouseConfig::default_target_table")]
    pub target_table: String,
    #[serde(default = "WarehouseConfig::default_staging_table")]
    pub staging_table: String,
}

impl WarehouseConfig {
    fn default_target_table() -> String {
        "issues".to_string()
    }

    fn default_staging_table() -> String {
        "issues_staging".to_string()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SyncConfig {
    #[serde(default = "SyncConfig::default_interval_secs")]
    pub interval_secs: u64,
    #[serde(default = "SyncConfig::default_page_size")]
    pub page_size: u32,
    #[serde(default = "SyncConfig::default_lookback_secs")]
    pub lookback_secs: u64,
    #[serde(default)]
    pub run_once: bool,
    /// Explicit lower bound override for the incremental window. When unset,
    /// each run starts at now minus the lookback window.
    #[serde(default)]
    pub since: Option<String>,
}

impl SyncConfig {
    const fn default_interval_secs() -> u64 {
        3600
    }

    const fn default_page_size() -> u32 {
        200
    }

    const fn default_lookback_secs() -> u64 {
        3600
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    pub bind: String,
    pub trigger_token: String,
    #[serde(default = "ApiConfig::default_metrics_path")]
    pub metrics_path: String,
}

impl ApiConfig {
    fn default_metrics_path() -> String {
        "/metrics".to_string()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReportConfig {
    pub webhook_url: String,
    #[serde(default)]
    pub team_mentions: HashMap<String, String>,
    #[serde(default = "ReportConfig::default_lookback_days")]
    pub lookback_days: i64,
}

impl ReportConfig {
    const fn default_lookback_days() -> i64 {
        7
    }
}
