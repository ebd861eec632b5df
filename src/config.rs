use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use tracing_subscriber::EnvFilter;
use validator::Validate;

const DEFAULT_LOG_LEVEL: &str = "info";
const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 8080;
const DEFAULT_GAP_THRESHOLD_DAYS: i64 = 7;
const CONFIG_DIR: &str = "config";

/// Application configuration, layered from `config/default.toml`, an
/// optional `config/{environment}.toml`, and `SHOPFLOOR_*` environment
/// variables.
#[derive(Clone, Debug, Deserialize, Validate)]
pub struct AppConfig {
    /// Database connection URL (Postgres or SQLite)
    pub database_url: String,

    /// Bind host for the HTTP server
    #[serde(default = "default_host")]
    pub host: String,

    /// Bind port for the HTTP server
    #[serde(default = "default_port")]
    pub port: u16,

    /// Log level: trace | debug | info | warn | error
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Emit logs as JSON lines instead of human-readable text
    #[serde(default)]
    pub log_json: bool,

    /// Apply pending schema migrations on startup
    #[serde(default = "default_true")]
    pub auto_migrate: bool,

    /// Days of production inactivity after which an open batch is closed
    /// and a gap-restart batch is created
    #[serde(default = "default_gap_threshold_days")]
    #[validate(range(min = 1, max = 365))]
    pub gap_threshold_days: i64,
}

fn default_host() -> String {
    DEFAULT_HOST.to_string()
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}

fn default_true() -> bool {
    true
}

fn default_gap_threshold_days() -> i64 {
    DEFAULT_GAP_THRESHOLD_DAYS
}

impl AppConfig {
    pub fn log_level(&self) -> &str {
        &self.log_level
    }
}

/// Loads and validates the application configuration.
pub fn load_config() -> Result<AppConfig, ConfigError> {
    let environment = std::env::var("SHOPFLOOR_ENV").unwrap_or_else(|_| "development".to_string());

    let config = Config::builder()
        .add_source(File::with_name(&format!("{}/default", CONFIG_DIR)).required(false))
        .add_source(File::with_name(&format!("{}/{}", CONFIG_DIR, environment)).required(false))
        .add_source(Environment::with_prefix("SHOPFLOOR").separator("__"))
        .build()?;

    let app_config: AppConfig = config.try_deserialize()?;
    app_config
        .validate()
        .map_err(|e| ConfigError::Message(format!("invalid configuration: {}", e)))?;
    Ok(app_config)
}

/// Installs the global tracing subscriber.
pub fn init_tracing(log_level: &str, json: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("shopfloor_api={0},tower_http={0}", log_level)));

    if json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}
