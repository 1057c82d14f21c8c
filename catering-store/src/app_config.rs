use serde::Deserialize;
use std::env;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub notifications: NotificationConfig,
    pub sweeper: SweeperConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub port: u16,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_max_connections() -> u32 {
    5
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum NotificationProvider {
    Brevo,
    Console,
}

#[derive(Debug, Deserialize, Clone)]
pub struct NotificationConfig {
    pub provider: NotificationProvider,
    pub brevo: Option<BrevoConfig>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct BrevoConfig {
    pub api_key: String,
    pub sender_email: String,
    pub sender_name: String,
    #[serde(default = "default_brevo_url")]
    pub api_url: String,
}

pub fn default_brevo_url() -> String {
    "https://api.brevo.com/v3".to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct SweeperConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    pub interval_seconds: u64,
}

fn default_true() -> bool {
    true
}

impl Config {
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let s = config::Config::builder()
            .add_source(config::File::with_name("config/default"))
            // Optional per-environment overrides
            .add_source(config::File::with_name(&format!("config/{}", run_mode)).required(false))
            // Not checked in
            .add_source(config::File::with_name("config/local").required(false))
            // Eg. `CATERING__DATABASE__URL=postgres://...` sets `database.url`
            .add_source(config::Environment::with_prefix("CATERING").separator("__"))
            .build()?;

        s.try_deserialize()
    }
}
