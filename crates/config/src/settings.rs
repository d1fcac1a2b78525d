use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
    pub app: AppSettings,
    pub database: DatabaseSettings,
    pub members: MembersSettings,
    pub rate_limit: RateLimitSettings,
    pub transfer: TransferSettings,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppSettings {
    pub host: String,
    pub port: u16,
    pub environment: RuntimeEnv,
    pub cors_origins: Vec<String>,
    pub log_format: LogFormat,
}

/// Deployment flavour. Controls whether internal error details reach clients.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum RuntimeEnv {
    #[default]
    Development,
    Production,
    Test,
}

impl RuntimeEnv {
    pub fn is_production(self) -> bool {
        self == RuntimeEnv::Production
    }
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseSettings {
    pub url: String,
    pub name: String,
    pub max_pool_size: Option<u32>,
    pub min_pool_size: Option<u32>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct MembersSettings {
    pub collection: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct RateLimitSettings {
    pub enabled: bool,
    /// Seconds between quota replenishments, as `tower_governor` counts them.
    pub per_second: u64,
    pub burst_size: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct TransferSettings {
    pub batch_size: usize,
}

impl Settings {
    pub fn load() -> Result<Self, ConfigError> {
        let config = Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))
            .add_source(
                Environment::default()
                    .separator("__")
                    .prefix("MEMBERDIR")
                    .list_separator(",")
                    .with_list_parse_key("app.cors_origins")
                    .try_parsing(true),
            )
            .set_default("app.host", "0.0.0.0")?
            .set_default("app.port", 3000)?
            .set_default("app.environment", "development")?
            .set_default("app.cors_origins", Vec::<String>::new())?
            .set_default("app.log_format", "pretty")?
            .set_default("database.url", "mongodb://localhost:27017")?
            .set_default("database.name", "memberdir")?
            .set_default("members.collection", "members")?
            .set_default("rate_limit.enabled", false)?
            .set_default("rate_limit.per_second", 1)?
            .set_default("rate_limit.burst_size", 100)?
            .set_default("transfer.batch_size", 500)?
            .build()?;

        config.try_deserialize()
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self::load().expect("Failed to load default settings")
    }
}
