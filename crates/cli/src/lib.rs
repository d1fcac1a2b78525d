//! Shared plumbing for the member import, export and clear tools.

use anyhow::Context;
use memberdir_config::{LogFormat, Settings};
use memberdir_db::connect;
use memberdir_services::MemberDao;
use mongodb::Database;
use tracing::info;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

pub fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "memberdir_cli=info,memberdir_services=info,memberdir_db=info".into());
    let (pretty, json) = match format {
        LogFormat::Pretty => (Some(tracing_subscriber::fmt::layer()), None),
        LogFormat::Json => (None, Some(tracing_subscriber::fmt::layer().json())),
    };
    tracing_subscriber::registry()
        .with(filter)
        .with(pretty)
        .with(json)
        .init();
}

/// Points the settings at `collection` when one was given on the command line.
pub fn with_collection(mut settings: Settings, collection: Option<String>) -> Settings {
    if let Some(collection) = collection.filter(|c| !c.trim().is_empty()) {
        settings.members.collection = collection;
    }
    settings
}

/// Loads `.env` and settings, then installs the log subscriber.
pub fn bootstrap(collection: Option<String>) -> anyhow::Result<Settings> {
    dotenvy::dotenv().ok();
    let settings = Settings::load().context("failed to load settings")?;
    init_tracing(settings.app.log_format);
    Ok(with_collection(settings, collection))
}

pub async fn open_database(settings: &Settings) -> anyhow::Result<Database> {
    let db = connect(settings)
        .await
        .with_context(|| format!("failed to connect to {}", settings.database.name))?;
    info!(
        database = %settings.database.name,
        collection = %settings.members.collection,
        "Connected"
    );
    Ok(db)
}

pub async fn open_members(settings: &Settings) -> anyhow::Result<MemberDao> {
    let db = open_database(settings).await?;
    Ok(MemberDao::new(&db, &settings.members.collection))
}
