use anyhow::Context;
use clap::Parser;
use memberdir_cli::{bootstrap, open_members};
use memberdir_services::transfer::clear_collection;
use tracing::info;

#[derive(Parser)]
#[command(name = "member-clear")]
#[command(about = "Delete every document in a members collection")]
struct Cli {
    /// Collection to clear (defaults to the configured members collection)
    collection: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let settings = bootstrap(cli.collection)?;
    let dao = open_members(&settings).await?;

    info!(collection = %settings.members.collection, "Clearing collection");
    let deleted = clear_collection(&dao, settings.transfer.batch_size)
        .await
        .with_context(|| format!("clearing {} failed", settings.members.collection))?;

    info!(deleted, "Collection cleared");
    Ok(())
}
