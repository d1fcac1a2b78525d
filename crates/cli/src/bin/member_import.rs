use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use memberdir_cli::{bootstrap, open_database};
use memberdir_db::indexes::ensure_indexes;
use memberdir_services::{
    MemberDao,
    transfer::{ImportOptions, import_csv_file},
};
use tracing::info;

#[derive(Parser)]
#[command(name = "member-import")]
#[command(about = "Load members from a CSV export into MongoDB")]
struct Cli {
    /// CSV file with a header row
    #[arg(default_value = "members.csv")]
    csv_path: PathBuf,

    /// Target collection (defaults to the configured members collection)
    collection: Option<String>,

    /// Import every row, not only members with an avatar and a bio or headline
    #[arg(long)]
    all: bool,

    /// Documents per insert batch
    #[arg(long)]
    batch_size: Option<usize>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let settings = bootstrap(cli.collection)?;
    let db = open_database(&settings).await?;
    let dao = MemberDao::new(&db, &settings.members.collection);

    let options = ImportOptions {
        require_profile: !cli.all,
        batch_size: cli.batch_size.unwrap_or(settings.transfer.batch_size),
    };
    info!(path = %cli.csv_path.display(), ?options, "Importing members");

    let summary = import_csv_file(&dao, &cli.csv_path, options)
        .await
        .with_context(|| format!("import from {} failed", cli.csv_path.display()))?;

    ensure_indexes(&db, &settings.members.collection).await?;

    info!(
        parsed = summary.parsed,
        kept = summary.kept,
        inserted = summary.inserted,
        collection = %settings.members.collection,
        "Import complete"
    );
    Ok(())
}
