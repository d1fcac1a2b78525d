use std::path::PathBuf;

use anyhow::Context;
use chrono::Utc;
use clap::Parser;
use memberdir_cli::{bootstrap, open_members};
use memberdir_services::transfer::export_collection;
use tracing::info;

#[derive(Parser)]
#[command(name = "member-export")]
#[command(about = "Dump a members collection to JSON and CSV files")]
struct Cli {
    /// Collection to export
    collection: String,

    /// Directory the export files are written to
    #[arg(long, default_value = ".")]
    out_dir: PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let settings = bootstrap(Some(cli.collection))?;
    let dao = open_members(&settings).await?;

    let exported = export_collection(&dao, &settings.members.collection, &cli.out_dir, Utc::now())
        .await
        .with_context(|| format!("export of {} failed", settings.members.collection))?;

    match exported {
        Some(files) => info!(
            count = files.count,
            json = %files.json.display(),
            csv = %files.csv.display(),
            "Export complete"
        ),
        None => info!("Nothing to export"),
    }
    Ok(())
}
