//! Whole-collection jobs behind the `member-import`, `member-export` and
//! `member-clear` tools. None of them retry: the first failed batch ends
//! the run and whatever was already written or deleted stays that way.

pub mod clear;
pub mod export;
pub mod import;

use thiserror::Error;

use crate::dao::DaoError;

/// Documents per write or delete round trip.
pub const DEFAULT_BATCH_SIZE: usize = 500;

#[derive(Debug, Error)]
pub enum TransferError {
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Dao(#[from] DaoError),
}

pub type TransferResult<T> = Result<T, TransferError>;

pub use clear::clear_collection;
pub use export::{ExportFiles, export_collection};
pub use import::{ImportOptions, ImportSummary, import_csv_file, import_members};
