pub mod bibtex;
pub mod citation;
pub mod export;
pub mod extract;
pub mod generate;
pub mod ingest;
pub mod library;
pub mod parse;
pub mod report;
pub mod stats;

use std::path::Path;

use anyhow::{Context, Result};

use crate::cli::StoreArgs;
use crate::model::AcademicReportConfig;
use crate::store::SqliteStore;
use crate::util::{ensure_directory, read_text};

pub(crate) fn open_store(args: &StoreArgs) -> Result<SqliteStore> {
    if let Some(parent) = args.db_path.parent()
        && !parent.as_os_str().is_empty()
    {
        ensure_directory(parent)?;
    }
    SqliteStore::open(&args.db_path, &args.user)
        .with_context(|| format!("failed to open {}", args.db_path.display()))
}

pub(crate) fn load_academic_config(path: &Path) -> Result<AcademicReportConfig> {
    let raw = read_text(path)?;
    serde_json::from_str(&raw).with_context(|| format!("failed to parse {}", path.display()))
}
