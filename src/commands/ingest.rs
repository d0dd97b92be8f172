use std::fs;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use tracing::info;

use crate::cli::{ExtractorArgs, IngestArgs};
use crate::service::ingest::{self, HttpExtractor, RemoteExtractor, SourceDocument};
use crate::util::{print_json, write_json_pretty};

pub fn run(args: IngestArgs) -> Result<()> {
    let extractor = extractor_client(&args.extractor)?;
    let extractor = extractor.as_ref().map(|client| client as &dyn RemoteExtractor);

    let documents = args
        .files
        .iter()
        .map(|path| ingest_path(path, args.mime.as_deref(), extractor))
        .collect::<Result<Vec<SourceDocument>>>()?;

    let total_chars = documents.iter().map(|document| document.char_count).sum::<usize>();
    info!(documents = documents.len(), chars = total_chars, "ingest completed");

    match &args.output {
        Some(path) => {
            write_json_pretty(path, &documents)?;
            info!(path = %path.display(), "wrote ingested documents");
            Ok(())
        }
        None => print_json(&documents),
    }
}

pub(crate) fn ingest_path(
    path: &Path,
    declared: Option<&str>,
    extractor: Option<&dyn RemoteExtractor>,
) -> Result<SourceDocument> {
    let bytes = fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
    let file_name = path
        .file_name()
        .and_then(|value| value.to_str())
        .unwrap_or("document");
    ingest::ingest(file_name, &bytes, declared, extractor)
        .with_context(|| format!("failed to ingest {}", path.display()))
}

pub(crate) fn extractor_client(args: &ExtractorArgs) -> Result<Option<HttpExtractor>> {
    match args.extract_url.as_deref() {
        Some(url) if !url.trim().is_empty() => Ok(Some(HttpExtractor::new(
            url,
            args.extract_key.clone(),
            Duration::from_secs(args.extract_timeout_secs),
        )?)),
        _ => Ok(None),
    }
}
