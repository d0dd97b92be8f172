use anyhow::{Context, Result, bail};
use chrono::Utc;
use tracing::{info, warn};

use crate::cli::ExportArgs;
use crate::commands::{load_academic_config, open_store};
use crate::export::{self, ExportArtifact, ExportFormat, ExportMode, ExportOptions};
use crate::markdown;
use crate::model::{AcademicReportConfig, Block};
use crate::store::SqliteStore;
use crate::template::Template;
use crate::util::{ensure_directory, read_text, write_bytes};

pub fn run(args: ExportArgs) -> Result<()> {
    let mut store: Option<SqliteStore> = None;

    let (content, stored_title, stored_template) = match (&args.report_id, &args.input) {
        (Some(report_id), _) => {
            let report = store_for(&mut store, &args)?
                .get_report(report_id)
                .context("failed to load report")?;
            (report.content, Some(report.title), Some(report.template_id))
        }
        (None, Some(input)) => {
            let stem = input
                .file_stem()
                .and_then(|value| value.to_str())
                .map(str::to_string);
            (read_text(input)?, stem, None)
        }
        (None, None) => bail!("an input file or --report-id is required"),
    };

    let title = args
        .title
        .clone()
        .or(stored_title)
        .filter(|title| !title.trim().is_empty())
        .unwrap_or_else(|| "Report".to_string());

    let template_id = args
        .template
        .clone()
        .or(stored_template)
        .unwrap_or_else(|| "standard".to_string());
    let template = match Template::builtin(&template_id) {
        Some(template) => template,
        None => match store_for(&mut store, &args)?.get_template(&template_id) {
            Ok(template) => template,
            Err(err) => {
                warn!(template = %template_id, error = %err, "template unavailable, using standard");
                Template::resolve("standard")
            }
        },
    };

    let academic = match (&args.academic_config, &args.profile) {
        (Some(path), _) => load_academic_config(path)?,
        (None, Some(name)) => store_for(&mut store, &args)?
            .get_profile(name)
            .with_context(|| format!("failed to load academic profile {name}"))?,
        (None, None) => {
            if args.mode == ExportMode::Academic {
                warn!("no academic config given, cover page fields will be empty");
            }
            AcademicReportConfig::default()
        }
    };

    let options = ExportOptions {
        title,
        mode: args.mode,
        template,
        academic,
        generated_on: Utc::now().date_naive(),
    };

    let blocks = markdown::parse(&content);
    let artifacts = if args.formats.is_empty() {
        export::export_all(&blocks, &options)?
    } else {
        args.formats
            .iter()
            .map(|format| export_one(&blocks, &options, *format))
            .collect::<Result<Vec<ExportArtifact>>>()?
    };

    ensure_directory(&args.out_dir)?;
    for artifact in &artifacts {
        let path = args.out_dir.join(&artifact.filename);
        write_bytes(&path, &artifact.bytes)?;
        info!(
            format = artifact.format.as_str(),
            path = %path.display(),
            bytes = artifact.bytes.len(),
            "wrote export"
        );
    }

    info!(
        title = %options.title,
        mode = ?options.mode,
        template = %options.template.id,
        blocks = blocks.len(),
        artifacts = artifacts.len(),
        "export completed"
    );
    Ok(())
}

fn export_one(
    blocks: &[Block],
    options: &ExportOptions,
    format: ExportFormat,
) -> Result<ExportArtifact> {
    export::export(blocks, options, format)
        .with_context(|| format!("failed to export {}", format.as_str()))
}

fn store_for<'a>(store: &'a mut Option<SqliteStore>, args: &ExportArgs) -> Result<&'a SqliteStore> {
    if store.is_none() {
        *store = Some(open_store(&args.store)?);
    }
    store
        .as_ref()
        .context("store should be open after initialization")
}
