use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::info;

use crate::cli::{ReportArgs, ReportCommand};
use crate::commands::open_store;
use crate::extract::extract_simple;
use crate::model::{AssetKind, NewReport, Report};
use crate::stats::{ContentStats, calculate_content_stats};
use crate::store::ReportUpdate;
use crate::util::{print_json, read_text};

#[derive(Serialize)]
struct ReportSummary<'a> {
    id: &'a str,
    title: &'a str,
    template_id: &'a str,
    ai_generated: bool,
    updated_at: &'a str,
}

#[derive(Serialize)]
struct ReportDetail<'a> {
    #[serde(flatten)]
    report: &'a Report,
    stats: ContentStats,
}

pub fn run(args: ReportArgs) -> Result<()> {
    let store = open_store(&args.store)?;

    match args.command {
        ReportCommand::Create {
            title,
            input,
            template,
            extract,
        } => {
            let content = input.as_deref().map(read_text).transpose()?.unwrap_or_default();
            let extracted_data = if extract {
                extract_simple(&content)
            } else {
                Vec::new()
            };
            let report = store
                .create_report(NewReport {
                    title,
                    content,
                    template_id: template,
                    extracted_data,
                    ai_generated: false,
                })
                .context("failed to create report")?;
            info!(report_id = %report.id, title = %report.title, "created report");
            println!("{}", report.id);
        }
        ReportCommand::List => {
            let reports = store.list_reports()?;
            let summaries = reports
                .iter()
                .map(|report| ReportSummary {
                    id: &report.id,
                    title: &report.title,
                    template_id: &report.template_id,
                    ai_generated: report.ai_generated,
                    updated_at: &report.updated_at,
                })
                .collect::<Vec<ReportSummary>>();
            print_json(&summaries)?;
        }
        ReportCommand::Show { id } => {
            let report = store.get_report(&id)?;
            print_json(&ReportDetail {
                stats: calculate_content_stats(&report.content),
                report: &report,
            })?;
        }
        ReportCommand::Update {
            id,
            title,
            input,
            template,
        } => {
            let content = input.as_deref().map(read_text).transpose()?;
            let extracted_data = content.as_deref().map(extract_simple);
            let report = store
                .update_report(
                    &id,
                    ReportUpdate {
                        title,
                        content,
                        template_id: template,
                        extracted_data,
                    },
                )
                .context("failed to update report")?;
            info!(report_id = %report.id, sha256 = %report.content_sha256, "updated report");
        }
        ReportCommand::Delete { id } => {
            store.delete_report(&id)?;
            info!(report_id = %id, "deleted report");
        }
        ReportCommand::AddAsset {
            id,
            kind,
            caption,
            payload,
        } => {
            let payload = match kind {
                AssetKind::Table => read_text(Path::new(&payload))?,
                AssetKind::Figure => payload,
            };
            let asset = store.add_asset(&id, kind, &caption, &payload)?;
            info!(
                report_id = %id,
                kind = asset.kind.as_str(),
                number = asset.number,
                "added report asset"
            );
        }
        ReportCommand::Assets { id } => {
            print_json(&store.list_assets(&id)?)?;
        }
    }

    Ok(())
}
