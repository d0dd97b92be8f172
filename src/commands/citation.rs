use anyhow::{Context, Result, bail};
use serde::Serialize;
use tracing::info;

use crate::citation::bibtex;
use crate::citation::order::remap_numeric_markers;
use crate::cli::{CitationArgs, CitationCommand};
use crate::commands::open_store;
use crate::model::{Citation, CitationStyle};
use crate::store::ReportUpdate;
use crate::util::{print_json, read_text};

#[derive(Serialize)]
struct ListedCitation<'a> {
    position: usize,
    marker: String,
    #[serde(flatten)]
    citation: &'a Citation,
}

pub fn run(args: CitationArgs) -> Result<()> {
    let store = open_store(&args.store)?;
    let report_id = args.report_id.as_deref();

    match args.command {
        CitationCommand::Import { input } => {
            let raw = read_text(&input)?;
            let imported = store
                .import_bibtex(report_id, &raw)
                .with_context(|| format!("failed to import {}", input.display()))?;
            info!(path = %input.display(), imported = imported.len(), "imported citations");
        }
        CitationCommand::Add {
            title,
            authors,
            year,
            journal,
            doi,
            url,
        } => {
            let citation = store.add_citation(
                report_id,
                &Citation {
                    title,
                    authors,
                    year,
                    journal,
                    doi,
                    url,
                    ..Citation::default()
                },
            )?;
            info!(citation_id = ?citation.id, "added citation");
        }
        CitationCommand::List => {
            let list = store.citation_list(report_id)?;
            let markers = list.in_text_markers(CitationStyle::Ieee);
            let listed = list
                .citations()
                .iter()
                .zip(markers)
                .enumerate()
                .map(|(index, (citation, marker))| ListedCitation {
                    position: index + 1,
                    marker,
                    citation,
                })
                .collect::<Vec<ListedCitation>>();
            print_json(&listed)?;
        }
        CitationCommand::Delete { id } => {
            store.delete_citation(&id)?;
            info!(citation_id = %id, "deleted citation");
        }
        CitationCommand::Move { from, to } => {
            if from == 0 || to == 0 {
                bail!("citation positions start at 1");
            }
            let mapping = store.move_citation(report_id, from - 1, to - 1)?;
            info!(from, to, renumbered = mapping.len(), "moved citation");

            if let Some(report_id) = report_id {
                let report = store.get_report(report_id)?;
                let content = remap_numeric_markers(&report.content, &mapping);
                if content != report.content {
                    store.update_report(
                        report_id,
                        ReportUpdate {
                            content: Some(content),
                            ..ReportUpdate::default()
                        },
                    )?;
                    info!(report_id = %report_id, "rewrote in-text markers");
                }
            }
        }
        CitationCommand::Format {
            style,
            bibtex: as_bibtex,
        } => {
            let list = store.citation_list(report_id)?;
            if as_bibtex {
                let entries = list
                    .citations()
                    .iter()
                    .map(|citation| {
                        citation
                            .bibtex_raw
                            .clone()
                            .unwrap_or_else(|| bibtex::serialize(citation))
                    })
                    .collect::<Vec<String>>();
                println!("{}", entries.join("\n\n"));
            } else {
                for line in list.bibliography(style) {
                    println!("{line}");
                }
            }
        }
    }

    Ok(())
}
