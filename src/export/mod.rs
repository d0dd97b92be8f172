//! Export pipeline: one walk over the block sequence drives a
//! [`BlockRenderer`]. Each renderer owns its layout state; section numbering
//! is recomputed per call, so concurrent or repeated exports never share
//! counters.

pub mod docx;
pub mod latex;
pub mod numbering;
pub mod pdf;
pub mod toc;

#[cfg(test)]
mod tests;

use chrono::NaiveDate;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{ReportError, Result};
use crate::markdown::{InlineRun, split_inline_runs};
use crate::model::{AcademicReportConfig, Block, CitationStyle};
use crate::template::Template;
use crate::util::file_stem_for_title;

use self::docx::DocxRenderer;
use self::latex::LatexRenderer;
use self::numbering::{HeadingFormat, NumberedHeading, SectionCounter};
use self::pdf::PdfRenderer;
use self::toc::TocEntry;

pub const REFERENCES_TITLE: &str = "References";

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ExportMode {
    #[default]
    Standard,
    Academic,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Docx,
    Pdf,
    Latex,
}

impl ExportFormat {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Docx => "docx",
            Self::Pdf => "pdf",
            Self::Latex => "latex",
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            Self::Docx => "docx",
            Self::Pdf => "pdf",
            Self::Latex => "tex",
        }
    }

    /// Formats offered for a mode; LaTeX is academic-only.
    pub fn available(mode: ExportMode) -> &'static [ExportFormat] {
        match mode {
            ExportMode::Standard => &[ExportFormat::Docx, ExportFormat::Pdf],
            ExportMode::Academic => &[ExportFormat::Docx, ExportFormat::Pdf, ExportFormat::Latex],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListMarker {
    Bullet,
    Ordinal(usize),
}

impl ListMarker {
    pub fn label(self) -> String {
        match self {
            ListMarker::Bullet => "\u{2022}".to_string(),
            ListMarker::Ordinal(ordinal) => format!("{ordinal}."),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ExportOptions {
    pub title: String,
    pub mode: ExportMode,
    pub template: Template,
    pub academic: AcademicReportConfig,
    pub generated_on: NaiveDate,
}

impl ExportOptions {
    pub fn is_academic(&self) -> bool {
        self.mode == ExportMode::Academic
    }

    pub fn heading_format(&self) -> HeadingFormat {
        match self.mode {
            ExportMode::Academic => HeadingFormat {
                numbered: true,
                uppercase_top_level: true,
            },
            ExportMode::Standard => HeadingFormat {
                numbered: self.template.numbered_sections,
                uppercase_top_level: self.template.uppercase_top_headings,
            },
        }
    }

    pub fn include_cover_page(&self) -> bool {
        self.is_academic() && self.academic.structure.include_cover_page
    }

    pub fn include_toc(&self) -> bool {
        self.is_academic() && self.academic.structure.include_toc
    }

    /// Style named in the references placeholder, when that section is on.
    pub fn references_style(&self) -> Option<CitationStyle> {
        let structure = &self.academic.structure;
        if self.is_academic()
            && structure.include_references
            && structure.citation_style != CitationStyle::None
        {
            return Some(structure.citation_style);
        }
        None
    }

    pub fn generated_line(&self) -> String {
        format!("Generated on {}", self.generated_on.format("%B %-d, %Y"))
    }
}

/// Cover page fields; absent values are `None` and not rendered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoverPage {
    pub institution: Option<String>,
    pub department: Option<String>,
    pub title: String,
    pub report_type: String,
    pub course: Option<String>,
    pub author: Option<String>,
    pub student_id: Option<String>,
    pub supervisor: Option<String>,
    pub date: Option<String>,
}

impl CoverPage {
    pub fn from_options(options: &ExportOptions) -> Self {
        let details = &options.academic.academic_details;
        Self {
            institution: present(Some(&details.institution)),
            department: present(details.department.as_ref()),
            title: options.title.trim().to_string(),
            report_type: options.academic.report_type.display_name().to_string(),
            course: present(details.course.as_ref()),
            author: present(Some(&details.author_name)),
            student_id: present(details.student_id.as_ref()),
            supervisor: present(details.supervisor_name.as_ref()),
            date: details.formatted_submission_date(),
        }
    }
}

fn present(value: Option<&String>) -> Option<String> {
    value
        .map(|value| value.trim())
        .filter(|value| !value.is_empty())
        .map(ToOwned::to_owned)
}

pub fn references_note(style: CitationStyle) -> String {
    format!(
        "References are formatted in {} style. Insert formatted citations from the citation manager here.",
        style.display_name()
    )
}

/// Shared seam between the block walk and a concrete output format.
pub trait BlockRenderer {
    type Output;

    fn title_block(&mut self, title: &str, subtitle: &str);
    fn cover_page(&mut self, cover: &CoverPage);
    fn table_of_contents(&mut self, entries: &[TocEntry]);
    fn heading(&mut self, heading: &NumberedHeading);
    fn paragraph(&mut self, runs: &[InlineRun]);
    fn list_item(&mut self, runs: &[InlineRun], marker: ListMarker);
    fn table(&mut self, rows: &[Vec<String>]);
    fn code(&mut self, text: &str);
    fn blank(&mut self);
    fn references(&mut self, heading: &NumberedHeading, note: &str);
    fn finish(self) -> Result<Self::Output>;
}

/// Walk `blocks` once, threading section and list counters through the pass.
pub fn assemble<R: BlockRenderer>(
    mut renderer: R,
    blocks: &[Block],
    options: &ExportOptions,
) -> Result<R::Output> {
    let format = options.heading_format();
    let references_style = options.references_style();

    if options.include_cover_page() {
        renderer.cover_page(&CoverPage::from_options(options));
    } else {
        renderer.title_block(options.title.trim(), &options.generated_line());
    }

    if options.include_toc() {
        let entries = toc::build_entries(
            blocks,
            format,
            options.include_cover_page(),
            references_style.map(|_| REFERENCES_TITLE),
        );
        renderer.table_of_contents(&entries);
    }

    let mut counter = SectionCounter::default();
    let mut ordinal = 0usize;

    for block in blocks {
        match block {
            Block::Heading { level, text } => {
                let (next, number) = counter.next(*level);
                counter = next;
                ordinal = 0;
                renderer.heading(&format.apply(*level, number, text));
            }
            Block::Paragraph { text } => {
                ordinal = 0;
                renderer.paragraph(&split_inline_runs(text));
            }
            Block::ListItem { text } => {
                ordinal = 0;
                renderer.list_item(&split_inline_runs(text), ListMarker::Bullet);
            }
            Block::OrderedListItem { text } => {
                ordinal += 1;
                renderer.list_item(&split_inline_runs(text), ListMarker::Ordinal(ordinal));
            }
            Block::Table { rows } => {
                ordinal = 0;
                renderer.table(rows);
            }
            Block::Code { text } => {
                ordinal = 0;
                renderer.code(text);
            }
            Block::Blank => renderer.blank(),
        }
    }

    if let Some(style) = references_style {
        let heading = format.apply(1, Some(counter.next_section()), REFERENCES_TITLE);
        renderer.references(&heading, &references_note(style));
    }

    renderer.finish()
}

#[derive(Debug, Clone)]
pub struct ExportArtifact {
    pub format: ExportFormat,
    pub filename: String,
    pub bytes: Vec<u8>,
}

pub fn artifact_filename(title: &str, format: ExportFormat) -> String {
    let stem = file_stem_for_title(title);
    let stem = if stem.is_empty() { "report".to_string() } else { stem };
    format!("{stem}.{}", format.extension())
}

pub fn export(blocks: &[Block], options: &ExportOptions, format: ExportFormat) -> Result<ExportArtifact> {
    let bytes = match format {
        ExportFormat::Docx => assemble(DocxRenderer::new(options), blocks, options)?.to_bytes()?,
        ExportFormat::Pdf => assemble(PdfRenderer::new(options), blocks, options)?.to_bytes()?,
        ExportFormat::Latex => {
            if !options.is_academic() {
                return Err(ReportError::Export {
                    format: format.as_str(),
                    cause: "LaTeX export is only available in academic mode".to_string(),
                });
            }
            assemble(LatexRenderer::new(options), blocks, options)?.into_bytes()
        }
    };

    let artifact = ExportArtifact {
        format,
        filename: artifact_filename(&options.title, format),
        bytes,
    };
    debug!(
        format = format.as_str(),
        filename = %artifact.filename,
        bytes = artifact.bytes.len(),
        "assembled export artifact"
    );
    Ok(artifact)
}

/// Every format available for the mode, assembled one after another.
pub fn export_all(blocks: &[Block], options: &ExportOptions) -> Result<Vec<ExportArtifact>> {
    ExportFormat::available(options.mode)
        .iter()
        .map(|format| export(blocks, options, *format))
        .collect()
}
