//! Flow-document renderer. Blocks become a small office-document object
//! graph ([`FlowDocument`]); reflow and pagination are left to the word
//! processor. `writer` encodes the graph as a `.docx` package.

mod writer;

use serde::Serialize;

use crate::error::Result;
use crate::markdown::{InlineRun, strip_inline_markers};
use crate::template::Template;

use super::numbering::NumberedHeading;
use super::toc::TocEntry;
use super::{BlockRenderer, CoverPage, ExportOptions, ListMarker};

/// Width, in characters, the TOC dot leaders pad each entry to.
const TOC_LEADER_WIDTH: usize = 72;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Alignment {
    Left,
    Center,
    Justified,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FlowRun {
    pub text: String,
    pub bold: bool,
    pub italic: bool,
    pub size_pt: f32,
    pub color: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FlowParagraph {
    pub runs: Vec<FlowRun>,
    pub alignment: Alignment,
    pub heading_level: Option<u8>,
}

impl FlowParagraph {
    pub fn text(&self) -> String {
        self.runs.iter().map(|run| run.text.as_str()).collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FlowTable {
    /// First row is the header.
    pub rows: Vec<Vec<String>>,
    pub header_fill: String,
    pub size_pt: f32,
    pub color: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FlowCode {
    pub lines: Vec<String>,
    pub fill: String,
    pub size_pt: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum FlowElement {
    Paragraph(FlowParagraph),
    Table(FlowTable),
    Code(FlowCode),
    PageBreak,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FlowDocument {
    pub header_text: String,
    /// First page carries no running header or page number.
    pub title_page: bool,
    pub heading_sizes: [f32; 4],
    pub body: Vec<FlowElement>,
}

impl FlowDocument {
    pub fn paragraphs(&self) -> impl Iterator<Item = &FlowParagraph> {
        self.body.iter().filter_map(|element| match element {
            FlowElement::Paragraph(paragraph) => Some(paragraph),
            _ => None,
        })
    }

    pub fn headings(&self) -> Vec<String> {
        self.paragraphs()
            .filter(|paragraph| paragraph.heading_level.is_some())
            .map(FlowParagraph::text)
            .collect()
    }
}

pub struct DocxRenderer {
    template: Template,
    document: FlowDocument,
}

impl DocxRenderer {
    pub fn new(options: &ExportOptions) -> Self {
        Self {
            template: options.template.clone(),
            document: FlowDocument {
                header_text: options.title.trim().to_string(),
                title_page: false,
                heading_sizes: options.template.heading_sizes,
                body: Vec::new(),
            },
        }
    }

    fn run(&self, text: impl Into<String>, size_pt: f32) -> FlowRun {
        FlowRun {
            text: text.into(),
            bold: false,
            italic: false,
            size_pt,
            color: self.template.palette.text.clone(),
        }
    }

    fn styled(&self, runs: &[InlineRun], size_pt: f32) -> Vec<FlowRun> {
        runs.iter()
            .map(|run| FlowRun {
                bold: run.bold,
                italic: run.italic,
                ..self.run(run.text.as_str(), size_pt)
            })
            .collect()
    }

    fn push(&mut self, runs: Vec<FlowRun>, alignment: Alignment) {
        self.document.body.push(FlowElement::Paragraph(FlowParagraph {
            runs,
            alignment,
            heading_level: None,
        }));
    }

    fn push_centered(&mut self, text: &str, size_pt: f32, bold: bool) {
        let run = FlowRun {
            bold,
            ..self.run(text, size_pt)
        };
        self.push(vec![run], Alignment::Center);
    }

    fn push_spacer(&mut self) {
        self.push(Vec::new(), Alignment::Left);
    }
}

impl BlockRenderer for DocxRenderer {
    type Output = FlowDocument;

    fn title_block(&mut self, title: &str, subtitle: &str) {
        let title_run = FlowRun {
            bold: true,
            color: self.template.palette.primary.clone(),
            ..self.run(title, self.template.title_size)
        };
        self.push(vec![title_run], Alignment::Left);
        let subtitle_run = FlowRun {
            italic: true,
            color: self.template.palette.muted.clone(),
            ..self.run(subtitle, self.template.body_size - 1.0)
        };
        self.push(vec![subtitle_run], Alignment::Left);
        self.push_spacer();
    }

    fn cover_page(&mut self, cover: &CoverPage) {
        self.document.title_page = true;
        let body = self.template.body_size;

        if let Some(institution) = &cover.institution {
            self.push_centered(&institution.to_uppercase(), body + 5.0, true);
        }
        if let Some(department) = &cover.department {
            self.push_centered(department, body + 2.0, false);
        }
        for _ in 0..3 {
            self.push_spacer();
        }

        let title = FlowRun {
            bold: true,
            color: self.template.palette.primary.clone(),
            ..self.run(cover.title.as_str(), self.template.title_size)
        };
        self.push(vec![title], Alignment::Center);
        let report_type = FlowRun {
            italic: true,
            ..self.run(cover.report_type.as_str(), body + 2.0)
        };
        self.push(vec![report_type], Alignment::Center);
        if let Some(course) = &cover.course {
            self.push_centered(course, body, false);
        }
        for _ in 0..3 {
            self.push_spacer();
        }

        if let Some(author) = &cover.author {
            self.push_centered("Submitted by", body, false);
            self.push_centered(author, body + 1.0, true);
        }
        if let Some(student_id) = &cover.student_id {
            self.push_centered(&format!("Student ID: {student_id}"), body, false);
        }
        if let Some(supervisor) = &cover.supervisor {
            self.push_spacer();
            self.push_centered("Supervised by", body, false);
            self.push_centered(supervisor, body + 1.0, true);
        }
        if let Some(date) = &cover.date {
            self.push_spacer();
            self.push_centered(date, body, false);
        }

        self.document.body.push(FlowElement::PageBreak);
    }

    fn table_of_contents(&mut self, entries: &[TocEntry]) {
        self.push_centered("TABLE OF CONTENTS", self.template.heading_size(1), true);
        self.push_spacer();

        for entry in entries {
            let indent = if entry.level > 1 { "    " } else { "" };
            let label = format!("{indent}{}", entry.label());
            let page = entry.page.to_string();
            let used = label.chars().count() + page.chars().count();
            let dots = TOC_LEADER_WIDTH.saturating_sub(used).max(3);
            let line = format!("{label} {} {page}", ".".repeat(dots));
            let run = FlowRun {
                bold: entry.level == 1,
                ..self.run(line, self.template.body_size)
            };
            self.push(vec![run], Alignment::Left);
        }

        self.document.body.push(FlowElement::PageBreak);
    }

    fn heading(&mut self, heading: &NumberedHeading) {
        let size = self.template.heading_size(heading.level);
        let color = self.template.palette.primary.clone();
        let mut runs = Vec::new();
        if let Some(number) = heading.number {
            runs.push(FlowRun {
                bold: true,
                color: color.clone(),
                ..self.run(format!("{number} "), size)
            });
        }
        runs.extend(heading.runs.iter().map(|run| FlowRun {
            bold: true,
            italic: run.italic,
            color: color.clone(),
            ..self.run(run.text.as_str(), size)
        }));

        self.document.body.push(FlowElement::Paragraph(FlowParagraph {
            runs,
            alignment: Alignment::Left,
            heading_level: Some(heading.level.clamp(1, 4)),
        }));
    }

    fn paragraph(&mut self, runs: &[InlineRun]) {
        let runs = self.styled(runs, self.template.body_size);
        self.push(runs, Alignment::Justified);
    }

    fn list_item(&mut self, runs: &[InlineRun], marker: ListMarker) {
        let mut flow = vec![self.run(format!("    {}  ", marker.label()), self.template.body_size)];
        flow.extend(self.styled(runs, self.template.body_size));
        self.push(flow, Alignment::Left);
    }

    fn table(&mut self, rows: &[Vec<String>]) {
        if rows.is_empty() {
            return;
        }
        let rows = rows
            .iter()
            .map(|row| row.iter().map(|cell| strip_inline_markers(cell)).collect())
            .collect();
        self.document.body.push(FlowElement::Table(FlowTable {
            rows,
            header_fill: self.template.palette.table_header_fill.clone(),
            size_pt: self.template.body_size - 1.0,
            color: self.template.palette.text.clone(),
        }));
    }

    fn code(&mut self, text: &str) {
        self.document.body.push(FlowElement::Code(FlowCode {
            lines: text.lines().map(ToOwned::to_owned).collect(),
            fill: self.template.palette.code_fill.clone(),
            size_pt: self.template.code_size,
        }));
    }

    fn blank(&mut self) {
        self.push_spacer();
    }

    fn references(&mut self, heading: &NumberedHeading, note: &str) {
        self.heading(heading);
        let run = FlowRun {
            italic: true,
            color: self.template.palette.muted.clone(),
            ..self.run(note, self.template.body_size)
        };
        self.push(vec![run], Alignment::Left);
    }

    fn finish(self) -> Result<FlowDocument> {
        Ok(self.document)
    }
}
