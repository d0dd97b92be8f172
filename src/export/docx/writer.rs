use std::io::Cursor;

use docx_rs::{
    AlignmentType, BreakType, Docx, Footer, Header, PageNum, Paragraph, Run, RunFonts, Shading,
    Style, StyleType, Table, TableCell, TableRow,
};

use crate::error::{ReportError, Result};

use super::{Alignment, FlowCode, FlowDocument, FlowElement, FlowParagraph, FlowRun, FlowTable};

const MONO_FONT: &str = "Courier New";

impl FlowDocument {
    /// Encode as a `.docx` (zip) package.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut docx = Docx::new();

        for (index, size) in self.heading_sizes.iter().enumerate() {
            let level = index + 1;
            docx = docx.add_style(
                Style::new(&format!("Heading{level}"), StyleType::Paragraph)
                    .name(format!("Heading {level}"))
                    .size(half_points(*size))
                    .bold(),
            );
        }

        docx = docx
            .header(Header::new().add_paragraph(header_paragraph(&self.header_text)))
            .footer(Footer::new().add_paragraph(page_number_paragraph()));
        if self.title_page {
            docx = docx
                .first_header(Header::new())
                .first_footer(Footer::new());
        }

        for element in &self.body {
            docx = match element {
                FlowElement::Paragraph(paragraph) => docx.add_paragraph(paragraph_to_docx(paragraph)),
                FlowElement::Table(table) => docx.add_table(table_to_docx(table)),
                FlowElement::Code(code) => docx.add_table(code_to_docx(code)),
                FlowElement::PageBreak => {
                    docx.add_paragraph(Paragraph::new().add_run(Run::new().add_break(BreakType::Page)))
                }
            };
        }

        let mut cursor = Cursor::new(Vec::new());
        docx.build()
            .pack(&mut cursor)
            .map_err(|err| ReportError::Export {
                format: "docx",
                cause: err.to_string(),
            })?;
        Ok(cursor.into_inner())
    }
}

fn half_points(size_pt: f32) -> usize {
    (size_pt * 2.0).round().max(2.0) as usize
}

fn run_to_docx(run: &FlowRun) -> Run {
    let mut docx_run = Run::new()
        .add_text(run.text.as_str())
        .size(half_points(run.size_pt))
        .color(run.color.as_str());
    if run.bold {
        docx_run = docx_run.bold();
    }
    if run.italic {
        docx_run = docx_run.italic();
    }
    docx_run
}

fn paragraph_to_docx(paragraph: &FlowParagraph) -> Paragraph {
    let alignment = match paragraph.alignment {
        Alignment::Left => AlignmentType::Left,
        Alignment::Center => AlignmentType::Center,
        Alignment::Justified => AlignmentType::Both,
    };
    let mut docx_paragraph = paragraph
        .runs
        .iter()
        .fold(Paragraph::new(), |docx_paragraph, run| {
            docx_paragraph.add_run(run_to_docx(run))
        })
        .align(alignment);
    if let Some(level) = paragraph.heading_level {
        docx_paragraph = docx_paragraph.style(&format!("Heading{level}"));
    }
    docx_paragraph
}

fn table_to_docx(table: &FlowTable) -> Table {
    let rows = table
        .rows
        .iter()
        .enumerate()
        .map(|(row_index, row)| {
            let header = row_index == 0;
            let cells = row
                .iter()
                .map(|cell| {
                    let mut run = Run::new()
                        .add_text(cell.as_str())
                        .size(half_points(table.size_pt))
                        .color(table.color.as_str());
                    if header {
                        run = run.bold();
                    }
                    let docx_cell = TableCell::new().add_paragraph(Paragraph::new().add_run(run));
                    if header {
                        docx_cell.shading(Shading::new().fill(table.header_fill.as_str()))
                    } else {
                        docx_cell
                    }
                })
                .collect::<Vec<TableCell>>();
            TableRow::new(cells)
        })
        .collect::<Vec<TableRow>>();
    Table::new(rows)
}

/// Code is a single shaded cell so the block keeps its background across
/// page breaks.
fn code_to_docx(code: &FlowCode) -> Table {
    let lines = if code.lines.is_empty() {
        vec![String::new()]
    } else {
        code.lines.clone()
    };
    let cell = lines.iter().fold(
        TableCell::new().shading(Shading::new().fill(code.fill.as_str())),
        |cell, line| {
            cell.add_paragraph(
                Paragraph::new().add_run(
                    Run::new()
                        .add_text(line.as_str())
                        .size(half_points(code.size_pt))
                        .fonts(RunFonts::new().ascii(MONO_FONT).hi_ansi(MONO_FONT)),
                ),
            )
        },
    );
    Table::new(vec![TableRow::new(vec![cell])])
}

fn header_paragraph(text: &str) -> Paragraph {
    Paragraph::new()
        .add_run(Run::new().add_text(text).size(16).italic())
        .align(AlignmentType::Right)
}

fn page_number_paragraph() -> Paragraph {
    Paragraph::new()
        .add_run(Run::new().add_text("Page ").size(18))
        .add_page_num(PageNum::new())
        .align(AlignmentType::Center)
}
