use chrono::NaiveDate;

use super::docx::{DocxRenderer, FlowDocument, FlowElement};
use super::pdf::{CanvasItem, MARGIN, PAGE_HEIGHT, PdfRenderer};
use super::*;
use crate::markdown::parse;
use crate::model::{AcademicDetails, ReportStructure};

fn options(mode: ExportMode) -> ExportOptions {
    let template_id = match mode {
        ExportMode::Standard => "standard",
        ExportMode::Academic => "academic",
    };
    ExportOptions {
        title: "AI Report: 2024!".to_string(),
        mode,
        template: Template::resolve(template_id),
        academic: AcademicReportConfig {
            academic_details: AcademicDetails {
                author_name: "Ada Lovelace".to_string(),
                institution: "Analytical College".to_string(),
                submission_date: "2024-05-03".to_string(),
                ..AcademicDetails::default()
            },
            ..AcademicReportConfig::default()
        },
        generated_on: NaiveDate::from_ymd_opt(2024, 5, 3).expect("valid date"),
    }
}

fn academic_without_front_matter() -> ExportOptions {
    let mut options = options(ExportMode::Academic);
    options.academic.structure = ReportStructure {
        include_toc: false,
        include_cover_page: false,
        include_references: false,
        ..ReportStructure::default()
    };
    options
}

fn flow(markdown: &str, options: &ExportOptions) -> FlowDocument {
    assemble(DocxRenderer::new(options), &parse(markdown), options).expect("docx assembly")
}

fn flow_texts(document: &FlowDocument) -> Vec<String> {
    document.paragraphs().map(|paragraph| paragraph.text()).collect()
}

#[test]
fn academic_headings_are_numbered_and_subsections_reset() {
    let markdown = "# Intro\n\nHello **world**.\n\n## Sub\n\nMore text.";
    let options = academic_without_front_matter();

    let document = flow(markdown, &options);
    assert_eq!(document.headings(), vec!["1. INTRO", "1.1 Sub"]);

    let canvas = assemble(PdfRenderer::new(&options), &parse(markdown), &options).expect("pdf assembly");
    let text = canvas.plain_text();
    assert!(text.contains("1. INTRO"));
    assert!(text.contains("1.1 Sub"));

    let markdown = "# A\n## A1\n## A2\n# B\n## B1";
    let document = flow(markdown, &options);
    assert_eq!(document.headings(), vec!["1. A", "1.1 A1", "1.2 A2", "2. B", "2.1 B1"]);
}

#[test]
fn existing_heading_numbers_are_not_doubled() {
    let options = academic_without_front_matter();
    let document = flow("# 1. Introduction\n## 1.1 Background\n# CHAPTER 2: Methods", &options);
    assert_eq!(
        document.headings(),
        vec!["1. INTRODUCTION", "1.1 Background", "2. METHODS"]
    );
}

#[test]
fn block_text_is_left_untouched_by_numbering() {
    let blocks = parse("# 1. Introduction");
    let options = academic_without_front_matter();
    assemble(DocxRenderer::new(&options), &blocks, &options).expect("docx assembly");
    assert_eq!(
        blocks,
        vec![Block::Heading {
            level: 1,
            text: "1. Introduction".to_string()
        }]
    );
}

#[test]
fn repeated_exports_recompute_numbering() {
    let options = academic_without_front_matter();
    let first = flow("# One\n## Two", &options);
    let second = flow("# One\n## Two", &options);
    assert_eq!(first, second);
    assert_eq!(second.headings(), vec!["1. ONE", "1.1 Two"]);
}

#[test]
fn inline_runs_keep_bold_and_italic_styling() {
    let options = academic_without_front_matter();
    let document = flow("Hello **world** and *you*.", &options);
    let paragraph = document
        .paragraphs()
        .find(|paragraph| paragraph.text() == "Hello world and you.")
        .expect("body paragraph");
    let bold = paragraph.runs.iter().find(|run| run.text == "world").expect("bold run");
    let italic = paragraph.runs.iter().find(|run| run.text == "you").expect("italic run");
    assert!(bold.bold && !bold.italic);
    assert!(italic.italic && !italic.bold);
}

#[test]
fn cover_page_renders_only_present_fields() {
    let mut options = options(ExportMode::Academic);
    options.academic.structure.include_toc = false;
    let document = flow("# Intro", &options);
    let texts = flow_texts(&document);

    assert!(document.title_page);
    assert!(texts.contains(&"ANALYTICAL COLLEGE".to_string()));
    assert!(texts.contains(&"Submitted by".to_string()));
    assert!(texts.contains(&"Ada Lovelace".to_string()));
    assert!(texts.contains(&"May 3, 2024".to_string()));
    assert!(texts.contains(&"Research Paper".to_string()));
    assert!(!texts.iter().any(|text| text.starts_with("Student ID")));
    assert!(!texts.iter().any(|text| text == "Supervised by"));
    assert!(document.body.iter().any(|element| matches!(element, FlowElement::PageBreak)));
}

#[test]
fn cover_page_includes_optional_fields_when_given() {
    let mut options = options(ExportMode::Academic);
    options.academic.academic_details.student_id = Some("S-42".to_string());
    options.academic.academic_details.supervisor_name = Some("Dr. Babbage".to_string());
    options.academic.academic_details.department = Some("  ".to_string());
    let texts = flow_texts(&flow("# Intro", &options));

    assert!(texts.contains(&"Student ID: S-42".to_string()));
    assert!(texts.contains(&"Supervised by".to_string()));
    assert!(texts.contains(&"Dr. Babbage".to_string()));
    assert!(!texts.iter().any(|text| text.trim().is_empty() && !text.is_empty()));
}

#[test]
fn contents_page_lists_numbered_sections_with_estimated_pages() {
    let options = options(ExportMode::Academic);
    let document = flow("# Intro\n## Scope\n# Results", &options);
    let texts = flow_texts(&document);

    assert!(texts.contains(&"TABLE OF CONTENTS".to_string()));
    // Estimated, not laid out: with a cover page the body starts on page 3.
    let intro = texts
        .iter()
        .find(|text| text.starts_with("1. INTRO"))
        .expect("toc entry");
    assert!(intro.ends_with(" 3"));
    assert!(texts.iter().any(|text| text.starts_with("    1.1 Scope")));
    assert!(texts.iter().any(|text| text.starts_with("3. REFERENCES")));
}

#[test]
fn references_section_follows_last_section_with_style_placeholder() {
    let mut options = options(ExportMode::Academic);
    options.academic.structure.include_toc = false;
    options.academic.structure.include_cover_page = false;
    options.academic.structure.citation_style = CitationStyle::Ieee;

    let document = flow("# Intro\n# Results", &options);
    assert_eq!(document.headings(), vec!["1. INTRO", "2. RESULTS", "3. REFERENCES"]);
    let texts = flow_texts(&document);
    assert!(texts.iter().any(|text| text.contains("IEEE")));

    options.academic.structure.citation_style = CitationStyle::None;
    let document = flow("# Intro", &options);
    assert_eq!(document.headings(), vec!["1. INTRO"]);
}

#[test]
fn standard_mode_has_title_block_and_no_academic_sections() {
    let options = options(ExportMode::Standard);
    let document = flow("# 1. Overview\n\nText", &options);
    let texts = flow_texts(&document);

    assert!(!document.title_page);
    assert_eq!(texts[0], "AI Report: 2024!");
    assert_eq!(texts[1], "Generated on May 3, 2024");
    assert_eq!(document.headings(), vec!["1. Overview"]);
    assert!(!texts.iter().any(|text| text.contains("TABLE OF CONTENTS")));
    assert!(!texts.iter().any(|text| text.contains("REFERENCES")));
}

#[test]
fn technical_template_numbers_standard_headings() {
    let mut options = options(ExportMode::Standard);
    options.template = Template::resolve("technical");
    let document = flow("# 1. Overview\n## Details", &options);
    assert_eq!(document.headings(), vec!["1. Overview", "1.1 Details"]);
}

#[test]
fn ordered_list_ordinals_restart_after_other_blocks() {
    let options = academic_without_front_matter();
    let document = flow("1. a\n\n2. b\nBreak\n1. c\n- d", &options);
    let items = flow_texts(&document)
        .into_iter()
        .filter(|text| text.starts_with("    "))
        .collect::<Vec<String>>();
    assert_eq!(
        items,
        vec!["    1.  a", "    2.  b", "    1.  c", "    \u{2022}  d"]
    );
}

#[test]
fn tables_keep_header_row_and_strip_markers() {
    let options = academic_without_front_matter();
    let document = flow("| **Name** | Value |\n|---|---|\n| a | 1 |", &options);
    let table = document
        .body
        .iter()
        .find_map(|element| match element {
            FlowElement::Table(table) => Some(table),
            _ => None,
        })
        .expect("table element");
    assert_eq!(table.rows, vec![vec!["Name", "Value"], vec!["a", "1"]]);
}

#[test]
fn docx_and_pdf_bytes_have_format_signatures() {
    let blocks = parse("# Intro\n\nBody with \u{201C}quotes\u{201D}.\n\n```\ncode\n```\n| a | b |\n|---|---|\n| 1 | 2 |");
    let options = options(ExportMode::Academic);

    let docx = export(&blocks, &options, ExportFormat::Docx).expect("docx export");
    assert!(docx.bytes.starts_with(b"PK"));
    assert_eq!(docx.filename, "ai_report__2024_.docx");

    let pdf = export(&blocks, &options, ExportFormat::Pdf).expect("pdf export");
    assert!(pdf.bytes.starts_with(b"%PDF-1.5"));
    assert_eq!(pdf.filename, "ai_report__2024_.pdf");
}

#[test]
fn artifact_filenames_map_every_non_alphanumeric_character() {
    assert_eq!(artifact_filename(" AI ", ExportFormat::Docx), "_ai_.docx");
    assert_eq!(artifact_filename("Q3 / Q4", ExportFormat::Pdf), "q3___q4.pdf");
    assert_eq!(artifact_filename("", ExportFormat::Latex), "report.tex");
}

#[test]
fn latex_is_academic_only() {
    let blocks = parse("# Intro");
    let result = export(&blocks, &options(ExportMode::Standard), ExportFormat::Latex);
    assert!(matches!(result, Err(ReportError::Export { format: "latex", .. })));

    let standard = export_all(&blocks, &options(ExportMode::Standard)).expect("standard export");
    let names = standard.iter().map(|artifact| artifact.filename.as_str()).collect::<Vec<&str>>();
    assert_eq!(names, vec!["ai_report__2024_.docx", "ai_report__2024_.pdf"]);

    let academic = export_all(&blocks, &options(ExportMode::Academic)).expect("academic export");
    assert_eq!(academic.len(), 3);
    assert_eq!(academic[2].filename, "ai_report__2024_.tex");
}

#[test]
fn latex_keeps_code_verbatim() {
    let code = "# not a heading\n| a | b |\nlet x = 50% & $y;";
    let markdown = format!("# Intro\n\n```\n{code}\n```\n\nAfter 50%.");
    let options = options(ExportMode::Academic);
    let source = String::from_utf8(
        export(&parse(&markdown), &options, ExportFormat::Latex)
            .expect("latex export")
            .bytes,
    )
    .expect("utf8 source");

    assert!(source.contains(&format!("\\begin{{verbatim}}\n{code}\n\\end{{verbatim}}")));
    assert!(source.contains("After 50\\%."));
    assert!(source.contains("\\section{INTRO}"));
    assert!(source.contains("\\begin{titlepage}"));
    assert!(source.contains("\\tableofcontents"));
    assert!(source.contains("\\section{REFERENCES}"));
    assert!(source.trim_end().ends_with("\\end{document}"));
}

#[test]
fn latex_code_cannot_close_its_verbatim_early() {
    let options = academic_without_front_matter();
    let markdown = "```\nbefore\n\\end{verbatim}\n\\section{Injected}\n```\n\nAfter.";
    let source = assemble(LatexRenderer::new(&options), &parse(markdown), &options).expect("latex assembly");

    assert_eq!(source.matches("\\begin{verbatim}").count(), 1);
    assert_eq!(source.matches("\\end{verbatim}").count(), 1);
    assert!(source.contains("before\n\\end {verbatim}\n\\section{Injected}\n\\end{verbatim}"));
    assert!(source.contains("After."));
}

#[test]
fn latex_groups_list_items_into_environments() {
    let options = academic_without_front_matter();
    let source = assemble(LatexRenderer::new(&options), &parse("- a\n- b\n1. c\nText"), &options)
        .expect("latex assembly");
    assert!(source.contains("\\begin{itemize}\n  \\item a\n  \\item b\n\\end{itemize}"));
    assert!(source.contains("\\begin{enumerate}\n  \\item c\n\\end{enumerate}"));
}

#[test]
fn pdf_paginates_long_content_and_decorates_after_cover() {
    let paragraph = "Lorem ipsum dolor sit amet, consectetur adipiscing elit. ".repeat(12);
    let markdown = (0..40)
        .map(|index| format!("## Part {index}\n\n{paragraph}\n"))
        .collect::<Vec<String>>()
        .join("\n");
    let mut options = options(ExportMode::Academic);
    options.academic.structure.include_toc = false;

    let canvas = assemble(PdfRenderer::new(&options), &parse(&markdown), &options).expect("pdf assembly");
    let total = canvas.page_count();
    assert!(total > 3);

    let cover_texts = canvas.pages[0].texts().collect::<Vec<&str>>();
    assert!(!cover_texts.iter().any(|text| text.starts_with("Page ")));

    for (index, page) in canvas.pages.iter().enumerate().skip(1) {
        let label = format!("Page {} of {total}", index + 1);
        assert!(page.texts().any(|text| text == label), "missing {label}");
        assert!(page.texts().any(|text| text == "AI Report: 2024!"));
    }

    let bottom = PAGE_HEIGHT - MARGIN;
    for page in &canvas.pages {
        for item in &page.items {
            if let CanvasItem::Text { y, text, .. } = item {
                if !text.starts_with("Page ") {
                    assert!(*y <= bottom, "{text} overruns the bottom margin");
                }
            }
        }
    }
}

#[test]
fn pdf_code_and_tables_are_shaded() {
    let options = academic_without_front_matter();
    let canvas = assemble(
        PdfRenderer::new(&options),
        &parse("```\nfn main() {}\n```\n| h1 | h2 |\n|---|---|\n| a | b |"),
        &options,
    )
    .expect("pdf assembly");
    let fills = canvas.pages[0]
        .items
        .iter()
        .filter(|item| matches!(item, CanvasItem::Rect { fill: Some(_), .. }))
        .count();
    // Code strip rows plus the two header cells.
    assert!(fills >= 4);
    assert!(canvas.plain_text().contains("fn main() {}"));
}
