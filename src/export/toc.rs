//! Table of contents pre-pass.
//!
//! Page numbers are estimated from character counts, not from a layout pass:
//! a heading lands on `start_page + preceding_chars / CHARS_PER_PAGE`. The
//! estimate drifts on documents with large tables or code blocks.

use serde::Serialize;

use crate::model::Block;

use super::numbering::{HeadingFormat, SectionCounter, SectionNumber};

pub const CHARS_PER_PAGE: usize = 2500;

/// Page the body starts on when a cover page precedes the contents page.
pub const START_PAGE_AFTER_COVER: usize = 3;
pub const START_PAGE_WITHOUT_COVER: usize = 2;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TocEntry {
    pub level: u8,
    pub number: Option<String>,
    pub text: String,
    pub page: usize,
}

impl TocEntry {
    pub fn label(&self) -> String {
        match &self.number {
            Some(number) => format!("{number} {}", self.text),
            None => self.text.clone(),
        }
    }
}

/// Collect level 1 and 2 headings with their section numbers and estimated
/// pages. `references_title` appends the references section as the final
/// top-level entry.
pub fn build_entries(
    blocks: &[Block],
    format: HeadingFormat,
    has_cover_page: bool,
    references_title: Option<&str>,
) -> Vec<TocEntry> {
    let start_page = if has_cover_page {
        START_PAGE_AFTER_COVER
    } else {
        START_PAGE_WITHOUT_COVER
    };

    let mut entries = Vec::new();
    let mut counter = SectionCounter::default();
    let mut preceding_chars = 0usize;

    for block in blocks {
        if let Block::Heading { level, text } = block {
            let (next, number) = counter.next(*level);
            counter = next;
            if *level <= 2 {
                entries.push(TocEntry {
                    level: *level,
                    number: visible_number(format, number),
                    text: format.toc_text(*level, text),
                    page: start_page + preceding_chars / CHARS_PER_PAGE,
                });
            }
        }
        preceding_chars += block.char_len();
    }

    if let Some(title) = references_title {
        entries.push(TocEntry {
            level: 1,
            number: visible_number(format, Some(counter.next_section())),
            text: format.toc_text(1, title),
            page: start_page + preceding_chars / CHARS_PER_PAGE,
        });
    }

    entries
}

fn visible_number(format: HeadingFormat, number: Option<SectionNumber>) -> Option<String> {
    if !format.numbered {
        return None;
    }
    number.map(|number| number.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    const ACADEMIC: HeadingFormat = HeadingFormat {
        numbered: true,
        uppercase_top_level: true,
    };

    fn heading(level: u8, text: &str) -> Block {
        Block::Heading {
            level,
            text: text.to_string(),
        }
    }

    fn paragraph(chars: usize) -> Block {
        Block::Paragraph {
            text: "x".repeat(chars),
        }
    }

    #[test]
    fn collects_numbered_top_two_levels_only() {
        let blocks = vec![
            heading(1, "1. Intro"),
            heading(2, "Scope"),
            heading(3, "Detail"),
            heading(1, "Method"),
        ];
        let entries = build_entries(&blocks, ACADEMIC, false, None);
        let labels = entries.iter().map(TocEntry::label).collect::<Vec<String>>();
        assert_eq!(labels, vec!["1. INTRO", "1.1 Scope", "2. METHOD"]);
    }

    // Page numbers are an approximation from character counts; these checks
    // pin the heuristic, not real pagination.
    #[test]
    fn estimated_pages_follow_cumulative_characters() {
        let blocks = vec![
            heading(1, "Intro"),
            paragraph(2400),
            heading(1, "Body"),
            paragraph(2600),
            heading(2, "Late"),
        ];
        let entries = build_entries(&blocks, ACADEMIC, true, None);
        let pages = entries.iter().map(|entry| entry.page).collect::<Vec<usize>>();
        // "Intro" is 5 chars: 5 + 2400 < 2500, then + 4 + 2600 crosses twice.
        assert_eq!(pages, vec![3, 3, 5]);

        let without_cover = build_entries(&blocks, ACADEMIC, false, None);
        assert_eq!(without_cover[0].page, 2);
    }

    #[test]
    fn references_entry_takes_next_section_number() {
        let blocks = vec![heading(1, "Intro"), heading(1, "Results")];
        let entries = build_entries(&blocks, ACADEMIC, false, Some("References"));
        let last = entries.last().map(TocEntry::label);
        assert_eq!(last.as_deref(), Some("3. REFERENCES"));
    }

    #[test]
    fn unnumbered_format_keeps_heading_text() {
        let format = HeadingFormat {
            numbered: false,
            uppercase_top_level: false,
        };
        let entries = build_entries(&[heading(1, "**Bold** Start")], format, false, None);
        assert_eq!(entries[0].label(), "Bold Start");
        assert_eq!(entries[0].number, None);
    }
}
