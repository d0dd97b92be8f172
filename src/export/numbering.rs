//! Section numbering shared by every renderer.
//!
//! Numbering is a fold over heading levels: [`SectionCounter::next`] returns
//! the advanced counter instead of mutating shared state, so each export call
//! recomputes it from the block sequence.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;

use crate::markdown::{InlineRun, split_inline_runs, strip_inline_markers};

// The numeral must end at a word boundary, so "Section Lists" or
// "Part Ivy League" never match on their leading letters.
#[allow(clippy::expect_used)]
static NUMBERING_PREFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)^(?:(?:section|chapter|part)\s+(?P<numeral>\d+|[ivxlc]+)\b(?:\s*[:.\-–]\s*|\s+)|\d+(?:\.\d+)*\.?\s+)",
    )
    .expect("numbering prefix regex is valid")
});

#[allow(clippy::expect_used)]
static ROMAN_NUMERAL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^c{0,3}(?:xc|xl|l?x{0,3})(?:ix|iv|v?i{0,3})$").expect("roman numeral regex is valid")
});

/// Remove numbering a heading already carries (`"1. "`, `"1.1 "`,
/// `"CHAPTER 1: "`, `"Part IV "`, ...). Text that would become empty is
/// returned as is.
pub fn strip_numbering_prefix(text: &str) -> String {
    let mut current = text.trim();
    while let Some(captures) = NUMBERING_PREFIX.captures(current) {
        let Some(found) = captures.get(0) else {
            break;
        };
        if captures
            .name("numeral")
            .is_some_and(|numeral| !is_numeral(numeral.as_str()))
        {
            break;
        }
        let rest = current[found.end()..].trim_start();
        if rest.is_empty() || found.end() == 0 {
            break;
        }
        current = rest;
    }
    current.to_string()
}

fn is_numeral(value: &str) -> bool {
    value.chars().all(|character| character.is_ascii_digit()) || ROMAN_NUMERAL.is_match(value)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SectionNumber {
    Section(usize),
    Subsection(usize, usize),
}

impl fmt::Display for SectionNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SectionNumber::Section(section) => write!(f, "{section}."),
            SectionNumber::Subsection(section, subsection) => write!(f, "{section}.{subsection}"),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SectionCounter {
    section: usize,
    subsection: usize,
}

impl SectionCounter {
    /// Advance past a heading of `level`. Level 1 bumps the section and
    /// resets the subsection; level 2 bumps the subsection. A level 2 heading
    /// before any level 1 heading stays unnumbered.
    pub fn next(self, level: u8) -> (Self, Option<SectionNumber>) {
        match level {
            1 => {
                let section = self.section + 1;
                (
                    Self {
                        section,
                        subsection: 0,
                    },
                    Some(SectionNumber::Section(section)),
                )
            }
            2 if self.section > 0 => {
                let subsection = self.subsection + 1;
                (
                    Self {
                        section: self.section,
                        subsection,
                    },
                    Some(SectionNumber::Subsection(self.section, subsection)),
                )
            }
            _ => (self, None),
        }
    }

    /// Number the next top-level section would receive.
    pub fn next_section(self) -> SectionNumber {
        SectionNumber::Section(self.section + 1)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeadingFormat {
    pub numbered: bool,
    pub uppercase_top_level: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NumberedHeading {
    pub level: u8,
    pub number: Option<SectionNumber>,
    pub runs: Vec<InlineRun>,
}

impl NumberedHeading {
    pub fn plain_text(&self) -> String {
        self.runs.iter().map(|run| run.text.as_str()).collect()
    }

    /// Number and text as a single line, e.g. `"1.1 Background"`.
    pub fn display(&self) -> String {
        match self.number {
            Some(number) => format!("{number} {}", self.plain_text()),
            None => self.plain_text(),
        }
    }
}

impl HeadingFormat {
    /// Build the rendered heading. The source block text is not modified.
    pub fn apply(&self, level: u8, number: Option<SectionNumber>, text: &str) -> NumberedHeading {
        if !self.numbered {
            return NumberedHeading {
                level,
                number: None,
                runs: split_inline_runs(text),
            };
        }

        let stripped = strip_numbering_prefix(text);
        let runs = if self.uppercase_top_level && level == 1 {
            split_inline_runs(&stripped)
                .into_iter()
                .map(|run| InlineRun {
                    text: run.text.to_uppercase(),
                    ..run
                })
                .collect()
        } else {
            split_inline_runs(&stripped)
        };

        NumberedHeading {
            level,
            number: if level <= 2 { number } else { None },
            runs,
        }
    }

    /// Plain text of a heading as it appears in the table of contents.
    pub fn toc_text(&self, level: u8, text: &str) -> String {
        let heading = self.apply(level, None, text);
        strip_inline_markers(&heading.plain_text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_common_numbering_prefixes() {
        assert_eq!(strip_numbering_prefix("1. Introduction"), "Introduction");
        assert_eq!(strip_numbering_prefix("1.1 Background"), "Background");
        assert_eq!(strip_numbering_prefix("2.3.4. Details"), "Details");
        assert_eq!(strip_numbering_prefix("SECTION 1: Scope"), "Scope");
        assert_eq!(strip_numbering_prefix("Chapter 2: Methods"), "Methods");
        assert_eq!(strip_numbering_prefix("CHAPTER IV - Results"), "Results");
        assert_eq!(strip_numbering_prefix("Chapter 1: 1.2 Nested"), "Nested");
    }

    #[test]
    fn leaves_unnumbered_and_bare_numbers_alone() {
        assert_eq!(strip_numbering_prefix("Introduction"), "Introduction");
        assert_eq!(strip_numbering_prefix("42"), "42");
        assert_eq!(strip_numbering_prefix("1. "), "1.");
        assert_eq!(strip_numbering_prefix("Sectional analysis"), "Sectional analysis");
    }

    #[test]
    fn keyword_followed_by_an_ordinary_word_is_kept() {
        assert_eq!(strip_numbering_prefix("Section Lists"), "Section Lists");
        assert_eq!(strip_numbering_prefix("Part Ivy League"), "Part Ivy League");
        assert_eq!(strip_numbering_prefix("Chapter Civil Works"), "Chapter Civil Works");
        assert_eq!(strip_numbering_prefix("Part Mix Design"), "Part Mix Design");
    }

    #[test]
    fn keyword_with_numeral_is_stripped_with_or_without_separator() {
        assert_eq!(strip_numbering_prefix("Section IV. Results"), "Results");
        assert_eq!(strip_numbering_prefix("Part II Design"), "Design");
        assert_eq!(strip_numbering_prefix("chapter 3 Findings"), "Findings");
        assert_eq!(strip_numbering_prefix("Chapter XL: Appendix"), "Appendix");
    }

    #[test]
    fn counter_resets_subsections_on_new_section() {
        let counter = SectionCounter::default();
        let (counter, first) = counter.next(1);
        let (counter, sub_one) = counter.next(2);
        let (counter, sub_two) = counter.next(2);
        let (counter, deep) = counter.next(3);
        let (counter, second) = counter.next(1);
        let (_, sub_again) = counter.next(2);

        assert_eq!(first, Some(SectionNumber::Section(1)));
        assert_eq!(sub_one, Some(SectionNumber::Subsection(1, 1)));
        assert_eq!(sub_two, Some(SectionNumber::Subsection(1, 2)));
        assert_eq!(deep, None);
        assert_eq!(second, Some(SectionNumber::Section(2)));
        assert_eq!(sub_again, Some(SectionNumber::Subsection(2, 1)));
    }

    #[test]
    fn subsection_before_any_section_is_unnumbered() {
        let (counter, number) = SectionCounter::default().next(2);
        assert_eq!(number, None);
        assert_eq!(counter, SectionCounter::default());
    }

    #[test]
    fn academic_format_uppercases_and_renumbers() {
        let format = HeadingFormat {
            numbered: true,
            uppercase_top_level: true,
        };
        let heading = format.apply(1, Some(SectionNumber::Section(1)), "1. Introduction");
        assert_eq!(heading.display(), "1. INTRODUCTION");

        let heading = format.apply(2, Some(SectionNumber::Subsection(1, 1)), "Sub **part**");
        assert_eq!(heading.display(), "1.1 Sub part");
        assert!(heading.runs.iter().any(|run| run.bold && run.text == "part"));
    }

    #[test]
    fn unnumbered_format_keeps_text() {
        let format = HeadingFormat {
            numbered: false,
            uppercase_top_level: false,
        };
        let heading = format.apply(1, Some(SectionNumber::Section(3)), "1. Keep Me");
        assert_eq!(heading.display(), "1. Keep Me");
        assert_eq!(heading.number, None);
    }
}
