//! Typed regex extraction.
//!
//! Patterns are applied independently and in order; overlaps across types
//! are kept (a DOI inside a URL is reported as both).

use std::collections::{BTreeMap, HashSet};
use std::sync::LazyLock;

use regex::Regex;

use crate::model::ExtractedMatch;

/// Extra acceptance rule applied to a raw regex hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Guard {
    None,
    /// Reject hits directly preceded or followed by this character.
    NotAdjacentTo(char),
}

struct Pattern {
    name: &'static str,
    description: &'static str,
    regex: Regex,
    guard: Guard,
}

impl Pattern {
    #[allow(clippy::expect_used)]
    fn new(name: &'static str, description: &'static str, source: &str, guard: Guard) -> Self {
        Self {
            name,
            description,
            regex: Regex::new(source).expect("extraction pattern is valid"),
            guard,
        }
    }

    /// `(start, end, value)` for every accepted hit. When the regex has a
    /// `value` group its span is reported instead of the whole match. A hit
    /// rejected by the guard restarts the scan one character later so a
    /// valid hit overlapping it is still found.
    fn hits<'t>(&self, text: &'t str) -> Vec<(usize, usize, &'t str)> {
        let mut hits = Vec::new();
        let mut position = 0usize;

        while position <= text.len() {
            let Some(captures) = self.regex.captures_at(text, position) else {
                break;
            };
            let Some(whole) = captures.get(0) else {
                break;
            };

            if self.rejects(text, whole.start(), whole.end()) {
                position = next_char_boundary(text, whole.start());
                continue;
            }

            let span = captures.name("value").unwrap_or(whole);
            if !span.as_str().trim().is_empty() {
                hits.push((span.start(), span.end(), span.as_str()));
            }

            position = if whole.end() > whole.start() {
                whole.end()
            } else {
                next_char_boundary(text, whole.end())
            };
        }

        hits
    }

    fn rejects(&self, text: &str, start: usize, end: usize) -> bool {
        match self.guard {
            Guard::None => false,
            Guard::NotAdjacentTo(marker) => {
                let before = text[..start].chars().next_back();
                let after = text[end..].chars().next();
                before == Some(marker) || after == Some(marker)
            }
        }
    }
}

fn next_char_boundary(text: &str, index: usize) -> usize {
    text[index..]
        .chars()
        .next()
        .map(|character| index + character.len_utf8())
        .unwrap_or(text.len() + 1)
}

static BASE_PATTERNS: LazyLock<Vec<Pattern>> = LazyLock::new(|| {
    vec![
        Pattern::new(
            "email",
            "Email address",
            r"[A-Za-z0-9._%+\-]+@[A-Za-z0-9.\-]+\.[A-Za-z]{2,}",
            Guard::None,
        ),
        Pattern::new(
            "phone",
            "Phone number",
            r"(?:\+\d{1,3}[\s.\-]?)?(?:\(\d{3}\)|\b\d{3})[\s.\-]?\d{3}[\s.\-]\d{4}\b",
            Guard::None,
        ),
        Pattern::new(
            "date",
            "Date (D/M/YYYY, D.M.YYYY or YYYY-MM-DD)",
            r"\b(?:\d{1,2}[/.]\d{1,2}[/.]\d{4}|\d{4}-\d{2}-\d{2})\b",
            Guard::None,
        ),
        Pattern::new(
            "currency",
            "Currency amount",
            r"\$\d{1,3}(?:,\d{3})+(?:\.\d{2})?|\$\d+(?:\.\d{2})?",
            Guard::None,
        ),
        Pattern::new(
            "url",
            "Web address",
            r#"https?://[^\s<>"')\]]+"#,
            Guard::None,
        ),
        Pattern::new(
            "time",
            "Time of day",
            r"\b(?:[01]?\d|2[0-3]):[0-5]\d(?:\s?[AaPp][Mm]\b)?",
            Guard::None,
        ),
        Pattern::new(
            "percentage",
            "Percentage",
            r"\b\d+(?:\.\d+)?%",
            Guard::None,
        ),
        Pattern::new(
            "ssn",
            "Social security number",
            r"\b\d{3}-\d{2}-\d{4}\b",
            Guard::None,
        ),
        Pattern::new(
            "ip_address",
            "IPv4 address",
            r"\b(?:(?:25[0-5]|2[0-4]\d|1?\d?\d)\.){3}(?:25[0-5]|2[0-4]\d|1?\d?\d)\b",
            Guard::None,
        ),
        Pattern::new(
            "hashtag",
            "Hashtag",
            r"\B#[A-Za-z][A-Za-z0-9_]*",
            Guard::None,
        ),
    ]
});

static ACADEMIC_PATTERNS: LazyLock<Vec<Pattern>> = LazyLock::new(|| {
    vec![
        Pattern::new(
            "citation_numeric",
            "Numeric citation marker",
            r"\[\d+(?:\s*[,\-–]\s*\d+)*\]",
            Guard::None,
        ),
        Pattern::new(
            "citation_author_year",
            "Author-year citation",
            r"\([A-Z][A-Za-z'\-]+(?:\s+et\s+al\.)?(?:\s+(?:&|and)\s+[A-Z][A-Za-z'\-]+)?,\s*\d{4}[a-z]?\)",
            Guard::None,
        ),
        Pattern::new(
            "figure_reference",
            "Figure reference",
            r"\b(?:Figure|Fig\.)\s*\d+(?:\.\d+)*[a-z]?",
            Guard::None,
        ),
        Pattern::new(
            "table_reference",
            "Table reference",
            r"\bTable\s+\d+(?:\.\d+)*",
            Guard::None,
        ),
        Pattern::new(
            "equation_reference",
            "Equation reference",
            r"\b(?:Equation|Eq\.)\s*\(?\d+(?:\.\d+)*\)?",
            Guard::None,
        ),
        Pattern::new(
            "section_reference",
            "Section reference",
            r"\bSection\s+\d+(?:\.\d+)*",
            Guard::None,
        ),
        Pattern::new(
            "key_term",
            "Key term (bold)",
            r"\*\*(?P<value>[^*\n]+)\*\*",
            Guard::None,
        ),
        Pattern::new(
            "definition",
            "Definition (italic)",
            r"\*(?P<value>[^*\n]+)\*",
            Guard::NotAdjacentTo('*'),
        ),
        Pattern::new(
            "doi",
            "Digital object identifier",
            r"\b10\.\d{4,9}/[\-._;()/:A-Za-z0-9]+",
            Guard::None,
        ),
        Pattern::new(
            "isbn",
            "ISBN",
            r"\bISBN(?:-1[03])?:?\s*(?:\d[\s\-]?){9,12}[\dX]\b",
            Guard::None,
        ),
    ]
});

/// Every distinct `(type, value)` pair, in pattern order then first
/// occurrence. No offsets.
pub fn extract_simple(text: &str) -> Vec<ExtractedMatch> {
    let mut seen = HashSet::<(&'static str, String)>::new();
    let mut matches = Vec::new();

    for pattern in BASE_PATTERNS.iter() {
        for (_, _, value) in pattern.hits(text) {
            if !seen.insert((pattern.name, value.to_string())) {
                continue;
            }
            matches.push(ExtractedMatch {
                match_type: pattern.name.to_string(),
                value: value.to_string(),
                pattern_description: pattern.description.to_string(),
                start_offset: None,
                end_offset: None,
            });
        }
    }

    matches
}

/// Every occurrence with byte offsets, sorted by start offset. Identical
/// values at different offsets are all kept.
pub fn extract_with_positions(text: &str, include_academic_patterns: bool) -> Vec<ExtractedMatch> {
    let academic: &[Pattern] = if include_academic_patterns {
        &ACADEMIC_PATTERNS
    } else {
        &[]
    };

    let mut seen = HashSet::<(&'static str, &str, usize)>::new();
    let mut indexed = Vec::<(usize, usize, ExtractedMatch)>::new();

    for (pattern_index, pattern) in BASE_PATTERNS.iter().chain(academic.iter()).enumerate() {
        for (start, end, value) in pattern.hits(text) {
            if !seen.insert((pattern.name, value, start)) {
                continue;
            }
            indexed.push((
                start,
                pattern_index,
                ExtractedMatch {
                    match_type: pattern.name.to_string(),
                    value: value.to_string(),
                    pattern_description: pattern.description.to_string(),
                    start_offset: Some(start),
                    end_offset: Some(end),
                },
            ));
        }
    }

    indexed.sort_by(|a, b| a.0.cmp(&b.0).then(a.1.cmp(&b.1)));
    indexed.into_iter().map(|(_, _, found)| found).collect()
}

/// Per-type counts, for entity chip display.
pub fn summarize(matches: &[ExtractedMatch]) -> BTreeMap<String, usize> {
    let mut counts = BTreeMap::new();
    for found in matches {
        *counts.entry(found.match_type.clone()).or_insert(0) += 1;
    }
    counts
}

#[cfg(test)]
mod tests {
    use super::*;

    fn values_of<'a>(matches: &'a [ExtractedMatch], kind: &str) -> Vec<&'a str> {
        matches
            .iter()
            .filter(|found| found.match_type == kind)
            .map(|found| found.value.as_str())
            .collect()
    }

    #[test]
    fn simple_extraction_finds_common_entities() {
        let text = "Mail ada@example.org or call (555) 123-4567 before 12/03/2024 at 10:30 AM. \
                    Budget $1,250.50 covers 15% of https://example.org/plan from 192.168.0.1 #launch";
        let matches = extract_simple(text);

        assert_eq!(values_of(&matches, "email"), vec!["ada@example.org"]);
        assert_eq!(values_of(&matches, "phone"), vec!["(555) 123-4567"]);
        assert_eq!(values_of(&matches, "date"), vec!["12/03/2024"]);
        assert_eq!(values_of(&matches, "time"), vec!["10:30 AM"]);
        assert_eq!(values_of(&matches, "currency"), vec!["$1,250.50"]);
        assert_eq!(values_of(&matches, "percentage"), vec!["15%"]);
        assert_eq!(values_of(&matches, "url"), vec!["https://example.org/plan"]);
        assert_eq!(values_of(&matches, "ip_address"), vec!["192.168.0.1"]);
        assert_eq!(values_of(&matches, "hashtag"), vec!["#launch"]);
        assert!(matches.iter().all(|found| found.start_offset.is_none()));
    }

    #[test]
    fn iso_dates_and_ssn_are_recognised() {
        let matches = extract_simple("Filed 2023-11-05 under 123-45-6789.");
        assert_eq!(values_of(&matches, "date"), vec!["2023-11-05"]);
        assert_eq!(values_of(&matches, "ssn"), vec!["123-45-6789"]);
    }

    #[test]
    fn markdown_heading_is_not_a_hashtag() {
        let matches = extract_simple("# Heading\nword#notatag and #tag");
        assert_eq!(values_of(&matches, "hashtag"), vec!["#tag"]);
    }

    #[test]
    fn simple_extraction_deduplicates_on_type_and_value() {
        let text = "ada@example.org wrote to ada@example.org";
        let matches = extract_simple(text);
        assert_eq!(values_of(&matches, "email").len(), 1);
    }

    #[test]
    fn simple_extraction_is_idempotent() {
        let text = "Call 555-123-4567 or 555-123-4567, email bob@example.com, 50% done";
        let first = extract_simple(text);
        let second = extract_simple(text);
        assert_eq!(first, second);

        let keys = first
            .iter()
            .map(|found| (found.match_type.clone(), found.value.clone()))
            .collect::<HashSet<_>>();
        assert_eq!(keys.len(), first.len());
    }

    #[test]
    fn positions_keep_every_occurrence_of_the_same_value() {
        let text = "See 50% here and 50% there.";
        let matches = extract_with_positions(text, false);
        let percentages = matches
            .iter()
            .filter(|found| found.match_type == "percentage")
            .collect::<Vec<_>>();
        assert_eq!(percentages.len(), 2);
        assert_ne!(percentages[0].start_offset, percentages[1].start_offset);
        for found in percentages {
            let start = found.start_offset.unwrap_or_default();
            let end = found.end_offset.unwrap_or_default();
            assert_eq!(&text[start..end], "50%");
        }
    }

    #[test]
    fn academic_patterns_only_scan_when_requested() {
        let text = "As shown in Figure 2 and Table 1.3 [1, 2] (Smith et al., 2020).";
        assert!(values_of(&extract_with_positions(text, false), "figure_reference").is_empty());

        let matches = extract_with_positions(text, true);
        assert_eq!(values_of(&matches, "figure_reference"), vec!["Figure 2"]);
        assert_eq!(values_of(&matches, "table_reference"), vec!["Table 1.3"]);
        assert_eq!(values_of(&matches, "citation_numeric"), vec!["[1, 2]"]);
        assert_eq!(
            values_of(&matches, "citation_author_year"),
            vec!["(Smith et al., 2020)"]
        );
    }

    #[test]
    fn author_year_citations_accept_joined_authors() {
        let matches = extract_with_positions("(Smith & Doe, 2023) and (Lee and Park, 2019b)", true);
        assert_eq!(
            values_of(&matches, "citation_author_year"),
            vec!["(Smith & Doe, 2023)", "(Lee and Park, 2019b)"]
        );
    }

    #[test]
    fn key_terms_and_definitions_report_inner_text() {
        let text = "A **neural network** is *a layered model* of units.";
        let matches = extract_with_positions(text, true);
        assert_eq!(values_of(&matches, "key_term"), vec!["neural network"]);
        assert_eq!(values_of(&matches, "definition"), vec!["a layered model"]);

        let term = matches
            .iter()
            .find(|found| found.match_type == "key_term")
            .and_then(|found| found.start_offset.zip(found.end_offset))
            .map(|(start, end)| &text[start..end]);
        assert_eq!(term, Some("neural network"));
    }

    #[test]
    fn doi_inside_url_is_claimed_by_both_types() {
        let text = "https://doi.org/10.1000/xyz123 ISBN 978-0-306-40615-7";
        let matches = extract_with_positions(text, true);
        assert_eq!(values_of(&matches, "url").len(), 1);
        assert_eq!(values_of(&matches, "doi"), vec!["10.1000/xyz123"]);
        assert_eq!(values_of(&matches, "isbn"), vec!["ISBN 978-0-306-40615-7"]);
    }

    #[test]
    fn positions_are_sorted_by_offset() {
        let matches = extract_with_positions("#tag then a@b.io then 10%", false);
        let offsets = matches
            .iter()
            .filter_map(|found| found.start_offset)
            .collect::<Vec<_>>();
        let mut sorted = offsets.clone();
        sorted.sort();
        assert_eq!(offsets, sorted);
    }

    #[test]
    fn empty_text_yields_nothing() {
        assert!(extract_simple("").is_empty());
        assert!(extract_with_positions("", true).is_empty());
    }

    #[test]
    fn summarize_counts_per_type() {
        let matches = extract_with_positions("1% 2% a@b.io", false);
        let counts = summarize(&matches);
        assert_eq!(counts.get("percentage"), Some(&2));
        assert_eq!(counts.get("email"), Some(&1));
    }
}
