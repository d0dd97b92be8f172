//! Caller-ordered citation lists.
//!
//! Numeric markers are positional, so any reorder invalidates every marker
//! already written into body text. `CitationList` regenerates the full marker
//! set and `remap_numeric_markers` rewrites inserted `[n]` markers.

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;

use crate::model::{Citation, CitationStyle};

use super::format::{format_bibliography_entry, format_in_text_marker};

#[allow(clippy::expect_used)]
static NUMERIC_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[(\d+(?:\s*,\s*\d+)*)\]").expect("numeric marker regex is valid"));

#[derive(Debug, Clone, Default)]
pub struct CitationList {
    citations: Vec<Citation>,
}

impl CitationList {
    pub fn new(citations: Vec<Citation>) -> Self {
        Self { citations }
    }

    pub fn citations(&self) -> &[Citation] {
        &self.citations
    }

    pub fn len(&self) -> usize {
        self.citations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.citations.is_empty()
    }

    pub fn push(&mut self, citation: Citation) {
        self.citations.push(citation);
    }

    /// In-text marker for the citation at `index`, numbered from its current
    /// position.
    pub fn marker_at(&self, index: usize, style: CitationStyle) -> Option<String> {
        self.citations.get(index).map(|citation| {
            format_in_text_marker(&citation.authors, citation.year, style, index + 1)
        })
    }

    /// Markers for every citation in list order. Must be regenerated after
    /// any reorder.
    pub fn in_text_markers(&self, style: CitationStyle) -> Vec<String> {
        self.citations
            .iter()
            .enumerate()
            .map(|(index, citation)| {
                format_in_text_marker(&citation.authors, citation.year, style, index + 1)
            })
            .collect()
    }

    /// Bibliography lines in list order. Numeric styles are prefixed with
    /// their marker.
    pub fn bibliography(&self, style: CitationStyle) -> Vec<String> {
        if style == CitationStyle::None {
            return Vec::new();
        }

        self.citations
            .iter()
            .enumerate()
            .map(|(index, citation)| {
                let entry = format_bibliography_entry(citation, style);
                if style == CitationStyle::Ieee {
                    format!("[{}] {entry}", index + 1)
                } else {
                    entry
                }
            })
            .collect()
    }

    /// Move the citation at `from` to `to` and return the old→new 1-based
    /// number mapping for every citation whose position changed.
    pub fn move_citation(&mut self, from: usize, to: usize) -> HashMap<usize, usize> {
        if from >= self.citations.len() || to >= self.citations.len() || from == to {
            return HashMap::new();
        }

        let mut positions = (0..self.citations.len()).collect::<Vec<usize>>();
        let citation = self.citations.remove(from);
        self.citations.insert(to, citation);
        let moved = positions.remove(from);
        positions.insert(to, moved);

        positions
            .into_iter()
            .enumerate()
            .filter(|(new_index, old_index)| new_index != old_index)
            .map(|(new_index, old_index)| (old_index + 1, new_index + 1))
            .collect()
    }

    /// Remove the citation at `index`; later citations shift down by one.
    pub fn remove(&mut self, index: usize) -> Option<(Citation, HashMap<usize, usize>)> {
        if index >= self.citations.len() {
            return None;
        }

        let removed = self.citations.remove(index);
        let mapping = ((index + 1)..=self.citations.len())
            .map(|new_index| (new_index + 1, new_index))
            .collect();
        Some((removed, mapping))
    }
}

/// Rewrite `[n]` / `[n, m]` markers in `body` through `mapping` (old → new
/// 1-based numbers). Numbers absent from the mapping are left untouched.
///
/// Only prose is rewritten: fenced code blocks, inline code spans and
/// subscripts such as `arr[1]` or `f(x)[2]` keep their brackets.
pub fn remap_numeric_markers(body: &str, mapping: &HashMap<usize, usize>) -> String {
    if mapping.is_empty() {
        return body.to_string();
    }

    let mut output = String::with_capacity(body.len());
    let mut in_fence = false;
    for line in body.split_inclusive('\n') {
        if line.trim().starts_with("```") {
            in_fence = !in_fence;
            output.push_str(line);
            continue;
        }
        if in_fence {
            output.push_str(line);
            continue;
        }

        let segments = line.split('`').collect::<Vec<&str>>();
        for (index, segment) in segments.iter().enumerate() {
            if index > 0 {
                output.push('`');
            }
            // An unmatched trailing backtick opens no span.
            let in_code_span = index % 2 == 1 && index + 1 < segments.len();
            if in_code_span {
                output.push_str(segment);
            } else {
                output.push_str(&remap_prose(segment, mapping));
            }
        }
    }
    output
}

fn remap_prose(text: &str, mapping: &HashMap<usize, usize>) -> String {
    let mut output = String::with_capacity(text.len());
    let mut last = 0;
    for captures in NUMERIC_MARKER.captures_iter(text) {
        let Some(whole) = captures.get(0) else {
            continue;
        };
        output.push_str(&text[last..whole.start()]);
        last = whole.end();

        if follows_operand(&text[..whole.start()]) {
            output.push_str(whole.as_str());
            continue;
        }

        let numbers = captures[1]
            .split(',')
            .map(|part| {
                let trimmed = part.trim();
                match trimmed.parse::<usize>() {
                    Ok(number) => mapping.get(&number).copied().unwrap_or(number).to_string(),
                    Err(_) => trimmed.to_string(),
                }
            })
            .collect::<Vec<String>>();
        output.push('[');
        output.push_str(&numbers.join(", "));
        output.push(']');
    }
    output.push_str(&text[last..]);
    output
}

fn follows_operand(before: &str) -> bool {
    before
        .chars()
        .next_back()
        .is_some_and(|character| character.is_alphanumeric() || matches!(character, '_' | ']' | ')'))
}
