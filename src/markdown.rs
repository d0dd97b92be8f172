//! Markdown to block sequence.
//!
//! A single forward pass over lines. Inline emphasis is left in place and
//! only resolved by [`split_inline_runs`] when a renderer needs styled text.

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use crate::model::Block;

#[allow(clippy::expect_used)]
static TABLE_SEPARATOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\|[\s\-:]+\|").expect("table separator regex is valid"));

#[allow(clippy::expect_used)]
static ORDERED_ITEM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d+\.\s").expect("ordered list regex is valid"));

#[allow(clippy::expect_used)]
static INLINE_EMPHASIS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\*\*([^*]+)\*\*|\*([^*]+)\*").expect("inline emphasis regex is valid")
});

const HEADING_PREFIXES: [(&str, u8); 4] = [("#### ", 4), ("### ", 3), ("## ", 2), ("# ", 1)];

pub fn parse(markdown: &str) -> Vec<Block> {
    let mut blocks = Vec::new();
    let mut code_lines: Option<Vec<&str>> = None;
    let mut table_rows: Option<Vec<Vec<String>>> = None;

    for line in markdown.lines() {
        let trimmed = line.trim();

        if trimmed.starts_with("```") {
            match code_lines.take() {
                Some(lines) => blocks.push(Block::Code {
                    text: lines.join("\n"),
                }),
                None => {
                    flush_table(&mut table_rows, &mut blocks);
                    code_lines = Some(Vec::new());
                }
            }
            continue;
        }

        if let Some(lines) = code_lines.as_mut() {
            lines.push(line);
            continue;
        }

        if is_table_line(trimmed) {
            let rows = table_rows.get_or_insert_with(Vec::new);
            if !TABLE_SEPARATOR.is_match(trimmed) {
                rows.push(split_table_row(trimmed));
            }
            continue;
        }
        flush_table(&mut table_rows, &mut blocks);

        if trimmed.is_empty() {
            blocks.push(Block::Blank);
            continue;
        }

        if let Some((level, text)) = heading_of(trimmed) {
            blocks.push(Block::Heading {
                level,
                text: text.trim().to_string(),
            });
            continue;
        }

        if let Some(found) = ORDERED_ITEM.find(trimmed) {
            blocks.push(Block::OrderedListItem {
                text: trimmed[found.end()..].trim().to_string(),
            });
            continue;
        }

        if let Some(rest) = trimmed
            .strip_prefix("- ")
            .or_else(|| trimmed.strip_prefix("* "))
        {
            blocks.push(Block::ListItem {
                text: rest.trim().to_string(),
            });
            continue;
        }

        blocks.push(Block::Paragraph {
            text: trimmed.to_string(),
        });
    }

    if let Some(lines) = code_lines.take() {
        blocks.push(Block::Code {
            text: lines.join("\n"),
        });
    }
    flush_table(&mut table_rows, &mut blocks);

    blocks
}

fn heading_of(line: &str) -> Option<(u8, &str)> {
    HEADING_PREFIXES
        .iter()
        .find_map(|(prefix, level)| line.strip_prefix(prefix).map(|rest| (*level, rest)))
}

fn is_table_line(line: &str) -> bool {
    line.strip_prefix('|')
        .map(|rest| rest.contains('|'))
        .unwrap_or(false)
}

fn split_table_row(line: &str) -> Vec<String> {
    let mut cells = line.split('|').collect::<Vec<&str>>();
    if cells.first().map(|cell| cell.trim().is_empty()).unwrap_or(false) {
        cells.remove(0);
    }
    if cells.last().map(|cell| cell.trim().is_empty()).unwrap_or(false) {
        cells.pop();
    }
    cells.into_iter().map(|cell| cell.trim().to_string()).collect()
}

/// Rows are normalised to the header width: short rows are padded with empty
/// cells, long rows are truncated.
fn flush_table(table_rows: &mut Option<Vec<Vec<String>>>, blocks: &mut Vec<Block>) {
    let Some(mut rows) = table_rows.take() else {
        return;
    };
    if rows.is_empty() {
        return;
    }

    let width = rows[0].len();
    for row in rows.iter_mut().skip(1) {
        row.resize(width, String::new());
    }
    blocks.push(Block::Table { rows });
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InlineRun {
    pub text: String,
    pub bold: bool,
    pub italic: bool,
}

impl InlineRun {
    fn plain(text: &str) -> Self {
        Self {
            text: text.to_string(),
            bold: false,
            italic: false,
        }
    }
}

/// Split `**bold**` and `*italic*` spans into styled runs. Unmatched markers
/// stay in the text as literal asterisks.
pub fn split_inline_runs(text: &str) -> Vec<InlineRun> {
    let mut runs = Vec::new();
    let mut cursor = 0usize;

    for captures in INLINE_EMPHASIS.captures_iter(text) {
        let Some(whole) = captures.get(0) else {
            continue;
        };
        if whole.start() > cursor {
            runs.push(InlineRun::plain(&text[cursor..whole.start()]));
        }

        if let Some(bold) = captures.get(1) {
            runs.push(InlineRun {
                text: bold.as_str().to_string(),
                bold: true,
                italic: false,
            });
        } else if let Some(italic) = captures.get(2) {
            runs.push(InlineRun {
                text: italic.as_str().to_string(),
                bold: false,
                italic: true,
            });
        }
        cursor = whole.end();
    }

    if cursor < text.len() {
        runs.push(InlineRun::plain(&text[cursor..]));
    }

    runs
}

pub fn strip_inline_markers(text: &str) -> String {
    split_inline_runs(text)
        .into_iter()
        .map(|run| run.text)
        .collect::<String>()
}
