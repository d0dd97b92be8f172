//! BibTeX reader and writer.
//!
//! The reader is tolerant: a malformed entry or one without a title is
//! skipped and scanning resumes at the next `@`.

use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use crate::model::Citation;

use super::surname;

#[allow(clippy::expect_used)]
static AUTHOR_SEPARATOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\s+and\s+").expect("author separator regex is valid"));

const SKIPPED_ENTRY_TYPES: [&str; 3] = ["comment", "preamble", "string"];

pub fn parse(raw: &str) -> Vec<Citation> {
    let mut citations = Vec::new();
    let mut cursor = 0usize;

    while let Some(offset) = raw[cursor..].find('@') {
        let start = cursor + offset;
        match parse_entry(raw, start) {
            Some((entry, end)) => {
                cursor = end;
                if let Some(citation) = entry.into_citation(&raw[start..end]) {
                    citations.push(citation);
                }
            }
            None => {
                debug!(offset = start, "skipping malformed bibtex entry");
                cursor = start + 1;
            }
        }
    }

    citations
}

pub fn serialize(citation: &Citation) -> String {
    let entry_type = citation
        .entry_type
        .as_deref()
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .unwrap_or("article");
    let key = citation
        .citation_key
        .as_deref()
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(ToOwned::to_owned)
        .unwrap_or_else(|| generate_key(citation));

    let mut fields = Vec::<(&str, String)>::new();
    if !citation.title.trim().is_empty() {
        fields.push(("title", citation.title.trim().to_string()));
    }
    if !citation.authors.is_empty() {
        fields.push(("author", citation.authors.join(" and ")));
    }
    if let Some(year) = citation.year {
        fields.push(("year", year.to_string()));
    }
    let optional = [
        ("journal", &citation.journal),
        ("volume", &citation.volume),
        ("pages", &citation.pages),
        ("doi", &citation.doi),
        ("url", &citation.url),
    ];
    for (name, value) in optional {
        if let Some(value) = value.as_deref().map(str::trim).filter(|value| !value.is_empty()) {
            fields.push((name, value.to_string()));
        }
    }

    let mut output = format!("@{entry_type}{{{key}");
    for (name, value) in fields {
        output.push_str(&format!(",\n  {name} = {{{value}}}"));
    }
    output.push_str("\n}");
    output
}

/// `surnameYEARfirstword`, lower-cased ASCII, e.g. `smith2023deep`.
pub fn generate_key(citation: &Citation) -> String {
    let author = citation
        .authors
        .first()
        .map(|author| ascii_word(surname(author)))
        .unwrap_or_else(|| "anon".to_string());
    let year = citation
        .year
        .map(|year| year.to_string())
        .unwrap_or_default();
    let word = citation
        .title
        .split_whitespace()
        .map(ascii_word)
        .find(|word| !word.is_empty())
        .unwrap_or_default();
    format!("{author}{year}{word}")
}

fn ascii_word(word: &str) -> String {
    word.chars()
        .filter(|character| character.is_ascii_alphanumeric())
        .collect::<String>()
        .to_lowercase()
}

#[derive(Debug, Default)]
struct RawEntry {
    entry_type: String,
    key: String,
    fields: Vec<(String, String)>,
}

impl RawEntry {
    fn field(&self, name: &str) -> Option<String> {
        self.fields
            .iter()
            .find(|(field, _)| field == name)
            .map(|(_, value)| value.clone())
            .filter(|value| !value.is_empty())
    }

    fn into_citation(self, raw: &str) -> Option<Citation> {
        if SKIPPED_ENTRY_TYPES.contains(&self.entry_type.as_str()) {
            return None;
        }

        let Some(title) = self.field("title") else {
            debug!(key = %self.key, "skipping bibtex entry without title");
            return None;
        };

        let authors = self
            .field("author")
            .map(|value| {
                AUTHOR_SEPARATOR
                    .split(&value)
                    .map(|author| author.trim().to_string())
                    .filter(|author| !author.is_empty())
                    .collect::<Vec<String>>()
            })
            .unwrap_or_default();

        Some(Citation {
            id: None,
            title,
            authors,
            year: self
                .field("year")
                .and_then(|value| value.trim().parse::<i32>().ok()),
            entry_type: Some(self.entry_type.clone()),
            journal: self.field("journal"),
            volume: self.field("volume"),
            pages: self.field("pages"),
            doi: self.field("doi"),
            url: self.field("url"),
            citation_key: Some(self.key.clone()).filter(|key| !key.is_empty()),
            bibtex_raw: Some(raw.trim().to_string()),
        })
    }
}

struct Scanner<'a> {
    bytes: &'a [u8],
    text: &'a str,
    position: usize,
}

impl<'a> Scanner<'a> {
    fn new(text: &'a str, position: usize) -> Self {
        Self {
            bytes: text.as_bytes(),
            text,
            position,
        }
    }

    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.position).copied()
    }

    fn skip_whitespace(&mut self) {
        while self.peek().map(|byte| byte.is_ascii_whitespace()).unwrap_or(false) {
            self.position += 1;
        }
    }

    fn eat(&mut self, expected: u8) -> bool {
        if self.peek() == Some(expected) {
            self.position += 1;
            return true;
        }
        false
    }

    fn take_while(&mut self, accept: impl Fn(u8) -> bool) -> &'a str {
        let start = self.position;
        while self.peek().map(&accept).unwrap_or(false) {
            self.position += 1;
        }
        &self.text[start..self.position]
    }

    /// Body of a `{...}` value, nested braces balanced. Cursor must be on the
    /// opening brace.
    fn braced(&mut self) -> Option<&'a str> {
        if !self.eat(b'{') {
            return None;
        }
        let start = self.position;
        let mut depth = 1usize;
        while let Some(byte) = self.peek() {
            match byte {
                b'{' => depth += 1,
                b'}' => {
                    depth -= 1;
                    if depth == 0 {
                        let value = &self.text[start..self.position];
                        self.position += 1;
                        return Some(value);
                    }
                }
                _ => {}
            }
            self.position += 1;
        }
        None
    }

    /// Body of a `"..."` value; quotes inside braces do not terminate it.
    fn quoted(&mut self) -> Option<&'a str> {
        if !self.eat(b'"') {
            return None;
        }
        let start = self.position;
        let mut depth = 0usize;
        let mut escaped = false;
        while let Some(byte) = self.peek() {
            match byte {
                b'\\' => escaped = !escaped,
                b'{' => {
                    depth += 1;
                    escaped = false;
                }
                b'}' => {
                    depth = depth.saturating_sub(1);
                    escaped = false;
                }
                b'"' if depth == 0 && !escaped => {
                    let value = &self.text[start..self.position];
                    self.position += 1;
                    return Some(value);
                }
                _ => escaped = false,
            }
            self.position += 1;
        }
        None
    }
}

fn is_identifier(byte: u8) -> bool {
    byte.is_ascii_alphanumeric() || matches!(byte, b'_' | b'-' | b':' | b'.' | b'/' | b'+')
}

/// Parse one entry starting at the `@` at `start`; returns the entry and the
/// byte offset just past its closing delimiter.
fn parse_entry(raw: &str, start: usize) -> Option<(RawEntry, usize)> {
    let mut scanner = Scanner::new(raw, start);
    if !scanner.eat(b'@') {
        return None;
    }

    let entry_type = scanner
        .take_while(|byte| byte.is_ascii_alphabetic())
        .to_ascii_lowercase();
    if entry_type.is_empty() {
        return None;
    }

    scanner.skip_whitespace();
    let closing = match scanner.peek() {
        Some(b'{') => b'}',
        Some(b'(') => b')',
        _ => return None,
    };
    scanner.position += 1;

    if SKIPPED_ENTRY_TYPES.contains(&entry_type.as_str()) {
        let mut depth = 1usize;
        while let Some(byte) = scanner.peek() {
            scanner.position += 1;
            if byte == b'{' || byte == b'(' {
                depth += 1;
            } else if byte == b'}' || byte == b')' {
                depth -= 1;
                if depth == 0 {
                    break;
                }
            }
        }
        let entry = RawEntry {
            entry_type,
            ..RawEntry::default()
        };
        return Some((entry, scanner.position));
    }

    scanner.skip_whitespace();
    let key = scanner
        .take_while(|byte| byte != b',' && byte != closing && !byte.is_ascii_whitespace())
        .to_string();
    scanner.skip_whitespace();

    let mut entry = RawEntry {
        entry_type,
        key,
        fields: Vec::new(),
    };

    loop {
        scanner.skip_whitespace();
        if scanner.eat(closing) {
            return Some((entry, scanner.position));
        }
        if scanner.eat(b',') {
            continue;
        }

        let name = scanner.take_while(is_identifier).to_ascii_lowercase();
        if name.is_empty() {
            return None;
        }
        scanner.skip_whitespace();
        if !scanner.eat(b'=') {
            return None;
        }
        scanner.skip_whitespace();

        let value = match scanner.peek()? {
            b'{' => scanner.braced()?,
            b'"' => scanner.quoted()?,
            _ => scanner.take_while(|byte| byte != b',' && byte != closing && byte != b'\n'),
        };
        entry.fields.push((name, clean_value(value)));
    }
}

/// Drop grouping braces and collapse whitespace runs.
fn clean_value(value: &str) -> String {
    value
        .replace(['{', '}'], "")
        .split_whitespace()
        .collect::<Vec<&str>>()
        .join(" ")
}
