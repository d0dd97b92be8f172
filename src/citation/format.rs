use crate::model::{Citation, CitationStyle};

use super::{initials, split_author, surname};

const APA_MAX_LISTED: usize = 20;
const IEEE_MAX_LISTED: usize = 6;
const CHICAGO_MAX_LISTED: usize = 10;
const CHICAGO_TRUNCATED: usize = 7;

const ANONYMOUS: &str = "Anonymous";

pub fn format_bibliography_entry(citation: &Citation, style: CitationStyle) -> String {
    match style {
        CitationStyle::Apa => apa_entry(citation),
        CitationStyle::Ieee => ieee_entry(citation),
        CitationStyle::Harvard => harvard_entry(citation),
        CitationStyle::Mla => mla_entry(citation),
        CitationStyle::Chicago => chicago_entry(citation),
        CitationStyle::None => String::new(),
    }
}

/// Short inline marker. `ordinal` is the 1-based position of the citation in
/// its owning list and is only read by numeric styles.
pub fn format_in_text_marker(
    authors: &[String],
    year: Option<i32>,
    style: CitationStyle,
    ordinal: usize,
) -> String {
    let surnames = authors
        .iter()
        .map(|author| surname(author))
        .filter(|name| !name.is_empty())
        .collect::<Vec<&str>>();
    let year = year_text(year);

    match style {
        CitationStyle::Apa => {
            let names = match surnames.as_slice() {
                [] => ANONYMOUS.to_string(),
                [only] => only.to_string(),
                [first, second] => format!("{first} & {second}"),
                [first, ..] => format!("{first} et al."),
            };
            format!("({names}, {year})")
        }
        CitationStyle::Ieee => format!("[{ordinal}]"),
        CitationStyle::Harvard => {
            let names = match surnames.as_slice() {
                [] => ANONYMOUS.to_string(),
                [only] => only.to_string(),
                [first, second] => format!("{first} and {second}"),
                [first, second, third] => format!("{first}, {second} and {third}"),
                [first, ..] => format!("{first} et al."),
            };
            format!("({names} {year})")
        }
        CitationStyle::Mla => {
            let names = match surnames.as_slice() {
                [] => ANONYMOUS.to_string(),
                [only] => only.to_string(),
                [first, second] => format!("{first} and {second}"),
                [first, ..] => format!("{first} et al."),
            };
            format!("({names})")
        }
        CitationStyle::Chicago => {
            let names = match surnames.as_slice() {
                [] => ANONYMOUS.to_string(),
                [only] => only.to_string(),
                [first, second] => format!("{first} and {second}"),
                [first, second, third] => format!("{first}, {second}, and {third}"),
                [first, ..] => format!("{first} et al."),
            };
            format!("({names} {year})")
        }
        CitationStyle::None => String::new(),
    }
}

fn year_text(year: Option<i32>) -> String {
    year.map(|value| value.to_string())
        .unwrap_or_else(|| "n.d.".to_string())
}

fn title_text(citation: &Citation) -> &str {
    citation.title.trim().trim_end_matches('.')
}

fn present(value: &Option<String>) -> Option<&str> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|value| !value.is_empty())
}

/// `"Smith, John"` → `"Smith, J."`
fn surname_initials(author: &str) -> String {
    match split_author(author) {
        Some((last, first)) => format!("{last}, {}", initials(first)),
        None => author.trim().to_string(),
    }
}

/// `"Smith, John"` → `"J. Smith"`
fn initials_surname(author: &str) -> String {
    match split_author(author) {
        Some((last, first)) => format!("{} {last}", initials(first)),
        None => author.trim().to_string(),
    }
}

/// `"Smith, John"` → `"John Smith"`
fn natural_order(author: &str) -> String {
    match split_author(author) {
        Some((last, first)) => format!("{first} {last}"),
        None => author.trim().to_string(),
    }
}

/// `"Smith, John"` stays inverted; other shapes pass through.
fn inverted(author: &str) -> String {
    match split_author(author) {
        Some((last, first)) => format!("{last}, {first}"),
        None => author.trim().to_string(),
    }
}

fn serial_join(names: &[String], conjunction: &str) -> String {
    match names {
        [] => String::new(),
        [only] => only.clone(),
        [first, second] => format!("{first} {conjunction} {second}"),
        [init @ .., last] => format!("{}, {conjunction} {last}", init.join(", ")),
    }
}

fn apa_authors(authors: &[String]) -> String {
    let names = authors
        .iter()
        .map(|author| surname_initials(author))
        .collect::<Vec<String>>();

    match names.as_slice() {
        [] => String::new(),
        [only] => only.clone(),
        [first, second] => format!("{first}, & {second}"),
        _ if names.len() <= APA_MAX_LISTED => serial_join(&names, "&"),
        [..] => {
            let listed = names[..APA_MAX_LISTED - 1].join(", ");
            let last = &names[names.len() - 1];
            format!("{listed}, … {last}")
        }
    }
}

fn ieee_authors(authors: &[String]) -> String {
    let names = authors
        .iter()
        .map(|author| initials_surname(author))
        .collect::<Vec<String>>();

    if names.len() > IEEE_MAX_LISTED {
        return format!("{} et al.", names[0]);
    }
    serial_join(&names, "and")
}

fn harvard_authors(authors: &[String]) -> String {
    let names = authors
        .iter()
        .map(|author| surname_initials(author))
        .collect::<Vec<String>>();

    match names.as_slice() {
        [] => String::new(),
        [only] => only.clone(),
        [first, second] => format!("{first} and {second}"),
        [first, second, third] => format!("{first}, {second} and {third}"),
        [first, ..] => format!("{first} et al."),
    }
}

fn mla_authors(authors: &[String]) -> String {
    match authors {
        [] => String::new(),
        [only] => inverted(only),
        [first, second] => format!("{}, and {}", inverted(first), natural_order(second)),
        [first, ..] => format!("{}, et al.", inverted(first)),
    }
}

fn chicago_authors(authors: &[String]) -> String {
    if authors.is_empty() {
        return String::new();
    }

    let listed = if authors.len() > CHICAGO_MAX_LISTED {
        &authors[..CHICAGO_TRUNCATED]
    } else {
        authors
    };

    let names = listed
        .iter()
        .enumerate()
        .map(|(index, author)| {
            if index == 0 {
                inverted(author)
            } else {
                natural_order(author)
            }
        })
        .collect::<Vec<String>>();

    if authors.len() > CHICAGO_MAX_LISTED {
        return format!("{}, et al.", names.join(", "));
    }

    match names.as_slice() {
        [first, second] => format!("{first}, and {second}"),
        _ => serial_join(&names, "and"),
    }
}

fn doi_link(citation: &Citation) -> Option<String> {
    present(&citation.doi)
        .map(|doi| format!("https://doi.org/{doi}"))
        .or_else(|| present(&citation.url).map(ToOwned::to_owned))
}

fn apa_entry(citation: &Citation) -> String {
    let authors = apa_authors(&citation.authors);
    let year = year_text(citation.year);
    let title = title_text(citation);

    let mut entry = if authors.is_empty() {
        format!("{title}. ({year}).")
    } else {
        let authors = authors.trim_end_matches('.');
        format!("{authors}. ({year}). {title}.")
    };

    if let Some(journal) = present(&citation.journal) {
        entry.push_str(&format!(" *{journal}*"));
        if let Some(volume) = present(&citation.volume) {
            entry.push_str(&format!(", *{volume}*"));
        }
        if let Some(pages) = present(&citation.pages) {
            entry.push_str(&format!(", {pages}"));
        }
        entry.push('.');
    }

    if let Some(link) = doi_link(citation) {
        entry.push(' ');
        entry.push_str(&link);
    }

    entry
}

fn ieee_entry(citation: &Citation) -> String {
    let authors = ieee_authors(&citation.authors);
    let title = title_text(citation);

    let mut rest = Vec::<String>::new();
    if let Some(journal) = present(&citation.journal) {
        rest.push(format!("*{journal}*"));
    }
    if let Some(volume) = present(&citation.volume) {
        rest.push(format!("vol. {volume}"));
    }
    if let Some(pages) = present(&citation.pages) {
        rest.push(format!("pp. {pages}"));
    }
    if let Some(year) = citation.year {
        rest.push(year.to_string());
    }
    if let Some(doi) = present(&citation.doi) {
        rest.push(format!("doi: {doi}"));
    }

    let lead = if authors.is_empty() {
        String::new()
    } else {
        format!("{authors}, ")
    };

    if rest.is_empty() {
        format!("{lead}\"{title}.\"")
    } else {
        format!("{lead}\"{title},\" {}.", rest.join(", "))
    }
}

fn harvard_entry(citation: &Citation) -> String {
    let authors = harvard_authors(&citation.authors);
    let year = year_text(citation.year);
    let title = title_text(citation);

    let mut entry = if authors.is_empty() {
        format!("'{title}' ({year})")
    } else {
        format!("{authors} ({year}) '{title}'")
    };

    if let Some(journal) = present(&citation.journal) {
        entry.push_str(&format!(", *{journal}*"));
    }
    if let Some(volume) = present(&citation.volume) {
        entry.push_str(&format!(", {volume}"));
    }
    if let Some(pages) = present(&citation.pages) {
        entry.push_str(&format!(", pp. {pages}"));
    }
    entry.push('.');

    if let Some(link) = doi_link(citation) {
        entry.push_str(&format!(" Available at: {link}."));
    }

    entry
}

fn mla_entry(citation: &Citation) -> String {
    let authors = mla_authors(&citation.authors);
    let title = title_text(citation);

    let mut entry = if authors.is_empty() {
        format!("\"{title}.\"")
    } else {
        format!("{}. \"{title}.\"", authors.trim_end_matches('.'))
    };

    let mut container = Vec::<String>::new();
    if let Some(journal) = present(&citation.journal) {
        container.push(format!("*{journal}*"));
    }
    if let Some(volume) = present(&citation.volume) {
        container.push(format!("vol. {volume}"));
    }
    if let Some(year) = citation.year {
        container.push(year.to_string());
    }
    if let Some(pages) = present(&citation.pages) {
        container.push(format!("pp. {pages}"));
    }
    if !container.is_empty() {
        entry.push(' ');
        entry.push_str(&container.join(", "));
        entry.push('.');
    }

    if let Some(link) = doi_link(citation) {
        entry.push_str(&format!(" {link}."));
    }

    entry
}

fn chicago_entry(citation: &Citation) -> String {
    let authors = chicago_authors(&citation.authors);
    let year = year_text(citation.year);
    let title = title_text(citation);

    let mut entry = if authors.is_empty() {
        format!("\"{title}.\" {year}.")
    } else {
        format!("{}. {year}. \"{title}.\"", authors.trim_end_matches('.'))
    };

    if let Some(journal) = present(&citation.journal) {
        entry.push_str(&format!(" *{journal}*"));
        if let Some(volume) = present(&citation.volume) {
            entry.push_str(&format!(" {volume}"));
        }
        if let Some(pages) = present(&citation.pages) {
            entry.push_str(&format!(": {pages}"));
        }
        entry.push('.');
    }

    if let Some(link) = doi_link(citation) {
        entry.push_str(&format!(" {link}."));
    }

    entry
}
