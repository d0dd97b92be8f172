pub mod bibtex;
pub mod format;
pub mod order;

#[cfg(test)]
mod tests;

pub use format::{format_bibliography_entry, format_in_text_marker};
pub use order::CitationList;

/// Split a stored `"Last, First"` author into its parts. Anything that is not
/// exactly that two-part shape yields `None` and is passed through by the
/// formatters.
pub(crate) fn split_author(author: &str) -> Option<(&str, &str)> {
    let (last, first) = author.split_once(',')?;
    let last = last.trim();
    let first = first.trim();
    if last.is_empty() || first.is_empty() || first.contains(',') {
        return None;
    }
    Some((last, first))
}

/// Surname used for in-text markers and generated keys.
pub(crate) fn surname(author: &str) -> &str {
    match split_author(author) {
        Some((last, _)) => last,
        None => author.split_whitespace().last().unwrap_or(author).trim(),
    }
}

/// `"John Ronald"` → `"J. R."`; hyphenated names keep the hyphen (`"J.-P."`).
pub(crate) fn initials(given: &str) -> String {
    given
        .split_whitespace()
        .map(|name| {
            name.split('-')
                .filter_map(|part| part.chars().next())
                .map(|first| format!("{}.", first.to_uppercase()))
                .collect::<Vec<String>>()
                .join("-")
        })
        .collect::<Vec<String>>()
        .join(" ")
}
