use std::collections::HashMap;

use super::bibtex;
use super::order::remap_numeric_markers;
use super::*;
use crate::model::{Citation, CitationStyle};

fn authors(names: &[&str]) -> Vec<String> {
    names.iter().map(|name| name.to_string()).collect()
}

fn sample_citation() -> Citation {
    Citation {
        title: "AI".to_string(),
        authors: authors(&["Smith, John", "Doe, Jane"]),
        year: Some(2023),
        journal: Some("Journal of Testing".to_string()),
        volume: Some("12".to_string()),
        pages: Some("1-10".to_string()),
        doi: Some("10.1000/ai.2023".to_string()),
        ..Citation::default()
    }
}

const ALL_STYLES: [CitationStyle; 6] = [
    CitationStyle::Apa,
    CitationStyle::Ieee,
    CitationStyle::Harvard,
    CitationStyle::Mla,
    CitationStyle::Chicago,
    CitationStyle::None,
];

#[test]
fn apa_two_author_marker_joins_with_ampersand() {
    let citation = sample_citation();
    let marker = format_in_text_marker(&citation.authors, citation.year, CitationStyle::Apa, 1);
    assert_eq!(marker, "(Smith & Doe, 2023)");
}

#[test]
fn ieee_marker_uses_caller_ordinal() {
    let citation = sample_citation();
    assert_eq!(
        format_in_text_marker(&citation.authors, citation.year, CitationStyle::Ieee, 1),
        "[1]"
    );
    assert_eq!(
        format_in_text_marker(&citation.authors, citation.year, CitationStyle::Ieee, 7),
        "[7]"
    );
}

#[test]
fn style_none_yields_empty_strings() {
    let citation = sample_citation();
    assert_eq!(format_bibliography_entry(&citation, CitationStyle::None), "");
    assert_eq!(
        format_in_text_marker(&citation.authors, citation.year, CitationStyle::None, 3),
        ""
    );
    assert_eq!(format_bibliography_entry(&Citation::default(), CitationStyle::None), "");
}

#[test]
fn every_style_handles_a_bare_citation() {
    let citation = Citation {
        title: "Untitled Notes".to_string(),
        ..Citation::default()
    };
    for style in ALL_STYLES {
        let entry = format_bibliography_entry(&citation, style);
        if style == CitationStyle::None {
            assert!(entry.is_empty());
        } else {
            assert!(entry.contains("Untitled Notes"), "{style:?}: {entry}");
        }
        let _ = format_in_text_marker(&citation.authors, citation.year, style, 1);
    }
}

#[test]
fn in_text_markers_collapse_authors_per_style() {
    let three = authors(&["Smith, John", "Doe, Jane", "Lee, Ann"]);
    let four = authors(&["Smith, John", "Doe, Jane", "Lee, Ann", "Park, Min"]);

    assert_eq!(
        format_in_text_marker(&three, Some(2020), CitationStyle::Apa, 1),
        "(Smith et al., 2020)"
    );
    assert_eq!(
        format_in_text_marker(&three, Some(2020), CitationStyle::Harvard, 1),
        "(Smith, Doe and Lee 2020)"
    );
    assert_eq!(
        format_in_text_marker(&four, Some(2020), CitationStyle::Harvard, 1),
        "(Smith et al. 2020)"
    );
    assert_eq!(
        format_in_text_marker(&three, Some(2020), CitationStyle::Mla, 1),
        "(Smith et al.)"
    );
    assert_eq!(
        format_in_text_marker(&three, Some(2020), CitationStyle::Chicago, 1),
        "(Smith, Doe, and Lee 2020)"
    );
    assert_eq!(
        format_in_text_marker(&[], None, CitationStyle::Apa, 1),
        "(Anonymous, n.d.)"
    );
}

#[test]
fn apa_entry_formats_names_as_surname_initials() {
    let entry = format_bibliography_entry(&sample_citation(), CitationStyle::Apa);
    assert_eq!(
        entry,
        "Smith, J., & Doe, J. (2023). AI. *Journal of Testing*, *12*, 1-10. https://doi.org/10.1000/ai.2023"
    );
}

#[test]
fn ieee_entry_formats_names_as_initials_surname() {
    let entry = format_bibliography_entry(&sample_citation(), CitationStyle::Ieee);
    assert_eq!(
        entry,
        "J. Smith and J. Doe, \"AI,\" *Journal of Testing*, vol. 12, pp. 1-10, 2023, doi: 10.1000/ai.2023."
    );
}

#[test]
fn harvard_mla_and_chicago_entries() {
    let citation = sample_citation();
    assert_eq!(
        format_bibliography_entry(&citation, CitationStyle::Harvard),
        "Smith, J. and Doe, J. (2023) 'AI', *Journal of Testing*, 12, pp. 1-10. Available at: https://doi.org/10.1000/ai.2023."
    );
    assert_eq!(
        format_bibliography_entry(&citation, CitationStyle::Mla),
        "Smith, John, and Jane Doe. \"AI.\" *Journal of Testing*, vol. 12, 2023, pp. 1-10. https://doi.org/10.1000/ai.2023."
    );
    assert_eq!(
        format_bibliography_entry(&citation, CitationStyle::Chicago),
        "Smith, John, and Jane Doe. 2023. \"AI.\" *Journal of Testing* 12: 1-10. https://doi.org/10.1000/ai.2023."
    );
}

#[test]
fn author_names_outside_last_first_shape_pass_through() {
    let citation = Citation {
        title: "Report".to_string(),
        authors: authors(&["World Health Organization"]),
        year: Some(2021),
        ..Citation::default()
    };
    assert_eq!(
        format_bibliography_entry(&citation, CitationStyle::Ieee),
        "World Health Organization, \"Report,\" 2021."
    );
    assert_eq!(
        format_in_text_marker(&citation.authors, citation.year, CitationStyle::Apa, 1),
        "(Organization, 2021)"
    );
}

#[test]
fn apa_lists_up_to_twenty_authors_then_elides() {
    let many = (1..=22)
        .map(|index| format!("Author{index}, Given"))
        .collect::<Vec<String>>();

    let twenty = Citation {
        title: "Big Team".to_string(),
        authors: many[..20].to_vec(),
        year: Some(2022),
        ..Citation::default()
    };
    let entry = format_bibliography_entry(&twenty, CitationStyle::Apa);
    assert!(entry.contains("Author19, G., & Author20, G."), "{entry}");

    let twenty_two = Citation {
        authors: many.clone(),
        ..twenty
    };
    let entry = format_bibliography_entry(&twenty_two, CitationStyle::Apa);
    assert!(entry.contains("Author19, G., … Author22, G."), "{entry}");
    assert!(!entry.contains("Author20,"), "{entry}");
}

#[test]
fn ieee_lists_six_authors_then_uses_et_al() {
    let six = (1..=6)
        .map(|index| format!("Author{index}, Given"))
        .collect::<Vec<String>>();
    let citation = Citation {
        title: "Six".to_string(),
        authors: six.clone(),
        ..Citation::default()
    };
    let entry = format_bibliography_entry(&citation, CitationStyle::Ieee);
    assert!(entry.starts_with("G. Author1, G. Author2, G. Author3, G. Author4, G. Author5, and G. Author6"));

    let mut seven = six;
    seven.push("Author7, Given".to_string());
    let citation = Citation {
        authors: seven,
        ..citation
    };
    let entry = format_bibliography_entry(&citation, CitationStyle::Ieee);
    assert!(entry.starts_with("G. Author1 et al., "), "{entry}");
}

#[test]
fn bibtex_parses_braced_and_quoted_fields() {
    let raw = r#"
    @article{smith2023ai,
      title = {Deep {Learning} for Everyone},
      author = {Smith, John and Doe, Jane AND Lee, Ann},
      year = {2023},
      journal = "Journal of Testing",
      volume = 12,
      pages = {1--10}
    }
    "#;

    let citations = bibtex::parse(raw);
    assert_eq!(citations.len(), 1);
    let citation = &citations[0];
    assert_eq!(citation.title, "Deep Learning for Everyone");
    assert_eq!(citation.authors, vec!["Smith, John", "Doe, Jane", "Lee, Ann"]);
    assert_eq!(citation.year, Some(2023));
    assert_eq!(citation.journal.as_deref(), Some("Journal of Testing"));
    assert_eq!(citation.volume.as_deref(), Some("12"));
    assert_eq!(citation.pages.as_deref(), Some("1--10"));
    assert_eq!(citation.citation_key.as_deref(), Some("smith2023ai"));
    assert_eq!(citation.entry_type.as_deref(), Some("article"));
    assert!(citation.doi.is_none());
    assert!(citation.url.is_none());
    assert!(citation.bibtex_raw.as_deref().unwrap_or_default().starts_with("@article"));
}

#[test]
fn bibtex_unparseable_year_becomes_none() {
    let citations = bibtex::parse("@book{k, title={Draft}, year={forthcoming}}");
    assert_eq!(citations.len(), 1);
    assert_eq!(citations[0].year, None);
}

#[test]
fn bibtex_malformed_entry_does_not_abort_import() {
    let raw = "@article{broken, title = {Never closed\n\
               @misc{ok, title = {Survivor}, year = 2020}\n\
               @comment{ignored}\n\
               @misc{notitle, year = 2001}";
    let citations = bibtex::parse(raw);
    let titles = citations.iter().map(|citation| citation.title.as_str()).collect::<Vec<_>>();
    assert_eq!(titles, vec!["Survivor"]);
}

#[test]
fn bibtex_empty_input_yields_nothing() {
    assert!(bibtex::parse("").is_empty());
    assert!(bibtex::parse("no entries here").is_empty());
}

#[test]
fn bibtex_serializer_omits_absent_fields() {
    let citation = Citation {
        title: "Only Title".to_string(),
        ..Citation::default()
    };
    let serialized = bibtex::serialize(&citation);
    assert_eq!(serialized, "@article{anononly,\n  title = {Only Title}\n}");
    assert!(!serialized.contains("{}"));
}

#[test]
fn bibtex_round_trip_preserves_title_authors_and_year() {
    let entries = [
        "@article{a1, author = {Smith, John and Doe, Jane}, title = {First Paper}, year = {2021}}",
        "@inproceedings{b2, title = \"Second {Paper}\", author = \"Lee, Ann\", year = 1999, doi = {10.1/xyz}}",
        "@book{c3, title = {Third}, author = {Zed, Zoe and Young, Yan and Xu, Xi}, year = {n.d.}}",
    ];

    for raw in entries {
        let first = bibtex::parse(raw);
        assert_eq!(first.len(), 1, "{raw}");
        let again = bibtex::parse(&bibtex::serialize(&first[0]));
        assert_eq!(again.len(), 1, "{raw}");
        assert_eq!(again[0].title, first[0].title);
        assert_eq!(again[0].authors, first[0].authors);
        assert_eq!(again[0].year, first[0].year);
        assert_eq!(again[0].citation_key, first[0].citation_key);
    }
}

#[test]
fn generated_key_uses_surname_year_and_first_word() {
    let citation = Citation {
        title: "The Deep Dive".to_string(),
        authors: authors(&["O'Brien, Pat"]),
        year: Some(2019),
        ..Citation::default()
    };
    assert_eq!(bibtex::generate_key(&citation), "obrien2019the");
}

#[test]
fn citation_list_regenerates_numeric_markers_after_move() {
    let first = Citation {
        title: "A".to_string(),
        authors: authors(&["Alpha, A"]),
        ..Citation::default()
    };
    let second = Citation {
        title: "B".to_string(),
        authors: authors(&["Beta, B"]),
        ..Citation::default()
    };
    let third = Citation {
        title: "C".to_string(),
        authors: authors(&["Gamma, C"]),
        ..Citation::default()
    };
    let mut list = CitationList::new(vec![first, second, third]);
    assert_eq!(list.in_text_markers(CitationStyle::Ieee), vec!["[1]", "[2]", "[3]"]);

    let mapping = list.move_citation(2, 0);
    assert_eq!(list.citations()[0].title, "C");
    assert_eq!(mapping.get(&3), Some(&1));
    assert_eq!(mapping.get(&1), Some(&2));
    assert_eq!(mapping.get(&2), Some(&3));

    let body = "Alpha [1] then beta [2] and gamma [3], jointly [1, 3].";
    assert_eq!(
        remap_numeric_markers(body, &mapping),
        "Alpha [2] then beta [3] and gamma [1], jointly [2, 1]."
    );
    assert_eq!(list.marker_at(0, CitationStyle::Ieee).as_deref(), Some("[1]"));
}

#[test]
fn citation_list_bibliography_prefixes_ieee_numbers() {
    let list = CitationList::new(vec![sample_citation()]);
    let lines = list.bibliography(CitationStyle::Ieee);
    assert_eq!(lines.len(), 1);
    assert!(lines[0].starts_with("[1] J. Smith and J. Doe"));
    assert!(list.bibliography(CitationStyle::None).is_empty());
}

#[test]
fn removing_citation_shifts_later_numbers_down() {
    let mut list = CitationList::new(vec![
        sample_citation(),
        sample_citation(),
        sample_citation(),
    ]);
    let (_, mapping) = list.remove(0).unwrap_or_else(|| (Citation::default(), HashMap::new()));
    assert_eq!(list.len(), 2);
    assert_eq!(mapping.get(&2), Some(&1));
    assert_eq!(mapping.get(&3), Some(&2));
    assert_eq!(remap_numeric_markers("[3]", &mapping), "[2]");
}

#[test]
fn remapping_leaves_code_and_subscripts_untouched() {
    let mapping = HashMap::from([(1, 2), (2, 1)]);
    let body = "See [1].\n```\nlet x = arr[1];\nlet y = [2];\n```\nThen [2] and `v[1]` or `[1]`, not matrix[2] or f(x)[1].\r\nDone [1, 2]";
    assert_eq!(
        remap_numeric_markers(body, &mapping),
        "See [2].\n```\nlet x = arr[1];\nlet y = [2];\n```\nThen [1] and `v[1]` or `[1]`, not matrix[2] or f(x)[1].\r\nDone [2, 1]"
    );
}

#[test]
fn unmatched_backtick_does_not_hide_markers() {
    let mapping = HashMap::from([(1, 3)]);
    assert_eq!(remap_numeric_markers("a ` stray [1]", &mapping), "a ` stray [3]");
    assert_eq!(remap_numeric_markers("(see [1])", &mapping), "(see [3])");
}

#[test]
fn initials_handle_multiple_and_hyphenated_names() {
    assert_eq!(initials("John Ronald"), "J. R.");
    assert_eq!(initials("Jean-Paul"), "J.-P.");
    assert_eq!(split_author("Madonna"), None);
    assert_eq!(split_author("Smith, John"), Some(("Smith", "John")));
}
