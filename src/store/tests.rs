use super::*;
use crate::model::{AcademicDetails, AcademicReportConfig, Citation, CitationStyle};
use crate::template::Template;

fn store() -> SqliteStore {
    SqliteStore::open_in_memory("user-a").expect("open in-memory store")
}

fn new_report(title: &str, content: &str) -> NewReport {
    NewReport {
        title: title.to_string(),
        content: content.to_string(),
        ..NewReport::default()
    }
}

fn citation(title: &str, author: &str, year: i32) -> Citation {
    Citation {
        title: title.to_string(),
        authors: vec![author.to_string()],
        year: Some(year),
        ..Citation::default()
    }
}

#[test]
fn open_requires_user_id() {
    let error = SqliteStore::open_in_memory("  ").err().expect("blank user rejected");
    assert!(matches!(error, ReportError::Validation { field: "user id", .. }));
}

#[test]
fn schema_version_is_recorded() {
    let store = store();
    assert_eq!(store.schema_version().expect("version").as_deref(), Some(DB_SCHEMA_VERSION));
}

#[test]
fn reopening_file_database_keeps_rows() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("reports.sqlite");

    let id = {
        let store = SqliteStore::open(&path, "user-a").expect("open");
        store.create_report(new_report("Kept", "body")).expect("create").id
    };

    let store = SqliteStore::open(&path, "user-a").expect("reopen");
    assert_eq!(store.get_report(&id).expect("report").title, "Kept");
}

#[test]
fn create_report_defaults_template_and_hashes_content() {
    let store = store();
    let report = store.create_report(new_report("  Quarterly  ", "abc")).expect("create");

    assert_eq!(report.title, "Quarterly");
    assert_eq!(report.template_id, "standard");
    assert_eq!(report.content_sha256, crate::util::sha256_hex(b"abc"));
    assert_eq!(report.user_id, "user-a");
    assert_eq!(report.id.len(), 36);
}

#[test]
fn create_report_requires_title() {
    let store = store();
    let error = store.create_report(new_report(" ", "body")).err().expect("rejected");
    assert!(matches!(error, ReportError::Validation { field: "title", .. }));
}

#[test]
fn update_report_rehashes_and_keeps_untouched_fields() {
    let store = store();
    let created = store.create_report(new_report("Draft", "one")).expect("create");

    let updated = store
        .update_report(
            &created.id,
            ReportUpdate {
                content: Some("two".to_string()),
                ..ReportUpdate::default()
            },
        )
        .expect("update");

    assert_eq!(updated.title, "Draft");
    assert_eq!(updated.content, "two");
    assert_eq!(updated.content_sha256, crate::util::sha256_hex(b"two"));

    let reloaded = store.get_report(&created.id).expect("reload");
    assert_eq!(reloaded.content, "two");
    assert_eq!(reloaded.content_sha256, updated.content_sha256);
}

#[test]
fn list_reports_newest_first() {
    let store = store();
    let first = store.create_report(new_report("First", "")).expect("first");
    let second = store.create_report(new_report("Second", "")).expect("second");

    let ids = store
        .list_reports()
        .expect("list")
        .into_iter()
        .map(|report| report.id)
        .collect::<Vec<String>>();
    assert_eq!(ids, vec![second.id, first.id]);
}

#[test]
fn missing_report_is_not_found() {
    let store = store();
    assert!(matches!(
        store.get_report("nope"),
        Err(ReportError::NotFound { entity: "report", .. })
    ));
    assert!(matches!(
        store.delete_report("nope"),
        Err(ReportError::NotFound { entity: "report", .. })
    ));
}

#[test]
fn rows_are_scoped_to_their_user() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("shared.sqlite");
    let alice = SqliteStore::open(&path, "alice").expect("alice");
    let bob = SqliteStore::open(&path, "bob").expect("bob");

    let report = alice.create_report(new_report("Private", "x")).expect("create");
    alice.add_citation(None, &citation("Paper", "Smith, John", 2020)).expect("cite");

    assert!(bob.list_reports().expect("list").is_empty());
    assert!(bob.get_report(&report.id).is_err());
    assert!(bob.delete_report(&report.id).is_err());
    assert!(bob.list_citations(None).expect("citations").is_empty());
    assert_eq!(alice.list_reports().expect("list").len(), 1);
}

#[test]
fn asset_numbers_count_per_kind() {
    let store = store();
    let report = store.create_report(new_report("Assets", "")).expect("create");

    let figure_one = store
        .add_asset(&report.id, AssetKind::Figure, "Setup", "https://example.org/a.png")
        .expect("figure");
    let table_one = store
        .add_asset(&report.id, AssetKind::Table, "Results", "a,b\n1,2")
        .expect("table");
    let figure_two = store
        .add_asset(&report.id, AssetKind::Figure, "Output", "https://example.org/b.png")
        .expect("figure");

    assert_eq!(figure_one.number, 1);
    assert_eq!(table_one.number, 1);
    assert_eq!(figure_two.number, 2);
    assert_eq!(store.list_assets(&report.id).expect("assets").len(), 3);
}

#[test]
fn deleting_report_removes_its_assets() {
    let store = store();
    let report = store.create_report(new_report("Gone", "")).expect("create");
    store
        .add_asset(&report.id, AssetKind::Table, "T", "a,b")
        .expect("asset");

    store.delete_report(&report.id).expect("delete");
    assert!(store.list_assets(&report.id).expect("assets").is_empty());
}

#[test]
fn citations_keep_insertion_order() {
    let store = store();
    store.add_citation(None, &citation("Alpha", "Smith, John", 2020)).expect("a");
    store.add_citation(None, &citation("Beta", "Doe, Jane", 2019)).expect("b");
    store.add_citation(None, &citation("Gamma", "Roe, Rick", 2021)).expect("c");

    let titles = store
        .list_citations(None)
        .expect("list")
        .into_iter()
        .map(|citation| citation.title)
        .collect::<Vec<String>>();
    assert_eq!(titles, vec!["Alpha", "Beta", "Gamma"]);

    let markers = store.citation_list(None).expect("list").in_text_markers(CitationStyle::Ieee);
    assert_eq!(markers, vec!["[1]", "[2]", "[3]"]);
}

#[test]
fn add_citation_requires_title() {
    let store = store();
    let error = store.add_citation(None, &citation(" ", "Smith, John", 2020)).err().expect("rejected");
    assert!(matches!(error, ReportError::Validation { field: "title", .. }));
}

#[test]
fn move_citation_persists_order_and_returns_mapping() {
    let store = store();
    store.add_citation(None, &citation("Alpha", "Smith, John", 2020)).expect("a");
    store.add_citation(None, &citation("Beta", "Doe, Jane", 2019)).expect("b");
    store.add_citation(None, &citation("Gamma", "Roe, Rick", 2021)).expect("c");

    let mapping = store.move_citation(None, 2, 0).expect("move");
    assert_eq!(mapping.get(&3), Some(&1));
    assert_eq!(mapping.get(&1), Some(&2));
    assert_eq!(mapping.get(&2), Some(&3));

    let titles = store
        .list_citations(None)
        .expect("list")
        .into_iter()
        .map(|citation| citation.title)
        .collect::<Vec<String>>();
    assert_eq!(titles, vec!["Gamma", "Alpha", "Beta"]);

    assert!(store.move_citation(None, 0, 7).is_err());
}

#[test]
fn delete_citation_closes_the_gap() {
    let store = store();
    let first = store.add_citation(None, &citation("Alpha", "Smith, John", 2020)).expect("a");
    store.add_citation(None, &citation("Beta", "Doe, Jane", 2019)).expect("b");

    store
        .delete_citation(first.id.as_deref().expect("stored id"))
        .expect("delete");
    store.add_citation(None, &citation("Gamma", "Roe, Rick", 2021)).expect("c");

    let titles = store
        .list_citations(None)
        .expect("list")
        .into_iter()
        .map(|citation| citation.title)
        .collect::<Vec<String>>();
    assert_eq!(titles, vec!["Beta", "Gamma"]);
    assert!(matches!(
        store.delete_citation("missing"),
        Err(ReportError::NotFound { entity: "citation", .. })
    ));
}

fn titles(citations: Vec<Citation>) -> Vec<String> {
    citations.into_iter().map(|citation| citation.title).collect()
}

#[test]
fn reopening_a_version_two_database_adds_citation_report_column() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("v2.sqlite");
    {
        let connection = rusqlite::Connection::open(&path).expect("raw open");
        connection
            .execute_batch(
                "CREATE TABLE citations (
                   id TEXT PRIMARY KEY,
                   user_id TEXT NOT NULL,
                   position INTEGER NOT NULL,
                   title TEXT NOT NULL,
                   authors TEXT NOT NULL DEFAULT '[]',
                   year INTEGER,
                   entry_type TEXT,
                   journal TEXT,
                   volume TEXT,
                   pages TEXT,
                   doi TEXT,
                   url TEXT,
                   citation_key TEXT,
                   bibtex_raw TEXT,
                   created_at TEXT NOT NULL
                 );
                 INSERT INTO citations(id, user_id, position, title, created_at)
                 VALUES('old', 'user-a', 0, 'Legacy', '2024-01-01T00:00:00Z');",
            )
            .expect("legacy schema");
    }

    let store = SqliteStore::open(&path, "user-a").expect("migrate");
    assert_eq!(store.schema_version().expect("version").as_deref(), Some("3"));
    assert_eq!(titles(store.list_citations(None).expect("library")), vec!["Legacy"]);
}

#[test]
fn each_report_numbers_its_own_citations() {
    let store = store();
    let first = store.create_report(new_report("First", "")).expect("first");
    let second = store.create_report(new_report("Second", "")).expect("second");

    store.add_citation(Some(&first.id), &citation("Alpha", "Smith, John", 2020)).expect("a");
    store.add_citation(Some(&first.id), &citation("Beta", "Doe, Jane", 2019)).expect("b");
    store.add_citation(Some(&second.id), &citation("Gamma", "Roe, Rick", 2021)).expect("c");
    store.add_citation(None, &citation("Loose", "Poe, Ed", 2018)).expect("loose");

    let markers = store
        .citation_list(Some(&second.id))
        .expect("second list")
        .in_text_markers(CitationStyle::Ieee);
    assert_eq!(markers, vec!["[1]"]);
    assert_eq!(titles(store.list_citations(Some(&first.id)).expect("first")), vec!["Alpha", "Beta"]);
    assert_eq!(titles(store.list_citations(None).expect("library")), vec!["Loose"]);

    let mapping = store.move_citation(Some(&first.id), 1, 0).expect("move");
    assert_eq!(mapping.get(&2), Some(&1));
    assert_eq!(titles(store.list_citations(Some(&first.id)).expect("first")), vec!["Beta", "Alpha"]);
    assert_eq!(titles(store.list_citations(Some(&second.id)).expect("second")), vec!["Gamma"]);
    assert!(store.move_citation(Some(&second.id), 0, 1).is_err());
}

#[test]
fn deleting_a_report_citation_renumbers_only_that_report() {
    let store = store();
    let report = store.create_report(new_report("Owner", "")).expect("report");
    let doomed = store
        .add_citation(Some(&report.id), &citation("Alpha", "Smith, John", 2020))
        .expect("a");
    store.add_citation(Some(&report.id), &citation("Beta", "Doe, Jane", 2019)).expect("b");
    store.add_citation(None, &citation("Loose", "Poe, Ed", 2018)).expect("loose");

    store.delete_citation(doomed.id.as_deref().expect("stored id")).expect("delete");
    store.add_citation(Some(&report.id), &citation("Gamma", "Roe, Rick", 2021)).expect("c");

    assert_eq!(titles(store.list_citations(Some(&report.id)).expect("list")), vec!["Beta", "Gamma"]);
    assert_eq!(titles(store.list_citations(None).expect("library")), vec!["Loose"]);
}

#[test]
fn report_citations_require_an_owned_report_and_go_with_it() {
    let store = store();
    assert!(matches!(
        store.add_citation(Some("missing"), &citation("Alpha", "Smith, John", 2020)),
        Err(ReportError::NotFound { entity: "report", .. })
    ));
    assert!(matches!(
        store.import_bibtex(Some("missing"), "@misc{k, title = {T}}"),
        Err(ReportError::NotFound { entity: "report", .. })
    ));

    let report = store.create_report(new_report("Owner", "")).expect("report");
    store
        .import_bibtex(Some(&report.id), "@misc{k, title = {Owned}, year = {2022}}")
        .expect("import");
    assert_eq!(store.list_citations(Some(&report.id)).expect("list").len(), 1);

    store.delete_report(&report.id).expect("delete report");
    assert!(store.list_citations(Some(&report.id)).expect("list").is_empty());
}

#[test]
fn import_bibtex_skips_malformed_entries() {
    let store = store();
    let raw = "
@article{smith2020,
  title = {Deep Results},
  author = {Smith, John and Doe, Jane},
  year = {2020},
  journal = {Journal of Things}
}

@misc{broken,
  title = {Never closed

@book{roe2018,
  title = {A Book},
  author = {Roe, Rick},
  year = {2018}
}
";
    let imported = store.import_bibtex(None, raw).expect("import");
    let titles = imported
        .iter()
        .map(|citation| citation.title.as_str())
        .collect::<Vec<&str>>();
    assert!(titles.contains(&"Deep Results"));
    assert!(imported.iter().all(|citation| citation.id.is_some()));
    assert_eq!(store.list_citations(None).expect("list").len(), imported.len());

    let first = &store.list_citations(None).expect("list")[0];
    assert_eq!(first.authors, vec!["Smith, John", "Doe, Jane"]);
    assert_eq!(first.year, Some(2020));
}

#[test]
fn import_bibtex_requires_text() {
    let store = store();
    assert!(matches!(
        store.import_bibtex(None, "   "),
        Err(ReportError::Validation { .. })
    ));
}

#[test]
fn custom_templates_follow_builtins() {
    let store = store();
    let custom = Template {
        id: "house".to_string(),
        name: "House Style".to_string(),
        numbered_sections: true,
        ..Template::resolve("business")
    };
    store.save_template(&custom).expect("save");

    let ids = store
        .list_templates()
        .expect("list")
        .into_iter()
        .map(|template| template.id)
        .collect::<Vec<String>>();
    assert_eq!(ids, vec!["standard", "academic", "business", "technical", "minimal", "house"]);
    assert_eq!(store.get_template("house").expect("custom"), custom);
    assert_eq!(store.get_template("academic").expect("builtin").id, "academic");
    assert!(matches!(
        store.get_template("absent"),
        Err(ReportError::NotFound { entity: "template", .. })
    ));
}

#[test]
fn builtin_template_ids_are_reserved() {
    let store = store();
    let shadow = Template {
        name: "Mine".to_string(),
        ..Template::resolve("standard")
    };
    assert!(store.save_template(&shadow).is_err());
}

#[test]
fn academic_profiles_round_trip_by_name() {
    let store = store();
    let config = AcademicReportConfig {
        academic_details: AcademicDetails {
            author_name: "Ada Lovelace".to_string(),
            institution: "Analytical College".to_string(),
            submission_date: "2024-05-03".to_string(),
            ..AcademicDetails::default()
        },
        ..AcademicReportConfig::default()
    };

    store.save_profile("thesis", &config).expect("save");
    store.save_profile("thesis", &config).expect("overwrite");

    assert_eq!(store.get_profile("thesis").expect("profile"), config);
    assert_eq!(store.list_profiles().expect("names"), vec!["thesis"]);
    assert!(store.get_profile("other").is_err());
}
