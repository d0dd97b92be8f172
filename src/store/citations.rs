use std::collections::HashMap;

use rusqlite::{Connection, OptionalExtension, Row, params};
use tracing::{debug, info};
use uuid::Uuid;

use crate::citation::{CitationList, bibtex};
use crate::error::{ReportError, Result, require};
use crate::model::Citation;
use crate::util::now_utc_string;

use super::SqliteStore;

const CITATION_COLUMNS: &str = "id, title, authors, year, entry_type, journal, volume, pages, \
                                doi, url, citation_key, bibtex_raw";

// Citation lists are scoped by `(user_id, report_id)`. A `None` report id
// selects the user's unattached library; `report_id IS ?` matches NULL too.
impl SqliteStore {
    /// Append a citation after the existing ones in the same list.
    pub fn add_citation(&self, report_id: Option<&str>, citation: &Citation) -> Result<Citation> {
        require("add citation", "title", &citation.title)?;
        self.ensure_owning_report(report_id)?;
        insert_citation(&self.connection, &self.user_id, report_id, citation)
    }

    /// Parse BibTeX and append every usable entry in file order. Malformed
    /// and untitled entries are skipped.
    pub fn import_bibtex(&self, report_id: Option<&str>, raw: &str) -> Result<Vec<Citation>> {
        let raw = require("import bibtex", "bibtex text", raw)?;
        self.ensure_owning_report(report_id)?;
        let parsed = bibtex::parse(raw);

        let tx = self.connection.unchecked_transaction()?;
        let mut imported = Vec::with_capacity(parsed.len());
        for citation in &parsed {
            imported.push(insert_citation(&tx, &self.user_id, report_id, citation)?);
        }
        tx.commit()?;

        info!(
            report_id = report_id.unwrap_or("-"),
            imported = imported.len(),
            "imported bibtex citations"
        );
        Ok(imported)
    }

    /// Citations in the order they were added or last arranged.
    pub fn list_citations(&self, report_id: Option<&str>) -> Result<Vec<Citation>> {
        let sql = format!(
            "SELECT {CITATION_COLUMNS} FROM citations
             WHERE user_id = ?1 AND report_id IS ?2
             ORDER BY position, rowid"
        );
        let mut statement = self.connection.prepare(&sql)?;
        let rows = statement
            .query_map(params![self.user_id, report_id], citation_row)?
            .collect::<rusqlite::Result<Vec<CitationRow>>>()?;
        rows.into_iter().map(CitationRow::into_citation).collect()
    }

    pub fn citation_list(&self, report_id: Option<&str>) -> Result<CitationList> {
        Ok(CitationList::new(self.list_citations(report_id)?))
    }

    /// Delete by id and close the gap in the list the citation belonged to.
    pub fn delete_citation(&self, id: &str) -> Result<()> {
        let owner: Option<Option<String>> = self
            .connection
            .query_row(
                "SELECT report_id FROM citations WHERE id = ?1 AND user_id = ?2",
                params![id, self.user_id],
                |row| row.get(0),
            )
            .optional()?;
        let Some(report_id) = owner else {
            return Err(ReportError::NotFound {
                entity: "citation",
                id: id.to_string(),
            });
        };

        self.connection.execute(
            "DELETE FROM citations WHERE id = ?1 AND user_id = ?2",
            params![id, self.user_id],
        )?;
        self.renumber_positions(&self.list_citations(report_id.as_deref())?)?;
        debug!(citation_id = %id, "deleted citation");
        Ok(())
    }

    /// Move the citation at 0-based `from` to `to` and persist the new order.
    /// Returns the old→new marker number mapping for rewriting body text.
    pub fn move_citation(
        &self,
        report_id: Option<&str>,
        from: usize,
        to: usize,
    ) -> Result<HashMap<usize, usize>> {
        let mut list = self.citation_list(report_id)?;
        if from >= list.len() || to >= list.len() {
            return Err(ReportError::NotFound {
                entity: "citation position",
                id: format!("{}", from.max(to) + 1),
            });
        }
        let mapping = list.move_citation(from, to);
        self.renumber_positions(list.citations())?;
        Ok(mapping)
    }

    fn renumber_positions(&self, ordered: &[Citation]) -> Result<()> {
        let tx = self.connection.unchecked_transaction()?;
        {
            let mut statement =
                tx.prepare("UPDATE citations SET position = ?1 WHERE id = ?2 AND user_id = ?3")?;
            for (position, citation) in ordered.iter().enumerate() {
                if let Some(id) = &citation.id {
                    statement.execute(params![position as i64, id, self.user_id])?;
                }
            }
        }
        tx.commit()?;
        Ok(())
    }

    fn ensure_owning_report(&self, report_id: Option<&str>) -> Result<()> {
        if let Some(report_id) = report_id {
            self.get_report(report_id)?;
        }
        Ok(())
    }
}

fn insert_citation(
    connection: &Connection,
    user_id: &str,
    report_id: Option<&str>,
    citation: &Citation,
) -> Result<Citation> {
    let position: i64 = connection.query_row(
        "SELECT COALESCE(MAX(position), -1) + 1 FROM citations
         WHERE user_id = ?1 AND report_id IS ?2",
        params![user_id, report_id],
        |row| row.get(0),
    )?;

    let stored = Citation {
        id: Some(Uuid::new_v4().to_string()),
        title: citation.title.trim().to_string(),
        ..citation.clone()
    };
    connection.execute(
        "
        INSERT INTO citations(
          id, user_id, report_id, position, title, authors, year, entry_type, journal,
          volume, pages, doi, url, citation_key, bibtex_raw, created_at
        )
        VALUES(?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16)
        ",
        params![
            stored.id,
            user_id,
            report_id,
            position,
            stored.title,
            serde_json::to_string(&stored.authors)?,
            stored.year,
            stored.entry_type,
            stored.journal,
            stored.volume,
            stored.pages,
            stored.doi,
            stored.url,
            stored.citation_key,
            stored.bibtex_raw,
            now_utc_string(),
        ],
    )?;
    Ok(stored)
}

struct CitationRow {
    id: String,
    title: String,
    authors: String,
    year: Option<i32>,
    entry_type: Option<String>,
    journal: Option<String>,
    volume: Option<String>,
    pages: Option<String>,
    doi: Option<String>,
    url: Option<String>,
    citation_key: Option<String>,
    bibtex_raw: Option<String>,
}

fn citation_row(row: &Row<'_>) -> rusqlite::Result<CitationRow> {
    Ok(CitationRow {
        id: row.get(0)?,
        title: row.get(1)?,
        authors: row.get(2)?,
        year: row.get(3)?,
        entry_type: row.get(4)?,
        journal: row.get(5)?,
        volume: row.get(6)?,
        pages: row.get(7)?,
        doi: row.get(8)?,
        url: row.get(9)?,
        citation_key: row.get(10)?,
        bibtex_raw: row.get(11)?,
    })
}

impl CitationRow {
    fn into_citation(self) -> Result<Citation> {
        Ok(Citation {
            id: Some(self.id),
            title: self.title,
            authors: serde_json::from_str(&self.authors)?,
            year: self.year,
            entry_type: self.entry_type,
            journal: self.journal,
            volume: self.volume,
            pages: self.pages,
            doi: self.doi,
            url: self.url,
            citation_key: self.citation_key,
            bibtex_raw: self.bibtex_raw,
        })
    }
}
