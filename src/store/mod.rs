//! SQLite persistence. Every row carries the owning `user_id` and every
//! query is scoped to the store's user.

mod citations;
mod library;
mod schema;

#[cfg(test)]
mod tests;

use std::path::Path;

use rusqlite::{Connection, OptionalExtension, Row, params};
use tracing::debug;
use uuid::Uuid;

use crate::error::{ReportError, Result, require};
use crate::model::{AssetKind, ExtractedMatch, NewReport, Report, ReportAsset};
use crate::util::{now_utc_string, sha256_hex};

pub use schema::DB_SCHEMA_VERSION;

pub struct SqliteStore {
    connection: Connection,
    user_id: String,
}

/// Partial update; `None` fields keep their stored value.
#[derive(Debug, Clone, Default)]
pub struct ReportUpdate {
    pub title: Option<String>,
    pub content: Option<String>,
    pub template_id: Option<String>,
    pub extracted_data: Option<Vec<ExtractedMatch>>,
}

const REPORT_COLUMNS: &str = "id, user_id, title, content, template_id, extracted_data, \
                              ai_generated, content_sha256, created_at, updated_at";

impl SqliteStore {
    pub fn open(path: &Path, user_id: &str) -> Result<Self> {
        let connection = Connection::open(path)?;
        Self::with_connection(connection, user_id)
    }

    pub fn open_in_memory(user_id: &str) -> Result<Self> {
        Self::with_connection(Connection::open_in_memory()?, user_id)
    }

    fn with_connection(connection: Connection, user_id: &str) -> Result<Self> {
        let user_id = require("open store", "user id", user_id)?.to_string();
        schema::configure_connection(&connection)?;
        schema::ensure_schema(&connection)?;
        Ok(Self {
            connection,
            user_id,
        })
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn schema_version(&self) -> Result<Option<String>> {
        let version = self
            .connection
            .query_row(
                "SELECT value FROM metadata WHERE key = 'db_schema_version'",
                [],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(version)
    }

    pub fn create_report(&self, report: NewReport) -> Result<Report> {
        let title = require("create report", "title", &report.title)?.to_string();
        let now = now_utc_string();
        let template_id = if report.template_id.trim().is_empty() {
            "standard".to_string()
        } else {
            report.template_id.trim().to_string()
        };

        let created = Report {
            id: Uuid::new_v4().to_string(),
            user_id: self.user_id.clone(),
            title,
            content_sha256: sha256_hex(report.content.as_bytes()),
            content: report.content,
            template_id,
            extracted_data: report.extracted_data,
            ai_generated: report.ai_generated,
            created_at: now.clone(),
            updated_at: now,
        };

        self.connection.execute(
            "
            INSERT INTO reports(
              id, user_id, title, content, template_id, extracted_data,
              ai_generated, content_sha256, created_at, updated_at
            )
            VALUES(?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            ",
            params![
                created.id,
                created.user_id,
                created.title,
                created.content,
                created.template_id,
                serde_json::to_string(&created.extracted_data)?,
                created.ai_generated,
                created.content_sha256,
                created.created_at,
                created.updated_at,
            ],
        )?;

        debug!(report_id = %created.id, "created report");
        Ok(created)
    }

    /// Most recently updated first.
    pub fn list_reports(&self) -> Result<Vec<Report>> {
        let sql = format!(
            "SELECT {REPORT_COLUMNS} FROM reports WHERE user_id = ?1 ORDER BY updated_at DESC, rowid DESC"
        );
        let mut statement = self.connection.prepare(&sql)?;
        let rows = statement
            .query_map([self.user_id.as_str()], report_row)?
            .collect::<rusqlite::Result<Vec<ReportRow>>>()?;
        rows.into_iter().map(ReportRow::into_report).collect()
    }

    pub fn get_report(&self, id: &str) -> Result<Report> {
        let sql = format!("SELECT {REPORT_COLUMNS} FROM reports WHERE id = ?1 AND user_id = ?2");
        let row = self
            .connection
            .query_row(&sql, params![id, self.user_id], report_row)
            .optional()?;
        match row {
            Some(row) => row.into_report(),
            None => Err(ReportError::NotFound {
                entity: "report",
                id: id.to_string(),
            }),
        }
    }

    pub fn update_report(&self, id: &str, update: ReportUpdate) -> Result<Report> {
        let mut report = self.get_report(id)?;
        if let Some(title) = update.title {
            report.title = require("update report", "title", &title)?.to_string();
        }
        if let Some(content) = update.content {
            report.content_sha256 = sha256_hex(content.as_bytes());
            report.content = content;
        }
        if let Some(template_id) = update.template_id {
            report.template_id = template_id;
        }
        if let Some(extracted_data) = update.extracted_data {
            report.extracted_data = extracted_data;
        }
        report.updated_at = now_utc_string();

        self.connection.execute(
            "
            UPDATE reports
            SET title = ?1, content = ?2, template_id = ?3, extracted_data = ?4,
                content_sha256 = ?5, updated_at = ?6
            WHERE id = ?7 AND user_id = ?8
            ",
            params![
                report.title,
                report.content,
                report.template_id,
                serde_json::to_string(&report.extracted_data)?,
                report.content_sha256,
                report.updated_at,
                report.id,
                self.user_id,
            ],
        )?;
        Ok(report)
    }

    /// Deletes the report and its assets.
    pub fn delete_report(&self, id: &str) -> Result<()> {
        let deleted = self.connection.execute(
            "DELETE FROM reports WHERE id = ?1 AND user_id = ?2",
            params![id, self.user_id],
        )?;
        if deleted == 0 {
            return Err(ReportError::NotFound {
                entity: "report",
                id: id.to_string(),
            });
        }
        debug!(report_id = %id, "deleted report");
        Ok(())
    }

    /// Attach a figure or table; numbers count up per report and kind.
    pub fn add_asset(
        &self,
        report_id: &str,
        kind: AssetKind,
        caption: &str,
        payload: &str,
    ) -> Result<ReportAsset> {
        self.get_report(report_id)?;
        let number: i64 = self.connection.query_row(
            "SELECT COALESCE(MAX(number), 0) + 1 FROM report_assets
             WHERE report_id = ?1 AND user_id = ?2 AND kind = ?3",
            params![report_id, self.user_id, kind.as_str()],
            |row| row.get(0),
        )?;

        let asset = ReportAsset {
            id: Uuid::new_v4().to_string(),
            report_id: report_id.to_string(),
            kind,
            number,
            caption: caption.trim().to_string(),
            payload: payload.to_string(),
            created_at: now_utc_string(),
        };
        self.connection.execute(
            "
            INSERT INTO report_assets(id, report_id, user_id, kind, number, caption, payload, created_at)
            VALUES(?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            ",
            params![
                asset.id,
                asset.report_id,
                self.user_id,
                asset.kind.as_str(),
                asset.number,
                asset.caption,
                asset.payload,
                asset.created_at,
            ],
        )?;
        Ok(asset)
    }

    pub fn list_assets(&self, report_id: &str) -> Result<Vec<ReportAsset>> {
        let mut statement = self.connection.prepare(
            "
            SELECT id, report_id, kind, number, caption, payload, created_at
            FROM report_assets
            WHERE report_id = ?1 AND user_id = ?2
            ORDER BY kind, number
            ",
        )?;
        let rows = statement
            .query_map(params![report_id, self.user_id], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, i64>(3)?,
                    row.get::<_, String>(4)?,
                    row.get::<_, String>(5)?,
                    row.get::<_, String>(6)?,
                ))
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        let mut assets = Vec::with_capacity(rows.len());
        for (id, report_id, kind, number, caption, payload, created_at) in rows {
            let Some(kind) = AssetKind::parse(&kind) else {
                debug!(asset_id = %id, kind = %kind, "skipping asset with unknown kind");
                continue;
            };
            assets.push(ReportAsset {
                id,
                report_id,
                kind,
                number,
                caption,
                payload,
                created_at,
            });
        }
        Ok(assets)
    }
}

struct ReportRow {
    id: String,
    user_id: String,
    title: String,
    content: String,
    template_id: String,
    extracted_data: String,
    ai_generated: bool,
    content_sha256: String,
    created_at: String,
    updated_at: String,
}

fn report_row(row: &Row<'_>) -> rusqlite::Result<ReportRow> {
    Ok(ReportRow {
        id: row.get(0)?,
        user_id: row.get(1)?,
        title: row.get(2)?,
        content: row.get(3)?,
        template_id: row.get(4)?,
        extracted_data: row.get(5)?,
        ai_generated: row.get(6)?,
        content_sha256: row.get(7)?,
        created_at: row.get(8)?,
        updated_at: row.get(9)?,
    })
}

impl ReportRow {
    fn into_report(self) -> Result<Report> {
        Ok(Report {
            id: self.id,
            user_id: self.user_id,
            title: self.title,
            content: self.content,
            template_id: self.template_id,
            extracted_data: serde_json::from_str(&self.extracted_data)?,
            ai_generated: self.ai_generated,
            content_sha256: self.content_sha256,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}
