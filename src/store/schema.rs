use rusqlite::Connection;

use crate::error::{ReportError, Result};
use crate::util::now_utc_string;

pub const DB_SCHEMA_VERSION: &str = "3";

pub(super) fn configure_connection(connection: &Connection) -> Result<()> {
    connection.pragma_update(None, "journal_mode", "WAL")?;
    connection.pragma_update(None, "synchronous", "NORMAL")?;
    connection.pragma_update(None, "foreign_keys", "ON")?;
    Ok(())
}

pub(super) fn ensure_schema(connection: &Connection) -> Result<()> {
    connection.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS metadata (
          key TEXT PRIMARY KEY,
          value TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS reports (
          id TEXT PRIMARY KEY,
          user_id TEXT NOT NULL,
          title TEXT NOT NULL,
          content TEXT NOT NULL,
          template_id TEXT NOT NULL,
          extracted_data TEXT NOT NULL DEFAULT '[]',
          created_at TEXT NOT NULL,
          updated_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS citations (
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

        CREATE TABLE IF NOT EXISTS report_assets (
          id TEXT PRIMARY KEY,
          report_id TEXT NOT NULL,
          user_id TEXT NOT NULL,
          kind TEXT NOT NULL,
          number INTEGER NOT NULL,
          caption TEXT NOT NULL,
          payload TEXT NOT NULL,
          created_at TEXT NOT NULL,
          FOREIGN KEY(report_id) REFERENCES reports(id) ON DELETE CASCADE
        );

        CREATE TABLE IF NOT EXISTS custom_templates (
          id TEXT NOT NULL,
          user_id TEXT NOT NULL,
          name TEXT NOT NULL,
          definition TEXT NOT NULL,
          updated_at TEXT NOT NULL,
          PRIMARY KEY (user_id, id)
        );

        CREATE TABLE IF NOT EXISTS academic_profiles (
          name TEXT NOT NULL,
          user_id TEXT NOT NULL,
          config TEXT NOT NULL,
          updated_at TEXT NOT NULL,
          PRIMARY KEY (user_id, name)
        );
        ",
    )?;

    // Added in schema version 2.
    ensure_column_exists(connection, "reports", "ai_generated INTEGER NOT NULL DEFAULT 0")?;
    ensure_column_exists(connection, "reports", "content_sha256 TEXT NOT NULL DEFAULT ''")?;
    // Added in schema version 3. NULL marks a citation outside any report.
    ensure_column_exists(
        connection,
        "citations",
        "report_id TEXT REFERENCES reports(id) ON DELETE CASCADE",
    )?;

    connection.execute_batch(
        "
        CREATE INDEX IF NOT EXISTS idx_reports_user_updated ON reports(user_id, updated_at);
        CREATE INDEX IF NOT EXISTS idx_citations_user_report_position
          ON citations(user_id, report_id, position);
        CREATE INDEX IF NOT EXISTS idx_report_assets_report_kind ON report_assets(report_id, kind, number);
        ",
    )?;

    let now = now_utc_string();
    connection.execute(
        "INSERT INTO metadata(key, value) VALUES('db_schema_version', ?1)
         ON CONFLICT(key) DO UPDATE SET value=excluded.value",
        [DB_SCHEMA_VERSION],
    )?;
    connection.execute(
        "INSERT INTO metadata(key, value) VALUES('db_updated_at', ?1)
         ON CONFLICT(key) DO UPDATE SET value=excluded.value",
        [now],
    )?;

    Ok(())
}

fn ensure_column_exists(
    connection: &Connection,
    table_name: &str,
    column_definition: &str,
) -> Result<()> {
    let Some(column_name) = column_definition.split_whitespace().next() else {
        return Err(ReportError::External {
            action: "migrate schema",
            cause: format!("invalid column definition: {column_definition}"),
        });
    };

    let pragma_sql = format!("PRAGMA table_info({table_name})");
    let mut statement = connection.prepare(&pragma_sql)?;
    let mut rows = statement.query([])?;
    while let Some(row) = rows.next()? {
        let existing_name: String = row.get(1)?;
        if existing_name == column_name {
            return Ok(());
        }
    }

    let alter_sql = format!("ALTER TABLE {table_name} ADD COLUMN {column_definition}");
    connection.execute(&alter_sql, [])?;
    Ok(())
}
