use rusqlite::{OptionalExtension, params};
use tracing::debug;

use crate::error::{ReportError, Result, require};
use crate::model::AcademicReportConfig;
use crate::template::{BUILTIN_TEMPLATE_IDS, Template};
use crate::util::now_utc_string;

use super::SqliteStore;

impl SqliteStore {
    /// Insert or replace a user template. Built-in ids are reserved.
    pub fn save_template(&self, template: &Template) -> Result<()> {
        let id = require("save template", "template id", &template.id)?;
        let name = require("save template", "template name", &template.name)?;
        if BUILTIN_TEMPLATE_IDS.contains(&id) {
            return Err(ReportError::External {
                action: "save template",
                cause: format!("{id} is a built-in template id"),
            });
        }

        self.connection.execute(
            "
            INSERT INTO custom_templates(id, user_id, name, definition, updated_at)
            VALUES(?1, ?2, ?3, ?4, ?5)
            ON CONFLICT(user_id, id) DO UPDATE SET
              name=excluded.name,
              definition=excluded.definition,
              updated_at=excluded.updated_at
            ",
            params![
                id,
                self.user_id,
                name,
                serde_json::to_string(template)?,
                now_utc_string(),
            ],
        )?;
        debug!(template = %id, "saved custom template");
        Ok(())
    }

    /// Built-in templates followed by the user's own, by id.
    pub fn list_templates(&self) -> Result<Vec<Template>> {
        let mut templates = BUILTIN_TEMPLATE_IDS
            .iter()
            .filter_map(|id| Template::builtin(id))
            .collect::<Vec<Template>>();

        let mut statement = self
            .connection
            .prepare("SELECT definition FROM custom_templates WHERE user_id = ?1 ORDER BY id")?;
        let definitions = statement
            .query_map([self.user_id.as_str()], |row| row.get::<_, String>(0))?
            .collect::<rusqlite::Result<Vec<String>>>()?;
        for definition in definitions {
            templates.push(serde_json::from_str(&definition)?);
        }
        Ok(templates)
    }

    pub fn get_template(&self, id: &str) -> Result<Template> {
        if let Some(template) = Template::builtin(id) {
            return Ok(template);
        }

        let definition = self
            .connection
            .query_row(
                "SELECT definition FROM custom_templates WHERE id = ?1 AND user_id = ?2",
                params![id, self.user_id],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        match definition {
            Some(definition) => Ok(serde_json::from_str(&definition)?),
            None => Err(ReportError::NotFound {
                entity: "template",
                id: id.to_string(),
            }),
        }
    }

    /// Store a named academic profile so repeat exports can reuse it.
    pub fn save_profile(&self, name: &str, config: &AcademicReportConfig) -> Result<()> {
        let name = require("save profile", "profile name", name)?;
        self.connection.execute(
            "
            INSERT INTO academic_profiles(name, user_id, config, updated_at)
            VALUES(?1, ?2, ?3, ?4)
            ON CONFLICT(user_id, name) DO UPDATE SET
              config=excluded.config,
              updated_at=excluded.updated_at
            ",
            params![name, self.user_id, serde_json::to_string(config)?, now_utc_string()],
        )?;
        Ok(())
    }

    pub fn get_profile(&self, name: &str) -> Result<AcademicReportConfig> {
        let config = self
            .connection
            .query_row(
                "SELECT config FROM academic_profiles WHERE name = ?1 AND user_id = ?2",
                params![name.trim(), self.user_id],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        match config {
            Some(config) => Ok(serde_json::from_str(&config)?),
            None => Err(ReportError::NotFound {
                entity: "academic profile",
                id: name.to_string(),
            }),
        }
    }

    pub fn list_profiles(&self) -> Result<Vec<String>> {
        let mut statement = self
            .connection
            .prepare("SELECT name FROM academic_profiles WHERE user_id = ?1 ORDER BY name")?;
        let names = statement
            .query_map([self.user_id.as_str()], |row| row.get::<_, String>(0))?
            .collect::<rusqlite::Result<Vec<String>>>()?;
        Ok(names)
    }
}
