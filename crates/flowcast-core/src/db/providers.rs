//! Provider operations

use rusqlite::{params, OptionalExtension};

use super::Database;
use crate::error::{Error, Result};
use crate::models::Provider;

impl Database {
    /// Create or get a provider by name
    pub fn upsert_provider(&self, name: &str) -> Result<i64> {
        let conn = self.conn()?;

        let existing: Option<i64> = conn
            .query_row(
                "SELECT id FROM providers WHERE name = ?",
                params![name.trim()],
                |row| row.get(0),
            )
            .optional()?;

        if let Some(id) = existing {
            return Ok(id);
        }

        conn.execute(
            "INSERT INTO providers (name) VALUES (?)",
            params![name.trim()],
        )?;

        Ok(conn.last_insert_rowid())
    }

    /// List all providers
    pub fn list_providers(&self) -> Result<Vec<Provider>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare("SELECT id, name FROM providers ORDER BY name")?;

        let providers = stmt
            .query_map([], |row| {
                Ok(Provider {
                    id: row.get(0)?,
                    name: row.get(1)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(providers)
    }

    /// Find a provider by name (case-insensitive)
    pub fn find_provider(&self, name: &str) -> Result<Option<Provider>> {
        let conn = self.conn()?;
        let provider = conn
            .query_row(
                "SELECT id, name FROM providers WHERE name = ?",
                params![name.trim()],
                |row| {
                    Ok(Provider {
                        id: row.get(0)?,
                        name: row.get(1)?,
                    })
                },
            )
            .optional()?;

        Ok(provider)
    }

    /// Find a provider by name, failing when it does not exist
    pub fn require_provider(&self, name: &str) -> Result<Provider> {
        self.find_provider(name)?
            .ok_or_else(|| Error::NotFound(format!("Provider not found: {}", name.trim())))
    }
}
