use std::collections::HashSet;
use std::path::Path;

use anyhow::{Context, Result, bail};
use rusqlite::{Connection, params};
use serde_json::{Value, json};

use super::RowSink;
use crate::model::IncidentRow;
use crate::util::now_utc_string;

/// Local staging store. List fields are kept as JSON text columns.
pub struct SqliteSink {
    connection: Connection,
    ready_tables: HashSet<String>,
}

impl SqliteSink {
    pub fn open(db_path: &Path) -> Result<Self> {
        let connection = Connection::open(db_path)
            .with_context(|| format!("failed to open {}", db_path.display()))?;
        configure_connection(&connection)?;

        Ok(Self {
            connection,
            ready_tables: HashSet::new(),
        })
    }

    #[cfg(test)]
    fn in_memory() -> Result<Self> {
        Ok(Self {
            connection: Connection::open_in_memory()?,
            ready_tables: HashSet::new(),
        })
    }

    fn ensure_table(&mut self, table: &str) -> Result<()> {
        if self.ready_tables.contains(table) {
            return Ok(());
        }

        self.connection
            .execute_batch(&format!(
                "
                CREATE TABLE IF NOT EXISTS {table} (
                  id INTEGER PRIMARY KEY AUTOINCREMENT,
                  affected_persons TEXT NOT NULL,
                  countries TEXT NOT NULL,
                  regions TEXT NOT NULL,
                  themes TEXT NOT NULL,
                  inserted_at TEXT NOT NULL
                );
                "
            ))
            .with_context(|| format!("failed to create table {table}"))?;

        self.ready_tables.insert(table.to_string());
        Ok(())
    }
}

fn configure_connection(connection: &Connection) -> Result<()> {
    connection
        .pragma_update(None, "journal_mode", "WAL")
        .context("failed to set journal_mode=WAL")?;
    connection
        .pragma_update(None, "synchronous", "NORMAL")
        .context("failed to set synchronous=NORMAL")?;
    Ok(())
}

fn validate_table_name(table: &str) -> Result<()> {
    let valid = !table.is_empty()
        && table
            .chars()
            .all(|ch| ch.is_ascii_alphanumeric() || ch == '_');
    if !valid {
        bail!("invalid table name: {table:?}");
    }
    Ok(())
}

impl RowSink for SqliteSink {
    fn insert_rows(&mut self, table: &str, rows: &[IncidentRow]) -> Result<Vec<Value>> {
        validate_table_name(table)?;
        self.ensure_table(table)?;

        let inserted_at = now_utc_string();
        let tx = self.connection.transaction()?;
        let mut inserted = Vec::with_capacity(rows.len());

        {
            let mut statement = tx.prepare(&format!(
                "
                INSERT INTO {table}(affected_persons, countries, regions, themes, inserted_at)
                VALUES(?1, ?2, ?3, ?4, ?5)
                "
            ))?;

            for row in rows {
                statement.execute(params![
                    serde_json::to_string(&row.affected_persons)?,
                    serde_json::to_string(&row.countries)?,
                    serde_json::to_string(&row.regions)?,
                    serde_json::to_string(&row.themes)?,
                    inserted_at,
                ])?;

                inserted.push(json!({
                    "id": tx.last_insert_rowid(),
                    "affected_persons": row.affected_persons,
                    "countries": row.countries,
                    "regions": row.regions,
                    "themes": row.themes,
                    "inserted_at": inserted_at,
                }));
            }
        }

        tx.commit()
            .with_context(|| format!("failed to commit insert into {table}"))?;

        Ok(inserted)
    }
}
