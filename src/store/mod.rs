//! Read-only access to the bot's SQLite database.
//!
//! The schema is owned by the bot process; this module only runs
//! `SELECT *` over the two tables the dashboard shows and never writes.

pub mod models;

use rusqlite::{Connection, OpenFlags};
use std::path::Path;
use std::time::Instant;
use tracing::{debug, info};

pub use models::{CellValue, ChatId, Dataset, Interaction, Table};

use crate::{Error, Result};

pub const INTERACTIONS_TABLE: &str = "interactions";
pub const ALERTS_TABLE: &str = "alerts";

/// Load both dashboard tables from the database at `path`.
///
/// The connection lives only for the duration of this call.
pub fn load_dataset(path: &Path) -> Result<Dataset> {
    if !path.is_file() {
        return Err(Error::DatabaseNotFound(path.display().to_string()));
    }

    let start = Instant::now();
    let conn = Connection::open_with_flags(
        path,
        OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
    )?;

    let interactions_raw = query_table(&conn, INTERACTIONS_TABLE)?;
    let alerts = query_table(&conn, ALERTS_TABLE)?;
    conn.close().map_err(|(_, err)| Error::from(err))?;

    let interactions = Interaction::from_table(INTERACTIONS_TABLE, &interactions_raw)?;

    info!(
        path = %path.display(),
        interactions = interactions.len(),
        alerts = alerts.len(),
        elapsed_ms = start.elapsed().as_millis() as u64,
        "Loaded dashboard dataset"
    );

    Ok(Dataset {
        interactions,
        alerts,
    })
}

fn query_table(conn: &Connection, table: &str) -> Result<Table> {
    let sql = format!("SELECT * FROM {}", table);
    let mut stmt = conn.prepare(&sql)?;

    let columns: Vec<String> = stmt
        .column_names()
        .into_iter()
        .map(String::from)
        .collect();
    let width = columns.len();

    let rows = stmt
        .query_map([], |row| {
            (0..width)
                .map(|i| row.get_ref(i).map(CellValue::from))
                .collect::<rusqlite::Result<Vec<_>>>()
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    debug!(table, columns = width, rows = rows.len(), "Queried table");

    Ok(Table { columns, rows })
}
