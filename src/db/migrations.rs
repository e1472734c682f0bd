use anyhow::{Context, Result};
use log::warn;
use rusqlite::{Connection, Transaction};

pub const CURRENT_SCHEMA_VERSION: i32 = 1;

/// Brings the schema to `CURRENT_SCHEMA_VERSION`.
///
/// There are no incremental migrations: any stored version other than the
/// current one (older, newer, or a fresh file at 0) drops every table and
/// recreates the schema. Stored nights are lost on a version change.
pub fn run_migrations(conn: &mut Connection) -> Result<()> {
    let version: i32 = conn
        .pragma_query_value(None, "user_version", |row| row.get(0))
        .context("failed to read user_version pragma")?;

    if version == CURRENT_SCHEMA_VERSION {
        return Ok(());
    }

    let tx = conn
        .transaction()
        .context("failed to open migration transaction")?;

    let dropped = drop_all_tables(&tx).context("failed to drop existing tables")?;
    if version != 0 || dropped > 0 {
        warn!(
            "Schema version {version} does not match {CURRENT_SCHEMA_VERSION}; dropped {dropped} table(s)"
        );
    }

    tx.execute_batch(include_str!("schemas/schema_v1.sql"))
        .context("failed to execute schema_v1.sql")?;

    tx.pragma_update(None, "user_version", CURRENT_SCHEMA_VERSION)
        .context("failed to update user_version pragma")?;
    tx.commit().context("failed to commit migrations")?;

    Ok(())
}

fn drop_all_tables(tx: &Transaction<'_>) -> Result<usize> {
    let names = {
        let mut stmt = tx.prepare(
            "SELECT name FROM sqlite_master
             WHERE type = 'table' AND substr(name, 1, 7) != 'sqlite_'",
        )?;
        let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;
        rows.collect::<rusqlite::Result<Vec<String>>>()?
    };

    for name in &names {
        let escaped = name.replace('"', "\"\"");
        tx.execute_batch(&format!("DROP TABLE IF EXISTS \"{escaped}\""))
            .with_context(|| format!("failed to drop table {name}"))?;
    }

    Ok(names.len())
}
