//! Ordered schema migrations.
//!
//! # Responsibility
//! - Register competition schema steps in strictly increasing order.
//! - Apply pending steps in one transaction.
//! - Let repositories refuse connections that skipped bootstrap.
//!
//! # Invariants
//! - `version` values are monotonic and never reused.
//! - The applied version is mirrored to `PRAGMA user_version`.
//!
//! # See also
//! - `0001_init.sql` for the base competition schema.

use crate::db::{DbError, DbResult};
use log::info;
use rusqlite::Connection;

#[derive(Debug, Clone, Copy)]
struct Migration {
    version: u32,
    name: &'static str,
    sql: &'static str,
}

const MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        name: "init",
        sql: include_str!("0001_init.sql"),
    },
    Migration {
        version: 2,
        name: "member_reached_max",
        sql: include_str!("0002_member_reached_max.sql"),
    },
    Migration {
        version: 3,
        name: "display_state",
        sql: include_str!("0003_display_state.sql"),
    },
];

/// Latest schema version this binary can produce.
pub fn latest_version() -> u32 {
    MIGRATIONS.last().map_or(0, |migration| migration.version)
}

/// Version currently recorded in the database.
pub fn schema_version(conn: &Connection) -> DbResult<u32> {
    let version = conn.query_row("PRAGMA user_version;", [], |row| row.get::<_, u32>(0))?;
    Ok(version)
}

/// Fails unless `conn` is migrated to exactly `latest_version()`.
pub fn ensure_current(conn: &Connection) -> DbResult<()> {
    let db_version = schema_version(conn)?;
    let latest = latest_version();
    if db_version != latest {
        return Err(DbError::SchemaMismatch {
            db_version,
            expected: latest,
        });
    }
    Ok(())
}

/// Applies every migration newer than the recorded version.
pub fn apply_migrations(conn: &mut Connection) -> DbResult<()> {
    let current = schema_version(conn)?;
    let latest = latest_version();

    if current > latest {
        return Err(DbError::UnsupportedSchemaVersion {
            db_version: current,
            latest_supported: latest,
        });
    }
    if current == latest {
        return Ok(());
    }

    let tx = conn.transaction()?;
    for migration in MIGRATIONS.iter().filter(|m| m.version > current) {
        tx.execute_batch(migration.sql)?;
        tx.execute_batch(&format!("PRAGMA user_version = {};", migration.version))?;
        info!(
            "event=db_migrate module=db status=ok version={} name={}",
            migration.version, migration.name
        );
    }
    tx.commit()?;

    Ok(())
}
