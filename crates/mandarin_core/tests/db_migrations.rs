use mandarin_core::db::migrations::latest_version;
use mandarin_core::db::{open_db, open_db_in_memory, DbError};
use mandarin_core::repo::team_repo::SqliteTeamRepository;
use mandarin_core::RepoError;
use rusqlite::Connection;

#[test]
fn open_db_in_memory_applies_all_migrations() {
    let conn = open_db_in_memory().unwrap();

    assert_eq!(schema_version(&conn), latest_version());
    for table in [
        "teams",
        "members",
        "team_tasks",
        "personal_tasks",
        "display_state",
    ] {
        assert_table_exists(&conn, table);
    }
    assert_column_exists(&conn, "members", "reached_max_at");
}

#[test]
fn reopening_file_database_keeps_data_and_version() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("mandarin.sqlite3");

    let first = open_db(&path).unwrap();
    first
        .execute("INSERT INTO teams (number, name, score) VALUES (1, 'Owls', 6);", [])
        .unwrap();
    drop(first);

    let second = open_db(&path).unwrap();
    assert_eq!(schema_version(&second), latest_version());
    let score: i64 = second
        .query_row("SELECT score FROM teams WHERE number = 1;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(score, 6);
}

#[test]
fn opening_database_with_newer_schema_version_returns_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("future.sqlite3");

    let conn = Connection::open(&path).unwrap();
    conn.execute_batch("PRAGMA user_version = 999;").unwrap();
    drop(conn);

    match open_db(&path).unwrap_err() {
        DbError::UnsupportedSchemaVersion {
            db_version,
            latest_supported,
        } => {
            assert_eq!(db_version, 999);
            assert_eq!(latest_supported, latest_version());
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn repositories_reject_unmigrated_connections() {
    let conn = Connection::open_in_memory().unwrap();

    let err = SqliteTeamRepository::try_new(&conn).err().unwrap();
    assert!(matches!(
        err,
        RepoError::Db(DbError::SchemaMismatch { db_version: 0, .. })
    ));
}

#[test]
fn duplicate_team_number_violates_unique_key() {
    let conn = open_db_in_memory().unwrap();
    conn.execute("INSERT INTO teams (number, score) VALUES (3, 0);", [])
        .unwrap();

    let result = conn.execute("INSERT INTO teams (number, score) VALUES (3, 0);", []);
    assert!(result.is_err());
}

fn schema_version(conn: &Connection) -> u32 {
    conn.query_row("PRAGMA user_version;", [], |row| row.get(0))
        .unwrap()
}

fn assert_table_exists(conn: &Connection, table_name: &str) {
    let exists: i64 = conn
        .query_row(
            "SELECT EXISTS(
                SELECT 1
                FROM sqlite_master
                WHERE type = 'table' AND name = ?1
            );",
            [table_name],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(exists, 1, "table {table_name} does not exist");
}

fn assert_column_exists(conn: &Connection, table_name: &str, column: &str) {
    let mut stmt = conn
        .prepare(&format!("PRAGMA table_info({table_name});"))
        .unwrap();
    let columns = stmt
        .query_map([], |row| row.get::<_, String>("name"))
        .unwrap()
        .collect::<Result<Vec<_>, _>>()
        .unwrap();
    assert!(
        columns.iter().any(|name| name == column),
        "column {table_name}.{column} does not exist"
    );
}
