//! Persisted leaderboard visibility.
//!
//! # Invariants
//! - At most one row (`id = 1`) exists; a missing row means "visible".

use crate::db::migrations::ensure_current;
use crate::display::DisplayState;
use crate::repo::{bool_to_int, int_to_bool, RepoResult};
use rusqlite::{params, Connection, OptionalExtension};

pub trait DisplayRepository {
    fn load_display_state(&self) -> RepoResult<DisplayState>;
    fn save_display_state(&self, state: DisplayState) -> RepoResult<()>;
}

/// SQLite-backed display state.
pub struct SqliteDisplayRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteDisplayRepository<'conn> {
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_current(conn)?;
        Ok(Self { conn })
    }
}

impl DisplayRepository for SqliteDisplayRepository<'_> {
    fn load_display_state(&self) -> RepoResult<DisplayState> {
        let row = self
            .conn
            .query_row(
                "SELECT hidden, reveal_at_ms FROM display_state WHERE id = 1;",
                [],
                |row| Ok((row.get::<_, i64>(0)?, row.get::<_, Option<i64>>(1)?)),
            )
            .optional()?;
        match row {
            Some((hidden, reveal_at_ms)) => Ok(DisplayState {
                hidden: int_to_bool(hidden, "display_state.hidden")?,
                reveal_at_ms,
            }),
            None => Ok(DisplayState::default()),
        }
    }

    fn save_display_state(&self, state: DisplayState) -> RepoResult<()> {
        self.conn.execute(
            "INSERT INTO display_state (id, hidden, reveal_at_ms) VALUES (1, ?1, ?2)
             ON CONFLICT(id) DO UPDATE SET
                hidden = excluded.hidden,
                reveal_at_ms = excluded.reveal_at_ms;",
            params![bool_to_int(state.hidden), state.reveal_at_ms],
        )?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{DisplayRepository, SqliteDisplayRepository};
    use crate::db::open_db_in_memory;
    use crate::display::DisplayState;

    #[test]
    fn fresh_store_reads_as_visible() {
        let conn = open_db_in_memory().unwrap();
        let repo = SqliteDisplayRepository::try_new(&conn).unwrap();
        assert_eq!(repo.load_display_state().unwrap(), DisplayState::default());
    }

    #[test]
    fn saving_twice_keeps_a_single_row() {
        let conn = open_db_in_memory().unwrap();
        let repo = SqliteDisplayRepository::try_new(&conn).unwrap();
        let hidden = DisplayState {
            hidden: true,
            reveal_at_ms: Some(5_000),
        };

        repo.save_display_state(hidden).unwrap();
        assert_eq!(repo.load_display_state().unwrap(), hidden);
        repo.save_display_state(DisplayState::default()).unwrap();

        assert_eq!(repo.load_display_state().unwrap(), DisplayState::default());
        let rows: i64 = conn
            .query_row("SELECT COUNT(*) FROM display_state;", [], |row| row.get(0))
            .unwrap();
        assert_eq!(rows, 1);
    }
}
