//! Team and team-task repository.
//!
//! # Responsibility
//! - Look up teams by row id or natural key (`number`).
//! - Create and update teams and their seven tasks.
//!
//! # Invariants
//! - `list_teams` is ordered by ascending team number.
//! - Task lookups by natural key use `(team_id, task_number)`.

use crate::db::migrations::ensure_current;
use crate::model::entities::{Team, TeamId, TeamTask, TeamTaskId};
use crate::repo::{
    bool_to_int, ensure_changed, int_to_bool, EntityRef, NewTask, RepoResult,
};
use rusqlite::{params, Connection, OptionalExtension, Row};

const TEAM_SELECT_SQL: &str = "SELECT id, number, name, score FROM teams";
const TEAM_TASK_SELECT_SQL: &str =
    "SELECT id, team_id, task_number, description, is_completed FROM team_tasks";

/// Data access for teams and team tasks.
pub trait TeamRepository {
    fn get_team(&self, id: TeamId) -> RepoResult<Option<Team>>;
    fn find_team_by_number(&self, number: u32) -> RepoResult<Option<Team>>;
    fn list_teams(&self) -> RepoResult<Vec<Team>>;
    fn insert_team(&self, number: u32, name: Option<&str>) -> RepoResult<Team>;
    fn update_team_name(&self, id: TeamId, name: Option<&str>) -> RepoResult<()>;
    fn set_team_score(&self, id: TeamId, score: i64) -> RepoResult<()>;

    fn get_team_task(&self, id: TeamTaskId) -> RepoResult<Option<TeamTask>>;
    fn find_team_task(&self, team_id: TeamId, task_number: u32) -> RepoResult<Option<TeamTask>>;
    fn list_team_tasks(&self, team_id: TeamId) -> RepoResult<Vec<TeamTask>>;
    fn insert_team_task(&self, team_id: TeamId, task: NewTask<'_>) -> RepoResult<TeamTask>;
    /// Overwrites description and raw completion flag; score untouched.
    fn update_team_task_content(
        &self,
        id: TeamTaskId,
        description: &str,
        is_completed: bool,
    ) -> RepoResult<()>;
    fn set_team_task_completed(&self, id: TeamTaskId, is_completed: bool) -> RepoResult<()>;
}

/// SQLite-backed team repository.
pub struct SqliteTeamRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteTeamRepository<'conn> {
    /// Creates a repository over a migrated connection or transaction.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_current(conn)?;
        Ok(Self { conn })
    }
}

impl TeamRepository for SqliteTeamRepository<'_> {
    fn get_team(&self, id: TeamId) -> RepoResult<Option<Team>> {
        let team = self
            .conn
            .query_row(
                &format!("{TEAM_SELECT_SQL} WHERE id = ?1;"),
                [id],
                parse_team_row,
            )
            .optional()?;
        Ok(team)
    }

    fn find_team_by_number(&self, number: u32) -> RepoResult<Option<Team>> {
        let team = self
            .conn
            .query_row(
                &format!("{TEAM_SELECT_SQL} WHERE number = ?1;"),
                [number],
                parse_team_row,
            )
            .optional()?;
        Ok(team)
    }

    fn list_teams(&self) -> RepoResult<Vec<Team>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{TEAM_SELECT_SQL} ORDER BY number ASC;"))?;
        let teams = stmt
            .query_map([], parse_team_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(teams)
    }

    fn insert_team(&self, number: u32, name: Option<&str>) -> RepoResult<Team> {
        self.conn.execute(
            "INSERT INTO teams (number, name, score) VALUES (?1, ?2, 0);",
            params![number, name],
        )?;
        Ok(Team {
            id: self.conn.last_insert_rowid(),
            number,
            name: name.map(str::to_string),
            score: 0,
        })
    }

    fn update_team_name(&self, id: TeamId, name: Option<&str>) -> RepoResult<()> {
        let changed = self
            .conn
            .execute("UPDATE teams SET name = ?2 WHERE id = ?1;", params![id, name])?;
        ensure_changed(changed, EntityRef::Team(id))
    }

    fn set_team_score(&self, id: TeamId, score: i64) -> RepoResult<()> {
        let changed = self
            .conn
            .execute("UPDATE teams SET score = ?2 WHERE id = ?1;", params![id, score])?;
        ensure_changed(changed, EntityRef::Team(id))
    }

    fn get_team_task(&self, id: TeamTaskId) -> RepoResult<Option<TeamTask>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{TEAM_TASK_SELECT_SQL} WHERE id = ?1;"))?;
        let mut rows = stmt.query([id])?;
        match rows.next()? {
            Some(row) => Ok(Some(parse_team_task_row(row)?)),
            None => Ok(None),
        }
    }

    fn find_team_task(&self, team_id: TeamId, task_number: u32) -> RepoResult<Option<TeamTask>> {
        let mut stmt = self.conn.prepare(&format!(
            "{TEAM_TASK_SELECT_SQL} WHERE team_id = ?1 AND task_number = ?2;"
        ))?;
        let mut rows = stmt.query(params![team_id, task_number])?;
        match rows.next()? {
            Some(row) => Ok(Some(parse_team_task_row(row)?)),
            None => Ok(None),
        }
    }

    fn list_team_tasks(&self, team_id: TeamId) -> RepoResult<Vec<TeamTask>> {
        let mut stmt = self.conn.prepare(&format!(
            "{TEAM_TASK_SELECT_SQL} WHERE team_id = ?1 ORDER BY task_number ASC;"
        ))?;
        let mut rows = stmt.query([team_id])?;
        let mut tasks = Vec::new();
        while let Some(row) = rows.next()? {
            tasks.push(parse_team_task_row(row)?);
        }
        Ok(tasks)
    }

    fn insert_team_task(&self, team_id: TeamId, task: NewTask<'_>) -> RepoResult<TeamTask> {
        self.conn.execute(
            "INSERT INTO team_tasks (team_id, task_number, description, is_completed)
             VALUES (?1, ?2, ?3, ?4);",
            params![
                team_id,
                task.task_number,
                task.description,
                bool_to_int(task.is_completed)
            ],
        )?;
        Ok(TeamTask {
            id: self.conn.last_insert_rowid(),
            team_id,
            task_number: task.task_number,
            description: task.description.to_string(),
            is_completed: task.is_completed,
        })
    }

    fn update_team_task_content(
        &self,
        id: TeamTaskId,
        description: &str,
        is_completed: bool,
    ) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE team_tasks SET description = ?2, is_completed = ?3 WHERE id = ?1;",
            params![id, description, bool_to_int(is_completed)],
        )?;
        ensure_changed(changed, EntityRef::TeamTask(id))
    }

    fn set_team_task_completed(&self, id: TeamTaskId, is_completed: bool) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE team_tasks SET is_completed = ?2 WHERE id = ?1;",
            params![id, bool_to_int(is_completed)],
        )?;
        ensure_changed(changed, EntityRef::TeamTask(id))
    }
}

fn parse_team_row(row: &Row<'_>) -> rusqlite::Result<Team> {
    Ok(Team {
        id: row.get("id")?,
        number: row.get("number")?,
        name: row.get("name")?,
        score: row.get("score")?,
    })
}

fn parse_team_task_row(row: &Row<'_>) -> RepoResult<TeamTask> {
    Ok(TeamTask {
        id: row.get("id")?,
        team_id: row.get("team_id")?,
        task_number: row.get("task_number")?,
        description: row.get("description")?,
        is_completed: int_to_bool(row.get("is_completed")?, "team_tasks.is_completed")?,
    })
}
