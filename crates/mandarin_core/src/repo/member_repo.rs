//! Member and personal-task repository.
//!
//! # Responsibility
//! - Look up members by row id or natural key `(team, first, last)`.
//! - Create and update members and their ten personal tasks.
//! - Persist score and reached-maximum timestamp as one update.

use crate::db::migrations::ensure_current;
use crate::model::entities::{Member, MemberId, PersonalTask, PersonalTaskId, TeamId};
use crate::repo::{
    bool_to_int, ensure_changed, int_to_bool, EntityRef, NewTask, RepoError, RepoResult,
};
use rusqlite::{params, Connection, Row};

const MEMBER_SELECT_SQL: &str = "SELECT
    id,
    team_id,
    first_name,
    last_name,
    score,
    sheet_index,
    reached_max_at
FROM members";
const PERSONAL_TASK_SELECT_SQL: &str =
    "SELECT id, member_id, task_number, description, is_completed FROM personal_tasks";

/// Data access for members and personal tasks.
pub trait MemberRepository {
    fn get_member(&self, id: MemberId) -> RepoResult<Option<Member>>;
    fn find_member(
        &self,
        team_id: TeamId,
        first_name: &str,
        last_name: &str,
    ) -> RepoResult<Option<Member>>;
    /// Members of one team ordered by seat.
    fn list_members(&self, team_id: TeamId) -> RepoResult<Vec<Member>>;
    /// Every member ordered by row id.
    fn list_all_members(&self) -> RepoResult<Vec<Member>>;
    fn insert_member(
        &self,
        team_id: TeamId,
        first_name: &str,
        last_name: &str,
        sheet_index: u32,
    ) -> RepoResult<Member>;
    fn update_member_sheet_index(&self, id: MemberId, sheet_index: u32) -> RepoResult<()>;
    fn set_member_score(
        &self,
        id: MemberId,
        score: i64,
        reached_max_at: Option<i64>,
    ) -> RepoResult<()>;

    fn get_personal_task(&self, id: PersonalTaskId) -> RepoResult<Option<PersonalTask>>;
    fn find_personal_task(
        &self,
        member_id: MemberId,
        task_number: u32,
    ) -> RepoResult<Option<PersonalTask>>;
    fn list_personal_tasks(&self, member_id: MemberId) -> RepoResult<Vec<PersonalTask>>;
    fn insert_personal_task(
        &self,
        member_id: MemberId,
        task: NewTask<'_>,
    ) -> RepoResult<PersonalTask>;
    /// Overwrites description and raw completion flag; score untouched.
    fn update_personal_task_content(
        &self,
        id: PersonalTaskId,
        description: &str,
        is_completed: bool,
    ) -> RepoResult<()>;
    fn set_personal_task_completed(&self, id: PersonalTaskId, is_completed: bool)
        -> RepoResult<()>;
}

/// SQLite-backed member repository.
pub struct SqliteMemberRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteMemberRepository<'conn> {
    /// Creates a repository over a migrated connection or transaction.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_current(conn)?;
        Ok(Self { conn })
    }

    fn query_members(&self, sql: &str, params: impl rusqlite::Params) -> RepoResult<Vec<Member>> {
        let mut stmt = self.conn.prepare(sql)?;
        let mut rows = stmt.query(params)?;
        let mut members = Vec::new();
        while let Some(row) = rows.next()? {
            members.push(parse_member_row(row)?);
        }
        Ok(members)
    }

    fn query_tasks(
        &self,
        sql: &str,
        params: impl rusqlite::Params,
    ) -> RepoResult<Vec<PersonalTask>> {
        let mut stmt = self.conn.prepare(sql)?;
        let mut rows = stmt.query(params)?;
        let mut tasks = Vec::new();
        while let Some(row) = rows.next()? {
            tasks.push(parse_personal_task_row(row)?);
        }
        Ok(tasks)
    }
}

impl MemberRepository for SqliteMemberRepository<'_> {
    fn get_member(&self, id: MemberId) -> RepoResult<Option<Member>> {
        let members = self.query_members(&format!("{MEMBER_SELECT_SQL} WHERE id = ?1;"), [id])?;
        Ok(members.into_iter().next())
    }

    fn find_member(
        &self,
        team_id: TeamId,
        first_name: &str,
        last_name: &str,
    ) -> RepoResult<Option<Member>> {
        let members = self.query_members(
            &format!(
                "{MEMBER_SELECT_SQL}
                 WHERE team_id = ?1 AND first_name = ?2 AND last_name = ?3;"
            ),
            params![team_id, first_name, last_name],
        )?;
        Ok(members.into_iter().next())
    }

    fn list_members(&self, team_id: TeamId) -> RepoResult<Vec<Member>> {
        self.query_members(
            &format!("{MEMBER_SELECT_SQL} WHERE team_id = ?1 ORDER BY sheet_index ASC, id ASC;"),
            [team_id],
        )
    }

    fn list_all_members(&self) -> RepoResult<Vec<Member>> {
        self.query_members(&format!("{MEMBER_SELECT_SQL} ORDER BY id ASC;"), [])
    }

    fn insert_member(
        &self,
        team_id: TeamId,
        first_name: &str,
        last_name: &str,
        sheet_index: u32,
    ) -> RepoResult<Member> {
        self.conn.execute(
            "INSERT INTO members (team_id, first_name, last_name, score, sheet_index)
             VALUES (?1, ?2, ?3, 0, ?4);",
            params![team_id, first_name, last_name, sheet_index],
        )?;
        Ok(Member {
            id: self.conn.last_insert_rowid(),
            team_id,
            first_name: first_name.to_string(),
            last_name: last_name.to_string(),
            score: 0,
            sheet_index,
            reached_max_at: None,
        })
    }

    fn update_member_sheet_index(&self, id: MemberId, sheet_index: u32) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE members SET sheet_index = ?2 WHERE id = ?1;",
            params![id, sheet_index],
        )?;
        ensure_changed(changed, EntityRef::Member(id))
    }

    fn set_member_score(
        &self,
        id: MemberId,
        score: i64,
        reached_max_at: Option<i64>,
    ) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE members SET score = ?2, reached_max_at = ?3 WHERE id = ?1;",
            params![id, score, reached_max_at],
        )?;
        ensure_changed(changed, EntityRef::Member(id))
    }

    fn get_personal_task(&self, id: PersonalTaskId) -> RepoResult<Option<PersonalTask>> {
        let tasks =
            self.query_tasks(&format!("{PERSONAL_TASK_SELECT_SQL} WHERE id = ?1;"), [id])?;
        Ok(tasks.into_iter().next())
    }

    fn find_personal_task(
        &self,
        member_id: MemberId,
        task_number: u32,
    ) -> RepoResult<Option<PersonalTask>> {
        let tasks = self.query_tasks(
            &format!("{PERSONAL_TASK_SELECT_SQL} WHERE member_id = ?1 AND task_number = ?2;"),
            params![member_id, task_number],
        )?;
        Ok(tasks.into_iter().next())
    }

    fn list_personal_tasks(&self, member_id: MemberId) -> RepoResult<Vec<PersonalTask>> {
        self.query_tasks(
            &format!("{PERSONAL_TASK_SELECT_SQL} WHERE member_id = ?1 ORDER BY task_number ASC;"),
            [member_id],
        )
    }

    fn insert_personal_task(
        &self,
        member_id: MemberId,
        task: NewTask<'_>,
    ) -> RepoResult<PersonalTask> {
        self.conn.execute(
            "INSERT INTO personal_tasks (member_id, task_number, description, is_completed)
             VALUES (?1, ?2, ?3, ?4);",
            params![
                member_id,
                task.task_number,
                task.description,
                bool_to_int(task.is_completed)
            ],
        )?;
        Ok(PersonalTask {
            id: self.conn.last_insert_rowid(),
            member_id,
            task_number: task.task_number,
            description: task.description.to_string(),
            is_completed: task.is_completed,
        })
    }

    fn update_personal_task_content(
        &self,
        id: PersonalTaskId,
        description: &str,
        is_completed: bool,
    ) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE personal_tasks SET description = ?2, is_completed = ?3 WHERE id = ?1;",
            params![id, description, bool_to_int(is_completed)],
        )?;
        ensure_changed(changed, EntityRef::PersonalTask(id))
    }

    fn set_personal_task_completed(
        &self,
        id: PersonalTaskId,
        is_completed: bool,
    ) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE personal_tasks SET is_completed = ?2 WHERE id = ?1;",
            params![id, bool_to_int(is_completed)],
        )?;
        ensure_changed(changed, EntityRef::PersonalTask(id))
    }
}

fn parse_member_row(row: &Row<'_>) -> RepoResult<Member> {
    let sheet_index: i64 = row.get("sheet_index")?;
    let sheet_index = u32::try_from(sheet_index).map_err(|_| {
        RepoError::InvalidData(format!(
            "invalid sheet index `{sheet_index}` in members.sheet_index"
        ))
    })?;

    Ok(Member {
        id: row.get("id")?,
        team_id: row.get("team_id")?,
        first_name: row.get("first_name")?,
        last_name: row.get("last_name")?,
        score: row.get("score")?,
        sheet_index,
        reached_max_at: row.get("reached_max_at")?,
    })
}

fn parse_personal_task_row(row: &Row<'_>) -> RepoResult<PersonalTask> {
    Ok(PersonalTask {
        id: row.get("id")?,
        member_id: row.get("member_id")?,
        task_number: row.get("task_number")?,
        description: row.get("description")?,
        is_completed: int_to_bool(row.get("is_completed")?, "personal_tasks.is_completed")?,
    })
}
