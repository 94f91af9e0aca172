//! Snapshot reconciliation into the store.
//!
//! # Responsibility
//! - Merge one parsed `Snapshot` into SQLite by natural key.
//! - Report how many rows were created or updated per entity kind.
//!
//! # Invariants
//! - Scores and reached-maximum timestamps are never written here.
//! - The merge is all-or-nothing: one `IMMEDIATE` transaction.
//! - Re-running an unchanged snapshot creates no rows.

use crate::db::{begin_immediate, DbError};
use crate::model::entities::TeamId;
use crate::model::snapshot::{MemberRecord, Snapshot, TaskRecord, TeamRecord};
use crate::repo::member_repo::{MemberRepository, SqliteMemberRepository};
use crate::repo::team_repo::{SqliteTeamRepository, TeamRepository};
use crate::repo::{NewTask, RepoError};
use log::{error, info};
use rusqlite::Connection;
use serde::Serialize;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Instant;

pub type ReconcileResult<T> = Result<T, ReconcileError>;

/// Reconciliation failure. Nothing is persisted when this is returned.
#[derive(Debug)]
pub enum ReconcileError {
    Db(DbError),
    Repo(RepoError),
}

impl Display for ReconcileError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "reconcile transaction failed: {err}"),
            Self::Repo(err) => write!(f, "reconcile failed: {err}"),
        }
    }
}

impl Error for ReconcileError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::Repo(err) => Some(err),
        }
    }
}

impl From<DbError> for ReconcileError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for ReconcileError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

impl From<RepoError> for ReconcileError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

/// Created/updated counters for one reconcile run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ReconcileStats {
    pub teams_created: usize,
    pub teams_updated: usize,
    pub members_created: usize,
    pub members_updated: usize,
    pub team_tasks_created: usize,
    pub team_tasks_updated: usize,
    pub personal_tasks_created: usize,
    pub personal_tasks_updated: usize,
}

impl ReconcileStats {
    pub fn created_total(&self) -> usize {
        self.teams_created
            + self.members_created
            + self.team_tasks_created
            + self.personal_tasks_created
    }
}

/// Transactional entry point over a migrated connection.
pub struct ReconcileService<'conn> {
    conn: &'conn Connection,
}

impl<'conn> ReconcileService<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    /// Merges `snapshot` and commits.
    ///
    /// # Side effects
    /// - Emits `reconcile` events with counters and duration.
    pub fn reconcile(&self, snapshot: &Snapshot) -> ReconcileResult<ReconcileStats> {
        let started_at = Instant::now();
        info!(
            "event=reconcile module=service status=start teams={}",
            snapshot.teams.len()
        );

        let result = self.reconcile_in_transaction(snapshot);
        match &result {
            Ok(stats) => info!(
                "event=reconcile module=service status=ok duration_ms={} teams_created={} teams_updated={} members_created={} members_updated={} team_tasks_created={} team_tasks_updated={} personal_tasks_created={} personal_tasks_updated={}",
                started_at.elapsed().as_millis(),
                stats.teams_created,
                stats.teams_updated,
                stats.members_created,
                stats.members_updated,
                stats.team_tasks_created,
                stats.team_tasks_updated,
                stats.personal_tasks_created,
                stats.personal_tasks_updated
            ),
            Err(err) => error!(
                "event=reconcile module=service status=error duration_ms={} error={}",
                started_at.elapsed().as_millis(),
                err
            ),
        }
        result
    }

    fn reconcile_in_transaction(&self, snapshot: &Snapshot) -> ReconcileResult<ReconcileStats> {
        let tx = begin_immediate(self.conn)?;
        let stats = {
            let teams = SqliteTeamRepository::try_new(&tx)?;
            let members = SqliteMemberRepository::try_new(&tx)?;
            merge_snapshot(&teams, &members, snapshot)?
        };
        tx.commit()?;
        Ok(stats)
    }
}

/// Applies the create-or-update rules through any repository pair.
///
/// Callers own the transaction boundary.
pub fn merge_snapshot<T, M>(
    teams: &T,
    members: &M,
    snapshot: &Snapshot,
) -> ReconcileResult<ReconcileStats>
where
    T: TeamRepository,
    M: MemberRepository,
{
    let mut stats = ReconcileStats::default();
    for record in &snapshot.teams {
        let team_id = merge_team(teams, record, &mut stats)?;
        merge_team_tasks(teams, team_id, &record.tasks, &mut stats)?;
        for member in &record.members {
            merge_member(members, team_id, member, &mut stats)?;
        }
    }
    Ok(stats)
}

fn merge_team<T: TeamRepository>(
    teams: &T,
    record: &TeamRecord,
    stats: &mut ReconcileStats,
) -> ReconcileResult<TeamId> {
    let name = Some(record.name.trim()).filter(|name| !name.is_empty());
    match teams.find_team_by_number(record.number)? {
        Some(team) => {
            if team.name.as_deref() != name {
                teams.update_team_name(team.id, name)?;
                stats.teams_updated += 1;
            }
            Ok(team.id)
        }
        None => {
            let team = teams.insert_team(record.number, name)?;
            stats.teams_created += 1;
            Ok(team.id)
        }
    }
}

fn merge_team_tasks<T: TeamRepository>(
    teams: &T,
    team_id: TeamId,
    tasks: &[TaskRecord],
    stats: &mut ReconcileStats,
) -> ReconcileResult<()> {
    for task in tasks {
        match teams.find_team_task(team_id, task.number)? {
            Some(existing) => {
                if existing.description != task.description
                    || existing.is_completed != task.is_completed
                {
                    teams.update_team_task_content(
                        existing.id,
                        &task.description,
                        task.is_completed,
                    )?;
                    stats.team_tasks_updated += 1;
                }
            }
            None => {
                teams.insert_team_task(team_id, new_task(task))?;
                stats.team_tasks_created += 1;
            }
        }
    }
    Ok(())
}

fn merge_member<M: MemberRepository>(
    members: &M,
    team_id: TeamId,
    record: &MemberRecord,
    stats: &mut ReconcileStats,
) -> ReconcileResult<()> {
    let member = match members.find_member(team_id, &record.first_name, &record.last_name)? {
        Some(member) => {
            if member.sheet_index != record.sheet_index {
                members.update_member_sheet_index(member.id, record.sheet_index)?;
                stats.members_updated += 1;
            }
            member
        }
        None => {
            stats.members_created += 1;
            members.insert_member(
                team_id,
                &record.first_name,
                &record.last_name,
                record.sheet_index,
            )?
        }
    };

    for task in &record.tasks {
        match members.find_personal_task(member.id, task.number)? {
            Some(existing) => {
                if existing.description != task.description
                    || existing.is_completed != task.is_completed
                {
                    members.update_personal_task_content(
                        existing.id,
                        &task.description,
                        task.is_completed,
                    )?;
                    stats.personal_tasks_updated += 1;
                }
            }
            None => {
                members.insert_personal_task(member.id, new_task(task))?;
                stats.personal_tasks_created += 1;
            }
        }
    }
    Ok(())
}

fn new_task(record: &TaskRecord) -> NewTask<'_> {
    NewTask {
        task_number: record.number,
        description: &record.description,
        is_completed: record.is_completed,
    }
}
