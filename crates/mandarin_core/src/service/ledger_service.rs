//! Score ledger: the task-completion toggle state machine.
//!
//! # Responsibility
//! - Flip one task's completion flag and apply its score delta atomically.
//! - Maintain the member reached-maximum timestamp.
//! - Forward committed changes to the grid as a best-effort follow-up.
//!
//! # Invariants
//! - Personal task: member score moves by `personal_task_reward`.
//! - Team task: team score moves by `team_task_reward`.
//! - Personal toggles never change the team score.
//! - No floor is applied to scores.
//! - Reverse-sync failures are logged and never undo the commit.

use crate::db::{begin_immediate, DbError};
use crate::grid::writer::ReverseSync;
use crate::model::entities::{PersonalTaskId, TeamTaskId};
use crate::repo::member_repo::{MemberRepository, SqliteMemberRepository};
use crate::repo::team_repo::{SqliteTeamRepository, TeamRepository};
use crate::repo::{EntityRef, RepoError};
use log::{error, info, warn};
use rusqlite::Connection;
use serde::Serialize;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::{SystemTime, UNIX_EPOCH};

pub type LedgerResult<T> = Result<T, LedgerError>;

/// Score constants applied by the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LedgerPolicy {
    /// Personal score at which the reached-maximum timestamp is stamped.
    pub max_personal_score: i64,
    pub team_task_reward: i64,
    pub personal_task_reward: i64,
}

impl Default for LedgerPolicy {
    fn default() -> Self {
        Self {
            max_personal_score: 10,
            team_task_reward: 3,
            personal_task_reward: 1,
        }
    }
}

/// Source of "now" in epoch milliseconds.
pub trait Clock {
    fn now_ms(&self) -> i64;
}

/// Wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> i64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|elapsed| elapsed.as_millis() as i64)
            .unwrap_or(0)
    }
}

/// Clock frozen at one instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedClock(pub i64);

impl Clock for FixedClock {
    fn now_ms(&self) -> i64 {
        self.0
    }
}

/// Member score state after one personal toggle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemberScore {
    pub score: i64,
    pub reached_max_at: Option<i64>,
}

/// Computes the member score transition for one personal toggle.
///
/// The timestamp is stamped only when the new score is at or above the
/// maximum and no timestamp is set yet; it is cleared whenever the new
/// score drops below the maximum.
pub fn apply_personal_toggle(
    current: MemberScore,
    completed_now: bool,
    policy: &LedgerPolicy,
    now_ms: i64,
) -> MemberScore {
    let score = if completed_now {
        current.score + policy.personal_task_reward
    } else {
        current.score - policy.personal_task_reward
    };

    let reached_max_at = if score < policy.max_personal_score {
        None
    } else if current.reached_max_at.is_none() {
        Some(now_ms)
    } else {
        current.reached_max_at
    };

    MemberScore {
        score,
        reached_max_at,
    }
}

/// Computes the team score after one team-task toggle.
pub fn apply_team_toggle(current: i64, completed_now: bool, policy: &LedgerPolicy) -> i64 {
    if completed_now {
        current + policy.team_task_reward
    } else {
        current - policy.team_task_reward
    }
}

/// Task addressed by a toggle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum ToggleTarget {
    TeamTask(TeamTaskId),
    PersonalTask(PersonalTaskId),
}

impl Display for ToggleTarget {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::TeamTask(id) => write!(f, "team_task:{id}"),
            Self::PersonalTask(id) => write!(f, "personal_task:{id}"),
        }
    }
}

/// Result of the post-commit grid write.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "error", rename_all = "snake_case")]
pub enum SyncStatus {
    Synced,
    /// No writer configured.
    Skipped,
    Failed(String),
}

/// Committed state after one toggle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ToggleOutcome {
    pub target: ToggleTarget,
    pub is_completed: bool,
    /// New score of the owning team (team task) or member (personal task).
    pub owner_score: i64,
    /// Always `None` for team tasks.
    pub reached_max_at: Option<i64>,
    pub sync: SyncStatus,
}

/// Ledger failure. Nothing is persisted when this is returned.
#[derive(Debug)]
pub enum LedgerError {
    Db(DbError),
    Repo(RepoError),
}

impl Display for LedgerError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "toggle transaction failed: {err}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for LedgerError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::Repo(err) => Some(err),
        }
    }
}

impl From<DbError> for LedgerError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for LedgerError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

impl From<RepoError> for LedgerError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

/// Grid coordinates needed to mirror one committed toggle.
enum SyncRequest {
    Team {
        team_number: u32,
        task_number: u32,
    },
    Personal {
        team_number: u32,
        slot: u32,
        task_number: u32,
    },
}

/// Toggle entry point over a migrated connection.
pub struct LedgerService<'a> {
    conn: &'a Connection,
    policy: LedgerPolicy,
    clock: &'a dyn Clock,
    sync: Option<&'a dyn ReverseSync>,
}

impl<'a> LedgerService<'a> {
    /// Creates a ledger with default policy, wall clock and no reverse sync.
    pub fn new(conn: &'a Connection) -> Self {
        Self {
            conn,
            policy: LedgerPolicy::default(),
            clock: &SystemClock,
            sync: None,
        }
    }

    pub fn with_policy(mut self, policy: LedgerPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_clock(mut self, clock: &'a dyn Clock) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_reverse_sync(mut self, sync: &'a dyn ReverseSync) -> Self {
        self.sync = Some(sync);
        self
    }

    pub fn policy(&self) -> &LedgerPolicy {
        &self.policy
    }

    /// Flips a team task and moves the team score.
    ///
    /// # Errors
    /// - `RepoError::NotFound` when the task or its team does not exist.
    pub fn toggle_team_task(&self, id: TeamTaskId) -> LedgerResult<ToggleOutcome> {
        let target = ToggleTarget::TeamTask(id);
        let committed = self.logged_commit(target, || {
            let tx = begin_immediate(self.conn)?;
            let (outcome, request) = {
                let teams = SqliteTeamRepository::try_new(&tx)?;
                let task = teams
                    .get_team_task(id)?
                    .ok_or(RepoError::NotFound(EntityRef::TeamTask(id)))?;
                let team = teams
                    .get_team(task.team_id)?
                    .ok_or(RepoError::NotFound(EntityRef::Team(task.team_id)))?;

                let is_completed = !task.is_completed;
                let score = apply_team_toggle(team.score, is_completed, &self.policy);
                teams.set_team_task_completed(task.id, is_completed)?;
                teams.set_team_score(team.id, score)?;

                let outcome = ToggleOutcome {
                    target,
                    is_completed,
                    owner_score: score,
                    reached_max_at: None,
                    sync: SyncStatus::Skipped,
                };
                let request = SyncRequest::Team {
                    team_number: team.number,
                    task_number: task.task_number,
                };
                (outcome, request)
            };
            tx.commit()?;
            Ok((outcome, request))
        })?;
        Ok(self.finish(committed))
    }

    /// Flips a personal task and moves the member score.
    ///
    /// # Errors
    /// - `RepoError::NotFound` when the task, its member or the member's
    ///   team does not exist.
    pub fn toggle_personal_task(&self, id: PersonalTaskId) -> LedgerResult<ToggleOutcome> {
        let target = ToggleTarget::PersonalTask(id);
        let committed = self.logged_commit(target, || {
            let tx = begin_immediate(self.conn)?;
            let (outcome, request) = {
                let teams = SqliteTeamRepository::try_new(&tx)?;
                let members = SqliteMemberRepository::try_new(&tx)?;
                let task = members
                    .get_personal_task(id)?
                    .ok_or(RepoError::NotFound(EntityRef::PersonalTask(id)))?;
                let member = members
                    .get_member(task.member_id)?
                    .ok_or(RepoError::NotFound(EntityRef::Member(task.member_id)))?;
                let team = teams
                    .get_team(member.team_id)?
                    .ok_or(RepoError::NotFound(EntityRef::Team(member.team_id)))?;

                let is_completed = !task.is_completed;
                let next = apply_personal_toggle(
                    MemberScore {
                        score: member.score,
                        reached_max_at: member.reached_max_at,
                    },
                    is_completed,
                    &self.policy,
                    self.clock.now_ms(),
                );
                members.set_personal_task_completed(task.id, is_completed)?;
                members.set_member_score(member.id, next.score, next.reached_max_at)?;

                let outcome = ToggleOutcome {
                    target,
                    is_completed,
                    owner_score: next.score,
                    reached_max_at: next.reached_max_at,
                    sync: SyncStatus::Skipped,
                };
                let request = SyncRequest::Personal {
                    team_number: team.number,
                    slot: member.sheet_index,
                    task_number: task.task_number,
                };
                (outcome, request)
            };
            tx.commit()?;
            Ok((outcome, request))
        })?;
        Ok(self.finish(committed))
    }

    fn logged_commit(
        &self,
        target: ToggleTarget,
        commit: impl FnOnce() -> LedgerResult<(ToggleOutcome, SyncRequest)>,
    ) -> LedgerResult<(ToggleOutcome, SyncRequest)> {
        match commit() {
            Ok((outcome, request)) => {
                info!(
                    "event=task_toggle module=service status=ok target={} completed={} score={}",
                    target, outcome.is_completed, outcome.owner_score
                );
                Ok((outcome, request))
            }
            Err(err) => {
                error!(
                    "event=task_toggle module=service status=error target={} error={}",
                    target, err
                );
                Err(err)
            }
        }
    }

    fn finish(&self, (mut outcome, request): (ToggleOutcome, SyncRequest)) -> ToggleOutcome {
        let Some(sync) = self.sync else {
            return outcome;
        };

        let result = match request {
            SyncRequest::Team {
                team_number,
                task_number,
            } => sync.sync_team_task(team_number, task_number, outcome.is_completed),
            SyncRequest::Personal {
                team_number,
                slot,
                task_number,
            } => sync.sync_personal_task(team_number, slot, task_number, outcome.is_completed),
        };

        outcome.sync = match result {
            Ok(()) => {
                info!(
                    "event=reverse_sync module=service status=ok target={}",
                    outcome.target
                );
                SyncStatus::Synced
            }
            Err(err) => {
                warn!(
                    "event=reverse_sync module=service status=failed target={} error={}",
                    outcome.target, err
                );
                SyncStatus::Failed(err.to_string())
            }
        };
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::{apply_personal_toggle, apply_team_toggle, LedgerPolicy, MemberScore};

    const T0: i64 = 1_700_000_000_000;

    fn score(score: i64, reached_max_at: Option<i64>) -> MemberScore {
        MemberScore {
            score,
            reached_max_at,
        }
    }

    #[test]
    fn reaching_maximum_stamps_once() {
        let policy = LedgerPolicy::default();
        let reached = apply_personal_toggle(score(9, None), true, &policy, T0);
        assert_eq!(reached, score(10, Some(T0)));

        let over = apply_personal_toggle(reached, true, &policy, T0 + 5);
        assert_eq!(over, score(11, Some(T0)));
    }

    #[test]
    fn dropping_below_maximum_clears_timestamp() {
        let policy = LedgerPolicy::default();
        let dropped = apply_personal_toggle(score(10, Some(T0)), false, &policy, T0 + 1);
        assert_eq!(dropped, score(9, None));
    }

    #[test]
    fn staying_at_maximum_keeps_existing_timestamp() {
        let policy = LedgerPolicy::default();
        let next = apply_personal_toggle(score(11, Some(T0)), false, &policy, T0 + 9);
        assert_eq!(next, score(10, Some(T0)));
    }

    #[test]
    fn scores_go_negative_without_floor() {
        let policy = LedgerPolicy::default();
        assert_eq!(
            apply_personal_toggle(score(0, None), false, &policy, T0),
            score(-1, None)
        );
        assert_eq!(apply_team_toggle(0, false, &policy), -3);
    }

    #[test]
    fn team_toggle_uses_flat_reward() {
        let policy = LedgerPolicy::default();
        assert_eq!(apply_team_toggle(6, true, &policy), 9);
        assert_eq!(apply_team_toggle(9, false, &policy), 6);
    }
}
