//! Snapshot exchange schema.
//!
//! # Responsibility
//! - Represent one fully parsed copy of the external grid.
//! - Serialize to and from the JSON exchange format used for offline import.
//!
//! # Invariants
//! - `validate()` accepts only coordinates the grid layout can resolve.
//! - A snapshot is never persisted partially; callers validate first.
//!
//! # See also
//! - `grid::parser` for how snapshots are produced from sheets.

use crate::grid::layout::{MEMBER_SLOT_COUNT, PERSONAL_TASK_COUNT, TEAM_COUNT, TEAM_TASK_COUNT};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::Path;

/// Parsed task row (team or personal).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskRecord {
    pub number: u32,
    pub description: String,
    pub is_completed: bool,
}

/// Parsed member seat.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberRecord {
    pub first_name: String,
    pub last_name: String,
    pub sheet_index: u32,
    pub tasks: Vec<TaskRecord>,
}

/// Parsed team with its tasks and members.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamRecord {
    pub number: u32,
    pub name: String,
    pub tasks: Vec<TaskRecord>,
    /// Serialized as `users` to match the exchange schema.
    #[serde(rename = "users", default)]
    pub members: Vec<MemberRecord>,
}

/// In-memory copy of the whole grid at one point in time.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Snapshot {
    pub teams: Vec<TeamRecord>,
}

/// Aggregate counts used for parse/import summaries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SnapshotSummary {
    pub teams: usize,
    pub members: usize,
    pub team_tasks: usize,
    pub personal_tasks: usize,
}

/// Snapshot decode/validation failures.
#[derive(Debug)]
pub enum SnapshotError {
    Io(std::io::Error),
    Json(serde_json::Error),
    InvalidTeamNumber(u32),
    DuplicateTeam(u32),
    InvalidTaskNumber { owner: String, number: u32 },
    DuplicateTask { owner: String, number: u32 },
    InvalidSheetIndex { team: u32, sheet_index: u32 },
    DuplicateMember { team: u32, name: String },
}

impl Display for SnapshotError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(err) => write!(f, "snapshot io error: {err}"),
            Self::Json(err) => write!(f, "snapshot json error: {err}"),
            Self::InvalidTeamNumber(number) => {
                write!(f, "team number {number} is outside 1..={TEAM_COUNT}")
            }
            Self::DuplicateTeam(number) => write!(f, "team {number} appears more than once"),
            Self::InvalidTaskNumber { owner, number } => {
                write!(f, "task number {number} is out of range for {owner}")
            }
            Self::DuplicateTask { owner, number } => {
                write!(f, "task {number} appears more than once for {owner}")
            }
            Self::InvalidSheetIndex { team, sheet_index } => write!(
                f,
                "sheet index {sheet_index} in team {team} is outside 0..{MEMBER_SLOT_COUNT}"
            ),
            Self::DuplicateMember { team, name } => {
                write!(f, "member `{name}` appears more than once in team {team}")
            }
        }
    }
}

impl Error for SnapshotError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            Self::Json(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for SnapshotError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<serde_json::Error> for SnapshotError {
    fn from(value: serde_json::Error) -> Self {
        Self::Json(value)
    }
}

impl Snapshot {
    pub fn new(teams: Vec<TeamRecord>) -> Self {
        Self { teams }
    }

    /// Decodes and validates a JSON snapshot.
    pub fn from_json(text: &str) -> Result<Self, SnapshotError> {
        let snapshot: Snapshot = serde_json::from_str(text)?;
        snapshot.validate()?;
        Ok(snapshot)
    }

    /// Reads and validates a JSON snapshot file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SnapshotError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    /// Pretty JSON in the exchange schema.
    pub fn to_json_pretty(&self) -> Result<String, SnapshotError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Writes pretty JSON to `path`.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), SnapshotError> {
        std::fs::write(path, self.to_json_pretty()?)?;
        Ok(())
    }

    /// Checks that every key in the snapshot fits the fixed grid layout and
    /// that natural keys are unique.
    pub fn validate(&self) -> Result<(), SnapshotError> {
        let mut seen_teams = HashSet::new();
        for team in &self.teams {
            if team.number == 0 || team.number > TEAM_COUNT {
                return Err(SnapshotError::InvalidTeamNumber(team.number));
            }
            if !seen_teams.insert(team.number) {
                return Err(SnapshotError::DuplicateTeam(team.number));
            }
            validate_tasks(
                &team.tasks,
                TEAM_TASK_COUNT,
                || format!("team {}", team.number),
            )?;

            let mut seen_members = HashSet::new();
            for member in &team.members {
                if member.sheet_index as usize >= MEMBER_SLOT_COUNT {
                    return Err(SnapshotError::InvalidSheetIndex {
                        team: team.number,
                        sheet_index: member.sheet_index,
                    });
                }
                let key = (member.first_name.as_str(), member.last_name.as_str());
                if !seen_members.insert(key) {
                    return Err(SnapshotError::DuplicateMember {
                        team: team.number,
                        name: format!("{} {}", member.last_name, member.first_name),
                    });
                }
                validate_tasks(&member.tasks, PERSONAL_TASK_COUNT, || {
                    format!(
                        "member `{} {}` of team {}",
                        member.last_name, member.first_name, team.number
                    )
                })?;
            }
        }
        Ok(())
    }

    pub fn summary(&self) -> SnapshotSummary {
        let mut summary = SnapshotSummary {
            teams: self.teams.len(),
            ..SnapshotSummary::default()
        };
        for team in &self.teams {
            summary.team_tasks += team.tasks.len();
            summary.members += team.members.len();
            summary.personal_tasks += team
                .members
                .iter()
                .map(|member| member.tasks.len())
                .sum::<usize>();
        }
        summary
    }
}

fn validate_tasks(
    tasks: &[TaskRecord],
    max_number: u32,
    owner: impl Fn() -> String,
) -> Result<(), SnapshotError> {
    let mut seen = HashSet::new();
    for task in tasks {
        if task.number == 0 || task.number > max_number {
            return Err(SnapshotError::InvalidTaskNumber {
                owner: owner(),
                number: task.number,
            });
        }
        if !seen.insert(task.number) {
            return Err(SnapshotError::DuplicateTask {
                owner: owner(),
                number: task.number,
            });
        }
    }
    Ok(())
}
